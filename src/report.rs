//! Human-facing output on stderr

use crate::config::Configuration;
use std::path::{Path, PathBuf};

/// Print the project root, discovery glob and ignore list
pub fn resolved(project_root: &Path, config: &Configuration) {
    eprintln!("project root: {}", project_root.display());
    eprintln!("tests glob:   {}", config.tests_glob);
    if config.ignore_pattern.is_empty() {
        eprintln!("ignoring:     -");
    } else {
        eprintln!("ignoring:     {}", config.ignore_pattern.join(", "));
    }
}

/// Print the files about to be handed to the engine
pub fn selected(files: &[PathBuf]) {
    eprintln!("running {} test file(s)", files.len());
    for file in files {
        eprintln!("  {}", file.display());
    }
}

/// Print a failure in red when colors are enabled and stderr is a terminal
#[cfg(feature = "colors")]
pub fn failure(message: &str) {
    use std::io::Write;
    use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

    let choice = if atty::is(atty::Stream::Stderr) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stderr = StandardStream::stderr(choice);
    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
    let _ = write!(stderr, "error");
    let _ = stderr.reset();
    let _ = writeln!(stderr, ": {}", message);
}

/// Print a failure
#[cfg(not(feature = "colors"))]
pub fn failure(message: &str) {
    eprintln!("error: {}", message);
}
