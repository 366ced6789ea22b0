//! runtests command-line entry point

use anyhow::Context;
use clap::Parser;
use runtests::overrides::split_command_line;
use runtests::{report, RunCommand};
use std::path::PathBuf;
use std::process;

/// Run every test file of the project in the current directory
#[derive(Parser, Debug)]
#[command(name = "runtests", version, about, long_about = None)]
struct Cli {
    /// Exit early when a test fails
    #[arg(short, long)]
    bail: bool,

    /// Global timeout for every test, in milliseconds
    #[arg(short, long, value_name = "MS")]
    timeout: Option<u64>,

    /// Only run tests whose title matches
    #[arg(short, long, value_name = "PATTERN")]
    grep: Option<String>,

    /// Print the resolved project root, glob and ignore list
    #[arg(long)]
    verbose: bool,

    /// Program used to evaluate each test file, e.g. "node --enable-source-maps"
    #[arg(long, value_name = "COMMAND")]
    runner: Option<String>,

    /// Project directory, defaults to the current directory
    #[arg(long, value_name = "DIR")]
    project_root: Option<PathBuf>,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .try_init();
}

fn build_command(cli: Cli) -> anyhow::Result<RunCommand> {
    let project_root = match cli.project_root {
        Some(dir) => dir,
        None => std::env::current_dir().context("cannot determine the current directory")?,
    };

    let mut command = RunCommand::new(project_root).verbose(cli.verbose);
    if cli.bail {
        command = command.bail(true);
    }
    if let Some(timeout) = cli.timeout {
        command = command.timeout(timeout);
    }
    if let Some(grep) = cli.grep {
        command = command.grep(grep);
    }
    if let Some(runner) = cli.runner {
        let runner = split_command_line(&runner)
            .map_err(|message| anyhow::anyhow!("invalid --runner: {}", message))?;
        command = command.runner(runner);
    }
    Ok(command)
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let command = match build_command(cli) {
        Ok(command) => command,
        Err(e) => {
            report::failure(&format!("{:#}", e));
            process::exit(1);
        }
    };

    let result = command.run();
    if let Err(e) = &result {
        report::failure(&e.to_string());
    }
    process::exit(runtests::exit_code(&result));
}
