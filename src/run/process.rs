//! Engine that evaluates each test file in a child process

use crate::error::{Error, Result};
use crate::run::completion::CompletionNotifier;
use crate::run::engine::Engine;
use std::path::{Path, PathBuf};
use std::process::{Child, Command as StdCommand, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

/// Environment variable carrying the bail flag to the runner
pub const BAIL_ENV: &str = "RUNTESTS_BAIL";
/// Environment variable carrying the timeout in milliseconds
pub const TIMEOUT_ENV: &str = "RUNTESTS_TIMEOUT";
/// Environment variable carrying the grep pattern
pub const GREP_ENV: &str = "RUNTESTS_GREP";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs `<runner...> <file>` for every loaded file
///
/// A file fails when its process exits unsuccessfully or outlives the
/// timeout. On [`finish`](Engine::finish) the engine reports `1` if any file
/// failed and `0` otherwise.
#[derive(Debug)]
pub struct ProcessEngine {
    program: String,
    args: Vec<String>,
    work_dir: PathBuf,
    bail: bool,
    timeout: Option<Duration>,
    grep: Option<String>,
    notifier: Option<CompletionNotifier>,
    failures: usize,
}

impl ProcessEngine {
    /// Create an engine for the given runner command line
    ///
    /// # Errors
    /// Fails with [`Error::EngineMissing`] when the runner program cannot be
    /// found.
    pub fn new(runner: &[String], work_dir: impl Into<PathBuf>) -> Result<Self> {
        let (program, args) = runner
            .split_first()
            .ok_or_else(|| Error::invalid_argument("runner expects a program name"))?;

        if !Self::program_exists(program) {
            return Err(Error::EngineMissing {
                program: program.clone(),
            });
        }

        Ok(ProcessEngine {
            program: program.clone(),
            args: args.to_vec(),
            work_dir: work_dir.into(),
            bail: false,
            timeout: None,
            grep: None,
            notifier: None,
            failures: 0,
        })
    }

    /// Number of files that failed so far
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Check if a program exists as a path or in PATH (cross-platform)
    fn program_exists(program: &str) -> bool {
        let path = Path::new(program);
        if path.components().count() > 1 {
            return path.is_file();
        }

        #[cfg(windows)]
        let check_cmd = "where";
        #[cfg(not(windows))]
        let check_cmd = "which";

        StdCommand::new(check_cmd)
            .arg(program)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn spawn(&self, file: &Path) -> Result<Child> {
        let mut command = StdCommand::new(&self.program);
        command.args(&self.args).arg(file).current_dir(&self.work_dir);

        if self.bail {
            command.env(BAIL_ENV, "1");
        }
        if let Some(timeout) = self.timeout {
            command.env(TIMEOUT_ENV, timeout.as_millis().to_string());
        }
        if let Some(grep) = &self.grep {
            command.env(GREP_ENV, grep);
        }

        command.spawn().map_err(|e| {
            Error::command_error(
                &self.program,
                format!("cannot start for {}: {}", file.display(), e),
            )
        })
    }

    /// Wait for the child, killing it once the timeout has elapsed
    ///
    /// Returns `None` when the child was killed.
    fn wait(&self, child: &mut Child) -> Result<Option<ExitStatus>> {
        let Some(timeout) = self.timeout else {
            return Ok(Some(child.wait()?));
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                child.kill()?;
                let _ = child.wait()?; // Reap the process
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Engine for ProcessEngine {
    fn attach(&mut self, notifier: CompletionNotifier) {
        self.notifier = Some(notifier);
    }

    fn bail(&mut self, bail: bool) {
        self.bail = bail;
    }

    fn timeout(&mut self, timeout: Duration) {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
    }

    fn grep(&mut self, pattern: &str) {
        self.grep = Some(pattern.to_string());
    }

    fn load(&mut self, file: &Path) -> Result<()> {
        if self.bail && self.failures > 0 {
            tracing::warn!(file = %file.display(), "skipped after earlier failure");
            return Ok(());
        }

        tracing::debug!(program = %self.program, file = %file.display(), "running test file");
        let mut child = self.spawn(file)?;

        match self.wait(&mut child)? {
            Some(status) if status.success() => {}
            Some(status) => {
                tracing::debug!(
                    file = %file.display(),
                    code = status.code().unwrap_or(-1),
                    "test file failed"
                );
                self.failures += 1;
            }
            None => {
                tracing::warn!(
                    file = %file.display(),
                    timeout_ms = self.timeout.map(|t| t.as_millis() as u64).unwrap_or(0),
                    "test file timed out"
                );
                self.failures += 1;
            }
        }
        Ok(())
    }

    fn finish(&mut self) {
        let code = if self.failures > 0 { 1 } else { 0 };
        if let Some(notifier) = self.notifier.take() {
            notifier.notify(code);
        }
    }
}
