//! The `runtests` pipeline
//!
//! overrides → discover → filter → execute, each stage short-circuiting the
//! rest on failure.

use crate::config::Configuration;
use crate::discovery;
use crate::error::{Error, Result};
use crate::filter;
use crate::overrides::{OverrideFile, OverrideSource};
use crate::report;
use crate::run::{Engine, Executor, Outcome, ProcessEngine};
use std::path::{Path, PathBuf};

/// Runs every test file of a project
///
/// # Examples
///
/// ```no_run
/// use runtests::RunCommand;
///
/// let result = RunCommand::new(".").bail(true).timeout(2000).run();
/// std::process::exit(runtests::exit_code(&result));
/// ```
pub struct RunCommand {
    project_root: PathBuf,
    config: Configuration,
    bail: Option<bool>,
    timeout: Option<u64>,
    grep: Option<String>,
    runner: Option<Vec<String>>,
    verbose: bool,
    overrides: Box<dyn OverrideSource>,
    engine: Option<Box<dyn Engine>>,
}

impl RunCommand {
    /// Create a run for the project at `project_root`
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let overrides = Box::new(OverrideFile::in_project(&project_root));
        Self {
            project_root,
            config: Configuration::new(),
            bail: None,
            timeout: None,
            grep: None,
            runner: None,
            verbose: false,
            overrides,
            engine: None,
        }
    }

    /// Stop at the first failing test; wins over the override file
    pub fn bail(mut self, bail: bool) -> Self {
        self.bail = Some(bail);
        self
    }

    /// Per-test timeout in milliseconds; wins over the override file
    pub fn timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Only run matching tests; wins over the override file
    pub fn grep(mut self, grep: impl Into<String>) -> Self {
        self.grep = Some(grep.into());
        self
    }

    /// Command line used to evaluate test files; wins over the override file
    pub fn runner(mut self, runner: Vec<String>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Print the resolved configuration before running
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Replace the project override file
    pub fn overrides(mut self, overrides: impl OverrideSource + 'static) -> Self {
        self.overrides = Box::new(overrides);
        self
    }

    /// Replace the default process engine
    pub fn engine(mut self, engine: impl Engine + 'static) -> Self {
        self.engine = Some(Box::new(engine));
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Base configuration that every run starts from
    pub fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }

    /// Base configuration, then overrides, then explicit settings
    pub fn resolve_configuration(&self) -> Result<Configuration> {
        let mut config = self.config.clone();
        self.overrides.apply(&mut config)?;

        if let Some(bail) = self.bail {
            config.bail(bail);
        }
        if let Some(timeout) = self.timeout {
            config.timeout(timeout);
        }
        if let Some(grep) = &self.grep {
            config.grep(grep.as_str());
        }
        if let Some(runner) = &self.runner {
            config.runner(runner.clone())?;
        }

        tracing::debug!(?config, "resolved configuration");
        Ok(config)
    }

    /// Discover the test files selected by `config`
    pub fn test_files(&self, config: &Configuration) -> Result<Vec<PathBuf>> {
        discovery::discover(&self.project_root, &config.tests_glob, &config.ignore_pattern)
    }

    /// Discover and filter the test files selected by `config`
    pub fn selected_files(&self, config: &Configuration) -> Result<Vec<PathBuf>> {
        let files = self.test_files(config)?;
        filter::filter_files(files, config.filter_callback.as_ref())
    }

    /// Run the whole pipeline
    ///
    /// The command is consumed along with any injected engine.
    ///
    /// # Errors
    /// [`Error::TestsFailed`] when the engine reports a failure, otherwise
    /// the error of the first stage that failed.
    pub fn run(mut self) -> Result<()> {
        let config = self.resolve_configuration()?;

        let mut engine: Box<dyn Engine> = match self.engine.take() {
            Some(engine) => engine,
            None => Box::new(ProcessEngine::new(&config.runner, &self.project_root)?),
        };

        if self.verbose {
            let root = discovery::resolve_root(&self.project_root)?;
            report::resolved(&root, &config);
        }

        let files = self.selected_files(&config)?;
        if self.verbose {
            report::selected(&files);
        }

        match Executor::new(&config).execute(engine.as_mut(), &files)? {
            Outcome::Success => Ok(()),
            Outcome::Failure(reason) => {
                tracing::debug!(%reason, "engine reported failure");
                Err(Error::TestsFailed)
            }
        }
    }
}

/// Map a pipeline result onto a process exit code
pub fn exit_code(result: &Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(_) => 1,
    }
}
