//! Project configuration for a test run
//!
//! A [`Configuration`] is built from defaults, mutated by the project
//! override file and finally by command-line flags. The pipeline stages
//! only ever read it.

use crate::error::{Error, Result};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Glob used to discover test files when nothing overrides it
pub const DEFAULT_TESTS_GLOB: &str = "test/*.spec.js";

/// Program that evaluates each test file by default
pub const DEFAULT_RUNNER: &str = "node";

/// Predicate deciding whether a discovered file should be ignored
///
/// Returning `Ok(true)` drops the file from the run.
pub type FilterFn = Arc<dyn Fn(&Path) -> Result<bool> + Send + Sync>;

/// The two ways test files can be excluded
#[derive(Clone)]
pub enum FilterSpec {
    /// Glob patterns, relative to the project root, that are never run
    Exclude(Vec<String>),
    /// A callback asked once per discovered file
    Predicate(FilterFn),
}

impl FilterSpec {
    /// Build a predicate filter from a closure
    pub fn predicate<F>(func: F) -> Self
    where
        F: Fn(&Path) -> Result<bool> + Send + Sync + 'static,
    {
        FilterSpec::Predicate(Arc::new(func))
    }

    /// Build an exclude filter from untyped arguments
    ///
    /// One argument is a single glob, several are a list. No arguments at
    /// all is not a filter.
    pub fn from_args(args: &[String]) -> Result<Self> {
        if args.is_empty() {
            return Err(Error::invalid_argument(
                "filter only accepts a glob string, array, or callback",
            ));
        }
        Ok(FilterSpec::Exclude(args.to_vec()))
    }
}

impl From<&str> for FilterSpec {
    fn from(glob: &str) -> Self {
        FilterSpec::Exclude(vec![glob.to_string()])
    }
}

impl From<String> for FilterSpec {
    fn from(glob: String) -> Self {
        FilterSpec::Exclude(vec![glob])
    }
}

impl From<Vec<String>> for FilterSpec {
    fn from(globs: Vec<String>) -> Self {
        FilterSpec::Exclude(globs)
    }
}

impl From<Vec<&str>> for FilterSpec {
    fn from(globs: Vec<&str>) -> Self {
        FilterSpec::Exclude(globs.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FilterSpec {
    fn from(globs: [&str; N]) -> Self {
        FilterSpec::Exclude(globs.iter().map(|g| g.to_string()).collect())
    }
}

impl fmt::Debug for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSpec::Exclude(globs) => f.debug_tuple("Exclude").field(globs).finish(),
            FilterSpec::Predicate(_) => f.write_str("Predicate(<fn>)"),
        }
    }
}

/// Configuration consumed by discovery, filtering and execution
#[derive(Clone)]
pub struct Configuration {
    /// Glob for test files, relative to the project root
    pub tests_glob: String,
    /// Globs excluded from discovery
    pub ignore_pattern: Vec<String>,
    /// Optional per-file ignore callback
    pub filter_callback: Option<FilterFn>,
    /// Stop at the first failing test
    pub bail: bool,
    /// Per-test timeout in milliseconds, engine default when unset
    pub timeout: Option<u64>,
    /// Only run tests whose title matches
    pub grep: Option<String>,
    /// Command line of the program that evaluates a test file
    pub runner: Vec<String>,
}

impl Configuration {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Configuration {
            tests_glob: DEFAULT_TESTS_GLOB.to_string(),
            ignore_pattern: Vec::new(),
            filter_callback: None,
            bail: false,
            timeout: None,
            grep: None,
            runner: vec![DEFAULT_RUNNER.to_string()],
        }
    }

    /// Restore every field to its default
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Exclude files by glob, or by callback
    ///
    /// Globs replace any previously configured ignore list. A callback
    /// leaves the ignore list untouched.
    pub fn filter(&mut self, spec: impl Into<FilterSpec>) -> &mut Self {
        match spec.into() {
            FilterSpec::Exclude(globs) => self.ignore_pattern = globs,
            FilterSpec::Predicate(func) => self.filter_callback = Some(func),
        }
        self
    }

    /// Set the glob used to discover test files
    pub fn run(&mut self, pattern: impl Into<String>) -> &mut Self {
        self.tests_glob = pattern.into();
        self
    }

    /// Set the glob from untyped arguments, which must be exactly one string
    pub fn run_args(&mut self, args: &[String]) -> Result<&mut Self> {
        match args {
            [pattern] => Ok(self.run(pattern.as_str())),
            [] => Err(Error::invalid_argument(
                "run expects glob pattern to be a string, got nothing",
            )),
            _ => Err(Error::invalid_argument(
                "run expects glob pattern to be a string, got list",
            )),
        }
    }

    pub fn bail(&mut self, bail: bool) -> &mut Self {
        self.bail = bail;
        self
    }

    pub fn timeout(&mut self, timeout: u64) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn grep(&mut self, grep: impl Into<String>) -> &mut Self {
        self.grep = Some(grep.into());
        self
    }

    /// Set the command line used to evaluate test files
    pub fn runner(&mut self, runner: Vec<String>) -> Result<&mut Self> {
        if runner.is_empty() {
            return Err(Error::invalid_argument("runner expects a program name"));
        }
        self.runner = runner;
        Ok(self)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("tests_glob", &self.tests_glob)
            .field("ignore_pattern", &self.ignore_pattern)
            .field("filter_callback", &self.filter_callback.as_ref().map(|_| "<fn>"))
            .field("bail", &self.bail)
            .field("timeout", &self.timeout)
            .field("grep", &self.grep)
            .field("runner", &self.runner)
            .finish()
    }
}
