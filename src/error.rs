//! Error types for runtests

use std::path::Path;
use thiserror::Error;

/// Result type alias for runtests operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for runtests operations
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value had the wrong shape
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Regex error
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A discovery glob could not be compiled
    #[error("Discovery failed: invalid glob pattern '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// WalkDir error
    #[error("Discovery failed: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// A path could not be resolved to its canonical form
    #[error("Discovery failed: cannot resolve '{path}': {source}")]
    Resolve {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Parse error in the override file
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// The project override file failed while being applied
    #[error("Failed to load overrides from {path} at line {line}: {source}")]
    OverrideLoad {
        path: String,
        line: usize,
        #[source]
        source: Box<Error>,
    },

    /// The filter callback failed for a file
    #[error("Filter callback failed for '{file}': {source}")]
    Filter {
        file: String,
        #[source]
        source: Box<Error>,
    },

    /// The runner could not be started
    #[error("Command '{command}' failed: {message}")]
    Command { command: String, message: String },

    /// The runner program for the execution engine is not available
    #[error("Make sure to install '{program}' before running tests")]
    EngineMissing { program: String },

    /// The engine never reported how the run terminated
    #[error("Execution engine did not report completion: {0}")]
    Completion(String),

    /// At least one test failed
    #[error("Tests failed")]
    TestsFailed,

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    /// Create a command error
    pub fn command_error(command: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Command {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Wrap an error raised while applying the override file
    pub fn override_load(path: &Path, line: usize, source: Error) -> Self {
        Error::OverrideLoad {
            path: path.display().to_string(),
            line,
            source: Box::new(source),
        }
    }

    /// Wrap an error returned by the filter callback
    pub fn filter(file: &Path, source: Error) -> Self {
        Error::Filter {
            file: file.display().to_string(),
            source: Box::new(source),
        }
    }

    /// Whether this error was raised while discovering test files
    pub fn is_discovery(&self) -> bool {
        matches!(
            self,
            Error::Glob { .. } | Error::WalkDir(_) | Error::Resolve { .. }
        )
    }
}
