//! # runtests
//!
//! Discovers the test files of a project, filters them and hands them to an
//! external test engine, turning the engine's verdict into an exit code.
//!
//! The pipeline is strictly sequential:
//!
//! 1. apply the project's `runtestsfile` overrides to the [`Configuration`]
//! 2. [`discover`] files matching the tests glob, minus the ignore globs
//! 3. [`filter_files`] through the optional callback
//! 4. [`Executor::execute`] every file once on an [`Engine`] and wait for
//!    its completion signal
//!
//! ```no_run
//! use runtests::{FilterSpec, RunCommand};
//!
//! let mut command = RunCommand::new("/path/to/project").timeout(5000);
//! command
//!     .config_mut()
//!     .run("test/**/*.spec.js")
//!     .filter(FilterSpec::predicate(|file| {
//!         Ok(file.to_string_lossy().contains("fixtures"))
//!     }));
//! command.run().unwrap();
//! ```

pub mod command;
pub mod config;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod overrides;
pub mod report;
pub mod run;

pub use command::{exit_code, RunCommand};
pub use config::{Configuration, FilterFn, FilterSpec, DEFAULT_RUNNER, DEFAULT_TESTS_GLOB};
pub use discovery::discover;
pub use error::{Error, Result};
pub use filter::filter_files;
pub use overrides::{OverrideFile, OverrideSource, OVERRIDE_FILE_NAME};
pub use run::{CompletionNotifier, CompletionObserver, Engine, Executor, Outcome, ProcessEngine};
