//! The boundary to the external test-execution engine

use crate::error::Result;
use crate::run::completion::CompletionNotifier;
use std::path::Path;
use std::time::Duration;

/// An engine that evaluates test files and judges the run
///
/// The executor drives an engine in a fixed order: [`attach`], then the
/// settings that were explicitly configured, then one [`load`] per file,
/// then [`finish`]. The engine must eventually report a termination code
/// through the attached notifier, `1` meaning that at least one test failed.
///
/// [`attach`]: Engine::attach
/// [`load`]: Engine::load
/// [`finish`]: Engine::finish
pub trait Engine {
    /// Receive the handle used to report completion
    fn attach(&mut self, notifier: CompletionNotifier);

    /// Stop at the first failing test
    fn bail(&mut self, bail: bool);

    /// Per-test timeout, a zero duration disables the limit
    fn timeout(&mut self, timeout: Duration);

    /// Only run tests whose title matches
    fn grep(&mut self, pattern: &str);

    /// Evaluate a test file, registering and running its tests
    fn load(&mut self, file: &Path) -> Result<()>;

    /// No more files will be loaded
    fn finish(&mut self);
}
