//! Test execution module

pub mod completion;
pub mod engine;
pub mod process;

// Re-export public types
pub use completion::{CompletionNotifier, CompletionObserver};
pub use engine::Engine;
pub use process::ProcessEngine;

use crate::config::Configuration;
use crate::error::Result;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// How a run ended, as judged by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(String),
}

impl Outcome {
    /// Interpret an engine termination code
    ///
    /// Only `1` is a failure; every other code counts as success.
    pub fn from_exit_code(code: i32) -> Self {
        if code == 1 {
            Outcome::Failure("Tests failed".to_string())
        } else {
            Outcome::Success
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Hands test files to an engine and waits for its verdict
pub struct Executor<'a> {
    config: &'a Configuration,
}

impl<'a> Executor<'a> {
    pub fn new(config: &'a Configuration) -> Self {
        Self { config }
    }

    /// Load every file once, in order, then wait for the engine to finish
    pub fn execute(&self, engine: &mut dyn Engine, files: &[PathBuf]) -> Result<Outcome> {
        // Attach before the first load so a fast engine cannot finish unobserved.
        let (notifier, observer) = completion::channel();
        engine.attach(notifier);

        self.configure(engine);

        let mut loaded = HashSet::new();
        for file in files {
            let key = file.canonicalize().unwrap_or_else(|_| file.clone());
            if !loaded.insert(key) {
                tracing::debug!(file = %file.display(), "already loaded");
                continue;
            }
            engine.load(file)?;
        }
        engine.finish();

        let code = observer.wait()?;
        let outcome = Outcome::from_exit_code(code);
        tracing::info!(files = loaded.len(), code, ?outcome, "run complete");
        Ok(outcome)
    }

    /// Push explicitly configured settings; unset values keep the engine defaults
    fn configure(&self, engine: &mut dyn Engine) {
        if self.config.bail {
            engine.bail(true);
        }
        if let Some(timeout) = self.config.timeout {
            engine.timeout(Duration::from_millis(timeout));
        }
        if let Some(grep) = self.config.grep.as_deref().filter(|g| !g.is_empty()) {
            engine.grep(grep);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[derive(Default)]
    struct Recording {
        calls: Vec<String>,
        notifier: Option<CompletionNotifier>,
        code: i32,
    }

    impl Engine for Recording {
        fn attach(&mut self, notifier: CompletionNotifier) {
            self.calls.push("attach".to_string());
            self.notifier = Some(notifier);
        }

        fn bail(&mut self, bail: bool) {
            self.calls.push(format!("bail {}", bail));
        }

        fn timeout(&mut self, timeout: Duration) {
            self.calls.push(format!("timeout {}", timeout.as_millis()));
        }

        fn grep(&mut self, pattern: &str) {
            self.calls.push(format!("grep {}", pattern));
        }

        fn load(&mut self, file: &Path) -> Result<()> {
            self.calls.push(format!("load {}", file.display()));
            Ok(())
        }

        fn finish(&mut self) {
            self.calls.push("finish".to_string());
            if let Some(notifier) = self.notifier.take() {
                notifier.notify(self.code);
            }
        }
    }

    #[test]
    fn exit_code_interpretation() {
        assert_eq!(Outcome::from_exit_code(0), Outcome::Success);
        assert_eq!(Outcome::from_exit_code(2), Outcome::Success);
        assert!(!Outcome::from_exit_code(1).is_success());
    }

    #[test]
    fn attaches_before_loading_and_skips_unset_settings() {
        let config = Configuration::new();
        let mut engine = Recording::default();
        let files = vec![PathBuf::from("/nope/a.js"), PathBuf::from("/nope/b.js")];

        let outcome = Executor::new(&config).execute(&mut engine, &files).unwrap();

        assert_eq!(outcome, Outcome::Success);
        assert_eq!(
            engine.calls,
            vec!["attach", "load /nope/a.js", "load /nope/b.js", "finish"]
        );
    }

    #[test]
    fn pushes_explicit_settings() {
        let mut config = Configuration::new();
        config.bail(true).timeout(0).grep("parser");
        let mut engine = Recording::default();

        Executor::new(&config).execute(&mut engine, &[]).unwrap();

        assert_eq!(
            engine.calls,
            vec!["attach", "bail true", "timeout 0", "grep parser", "finish"]
        );
    }

    #[test]
    fn empty_grep_is_not_pushed() {
        let mut config = Configuration::new();
        config.grep("");
        let mut engine = Recording::default();

        Executor::new(&config).execute(&mut engine, &[]).unwrap();

        assert_eq!(engine.calls, vec!["attach", "finish"]);
    }

    #[test]
    fn duplicate_files_load_once() {
        let config = Configuration::new();
        let mut engine = Recording::default();
        let file = PathBuf::from("/nope/a.js");

        Executor::new(&config)
            .execute(&mut engine, &[file.clone(), file])
            .unwrap();

        let loads = engine.calls.iter().filter(|c| c.starts_with("load")).count();
        assert_eq!(loads, 1);
    }

    #[test]
    fn failure_code_becomes_failure_outcome() {
        let config = Configuration::new();
        let mut engine = Recording {
            code: 1,
            ..Recording::default()
        };

        let outcome = Executor::new(&config)
            .execute(&mut engine, &[PathBuf::from("/nope/a.js")])
            .unwrap();

        assert_eq!(outcome, Outcome::Failure("Tests failed".to_string()));
    }
}
