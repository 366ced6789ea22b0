//! Completion rendezvous between the executor and the engine
//!
//! The engine decides when every registered test has finished. It reports
//! the termination code through a [`CompletionNotifier`]; the executor waits
//! on the matching [`CompletionObserver`].

use crate::error::{Error, Result};
use std::sync::mpsc::{self, Receiver, Sender};

/// Create a connected notifier/observer pair
pub fn channel() -> (CompletionNotifier, CompletionObserver) {
    let (tx, rx) = mpsc::channel();
    (CompletionNotifier { tx }, CompletionObserver { rx })
}

/// Handed to the engine so it can report how the run terminated
#[derive(Debug)]
pub struct CompletionNotifier {
    tx: Sender<i32>,
}

impl CompletionNotifier {
    /// Report the termination code, `0` for success and `1` for failure
    pub fn notify(self, code: i32) {
        // The observer may have gone away if the executor already bailed out.
        let _ = self.tx.send(code);
    }
}

/// Kept by the executor to wait for the engine
#[derive(Debug)]
pub struct CompletionObserver {
    rx: Receiver<i32>,
}

impl CompletionObserver {
    /// Block until the engine reports a termination code
    pub fn wait(self) -> Result<i32> {
        self.rx.recv().map_err(|_| {
            Error::Completion("the engine released its completion handle without a code".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn code_crosses_threads() {
        let (notifier, observer) = channel();
        let handle = thread::spawn(move || notifier.notify(1));
        assert_eq!(observer.wait().unwrap(), 1);
        handle.join().unwrap();
    }

    #[test]
    fn dropped_notifier_is_an_error() {
        let (notifier, observer) = channel();
        drop(notifier);
        assert!(matches!(observer.wait(), Err(Error::Completion(_))));
    }
}
