//! Cross-worker fixture coordination
//!
//! A reference-counted first-in/last-out protocol cooperating workers use
//! to agree on which of them performs one-time setup and teardown around a
//! shared named resource.

use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::warn;

/// Active-consumer counts keyed by resource name
#[derive(Debug, Default)]
pub struct Trail {
    board: Mutex<HashMap<String, usize>>,
}

impl Trail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in `name`. Returns true when the caller is the
    /// first consumer and should perform setup.
    pub fn start(&self, name: &str) -> bool {
        let mut board = self.board.lock();
        match board.get_mut(name) {
            Some(count) => {
                *count += 1;
                false
            }
            None => {
                board.insert(name.to_string(), 1);
                true
            }
        }
    }

    /// Release interest in `name`. Returns true when the caller is the
    /// last consumer out and should perform teardown.
    ///
    /// Callers must pair every `finish` with an earlier `start`; the
    /// protocol does not detect mismatched ordering.
    pub fn finish(&self, name: &str) -> bool {
        let mut board = self.board.lock();
        match board.get_mut(name) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                board.remove(name);
                true
            }
            None => {
                warn!(resource = name, "finish without a matching start");
                true
            }
        }
    }

    /// Current consumer count for `name`, if any consumer is active.
    pub fn active(&self, name: &str) -> Option<usize> {
        self.board.lock().get(name).copied()
    }
}
