//! Cancellation for work started by a screen.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag.
///
/// Clones observe the same flag. Once cancelled it stays cancelled; a new
/// screen gets a new `Lifetime`.
#[derive(Debug, Clone, Default)]
pub struct Lifetime {
    cancelled: Arc<AtomicBool>,
}

impl Lifetime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Result of an operation that may outlive its screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The result was applied to controller state.
    Applied(T),
    /// The lifetime ended while the operation was in flight; state untouched.
    Discarded,
}

impl<T> Outcome<T> {
    pub fn is_discarded(&self) -> bool {
        matches!(self, Outcome::Discarded)
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Outcome::Applied(value) => Some(value),
            Outcome::Discarded => None,
        }
    }
}
