//! Cancellation seam for blocked lock waits.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A one-shot cancellation flag shared between a waiting transaction and the
/// actor that may abort it (timeout watchdog, deadlock policy, user).
///
/// Cloning the token shares the flag. Once cancelled it stays cancelled; a
/// transaction gets a fresh token per lock request or per lifetime, at the
/// caller's discretion.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation. Blocked `lock()` calls observing this token
    /// return `GraniteError::Aborted` on their next wake.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation has been signalled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
