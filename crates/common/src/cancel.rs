//! Cooperative cancellation for in-flight validations.
//!
//! The gateway performs no I/O and has no natural suspension points, so
//! cancellation is advisory: the orchestrator polls the token between pipeline
//! phases and abandons the remaining phases once it trips. Shared-map mutations
//! are atomic under their own locks, so abandonment never requires rollback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation token shared between a caller and an in-flight validation.
///
/// Cloning produces a handle to the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a new, untripped token
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the token, requesting that the associated call stop early
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_trips_all_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());
    }
}
