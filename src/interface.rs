use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::error::TagtreeError;
use crate::TagtreeResult;

/// Execution context handed to every node.
///
/// It carries no variables; it only lets a caller stop a long render, either
/// by cancelling it from another thread or by giving it a deadline. Both are
/// checked before each node executes.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::default(),
            deadline: Some(deadline),
        }
    }

    /// Cancels this context and every clone of it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    pub(crate) fn check(&self) -> TagtreeResult<()> {
        if self.is_cancelled() {
            return Err(TagtreeError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    #[ntest::timeout(100)]
    fn test_fresh_context_is_live() {
        assert!(Context::new().check().is_ok());
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_cancel_reaches_clones() {
        let context = Context::new();
        let clone = context.clone();
        context.cancel();
        assert_eq!(clone.check(), Err(TagtreeError::Cancelled));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_deadline() {
        let past = Instant::now();
        assert!(Context::with_deadline(past).is_cancelled());

        let future = Instant::now() + Duration::from_secs(60);
        assert!(!Context::with_deadline(future).is_cancelled());
    }
}
