//! Builder API for configuring a [`Runtime`].

use crate::rejection::{RejectionNotification, RejectionTracker};
use crate::runtime::Runtime;
use eddy_core::Promise;
use std::sync::Arc;

/// Fluent builder for a [`Runtime`].
///
/// # Example
///
/// ```
/// use eddy_runtime::RuntimeBuilder;
///
/// let runtime = RuntimeBuilder::new()
///     .drain_budget(100_000)
///     .on_unhandled_rejection(|promise, kind| {
///         eprintln!("{kind:?}: {promise:?}");
///     })
///     .build();
/// # drop(runtime);
/// ```
#[derive(Default)]
pub struct RuntimeBuilder {
    drain_budget: Option<usize>,
    rejection_callback:
        Option<Box<dyn Fn(&Arc<Promise>, RejectionNotification) + Send + Sync>>,
}

impl RuntimeBuilder {
    /// Start from defaults: unbounded drains, rejection notifications via the
    /// `tracing` log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of jobs a single drain may execute. Guards against
    /// runaway microtask loops; exhausted budgets leave the remainder queued.
    pub fn drain_budget(mut self, budget: usize) -> Self {
        self.drain_budget = Some(budget);
        self
    }

    /// Install the unhandled-rejection notification callback.
    pub fn on_unhandled_rejection<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Arc<Promise>, RejectionNotification) + Send + Sync + 'static,
    {
        self.rejection_callback = Some(Box::new(callback));
        self
    }

    /// Build the runtime.
    pub fn build(self) -> Arc<Runtime> {
        let tracker = RejectionTracker::new();
        if let Some(callback) = self.rejection_callback {
            tracker.set_callback(callback);
        }
        Runtime::with_parts(tracker, self.drain_budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let runtime = RuntimeBuilder::new().build();
        assert!(!runtime.has_pending_jobs());
        assert_eq!(runtime.drain_jobs(), 0);
    }
}
