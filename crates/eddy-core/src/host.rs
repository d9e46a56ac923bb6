//! The interface a host scheduler provides to the promise core.

use crate::job::Job;
use crate::promise::Promise;
use std::sync::Arc;

/// Which way a promise's handled-state changed, as reported to the host's
/// rejection tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionOperation {
    /// The promise was rejected with no reaction attached.
    Reject,
    /// A reaction was attached to a promise that had already been rejected
    /// unhandled.
    Handle,
}

/// Host hooks consumed by the promise state machine.
///
/// The core only ever *enqueues*: something external must eventually drain the
/// job queue at an appropriate checkpoint. `eddy-runtime` provides the
/// reference implementation; embedders with their own event loop can implement
/// this directly.
pub trait HostHooks: Send + Sync {
    /// Append a job to the host's FIFO job queue.
    fn enqueue_job(&self, job: Job);

    /// Rejection-tracking notification, in the shape of ECMA-262's
    /// `HostPromiseRejectionTracker(promise, operation)`.
    ///
    /// The default implementation ignores the notification.
    fn promise_rejection_tracker(&self, promise: &Arc<Promise>, operation: RejectionOperation) {
        let _ = (promise, operation);
    }
}
