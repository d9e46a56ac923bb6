//! The run-to-completion scheduler.
//!
//! A [`Runtime`] owns one [`JobQueue`] and one [`RejectionTracker`] and
//! implements [`HostHooks`], so promises settled through it enqueue their
//! reaction jobs here. Nothing runs until the embedder calls
//! [`Runtime::drain_jobs`] (or [`Runtime::run_until_idle`]) at a checkpoint,
//! typically the end of a synchronous turn.
//!
//! Each runtime is its own little world: queues are never process-wide, so
//! tests and embedders get isolated scheduling state.

use crate::queue::JobQueue;
use crate::rejection::RejectionTracker;
use eddy_core::{Handler, HostHooks, Job, Promise, RejectionOperation, Value};
use std::sync::Arc;

/// A promise together with latched settle handles, for resolving from host
/// code that outlives the current scope.
pub struct PromiseWithResolvers {
    /// The promise.
    pub promise: Arc<Promise>,
    /// Resolve handle; only the first call to either handle has an effect.
    pub resolve: Arc<dyn Fn(Value) + Send + Sync>,
    /// Reject handle.
    pub reject: Arc<dyn Fn(Value) + Send + Sync>,
}

/// Single-threaded cooperative job scheduler.
pub struct Runtime {
    jobs: JobQueue,
    tracker: RejectionTracker,
    /// Per-drain job budget; `None` means unbounded.
    drain_budget: Option<usize>,
}

impl Runtime {
    /// Create a runtime with default configuration.
    pub fn new() -> Arc<Self> {
        crate::builder::RuntimeBuilder::new().build()
    }

    pub(crate) fn with_parts(tracker: RejectionTracker, drain_budget: Option<usize>) -> Arc<Self> {
        Arc::new(Self {
            jobs: JobQueue::new(),
            tracker,
            drain_budget,
        })
    }

    /// Enqueue a plain callback job.
    pub fn enqueue_microtask<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue_job(Job::Callback(Box::new(callback)));
    }

    /// Pop and run jobs until the queue is empty.
    ///
    /// Each job runs to completion; jobs enqueued by a running job are
    /// appended and executed in the same drain. Returns the number of jobs
    /// executed. If a drain budget is configured and exhausted, the drain
    /// stops with jobs still queued.
    pub fn drain_jobs(&self) -> usize {
        let mut executed = 0usize;
        while let Some(job) = self.jobs.dequeue() {
            if let Some(swallowed) = job.run(self) {
                tracing::debug!(error = ?swallowed, "fire-and-forget handler threw; swallowed");
            }
            executed += 1;
            if self.drain_budget.is_some_and(|budget| executed >= budget) && !self.jobs.is_empty() {
                tracing::warn!(
                    executed,
                    pending = self.jobs.len(),
                    "drain budget exhausted, leaving jobs queued"
                );
                break;
            }
        }
        tracing::trace!(executed, "job drain complete");
        executed
    }

    /// Drain the queue, then run the unhandled-rejection checkpoint.
    ///
    /// Returns the number of jobs executed.
    pub fn run_until_idle(&self) -> usize {
        let executed = self.drain_jobs();
        self.tracker.report_unhandled();
        executed
    }

    /// True if jobs are queued.
    pub fn has_pending_jobs(&self) -> bool {
        !self.jobs.is_empty()
    }

    /// The rejection tracker for this runtime.
    pub fn rejection_tracker(&self) -> &RejectionTracker {
        &self.tracker
    }

    /// Create a new pending promise.
    ///
    /// Promises are not tied to a runtime; this is a convenience mirror of
    /// [`Promise::new`].
    pub fn new_promise(&self) -> Arc<Promise> {
        Promise::new()
    }

    /// A promise resolved with `value` through this runtime (thenables
    /// assimilate; non-objects fulfill directly).
    pub fn resolved(&self, value: Value) -> Arc<Promise> {
        let promise = Promise::new();
        promise.resolve(value, self);
        promise
    }

    /// A promise rejected with `reason` through this runtime. The rejection
    /// tracker sees it like any other rejection.
    pub fn rejected(&self, reason: Value) -> Arc<Promise> {
        let promise = Promise::new();
        promise.reject(reason, self);
        promise
    }

    /// Fulfill `promise` with `value` (no thenable assimilation).
    pub fn fulfill(&self, promise: &Arc<Promise>, value: Value) {
        promise.fulfill(value, self);
    }

    /// Reject `promise` with `reason`.
    pub fn reject(&self, promise: &Arc<Promise>, reason: Value) {
        promise.reject(reason, self);
    }

    /// Resolve `promise` with `value`, assimilating thenables.
    pub fn resolve(&self, promise: &Arc<Promise>, value: Value) {
        promise.resolve(value, self);
    }

    /// Register reaction handlers; returns the derived promise.
    pub fn then(
        &self,
        promise: &Arc<Promise>,
        on_fulfilled: Option<Handler>,
        on_rejected: Option<Handler>,
    ) -> Arc<Promise> {
        promise.then_with(on_fulfilled, on_rejected, self)
    }

    /// Register a rejection handler; returns the derived promise.
    pub fn catch(&self, promise: &Arc<Promise>, on_rejected: Handler) -> Arc<Promise> {
        promise.catch_with(on_rejected, self)
    }

    /// Create a promise with latched resolve/reject handles.
    pub fn with_resolvers(self: &Arc<Self>) -> PromiseWithResolvers {
        let promise = Promise::new();

        let resolve = {
            let runtime = Arc::clone(self);
            let promise = Arc::clone(&promise);
            Arc::new(move |value: Value| {
                promise.resolve(value, &*runtime);
            }) as Arc<dyn Fn(Value) + Send + Sync>
        };

        let reject = {
            let runtime = Arc::clone(self);
            let promise = Arc::clone(&promise);
            Arc::new(move |reason: Value| {
                promise.reject(reason, &*runtime);
            }) as Arc<dyn Fn(Value) + Send + Sync>
        };

        PromiseWithResolvers {
            promise,
            resolve,
            reject,
        }
    }
}

impl HostHooks for Runtime {
    fn enqueue_job(&self, job: Job) {
        tracing::trace!(job = ?job, "enqueue");
        self.jobs.enqueue(job);
    }

    fn promise_rejection_tracker(&self, promise: &Arc<Promise>, operation: RejectionOperation) {
        match operation {
            RejectionOperation::Reject => self.tracker.on_reject(promise),
            RejectionOperation::Handle => self.tracker.on_handle(promise),
        }
    }
}
