//! Deferred units of work and their dispatch.
//!
//! Every queued job is one variant of a single tagged [`Job`] enum, dispatched
//! by one match in [`Job::run`]. Jobs run to completion; anything they enqueue
//! lands behind the jobs already queued.

use crate::host::HostHooks;
use crate::promise::{Promise, Reaction};
use crate::thenable::Thenable;
use crate::value::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Which settlement outcome a reaction job delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    /// Run the fulfillment handler (or pass the value through).
    Fulfill,
    /// Run the rejection handler (or pass the reason through).
    Reject,
}

/// A reaction handed off to the scheduler at settle time.
pub struct ReactionJob {
    reaction: Reaction,
    kind: ReactionKind,
    argument: Value,
}

impl ReactionJob {
    pub(crate) fn new(reaction: Reaction, kind: ReactionKind, argument: Value) -> Self {
        Self {
            reaction,
            kind,
            argument,
        }
    }

    /// Run the applicable handler and settle the capability with its
    /// completion. Returns a thrown value that had nowhere to go.
    fn run(self, host: &dyn HostHooks) -> Option<Value> {
        let Reaction {
            on_fulfilled,
            on_rejected,
            capability,
            context,
        } = self.reaction;

        let handler = match self.kind {
            ReactionKind::Fulfill => on_fulfilled,
            ReactionKind::Reject => on_rejected,
        };

        match handler {
            Some(handler) => match (handler(self.argument, context), capability) {
                (Ok(value), Some(target)) => {
                    target.resolve_inner(value, host);
                    None
                }
                (Err(reason), Some(target)) => {
                    target.reject_inner(reason, host);
                    None
                }
                (Ok(_), None) => None,
                // Fire-and-forget: no promise to carry the failure, so it is
                // swallowed here and surfaced to the scheduler for logging.
                (Err(reason), None) => Some(reason),
            },
            // Pass-through defaults: identity for fulfillment, re-throw for
            // rejection.
            None => {
                if let Some(target) = capability {
                    match self.kind {
                        ReactionKind::Fulfill => target.resolve_inner(self.argument, host),
                        ReactionKind::Reject => target.reject_inner(self.argument, host),
                    }
                }
                None
            }
        }
    }
}

/// A deferred `then` invocation against a foreign thenable.
pub struct ResolveThenableJob {
    thenable: Arc<dyn Thenable>,
    promise: Arc<Promise>,
}

impl ResolveThenableJob {
    pub(crate) fn new(thenable: Arc<dyn Thenable>, promise: Arc<Promise>) -> Self {
        Self { thenable, promise }
    }

    /// Invoke `then` with resolve/reject callbacks sharing one
    /// already-resolved latch: the first invocation of either disables both,
    /// and a synchronous throw routes to the reject path.
    fn run(self, host: &dyn HostHooks) {
        let already_resolved = AtomicBool::new(false);
        let promise = self.promise;

        let result = {
            let mut resolve = |value: Value| {
                if !already_resolved.swap(true, Ordering::SeqCst) {
                    promise.resolve_inner(value, host);
                }
            };
            let mut reject = |reason: Value| {
                if !already_resolved.swap(true, Ordering::SeqCst) {
                    promise.reject_inner(reason, host);
                }
            };
            self.thenable.call_then(&mut resolve, &mut reject)
        };

        if let Err(thrown) = result {
            if !already_resolved.swap(true, Ordering::SeqCst) {
                promise.reject_inner(thrown, host);
            }
        }
    }
}

/// A queued unit of deferred work.
pub enum Job {
    /// Deliver a settlement to one reaction.
    Reaction(ReactionJob),
    /// Resolve a promise against a foreign thenable.
    ResolveThenable(ResolveThenableJob),
    /// A host-enqueued plain callback (`queueMicrotask` style).
    Callback(Box<dyn FnOnce() + Send>),
}

impl Job {
    /// Run the job to completion.
    ///
    /// Returns the thrown value of a fire-and-forget handler, which the
    /// scheduler may log; all other failure paths settle a promise instead.
    pub fn run(self, host: &dyn HostHooks) -> Option<Value> {
        match self {
            Job::Reaction(job) => job.run(host),
            Job::ResolveThenable(job) => {
                job.run(host);
                None
            }
            Job::Callback(callback) => {
                callback();
                None
            }
        }
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Job::Reaction(job) => f
                .debug_struct("ReactionJob")
                .field("kind", &job.kind)
                .field("argument", &job.argument)
                .finish(),
            Job::ResolveThenable(job) => f
                .debug_struct("ResolveThenableJob")
                .field("promise", &job.promise)
                .finish(),
            Job::Callback(_) => f.write_str("CallbackJob"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promise::handler;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct TestHost {
        jobs: Mutex<VecDeque<Job>>,
    }

    impl HostHooks for TestHost {
        fn enqueue_job(&self, job: Job) {
            self.jobs.lock().push_back(job);
        }
    }

    #[test]
    fn test_fire_and_forget_error_is_surfaced_to_scheduler() {
        let host = TestHost::default();
        let p = Promise::new();
        p.register_reaction(
            Reaction::new(Some(handler(|_| Err(Value::string("lost")))), None, None),
            &host,
        );
        p.fulfill(Value::undefined(), &host);

        let job = host.jobs.lock().pop_front().unwrap();
        assert_eq!(job.run(&host), Some(Value::string("lost")));
    }

    #[test]
    fn test_callback_job_runs() {
        let host = TestHost::default();
        let hit = Arc::new(AtomicBool::new(false));
        let hit_clone = hit.clone();
        let job = Job::Callback(Box::new(move || {
            hit_clone.store(true, Ordering::SeqCst);
        }));
        assert_eq!(job.run(&host), None);
        assert!(hit.load(Ordering::SeqCst));
    }
}
