//! The promise state machine.
//!
//! A [`Promise`] is a single-assignment container for an eventual value,
//! observed by registering reactions. All settling operations are
//! parameterized by a [`HostHooks`] implementation: handlers are never run
//! in place, they are packaged into jobs and handed to the host queue.

use crate::error::{PromiseError, type_error};
use crate::host::{HostHooks, RejectionOperation};
use crate::job::{Job, ReactionJob, ReactionKind, ResolveThenableJob};
use crate::value::Value;
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Completion of a reaction handler: `Ok` is a returned value, `Err` a thrown
/// one.
pub type Completion = Result<Value, Value>;

/// A boxed reaction handler.
///
/// The first argument is the settled value (or rejection reason), the second
/// the opaque context the reaction was registered with.
pub type Handler = Box<dyn FnOnce(Value, Value) -> Completion + Send>;

/// Box a context-ignoring closure into a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: FnOnce(Value) -> Completion + Send + 'static,
{
    Box::new(move |value, _context| f(value))
}

/// One `.then`-style registration against a promise's eventual settlement.
pub struct Reaction {
    pub(crate) on_fulfilled: Option<Handler>,
    pub(crate) on_rejected: Option<Handler>,
    pub(crate) capability: Option<Arc<Promise>>,
    pub(crate) context: Value,
}

impl Reaction {
    /// A reaction with the given handlers and an optional downstream promise
    /// to settle with the handler's completion.
    ///
    /// A missing handler defaults to pass-through: the fulfillment value or
    /// rejection reason propagates to the capability unchanged. A reaction
    /// with no capability is fire-and-forget.
    pub fn new(
        on_fulfilled: Option<Handler>,
        on_rejected: Option<Handler>,
        capability: Option<Arc<Promise>>,
    ) -> Self {
        Self {
            on_fulfilled,
            on_rejected,
            capability,
            context: Value::Undefined,
        }
    }

    /// Attach an opaque context value, handed to whichever handler runs.
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    /// A handler-less reaction that splices `target`'s fate onto the promise
    /// it is registered on.
    pub(crate) fn passthrough(target: Arc<Promise>) -> Self {
        Self::new(None, None, Some(target))
    }
}

impl std::fmt::Debug for Reaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reaction")
            .field("on_fulfilled", &self.on_fulfilled.is_some())
            .field("on_rejected", &self.on_rejected.is_some())
            .field("capability", &self.capability.is_some())
            .finish()
    }
}

/// The reaction list attached to a pending promise.
///
/// The first registration is stored inline; later ones spill to the heap.
type ReactionList = SmallVec<[Reaction; 1]>;

/// Internal state: one slot, overloaded. While pending it holds the reaction
/// list; once settled it holds the value or reason and the list is gone.
enum State {
    Pending { reactions: ReactionList },
    Fulfilled(Value),
    Rejected(Value),
}

/// A snapshot of a promise's externally visible state.
#[derive(Debug, Clone, PartialEq)]
pub enum PromiseState {
    /// Not yet settled.
    Pending,
    /// Settled with a value.
    Fulfilled(Value),
    /// Settled with a rejection reason.
    Rejected(Value),
}

/// A single-assignment container for an eventual value.
pub struct Promise {
    state: Mutex<State>,
    /// Set once a reaction has been registered; suppresses unhandled-rejection
    /// reporting.
    handled: AtomicBool,
    /// The first-resolving-function latch: set by the first public settling
    /// call, making every later one a no-op.
    resolving: AtomicBool,
}

impl Promise {
    /// Create a new pending promise with an empty reaction list.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State::Pending {
                reactions: ReactionList::new(),
            }),
            handled: AtomicBool::new(false),
            resolving: AtomicBool::new(false),
        })
    }

    /// Create an already fulfilled promise.
    pub fn fulfilled(value: Value) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State::Fulfilled(value)),
            handled: AtomicBool::new(false),
            resolving: AtomicBool::new(true),
        })
    }

    /// Create an already rejected promise.
    ///
    /// Bypasses the host, so no rejection-tracker notification is emitted;
    /// use [`Promise::reject`] on a fresh promise when tracking matters.
    pub fn rejected(reason: Value) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State::Rejected(reason)),
            handled: AtomicBool::new(false),
            resolving: AtomicBool::new(true),
        })
    }

    /// Snapshot the current state.
    pub fn state(&self) -> PromiseState {
        match &*self.state.lock() {
            State::Pending { .. } => PromiseState::Pending,
            State::Fulfilled(v) => PromiseState::Fulfilled(v.clone()),
            State::Rejected(r) => PromiseState::Rejected(r.clone()),
        }
    }

    /// True while no settlement has happened.
    pub fn is_pending(&self) -> bool {
        matches!(&*self.state.lock(), State::Pending { .. })
    }

    /// True once fulfilled.
    pub fn is_fulfilled(&self) -> bool {
        matches!(&*self.state.lock(), State::Fulfilled(_))
    }

    /// True once rejected.
    pub fn is_rejected(&self) -> bool {
        matches!(&*self.state.lock(), State::Rejected(_))
    }

    /// True once fulfilled or rejected.
    pub fn is_settled(&self) -> bool {
        !self.is_pending()
    }

    /// True once a reaction has been registered.
    pub fn is_handled(&self) -> bool {
        self.handled.load(Ordering::SeqCst)
    }

    /// The settled value or rejection reason, if settled.
    pub fn result(&self) -> Option<Value> {
        match &*self.state.lock() {
            State::Pending { .. } => None,
            State::Fulfilled(v) | State::Rejected(v) => Some(v.clone()),
        }
    }

    /// Fulfill with `value`, without thenable assimilation.
    ///
    /// No-op if a resolving function was already called; use
    /// [`Promise::try_fulfill`] to surface that as an error.
    pub fn fulfill(self: &Arc<Self>, value: Value, host: &dyn HostHooks) {
        let _ = self.try_fulfill(value, host);
    }

    /// Checked variant of [`Promise::fulfill`].
    pub fn try_fulfill(
        self: &Arc<Self>,
        value: Value,
        host: &dyn HostHooks,
    ) -> Result<(), PromiseError> {
        self.take_latch()?;
        self.fulfill_inner(value, host);
        Ok(())
    }

    /// Reject with `reason`.
    ///
    /// If no reaction is attached at this moment, the host's rejection
    /// tracker is notified. No-op if a resolving function was already called.
    pub fn reject(self: &Arc<Self>, reason: Value, host: &dyn HostHooks) {
        let _ = self.try_reject(reason, host);
    }

    /// Checked variant of [`Promise::reject`].
    pub fn try_reject(
        self: &Arc<Self>,
        reason: Value,
        host: &dyn HostHooks,
    ) -> Result<(), PromiseError> {
        self.take_latch()?;
        self.reject_inner(reason, host);
        Ok(())
    }

    /// Resolve with `value`, assimilating thenables.
    ///
    /// - Resolving a promise with itself rejects it with a TypeError.
    /// - Non-object values fulfill directly.
    /// - A native promise is spliced onto this one without an extra job hop.
    /// - A [`crate::thenable::Thenable`] whose `then` read throws rejects;
    ///   a non-callable `then` fulfills with the value as-is; otherwise a
    ///   thenable-resolution job is enqueued.
    ///
    /// No-op if a resolving function was already called.
    pub fn resolve(self: &Arc<Self>, value: Value, host: &dyn HostHooks) {
        let _ = self.try_resolve(value, host);
    }

    /// Checked variant of [`Promise::resolve`].
    pub fn try_resolve(
        self: &Arc<Self>,
        value: Value,
        host: &dyn HostHooks,
    ) -> Result<(), PromiseError> {
        self.take_latch()?;
        self.resolve_inner(value, host);
        Ok(())
    }

    /// Register fulfillment/rejection handlers and return the derived promise
    /// that settles with the handler's completion.
    ///
    /// The handler is never invoked synchronously: if the promise is already
    /// settled, a job is enqueued instead.
    pub fn then_with(
        self: &Arc<Self>,
        on_fulfilled: Option<Handler>,
        on_rejected: Option<Handler>,
        host: &dyn HostHooks,
    ) -> Arc<Promise> {
        let capability = Promise::new();
        self.register_reaction(
            Reaction::new(on_fulfilled, on_rejected, Some(capability.clone())),
            host,
        );
        capability
    }

    /// `catch` sugar: a rejection handler only.
    pub fn catch_with(self: &Arc<Self>, on_rejected: Handler, host: &dyn HostHooks) -> Arc<Promise> {
        self.then_with(None, Some(on_rejected), host)
    }

    /// `finally` sugar: run `callback` on either outcome, passing the
    /// settlement through unchanged.
    pub fn finally_with<F>(self: &Arc<Self>, callback: F, host: &dyn HostHooks) -> Arc<Promise>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let callback = Arc::new(callback);
        let on_fulfilled = {
            let callback = Arc::clone(&callback);
            Box::new(move |value: Value, _context: Value| {
                callback();
                Ok(value)
            }) as Handler
        };
        let on_rejected = Box::new(move |reason: Value, _context: Value| {
            callback();
            Err(reason)
        }) as Handler;
        self.then_with(Some(on_fulfilled), Some(on_rejected), host)
    }

    /// Register a raw reaction.
    ///
    /// While pending, the reaction is appended to the list; on a settled
    /// promise, the applicable job is enqueued immediately. Either way the
    /// promise is marked handled, retracting any pending unhandled report.
    pub fn register_reaction(self: &Arc<Self>, reaction: Reaction, host: &dyn HostHooks) {
        self.mark_handled(host);
        self.register_reaction_inner(reaction, host);
    }

    /// Consume the resolving latch, classifying a repeat call.
    fn take_latch(self: &Arc<Self>) -> Result<(), PromiseError> {
        if self.resolving.swap(true, Ordering::SeqCst) {
            if self.is_settled() {
                return Err(PromiseError::AlreadySettled);
            }
            return Err(PromiseError::AlreadyResolved);
        }
        Ok(())
    }

    fn mark_handled(self: &Arc<Self>, host: &dyn HostHooks) {
        if !self.handled.swap(true, Ordering::SeqCst)
            && matches!(&*self.state.lock(), State::Rejected(_))
        {
            host.promise_rejection_tracker(self, RejectionOperation::Handle);
        }
    }

    fn register_reaction_inner(self: &Arc<Self>, reaction: Reaction, host: &dyn HostHooks) {
        let job = {
            let mut state = self.state.lock();
            match &mut *state {
                State::Pending { reactions } => {
                    reactions.push(reaction);
                    None
                }
                State::Fulfilled(value) => Some(Job::Reaction(ReactionJob::new(
                    reaction,
                    ReactionKind::Fulfill,
                    value.clone(),
                ))),
                State::Rejected(reason) => Some(Job::Reaction(ReactionJob::new(
                    reaction,
                    ReactionKind::Reject,
                    reason.clone(),
                ))),
            }
        };
        if let Some(job) = job {
            host.enqueue_job(job);
        }
    }

    /// Pending → Fulfilled. The reaction list is swapped for the value under
    /// the state lock, then one job per queued reaction is enqueued.
    pub(crate) fn fulfill_inner(self: &Arc<Self>, value: Value, host: &dyn HostHooks) {
        let reactions = {
            let mut state = self.state.lock();
            match &mut *state {
                State::Pending { reactions } => {
                    let taken = std::mem::take(reactions);
                    *state = State::Fulfilled(value.clone());
                    taken
                }
                _ => return,
            }
        };
        for reaction in reactions {
            host.enqueue_job(Job::Reaction(ReactionJob::new(
                reaction,
                ReactionKind::Fulfill,
                value.clone(),
            )));
        }
    }

    /// Pending → Rejected, with unhandled-rejection notification.
    pub(crate) fn reject_inner(self: &Arc<Self>, reason: Value, host: &dyn HostHooks) {
        let reactions = {
            let mut state = self.state.lock();
            match &mut *state {
                State::Pending { reactions } => {
                    let taken = std::mem::take(reactions);
                    *state = State::Rejected(reason.clone());
                    taken
                }
                _ => return,
            }
        };
        if !self.handled.load(Ordering::SeqCst) {
            host.promise_rejection_tracker(self, RejectionOperation::Reject);
        }
        for reaction in reactions {
            host.enqueue_job(Job::Reaction(ReactionJob::new(
                reaction,
                ReactionKind::Reject,
                reason.clone(),
            )));
        }
    }

    /// The resolution algorithm, past the latch.
    pub(crate) fn resolve_inner(self: &Arc<Self>, value: Value, host: &dyn HostHooks) {
        match &value {
            Value::Promise(inner) => {
                if Arc::ptr_eq(inner, self) {
                    self.reject_inner(type_error("promise cannot resolve itself"), host);
                    return;
                }
                // Fast path for native promises: splice our fate directly
                // onto `inner`, skipping the thenable job hop.
                let inner = Arc::clone(inner);
                inner.register_reaction(Reaction::passthrough(Arc::clone(self)), host);
            }
            Value::Thenable(thenable) => {
                let thenable = Arc::clone(thenable);
                match thenable.then_callable() {
                    Err(thrown) => self.reject_inner(thrown, host),
                    Ok(false) => self.fulfill_inner(value, host),
                    Ok(true) => host.enqueue_job(Job::ResolveThenable(ResolveThenableJob::new(
                        thenable,
                        Arc::clone(self),
                    ))),
                }
            }
            _ => self.fulfill_inner(value, host),
        }
    }
}

impl std::fmt::Debug for Promise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &*self.state.lock() {
            State::Pending { reactions } => {
                write!(f, "Promise {{ <pending>, reactions: {} }}", reactions.len())
            }
            State::Fulfilled(v) => write!(f, "Promise {{ <fulfilled>: {v:?} }}"),
            State::Rejected(r) => write!(f, "Promise {{ <rejected>: {r:?} }}"),
        }
    }
}
