//! Unhandled-rejection tracking.
//!
//! Shaped after HTML's `HostPromiseRejectionTracker` implementation, built on
//! two per-runtime structures:
//! - the **about-to-be-notified** list: promises rejected without a handler,
//!   waiting for the next checkpoint, and
//! - the **outstanding** set: promises already reported as unhandled, for
//!   which a later handler attachment emits a `Handled` notification.
//!
//! Attaching a handler *before* the checkpoint retracts the pending report
//! silently; attaching one *after* a report emits [`RejectionNotification::Handled`].

use eddy_core::Promise;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// What a rejection-tracker notification means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionNotification {
    /// The promise was still unhandled at a checkpoint.
    Unhandled,
    /// A previously reported promise became handled.
    Handled,
}

/// Callback receiving rejection notifications.
pub type RejectionCallback = Box<dyn Fn(&Arc<Promise>, RejectionNotification) + Send + Sync>;

/// Per-runtime rejection-tracking state machine.
#[derive(Default)]
pub struct RejectionTracker {
    about_to_be_notified: Mutex<Vec<Arc<Promise>>>,
    outstanding: Mutex<Vec<Weak<Promise>>>,
    callback: Mutex<Option<RejectionCallback>>,
}

impl RejectionTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the notification callback. Without one, notifications go to
    /// the `tracing` log.
    pub fn set_callback(&self, callback: RejectionCallback) {
        *self.callback.lock() = Some(callback);
    }

    /// A promise was rejected with no handler attached.
    pub fn on_reject(&self, promise: &Arc<Promise>) {
        tracing::trace!(promise = ?promise, "rejected without handler");
        self.about_to_be_notified.lock().push(Arc::clone(promise));
    }

    /// A handler was attached to a previously unhandled rejected promise.
    pub fn on_handle(&self, promise: &Arc<Promise>) {
        let mut pending = self.about_to_be_notified.lock();
        if let Some(idx) = pending.iter().position(|p| Arc::ptr_eq(p, promise)) {
            // Not yet reported; retract silently.
            pending.remove(idx);
            return;
        }
        drop(pending);

        let mut outstanding = self.outstanding.lock();
        if let Some(idx) = outstanding
            .iter()
            .position(|w| w.upgrade().is_some_and(|p| Arc::ptr_eq(&p, promise)))
        {
            outstanding.remove(idx);
            drop(outstanding);
            self.emit(promise, RejectionNotification::Handled);
        }
    }

    /// Checkpoint: report every promise still unhandled, moving it to the
    /// outstanding set. Returns the promises reported this time.
    pub fn report_unhandled(&self) -> Vec<Arc<Promise>> {
        let batch = std::mem::take(&mut *self.about_to_be_notified.lock());
        let mut reported = Vec::new();
        for promise in batch {
            if promise.is_handled() {
                continue;
            }
            self.emit(&promise, RejectionNotification::Unhandled);
            self.outstanding.lock().push(Arc::downgrade(&promise));
            reported.push(promise);
        }
        // Drop entries whose promise is gone.
        self.outstanding.lock().retain(|w| w.strong_count() > 0);
        reported
    }

    /// True if any rejection is waiting for the next checkpoint.
    pub fn has_pending_reports(&self) -> bool {
        !self.about_to_be_notified.lock().is_empty()
    }

    fn emit(&self, promise: &Arc<Promise>, notification: RejectionNotification) {
        let callback = self.callback.lock();
        match (&*callback, notification) {
            (Some(cb), _) => cb(promise, notification),
            (None, RejectionNotification::Unhandled) => {
                tracing::warn!(promise = ?promise, "unhandled promise rejection");
            }
            (None, RejectionNotification::Handled) => {
                tracing::debug!(promise = ?promise, "rejection handled late");
            }
        }
    }
}
