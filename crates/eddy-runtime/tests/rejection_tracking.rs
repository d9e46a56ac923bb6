//! Unhandled-rejection reporting through the runtime checkpoint.

use eddy_runtime::{
    Promise, RejectionNotification, Runtime, RuntimeBuilder, Value, handler,
};
use parking_lot::Mutex;
use std::sync::Arc;

type NotificationLog = Arc<Mutex<Vec<(Arc<Promise>, RejectionNotification)>>>;

fn tracked_runtime() -> (Arc<Runtime>, NotificationLog) {
    let log: NotificationLog = Arc::new(Mutex::new(Vec::new()));
    let log_clone = log.clone();
    let runtime = RuntimeBuilder::new()
        .on_unhandled_rejection(move |promise, kind| {
            log_clone.lock().push((promise.clone(), kind));
        })
        .build();
    (runtime, log)
}

#[test]
fn test_unreported_rejection_notifies_exactly_once() {
    let (runtime, log) = tracked_runtime();
    let p = runtime.new_promise();

    runtime.reject(&p, Value::string("nobody catches this"));
    runtime.run_until_idle();
    runtime.run_until_idle();

    let log = log.lock();
    assert_eq!(log.len(), 1);
    assert!(Arc::ptr_eq(&log[0].0, &p));
    assert_eq!(log[0].1, RejectionNotification::Unhandled);
}

#[test]
fn test_handler_attached_before_checkpoint_suppresses_report() {
    let (runtime, log) = tracked_runtime();
    let p = runtime.new_promise();

    runtime.reject(&p, Value::undefined());
    runtime.catch(&p, handler(Ok));
    runtime.run_until_idle();

    assert!(log.lock().is_empty());
}

#[test]
fn test_handler_attached_after_report_emits_handled() {
    let (runtime, log) = tracked_runtime();
    let p = runtime.new_promise();

    runtime.reject(&p, Value::undefined());
    runtime.run_until_idle();

    runtime.catch(&p, handler(Ok));
    runtime.run_until_idle();

    let log = log.lock();
    assert_eq!(
        log.iter().map(|(_, kind)| *kind).collect::<Vec<_>>(),
        vec![
            RejectionNotification::Unhandled,
            RejectionNotification::Handled
        ]
    );
}

#[test]
fn test_handler_attached_before_rejection_never_reports() {
    let (runtime, log) = tracked_runtime();
    let p = runtime.new_promise();

    runtime.catch(&p, handler(Ok));
    runtime.reject(&p, Value::undefined());
    runtime.run_until_idle();

    assert!(log.lock().is_empty());
}

#[test]
fn test_rejection_in_mid_chain_is_reported_for_unwatched_tail() {
    let (runtime, log) = tracked_runtime();
    let p = runtime.new_promise();

    // The tail promise has no handler, so when the rejection reaches it the
    // tracker fires for the tail (the intermediate links are handled by the
    // chain itself).
    let tail = runtime.then(&p, Some(handler(Ok)), None);
    runtime.reject(&p, Value::string("boom"));
    runtime.run_until_idle();

    let log = log.lock();
    assert_eq!(log.len(), 1);
    assert!(Arc::ptr_eq(&log[0].0, &tail));
    assert_eq!(log[0].1, RejectionNotification::Unhandled);
}

#[test]
fn test_report_unhandled_returns_batch() {
    let runtime = Runtime::new();
    let p = runtime.new_promise();
    runtime.reject(&p, Value::undefined());
    runtime.drain_jobs();

    let reported = runtime.rejection_tracker().report_unhandled();
    assert_eq!(reported.len(), 1);
    assert!(Arc::ptr_eq(&reported[0], &p));
    assert!(!runtime.rejection_tracker().has_pending_reports());
}
