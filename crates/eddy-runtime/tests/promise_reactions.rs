//! Reaction ordering and deferral guarantees.
//!
//! Handlers must never run synchronously inside the call that registers them,
//! reactions fire in registration order, and chains propagate values and
//! thrown reasons across drains.

use eddy_runtime::{Runtime, Value, handler};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[test]
fn test_resolve_plain_value_fulfills_after_one_drain() {
    let runtime = Runtime::new();
    let p = runtime.new_promise();

    runtime.resolve(&p, Value::number(42.0));
    let seen = Arc::new(Mutex::new(None));
    let seen_clone = seen.clone();
    runtime.then(
        &p,
        Some(handler(move |v| {
            *seen_clone.lock() = Some(v);
            Ok(Value::undefined())
        })),
        None,
    );

    runtime.run_until_idle();
    assert_eq!(*seen.lock(), Some(Value::number(42.0)));
}

#[test]
fn test_reactions_fire_in_registration_order() {
    let runtime = Runtime::new();
    let p = runtime.new_promise();
    let log = Arc::new(Mutex::new(Vec::new()));

    for tag in ["first", "second", "third"] {
        let log = log.clone();
        runtime.then(
            &p,
            Some(handler(move |_| {
                log.lock().push(tag);
                Ok(Value::undefined())
            })),
            None,
        );
    }

    runtime.fulfill(&p, Value::undefined());
    runtime.run_until_idle();
    assert_eq!(*log.lock(), vec!["first", "second", "third"]);
}

#[test]
fn test_handlers_never_run_synchronously() {
    let runtime = Runtime::new();

    // Already-settled promise: registration must still defer.
    let p = runtime.resolved(Value::number(1.0));
    let ran = Arc::new(AtomicBool::new(false));
    let ran_clone = ran.clone();
    runtime.then(
        &p,
        Some(handler(move |_| {
            ran_clone.store(true, Ordering::SeqCst);
            Ok(Value::undefined())
        })),
        None,
    );
    assert!(!ran.load(Ordering::SeqCst), "handler ran inside then()");

    runtime.run_until_idle();
    assert!(ran.load(Ordering::SeqCst));
}

#[test]
fn test_settle_then_register_end_to_end() {
    // p = create(); enqueue fulfill(p, 10); drain; then(v => v * 2); drain.
    let runtime = Runtime::new();
    let p = runtime.new_promise();

    {
        let runtime_inner = runtime.clone();
        let p_inner = p.clone();
        runtime.enqueue_microtask(move || {
            runtime_inner.fulfill(&p_inner, Value::number(10.0));
        });
    }
    runtime.run_until_idle();
    assert!(p.is_fulfilled());

    let result = Arc::new(Mutex::new(None));
    let result_clone = result.clone();
    runtime.then(
        &p,
        Some(handler(move |v| {
            let doubled = v.as_number().unwrap() * 2.0;
            *result_clone.lock() = Some(doubled);
            Ok(Value::number(doubled))
        })),
        None,
    );

    runtime.run_until_idle();
    assert_eq!(*result.lock(), Some(20.0));
}

#[test]
fn test_chain_with_throw_and_recovery() {
    // Fulfilled with 5, then: +1, throw, catch-identity => fulfilled with 6.
    let runtime = Runtime::new();
    let p = runtime.resolved(Value::number(5.0));

    let step1 = runtime.then(
        &p,
        Some(handler(|v| Ok(Value::number(v.as_number().unwrap() + 1.0)))),
        None,
    );
    let step2 = runtime.then(&step1, Some(handler(Err)), None);
    let step3 = runtime.then(&step2, None, Some(handler(Ok)));

    runtime.run_until_idle();
    assert!(step3.is_fulfilled());
    assert_eq!(step3.result(), Some(Value::number(6.0)));
}

#[test]
fn test_passthrough_defaults_compose() {
    // A handler-less link in the chain forwards both outcomes unchanged.
    let runtime = Runtime::new();
    let p = runtime.new_promise();

    let gap = runtime.then(&p, None, None);
    let tail = runtime.then(&gap, Some(handler(Ok)), Some(handler(Ok)));

    runtime.reject(&p, Value::string("carried through"));
    runtime.run_until_idle();
    assert_eq!(tail.result(), Some(Value::string("carried through")));
    assert!(tail.is_fulfilled(), "catch handler recovers the chain");
}

#[test]
fn test_jobs_enqueued_mid_drain_run_after_earlier_jobs() {
    let runtime = Runtime::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let p = runtime.resolved(Value::undefined());
    {
        let log = log.clone();
        let runtime_inner = runtime.clone();
        let log_inner = log.clone();
        runtime.then(
            &p,
            Some(handler(move |_| {
                log.lock().push("a");
                runtime_inner.enqueue_microtask(move || log_inner.lock().push("nested"));
                Ok(Value::undefined())
            })),
            None,
        );
    }
    {
        let log = log.clone();
        runtime.then(
            &p,
            Some(handler(move |_| {
                log.lock().push("b");
                Ok(Value::undefined())
            })),
            None,
        );
    }

    runtime.run_until_idle();
    assert_eq!(*log.lock(), vec!["a", "b", "nested"]);
}
