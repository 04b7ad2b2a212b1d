use super::*;
use crate::runtime::RuntimeError;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

type Fut = Future<i32, String>;

fn reason(s: &str) -> String {
    s.to_string()
}

fn simple_future(rt: &Runtime, x: i32) -> Fut {
    rt.future(|r| {
        if x > 0 {
            r.settle(x);
        } else {
            r.fail(reason("Must be a positive number."));
        }
        Ok(())
    })
}

#[test]
fn test_new_future_settles_with_value() {
    let rt = Runtime::new();
    let future: Fut = rt.future(|r| {
        r.settle(2);
        Ok(())
    });
    assert_eq!(rt.block_on(&future).unwrap(), Ok(2));
}

#[test]
fn test_fulfilled_future_never_rejects() {
    let rt = Runtime::new();
    let future = simple_future(&rt, 3);
    assert!(future.is_fulfilled());
    assert_eq!(future.state(), State::Fulfilled(3));
}

#[test]
fn test_rejected_future_never_fulfills() {
    let rt = Runtime::new();
    let future = simple_future(&rt, -3);
    assert_eq!(
        future.state(),
        State::Rejected(reason("Must be a positive number."))
    );
}

#[test]
fn test_only_first_settle_is_used() {
    let rt = Runtime::new();
    let future: Fut = rt.future(|r| {
        r.settle(2);
        r.settle(3);
        r.settle(4);
        Ok(())
    });
    rt.run().unwrap();
    assert_eq!(future.state(), State::Fulfilled(2));
}

#[test]
fn test_only_first_fail_is_used() {
    let rt = Runtime::new();
    let future: Fut = rt.future(|r| {
        r.fail(reason("First reason"));
        r.fail(reason("Second reason"));
        r.settle(1);
        Ok(())
    });
    assert_eq!(future.state(), State::Rejected(reason("First reason")));
}

#[test]
fn test_initializer_error_rejects() {
    let rt = Runtime::new();
    let future: Fut = rt.future(|_r| Err(reason("nonExistingFunction is not defined")));
    assert_eq!(
        future.state(),
        State::Rejected(reason("nonExistingFunction is not defined"))
    );
}

#[test]
fn test_initializer_error_after_settle_is_ignored() {
    let rt = Runtime::new();
    let future: Fut = rt.future(|r| {
        r.settle(7);
        Err(reason("too late"))
    });
    assert_eq!(future.state(), State::Fulfilled(7));
}

#[test]
fn test_settle_with_future_adopts_its_value() {
    let rt = Runtime::new();
    let inner: Fut = rt.resolved(5);
    let outer: Fut = rt.future(|r| {
        r.adopt(inner.clone());
        Ok(())
    });
    // Adoption is itself deferred
    assert!(outer.is_pending());
    rt.run().unwrap();
    assert_eq!(outer.state(), State::Fulfilled(5));
}

#[test]
fn test_adoption_is_recursive() {
    let rt = Runtime::new();
    let delayed: Fut = rt.delay(50, 9);
    let middle: Fut = rt.future(|r| {
        r.resolve(delayed.clone());
        Ok(())
    });
    let outer: Fut = rt.future(|r| {
        r.resolve(middle.clone());
        Ok(())
    });
    assert_eq!(rt.block_on(&outer).unwrap(), Ok(9));
    assert_eq!(rt.now_ms(), 50);
}

#[test]
fn test_adopting_locks_out_later_settlement() {
    let rt = Runtime::new();
    let (inner, inner_resolver) = rt.pending::<i32, String>();
    let outer: Fut = rt.future(|r| {
        r.adopt(inner.clone());
        r.settle(1);
        Ok(())
    });
    inner_resolver.fail(reason("inner failed"));
    rt.run().unwrap();
    assert_eq!(outer.state(), State::Rejected(reason("inner failed")));
}

#[test]
fn test_fail_with_future_does_not_flatten() {
    let rt = Runtime::new();
    let inner: Fut = rt.rejected(reason("Some reason"));
    let outer: Future<i32, Fut> = rt.rejected(inner.clone());
    rt.run().unwrap();
    match outer.state() {
        State::Rejected(r) => assert!(r.ptr_eq(&inner)),
        other => panic!("expected rejection, got {}", other.label()),
    }
}

#[test]
fn test_adopting_itself_stays_pending() {
    let rt = Runtime::new();
    let (future, resolver) = rt.pending::<i32, String>();
    resolver.adopt(future.clone());
    rt.run().unwrap();
    assert!(future.is_pending());
    assert_eq!(
        rt.block_on(&future),
        Err(RuntimeError::Stalled {
            future: future.id()
        })
    );
}

#[test]
fn test_handlers_never_run_synchronously() {
    let rt = Runtime::new();
    let ran = Rc::new(Cell::new(false));
    let flag = ran.clone();
    let parent: Fut = rt.resolved(1);
    let derived = parent.then(move |v| {
        flag.set(true);
        Outcome::Fulfill(v)
    });
    assert!(!ran.get());
    assert!(derived.is_pending());

    // One tick later the handler has run
    assert_eq!(rt.run_pending(), 1);
    assert!(ran.get());
    assert_eq!(derived.state(), State::Fulfilled(1));
}

#[test]
fn test_then_creates_a_new_future() {
    let rt = Runtime::new();
    let parent: Fut = rt.resolved(2);
    let derived = parent.then(|v| {
        assert_eq!(v, 2);
        Outcome::Fulfill(5)
    });
    assert!(!derived.ptr_eq(&parent));
    assert_eq!(rt.block_on(&derived).unwrap(), Ok(5));
    assert_eq!(parent.state(), State::Fulfilled(2));
}

#[test]
fn test_rejection_handler_returns_fulfilled_future() {
    let rt = Runtime::new();
    let derived = simple_future(&rt, -3).then_both(
        |_| Outcome::Reject(reason("should not get here")),
        |r| {
            assert_eq!(r, "Must be a positive number.");
            Outcome::Fulfill(42)
        },
    );
    assert_eq!(rt.block_on(&derived).unwrap(), Ok(42));
}

#[test]
fn test_default_rejection_handler_propagates() {
    let rt = Runtime::new();
    let chained = simple_future(&rt, -3)
        .then(|_| Outcome::Fulfill(1))
        .then(|_| Outcome::Fulfill(2))
        .then(|_| Outcome::Fulfill(3))
        .map(|_| 4);
    assert_eq!(
        rt.block_on(&chained).unwrap(),
        Err(reason("Must be a positive number."))
    );
}

#[test]
fn test_default_fulfillment_handler_passes_value() {
    let rt = Runtime::new();
    let recovered = simple_future(&rt, 3).catch(|_| Outcome::Reject(reason("unreachable")));
    assert_eq!(rt.block_on(&recovered).unwrap(), Ok(3));
}

#[test]
fn test_handler_error_skips_sibling_rejection_handler() {
    let rt = Runtime::new();
    let sibling_ran = Rc::new(Cell::new(false));
    let flag = sibling_ran.clone();
    let derived: Fut = rt.resolved::<i32, String>(2).then_both(
        |_| Outcome::Reject(reason("thrown in handler")),
        move |r| {
            flag.set(true);
            Outcome::Reject(r)
        },
    );
    assert_eq!(
        rt.block_on(&derived).unwrap(),
        Err(reason("thrown in handler"))
    );
    assert!(!sibling_ran.get());
}

#[test]
fn test_caught_error_is_not_seen_downstream() {
    let rt = Runtime::new();
    let downstream_catch = Rc::new(Cell::new(false));
    let flag = downstream_catch.clone();
    let rt2 = rt.clone();
    let chained: Fut = rt
        .resolved::<i32, String>(2)
        .then(|v| Outcome::Fulfill(v))
        .then(move |_| Outcome::Adopt(rt2.rejected::<i32, String>(reason("An error"))))
        .catch(|_| Outcome::Fulfill(42))
        .then(|v| Outcome::Fulfill(v))
        .catch(move |r| {
            flag.set(true);
            Outcome::Reject(r)
        });
    assert_eq!(rt.block_on(&chained).unwrap(), Ok(42));
    assert!(!downstream_catch.get());
}

#[test]
fn test_settled_future_is_externally_immutable() {
    let rt = Runtime::new();
    let parent = simple_future(&rt, 3);
    let a = parent.then(|v| Outcome::Fulfill(v));
    let b = parent.then(|v| Outcome::Fulfill(v));
    let both = rt.all([a, b]);
    assert_eq!(rt.block_on(&both).unwrap(), Ok(vec![3, 3]));
    assert_eq!(parent.state(), State::Fulfilled(3));
}

#[test]
fn test_observing_twice_yields_same_reason() {
    let rt = Runtime::new();
    let parent: Fut = rt.rejected(reason("x"));
    let first = parent.catch(|r| Outcome::Reject(r + "!"));
    let second = parent.catch(|r| Outcome::Reject(r + "!"));
    rt.run().unwrap();
    assert_eq!(first.state(), second.state());
    assert_eq!(first.state(), State::Rejected(reason("x!")));
}

#[test]
fn test_resolve_returns_same_future() {
    let rt = Runtime::new();
    let first: Fut = rt.resolved(2);
    let second = rt.resolve(first.clone());
    assert!(second.ptr_eq(&first));

    let plain: Fut = rt.resolve(Resolution::Value(3));
    assert_eq!(plain.state(), State::Fulfilled(3));
}

#[test]
fn test_rejected_with_future_is_a_new_future() {
    let rt = Runtime::new();
    let first: Fut = rt.rejected(reason("Some reason"));
    let second: Future<i32, Fut> = rt.rejected(first.clone());
    assert_ne!(second.id(), first.id());
}

#[test]
fn test_reactions_run_in_registration_order() {
    let rt = Runtime::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let a: Fut = rt.resolved(1);
    let b: Fut = rt.resolved(2);
    for (name, future) in [("a1", &a), ("b1", &b), ("a2", &a)] {
        let log = log.clone();
        future.then(move |v| {
            log.borrow_mut().push(name);
            Outcome::Fulfill(v)
        });
    }
    rt.run().unwrap();
    assert_eq!(*log.borrow(), vec!["a1", "b1", "a2"]);
}

#[test]
fn test_unhandled_rejection_is_reported() {
    let rt = Runtime::new();
    let ignored: Fut = rt.rejected(reason("nobody listens"));
    let handled: Fut = rt.rejected(reason("caught"));
    let _recovered = handled.catch(|_| Outcome::Fulfill(0));
    rt.run().unwrap();
    assert_eq!(rt.unhandled_rejections(), vec![ignored.id()]);
}

#[test]
fn test_late_handler_clears_unhandled_rejection() {
    let rt = Runtime::new();
    let future: Fut = rt.rejected(reason("late"));
    rt.run().unwrap();
    assert_eq!(rt.unhandled_rejections(), vec![future.id()]);

    let _ = future.catch(|_| Outcome::Fulfill(1));
    assert!(rt.unhandled_rejections().is_empty());
}

#[test]
fn test_block_on_pending_forever_stalls() {
    let rt = Runtime::new();
    let (future, _resolver) = rt.pending::<i32, String>();
    assert_eq!(
        rt.block_on(&future),
        Err(RuntimeError::Stalled {
            future: future.id()
        })
    );
}

#[test]
fn test_future_id_display() {
    let rt = Runtime::new();
    let future: Fut = rt.resolved(1);
    assert_eq!(format!("{}", future.id()), format!("Future({})", future.id().as_u64()));
    assert_eq!(format!("{:?}", future), format!("{} <fulfilled>", future.id()));
}

#[derive(Debug, Clone)]
enum Call {
    Settle(i32),
    Fail(String),
}

fn call_strategy() -> impl Strategy<Value = Call> {
    prop_oneof![
        any::<i32>().prop_map(Call::Settle),
        "[a-z]{1,8}".prop_map(Call::Fail),
    ]
}

proptest! {
    #[test]
    fn prop_first_settlement_wins(calls in prop::collection::vec(call_strategy(), 1..8)) {
        let rt = Runtime::new();
        let script = calls.clone();
        let future: Fut = rt.future(move |r| {
            for call in script {
                match call {
                    Call::Settle(v) => r.settle(v),
                    Call::Fail(e) => r.fail(e),
                }
            }
            Ok(())
        });
        rt.run().unwrap();
        let expected = match &calls[0] {
            Call::Settle(v) => State::Fulfilled(*v),
            Call::Fail(e) => State::Rejected(e.clone()),
        };
        prop_assert_eq!(future.state(), expected);
    }

    #[test]
    fn prop_resolved_then_applies_handler(v in -1000i32..1000, k in -1000i32..1000) {
        let rt = Runtime::new();
        let derived = rt.resolved::<i32, String>(v).map(move |x| x + k);
        prop_assert!(derived.is_pending());
        prop_assert_eq!(rt.run_pending(), 1);
        prop_assert_eq!(derived.state(), State::Fulfilled(v + k));
    }
}
