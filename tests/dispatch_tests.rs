use serde::Deserialize;
use sovran_outcome::{
    Context, Error, ErrorType, Exception, Handler, OneOf1, OneOf2, OneOf3, Outcome, OutcomeError,
    State, Value,
};
use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn ctx() -> Arc<Context> {
    Arc::new(Context::default())
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Order {
    id: u64,
    total: f64,
}

impl Value for Order {}

#[test]
fn test_each_state_reaches_its_branch() {
    let hits = RefCell::new(Vec::new());

    let mut cases: Vec<Outcome<OneOf1<i32>>> = vec![
        Outcome::from_value_in(&ctx(), 1i32),
        Outcome::empty_in(&ctx()),
        Outcome::from_error_in(&ctx(), Error::validation("bad")),
        Outcome::from_captured_in(&ctx(), Exception::detached("panic", "boom")),
    ];

    for outcome in cases.iter_mut() {
        outcome
            .matcher()
            .on::<i32>(|_| hits.borrow_mut().push("value"))
            .no_result(|| hits.borrow_mut().push("empty"))
            .errors(|_| hits.borrow_mut().push("errors"))
            .exception(|_| hits.borrow_mut().push("exception"))
            .run();
    }

    assert_eq!(hits.into_inner(), vec!["value", "empty", "errors", "exception"]);
}

#[test]
fn test_unhandled_exception_routes_to_registry() -> Result<(), OutcomeError> {
    let routed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&routed);
    let ctx = Arc::new(
        Context::builder()
            .handler(ErrorType::EXCEPTION, move |e| {
                if let Ok(mut seen) = sink.lock() {
                    seen.push(e.message().to_string());
                }
            })
            .build()?,
    );

    let mut outcome: Outcome<OneOf1<i32>> = ctx.invoke(|| -> i32 { panic!("lost") });
    outcome.matcher().on::<i32>(|_| {}).run();

    assert_eq!(*routed.lock().unwrap(), vec!["lost".to_string()]);
    Ok(())
}

#[test]
fn test_handle_chain_runs_matching_step_only() {
    let mut outcome = Outcome::<OneOf3<String, i32, bool>>::from_value_in(&ctx(), true);
    let mut log = Vec::new();

    outcome
        .try_handle::<String>(|_| log.push("string"))
        .try_handle::<i32>(|_| log.push("int"));
    outcome.try_handle::<bool>(|b| log.push(if *b { "yes" } else { "no" }));

    assert_eq!(log, vec!["yes"]);
}

#[test]
fn test_handle_skips_failed_outcome() {
    let mut outcome = Outcome::<OneOf1<i32>>::from_value_in(&ctx(), 3i32);
    outcome.add_error(Error::timeout("late"));

    let mut ran = false;
    outcome.try_handle::<i32>(|_| ran = true);
    assert!(!ran);
}

#[test]
fn test_failing_handler_policy() -> Result<(), OutcomeError> {
    let ctx = Arc::new(Context::builder().treat_exceptions_as_errors(true).build()?);
    let mut outcome = Outcome::<OneOf2<String, i32>>::from_value_in(&ctx, 7i32);

    outcome.try_handle::<i32>(|n| {
        let limit = std::hint::black_box(0);
        let _ = n / limit;
    });

    assert_eq!(outcome.state(), State::Error);
    assert_eq!(outcome.errors()[0].error_type(), &ErrorType::GENERIC);
    assert_eq!(outcome.errors()[0].source(), "panic");
    Ok(())
}

#[test]
fn test_registry_handlers_see_only_their_type() -> Result<(), OutcomeError> {
    let timeouts = Arc::new(AtomicUsize::new(0));
    let validations = Arc::new(AtomicUsize::new(0));
    let (t, v) = (Arc::clone(&timeouts), Arc::clone(&validations));

    let ctx = Arc::new(
        Context::builder()
            .handler(ErrorType::TIMEOUT, move |_| {
                t.fetch_add(1, Ordering::SeqCst);
            })
            .handler(ErrorType::VALIDATION, move |_| {
                v.fetch_add(1, Ordering::SeqCst);
            })
            .build()?,
    );

    let mut outcome = Outcome::<OneOf1<i32>>::from_errors_in(
        &ctx,
        [
            Error::timeout("a"),
            Error::timeout("b"),
            Error::not_found("c"),
            Error::validation("d"),
        ],
    );
    outcome.matcher().run();

    assert_eq!(timeouts.load(Ordering::SeqCst), 2);
    assert_eq!(validations.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn test_every_error_routed_past_failing_handler() -> Result<(), OutcomeError> {
    let timeouts = Arc::new(AtomicUsize::new(0));
    let t = Arc::clone(&timeouts);

    let ctx = Arc::new(
        Context::builder()
            .handler(ErrorType::VALIDATION, |_| panic!("rejected twice"))
            .handler(ErrorType::TIMEOUT, move |_| {
                t.fetch_add(1, Ordering::SeqCst);
            })
            .build()?,
    );

    let mut outcome = Outcome::<OneOf1<i32>>::from_errors_in(
        &ctx,
        [
            Error::validation("a"),
            Error::validation("b"),
            Error::timeout("c"),
        ],
    );
    outcome.matcher().run();

    assert_eq!(timeouts.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.errors().len(), 3);
    Ok(())
}

#[test]
fn test_map_to_common_type() {
    let describe = |outcome: &mut Outcome<OneOf3<String, i32, bool>>| {
        outcome
            .try_map(|s: &String| format!("text {s}"))
            .try_map(|n: &i32| format!("number {n}"))
            .try_map(|b: &bool| format!("flag {b}"))
            .take_matched_as::<String>()
    };

    type Mixed = Outcome<OneOf3<String, i32, bool>>;
    let mut text = Mixed::from_value_in(&ctx(), "hi".to_string());
    let mut flag = Mixed::from_value_in(&ctx(), false);
    let mut empty = Mixed::empty_in(&ctx());

    assert_eq!(describe(&mut text).as_deref(), Some("text hi"));
    assert_eq!(describe(&mut flag).as_deref(), Some("flag false"));
    assert_eq!(describe(&mut empty), None);
}

#[test]
fn test_mailbox_reset_by_take() {
    let mut outcome = Outcome::<OneOf1<i32>>::from_value_in(&ctx(), 2i32);

    outcome.try_map(|n: &i32| n * 10);
    assert!(outcome.has_matched_item());
    assert_eq!(outcome.take_matched_as::<i32>(), Some(20));

    outcome.try_map(|n: &i32| n * 100);
    let boxed = outcome.take_matched().unwrap();
    assert_eq!(boxed.downcast_ref::<i32>(), Some(&200));
}

#[test]
fn test_handle_any_deserializes_json() {
    let payload = serde_json::json!({ "id": 12, "total": 9.5 });
    let mut outcome = Outcome::<OneOf2<serde_json::Value, Order>>::from_value_in(&ctx(), payload);

    let seen = RefCell::new(None);
    outcome.try_handle_any([Handler::new(|order: Order| {
        *seen.borrow_mut() = Some(order);
    })]);

    assert_eq!(seen.into_inner(), Some(Order { id: 12, total: 9.5 }));
}

#[test]
fn test_handle_any_without_match_is_noop() {
    let mut outcome = Outcome::<OneOf2<String, i32>>::from_value_in(&ctx(), 1i32);
    let mut ran = false;
    outcome.try_handle_any([Handler::new(|_: u64| ran = true)]);
    assert!(!ran);
    assert_eq!(outcome.state(), State::Result);
}
