use sovran_outcome::{
    Context, Error, ErrorType, OneOf1, OneOf2, Outcome, OutcomeError, State, PANIC_TYPE_NAME,
};
use std::fmt;
use std::sync::Arc;

fn ctx() -> Arc<Context> {
    Arc::new(Context::default())
}

fn divide(a: i32, b: i32) -> i32 {
    a / b
}

#[derive(Debug)]
struct GatewayDown(u16);

impl fmt::Display for GatewayDown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gateway returned {}", self.0)
    }
}

impl std::error::Error for GatewayDown {}

#[test]
fn test_divide_by_zero_reaches_exception_handler_once() {
    let mut outcome: Outcome<OneOf1<i32>> = ctx().invoke(|| divide(10, 0));
    assert_eq!(outcome.state(), State::Exception);

    let mut calls = 0;
    let mut values = 0;
    outcome
        .matcher()
        .on::<i32>(|_| values += 1)
        .exception(|e| {
            assert_eq!(e.type_name(), PANIC_TYPE_NAME);
            calls += 1;
        })
        .run();

    assert_eq!(calls, 1);
    assert_eq!(values, 0);
}

#[test]
fn test_converter_turns_failure_into_typed_error() -> Result<(), OutcomeError> {
    let ctx = Arc::new(
        Context::builder()
            .converter::<GatewayDown, _>(ErrorType::SERVICE_UNAVAILABLE, |e| {
                Error::service_unavailable(e.to_string()).with_meta("status", e.0.to_string())
            })
            .build()?,
    );

    let outcome: Outcome<OneOf2<String, u16>> = ctx.try_invoke(|| Err::<u16, _>(GatewayDown(503)));
    assert_eq!(outcome.state(), State::Error);

    let error = &outcome.errors()[0];
    assert_eq!(error.error_type(), &ErrorType::SERVICE_UNAVAILABLE);
    assert_eq!(error.metadata().get("status").map(String::as_str), Some("503"));
    Ok(())
}

#[test]
fn test_unconverted_failure_keeps_cause() {
    let outcome: Outcome<OneOf1<u16>> = ctx().try_invoke(|| Err::<u16, _>(GatewayDown(502)));
    assert_eq!(outcome.state(), State::Exception);

    let exception = outcome.exception().unwrap();
    assert_eq!(exception.downcast_ref::<GatewayDown>().map(|g| g.0), Some(502));
    assert_eq!(outcome.errors()[0].source(), exception.type_name());
}

#[test]
fn test_converter_for_panics() -> Result<(), OutcomeError> {
    let ctx = Context::builder().build().map(Arc::new)?;
    ctx.converters()
        .register_named(PANIC_TYPE_NAME, ErrorType::UNEXPECTED, |e| {
            Error::unexpected(e.message())
        })?;

    let outcome: Outcome<OneOf1<i32>> = ctx.invoke(|| divide(1, 0));
    assert_eq!(outcome.state(), State::Error);
    assert_eq!(outcome.errors()[0].error_type(), &ErrorType::UNEXPECTED);
    Ok(())
}

#[test]
fn test_action_without_value() {
    let mut count = 0;
    let outcome: Outcome<OneOf1<i32>> = ctx().invoke_action(|| count += 1);
    assert_eq!(outcome.state(), State::Empty);
    assert_eq!(count, 1);
}

#[test]
fn test_invoke_any_runtime_type() {
    let pick = |flag: bool| -> Box<dyn std::any::Any + Send + Sync> {
        if flag {
            Box::new("text".to_string())
        } else {
            Box::new(4u16)
        }
    };

    let text: Outcome<OneOf2<String, u16>> = ctx().invoke_any(|| pick(true));
    let number: Outcome<OneOf2<String, u16>> = ctx().invoke_any(|| pick(false));
    assert_eq!(text.try_get_value::<String>().map(String::as_str), Some("text"));
    assert_eq!(number.try_get_value::<u16>(), Some(&4));
}

#[tokio::test]
async fn test_async_value() {
    let ctx = ctx();
    let outcome: Outcome<OneOf1<u64>> = ctx
        .invoke_async(async {
            tokio::task::yield_now().await;
            42u64
        })
        .await;
    assert_eq!(outcome.try_get_value::<u64>(), Some(&42));
}

#[tokio::test]
async fn test_async_panic_is_captured() {
    let ctx = ctx();
    let outcome: Outcome<OneOf1<i32>> = ctx
        .invoke_async(async {
            tokio::task::yield_now().await;
            divide(5, std::hint::black_box(0))
        })
        .await;
    assert_eq!(outcome.state(), State::Exception);
    assert!(outcome.exception().unwrap().is_panic());
}

#[tokio::test]
async fn test_async_error_is_classified() {
    let ctx = ctx();
    let outcome: Outcome<OneOf1<i32>> = ctx
        .try_invoke_async(async { Err::<i32, _>(GatewayDown(504)) })
        .await;
    assert_eq!(outcome.state(), State::Exception);
    assert_eq!(outcome.errors()[0].message(), "gateway returned 504");
}
