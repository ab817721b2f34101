use sovran_outcome::{Context, Error, ErrorType, OneOf2, Outcome, OutcomeError, State};
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
struct PaymentDeclined {
    code: u16,
}

impl fmt::Display for PaymentDeclined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "payment declined with code {}", self.code)
    }
}

impl std::error::Error for PaymentDeclined {}

type Receipt = Outcome<OneOf2<String, u32>>;

fn charge(ctx: &Arc<Context>, cents: u32) -> Receipt {
    ctx.try_invoke(|| {
        if cents > 10_000 {
            return Err(PaymentDeclined { code: 51 });
        }
        Ok(format!("receipt-{cents}"))
    })
}

fn split(ctx: &Arc<Context>, cents: u32, ways: u32) -> Receipt {
    // A zero divisor panics; the panic becomes an Exception outcome
    ctx.invoke(|| cents / ways)
}

fn main() -> Result<(), OutcomeError> {
    let ctx = Context::builder()
        .treat_exceptions_as_errors(true)
        .converter::<PaymentDeclined, _>(ErrorType::DEPENDENCY_FAILURE, |e| {
            Error::dependency_failure(e.to_string()).with_meta("code", e.code.to_string())
        })
        .handler(ErrorType::DEPENDENCY_FAILURE, |e| {
            println!("alerting billing: {e}");
        })
        .handler(ErrorType::EXCEPTION, |e| {
            println!("paging on-call: {}", e.message());
        })
        .build()
        .map(Arc::new)?;

    let mut outcomes = vec![
        charge(&ctx, 2_500),
        charge(&ctx, 25_000),
        split(&ctx, 900, 3),
        split(&ctx, 900, 0),
    ];

    for outcome in outcomes.iter_mut() {
        let label = outcome.match_with(
            |_| "ok",
            || "empty",
            |_| "declined",
            |_| "crashed",
        );
        println!("{label}: state {}", outcome.state());

        // Unhandled failures go to the handlers registered above
        outcome
            .matcher()
            .on::<String>(|receipt| println!("  issued {receipt}"))
            .on::<u32>(|share| println!("  each pays {share}"))
            .run();
    }

    let failed = outcomes.iter().filter(|o| o.state() != State::Result).count();
    println!("{failed} of {} checkouts need attention", outcomes.len());
    Ok(())
}
