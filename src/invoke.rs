//! Running fallible code into an [`Outcome`].
//!
//! Returned errors and panics both end up recorded on the container, so
//! the caller never sees an unwinding call site.

use futures::FutureExt;
use std::any::Any;
use std::error::Error as StdError;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::context::Context;
use crate::dispatch::guarded;
use crate::errors::Error;
use crate::exception::Exception;
use crate::outcome::Outcome;
use crate::variants::{Member, Variants};

impl Context {
    /// Runs `f`, holding its return value or the panic it raised.
    ///
    /// ```
    /// use sovran_outcome::{Context, OneOf1, Outcome, State};
    ///
    /// let ctx = Context::global();
    /// let divisor = std::hint::black_box(0);
    ///
    /// let quotient: Outcome<OneOf1<i32>> = ctx.invoke(|| 10 / divisor);
    /// assert_eq!(quotient.state(), State::Exception);
    /// ```
    pub fn invoke<V, T, I>(self: &Arc<Self>, f: impl FnOnce() -> T) -> Outcome<V>
    where
        V: Member<T, I>,
    {
        match guarded(f) {
            Ok(value) => Outcome::from_value_in(self, value),
            Err(failure) => self.captured(failure.exception),
        }
    }

    /// Runs `f`; an `Err` is classified through the converter registry
    pub fn try_invoke<V, T, E, I>(self: &Arc<Self>, f: impl FnOnce() -> Result<T, E>) -> Outcome<V>
    where
        V: Member<T, I>,
        E: StdError + Send + Sync + 'static,
    {
        match guarded(f) {
            Ok(Ok(value)) => Outcome::from_value_in(self, value),
            Ok(Err(e)) => self.captured(Exception::new(e)),
            Err(failure) => self.captured(failure.exception),
        }
    }

    /// Runs an action with no return value. The outcome is empty unless
    /// the action panicked.
    pub fn invoke_action<V: Variants>(self: &Arc<Self>, f: impl FnOnce()) -> Outcome<V> {
        match guarded(f) {
            Ok(()) => Outcome::empty_in(self),
            Err(failure) => self.captured(failure.exception),
        }
    }

    /// Awaits `future`, holding its output or the panic it raised while polled
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_outcome::{Context, OneOf1, Outcome};
    ///
    /// # futures::executor::block_on(async {
    /// let ctx = Context::global();
    /// let outcome: Outcome<OneOf1<u8>> = ctx.invoke_async(async { 7u8 }).await;
    /// assert_eq!(outcome.try_get_value::<u8>(), Some(&7));
    /// # });
    /// ```
    pub async fn invoke_async<V, T, I, F>(self: &Arc<Self>, future: F) -> Outcome<V>
    where
        V: Member<T, I>,
        F: Future<Output = T>,
    {
        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(value) => Outcome::from_value_in(self, value),
            Err(payload) => self.captured(Exception::from_panic(payload.as_ref())),
        }
    }

    /// Like [`try_invoke`](Context::try_invoke) for a future
    pub async fn try_invoke_async<V, T, E, I, F>(self: &Arc<Self>, future: F) -> Outcome<V>
    where
        V: Member<T, I>,
        E: StdError + Send + Sync + 'static,
        F: Future<Output = Result<T, E>>,
    {
        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(Ok(value)) => Outcome::from_value_in(self, value),
            Ok(Err(e)) => self.captured(Exception::new(e)),
            Err(payload) => self.captured(Exception::from_panic(payload.as_ref())),
        }
    }

    /// Runs a function whose return type is only known at runtime.
    ///
    /// The value lands in the first declared slot of its type; `V` itself
    /// is accepted as is. Anything else is recorded as an
    /// invalid-operation error.
    pub fn invoke_any<V: Variants>(
        self: &Arc<Self>,
        f: impl FnOnce() -> Box<dyn Any + Send + Sync>,
    ) -> Outcome<V> {
        let boxed = match guarded(f) {
            Ok(boxed) => boxed,
            Err(failure) => return self.captured(failure.exception),
        };

        let boxed = match boxed.downcast::<V>() {
            Ok(variant) => return Outcome::from_variant_in(self, *variant),
            Err(boxed) => boxed,
        };

        match V::from_any(boxed) {
            Ok(variant) => Outcome::from_variant_in(self, variant),
            Err(_) => {
                let declared = V::type_names().join(", ");
                tracing::debug!(%declared, "invoked function returned an undeclared type");
                Outcome::from_error_in(
                    self,
                    Error::invalid_operation(format!(
                        "returned value is none of the declared types: {declared}"
                    ))
                    .with_source("invoke_any"),
                )
            }
        }
    }

    fn captured<V: Variants>(self: &Arc<Self>, exception: Exception) -> Outcome<V> {
        tracing::debug!(
            type_name = exception.type_name(),
            message = exception.message(),
            "captured failure in invoked code"
        );
        Outcome::from_captured_in(self, exception)
    }
}
