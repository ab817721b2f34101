//! Consuming an [`Outcome`]: typed handlers, the matched-item mailbox, and
//! untyped multi-handler dispatch.
//!
//! Every handler supplied here runs behind `catch_unwind`. A panicking
//! handler goes to the catch handler when one is given; otherwise it is
//! logged, recorded as an error when `treat_exceptions_as_errors` is on,
//! and re-raised when `throw_exceptions_from_user_handling_code` is on.

use serde::de::DeserializeOwned;
use std::any::{Any, TypeId};
use std::panic::{self, AssertUnwindSafe};

use crate::any_value::AnyValue;
use crate::errors::Error;
use crate::exception::Exception;
use crate::outcome::Outcome;
use crate::state::State;
use crate::variants::Variants;

/// A panic caught while running user code
pub(crate) struct Failure {
    pub(crate) exception: Exception,
    payload: Box<dyn Any + Send>,
}

pub(crate) fn guarded<R>(f: impl FnOnce() -> R) -> Result<R, Failure> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| Failure {
        exception: Exception::from_panic(payload.as_ref()),
        payload,
    })
}

type Typed<'a> = (TypeId, Box<dyn FnOnce(&dyn Any) + 'a>);

/// Builder for matching on an outcome's state.
///
/// Created by [`Outcome::matcher`]. Exactly one branch runs:
///
/// - `Result`: the visitor from [`on_value`](Matcher::on_value) if set,
///   else the first [`on`](Matcher::on) handler registered for the held type
/// - `Empty`: [`no_result`](Matcher::no_result)
/// - `Error`: [`errors`](Matcher::errors), else every error goes to the
///   context's handler registry
/// - `Exception`: [`exception`](Matcher::exception), else the error is
///   logged and routed to the registry
///
/// ```
/// use sovran_outcome::{OneOf2, Outcome};
///
/// let mut outcome: Outcome<OneOf2<String, i32>> = Outcome::from_value(5i32);
/// let mut seen = None;
///
/// outcome
///     .matcher()
///     .on::<String>(|_| panic!("not a string"))
///     .on::<i32>(|n| seen = Some(*n))
///     .no_result(|| panic!("has a result"))
///     .run();
///
/// assert_eq!(seen, Some(5));
/// ```
pub struct Matcher<'a, V: Variants> {
    outcome: &'a mut Outcome<V>,
    visitor: Option<Box<dyn FnOnce(&V) + 'a>>,
    typed: Vec<Typed<'a>>,
    on_no_result: Option<Box<dyn FnOnce() + 'a>>,
    on_errors: Option<Box<dyn FnOnce(&[Error]) + 'a>>,
    on_exception: Option<Box<dyn FnOnce(&Exception) + 'a>>,
}

impl<'a, V: Variants> Matcher<'a, V> {
    /// Handles the held variant with a `match` over `V`
    pub fn on_value(mut self, visitor: impl FnOnce(&V) + 'a) -> Self {
        self.visitor = Some(Box::new(visitor));
        self
    }

    /// Handles the held value when it is a `T`
    pub fn on<T: 'static>(mut self, handler: impl FnOnce(&T) + 'a) -> Self {
        self.typed.push((
            TypeId::of::<T>(),
            Box::new(move |held: &dyn Any| {
                if let Some(value) = held.downcast_ref::<T>() {
                    handler(value);
                }
            }),
        ));
        self
    }

    /// Runs when the container holds neither a value nor errors
    pub fn no_result(mut self, handler: impl FnOnce() + 'a) -> Self {
        self.on_no_result = Some(Box::new(handler));
        self
    }

    /// Receives the whole error list in `State::Error`
    ///
    /// Without it, each error is routed to the context's handler registry.
    pub fn errors(mut self, handler: impl FnOnce(&[Error]) + 'a) -> Self {
        self.on_errors = Some(Box::new(handler));
        self
    }

    /// Receives the captured failure in `State::Exception`
    pub fn exception(mut self, handler: impl FnOnce(&Exception) + 'a) -> Self {
        self.on_exception = Some(Box::new(handler));
        self
    }

    /// Runs the branch for the current state
    ///
    /// A panicking branch is handled by the context's failure policy and can
    /// leave an extra error on the container.
    pub fn run(self) {
        let Matcher {
            outcome,
            visitor,
            typed,
            on_no_result,
            on_errors,
            on_exception,
        } = self;

        let failure = match outcome.state {
            State::Result => match outcome.value.as_ref() {
                Some(value) => dispatch_value(value, visitor, typed),
                None => None,
            },
            State::Empty => on_no_result.and_then(|handler| guarded(handler).err()),
            State::Error => match on_errors {
                Some(handler) => {
                    let errors = outcome.errors.as_slice();
                    guarded(|| handler(errors)).err()
                }
                None => route_all(outcome),
            },
            State::Exception => match (on_exception, outcome.exception()) {
                (Some(handler), Some(exception)) => guarded(|| handler(exception)).err(),
                _ => {
                    if let Some(exception) = outcome.exception() {
                        tracing::error!(
                            type_name = exception.type_name(),
                            message = exception.message(),
                            "unhandled exception in outcome"
                        );
                    }
                    route_all(outcome)
                }
            },
        };

        if let Some(failure) = failure {
            outcome.absorb_failure(failure, None::<fn(&Exception)>);
        }
    }
}

fn dispatch_value<'a, V: Variants>(
    value: &V,
    visitor: Option<Box<dyn FnOnce(&V) + 'a>>,
    typed: Vec<Typed<'a>>,
) -> Option<Failure> {
    if let Some(visitor) = visitor {
        return guarded(|| visitor(value)).err();
    }

    let held = value.as_any();
    let held_type = held.type_id();
    match typed.into_iter().find(|(type_id, _)| *type_id == held_type) {
        Some((_, handler)) => guarded(|| handler(held)).err(),
        None => {
            tracing::trace!(held = value.type_name(), "no handler for held type");
            None
        }
    }
}

/// Routes every error; the first handler failure is returned for the
/// policy, later ones are only logged.
fn route_all<V: Variants>(outcome: &Outcome<V>) -> Option<Failure> {
    let context = &outcome.context;
    let mut first = None;
    for error in outcome.errors.iter() {
        let Err(failure) = guarded(|| context.route(error)) else {
            continue;
        };
        if first.is_none() {
            first = Some(failure);
        } else {
            tracing::error!(
                error_type = %error.error_type(),
                message = failure.exception.message(),
                "error handler failed"
            );
        }
    }
    first
}

/// A handler for untyped multi-dispatch, see [`Outcome::try_handle_any`].
///
/// The parameter type is fixed when the handler is built. Values are
/// passed by clone, or deserialized when the held value is a
/// `serde_json::Value`.
pub struct Handler<'a> {
    param: TypeId,
    param_name: &'static str,
    call: Box<dyn FnMut(&dyn Any) -> bool + 'a>,
}

impl<'a> Handler<'a> {
    /// Wraps `handler` for a parameter of type `P`
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_outcome::{Handler, OneOf2, Outcome};
    /// use std::cell::Cell;
    ///
    /// let mut outcome: Outcome<OneOf2<String, u32>> = Outcome::from_value(9u32);
    /// let total = Cell::new(0);
    ///
    /// outcome.try_handle_any([
    ///     Handler::new(|s: String| total.set(total.get() + s.len() as u32)),
    ///     Handler::new(|n: u32| total.set(total.get() + n)),
    /// ]);
    /// assert_eq!(total.get(), 9);
    /// ```
    pub fn new<P, F>(mut handler: F) -> Self
    where
        P: DeserializeOwned + Clone + 'static,
        F: FnMut(P) + 'a,
    {
        Self {
            param: TypeId::of::<P>(),
            param_name: std::any::type_name::<P>(),
            call: Box::new(move |held: &dyn Any| match coerce::<P>(held) {
                Some(value) => {
                    handler(value);
                    true
                }
                None => false,
            }),
        }
    }

    /// Type name of the parameter this handler accepts
    pub fn param_name(&self) -> &'static str {
        self.param_name
    }
}

/// Views a held value as `P`: directly, or through its JSON form
fn coerce<P>(held: &dyn Any) -> Option<P>
where
    P: DeserializeOwned + Clone + 'static,
{
    if let Some(value) = held.downcast_ref::<P>() {
        return Some(value.clone());
    }

    let json = held.downcast_ref::<serde_json::Value>()?;
    match serde_json::from_value::<P>(json.clone()) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::trace!(
                target_type = std::any::type_name::<P>(),
                error = %e,
                "structured value does not fit handler"
            );
            None
        }
    }
}

impl<V: Variants> Outcome<V> {
    /// Starts a [`Matcher`]
    pub fn matcher(&mut self) -> Matcher<'_, V> {
        Matcher {
            outcome: self,
            visitor: None,
            typed: Vec::new(),
            on_no_result: None,
            on_errors: None,
            on_exception: None,
        }
    }

    /// Folds the outcome into a single value, one closure per state.
    ///
    /// Unlike [`matcher`](Outcome::matcher), the closures are not guarded.
    pub fn match_with<R>(
        &self,
        on_value: impl FnOnce(&V) -> R,
        on_no_result: impl FnOnce() -> R,
        on_errors: impl FnOnce(&[Error]) -> R,
        on_exception: impl FnOnce(&Exception) -> R,
    ) -> R {
        match (self.state, self.value.as_ref(), self.exception()) {
            (State::Result, Some(value), _) => on_value(value),
            (State::Exception, _, Some(exception)) => on_exception(exception),
            (State::Error | State::Exception, _, _) => on_errors(&self.errors),
            _ => on_no_result(),
        }
    }

    /// Runs `action` if the held value is a `T`
    pub fn try_handle<T: 'static>(&mut self, action: impl FnOnce(&T)) -> &mut Self {
        self.try_handle_inner(action, None::<fn(&Exception)>)
    }

    /// Like [`try_handle`](Outcome::try_handle), sending a panicking
    /// `action` to `catch`
    pub fn try_handle_catch<T: 'static>(
        &mut self,
        action: impl FnOnce(&T),
        catch: impl FnOnce(&Exception),
    ) -> &mut Self {
        self.try_handle_inner(action, Some(catch))
    }

    fn try_handle_inner<T: 'static, C>(
        &mut self,
        action: impl FnOnce(&T),
        catch: Option<C>,
    ) -> &mut Self
    where
        C: FnOnce(&Exception),
    {
        let failure = match self.try_get_value::<T>() {
            Some(value) => guarded(|| action(value)).err(),
            None => return self,
        };
        if let Some(failure) = failure {
            self.absorb_failure(failure, catch);
        }
        self
    }

    /// Maps a held `M` through `f` into the matched-item mailbox.
    ///
    /// The mailbox takes one value per cycle: while it is full, further
    /// maps are skipped. Read it with
    /// [`take_matched_as`](Outcome::take_matched_as).
    ///
    /// ```
    /// use sovran_outcome::{OneOf2, Outcome};
    ///
    /// let mut outcome: Outcome<OneOf2<String, i32>> = Outcome::from_value(21i32);
    /// outcome
    ///     .try_map(|s: &String| s.len() as i32)
    ///     .try_map(|n: &i32| n * 2);
    ///
    /// assert_eq!(outcome.take_matched_as::<i32>(), Some(42));
    /// assert!(!outcome.has_matched_item());
    /// ```
    pub fn try_map<M, R>(&mut self, f: impl FnOnce(&M) -> R) -> &mut Self
    where
        M: 'static,
        R: Any + Send + Sync,
    {
        self.try_map_inner(f, None::<fn(&Exception)>, None)
    }

    /// Like [`try_map`](Outcome::try_map); a panicking `f` goes to `catch`
    /// and `fallback`, if given, is deposited instead
    pub fn try_map_with<M, R>(
        &mut self,
        f: impl FnOnce(&M) -> R,
        catch: impl FnOnce(&Exception),
        fallback: Option<R>,
    ) -> &mut Self
    where
        M: 'static,
        R: Any + Send + Sync,
    {
        self.try_map_inner(f, Some(catch), fallback)
    }

    fn try_map_inner<M, R, C>(
        &mut self,
        f: impl FnOnce(&M) -> R,
        catch: Option<C>,
        fallback: Option<R>,
    ) -> &mut Self
    where
        M: 'static,
        R: Any + Send + Sync,
        C: FnOnce(&Exception),
    {
        if let Some(held) = &self.matched {
            tracing::trace!(held = held.type_name(), "matched item already set this cycle");
            return self;
        }

        let mapped = match self.try_get_value::<M>() {
            Some(value) => guarded(|| f(value)),
            None => return self,
        };

        match mapped {
            Ok(result) => self.matched = Some(AnyValue::new(result)),
            Err(failure) => {
                self.absorb_failure(failure, catch);
                if let Some(fallback) = fallback {
                    self.matched = Some(AnyValue::new(fallback));
                }
            }
        }
        self
    }

    /// True while the mailbox holds a mapped value
    pub fn has_matched_item(&self) -> bool {
        self.matched.is_some()
    }

    /// Reads the mailbox without clearing it
    pub fn matched_item_ref<R: 'static>(&self) -> Option<&R> {
        self.matched.as_ref()?.downcast_ref::<R>()
    }

    /// Reads and clears the mailbox. A value of another type stays put.
    pub fn take_matched_as<R: 'static>(&mut self) -> Option<R> {
        let held = self.matched.take()?;
        match held.downcast::<R>() {
            Ok(value) => Some(value),
            Err(held) => {
                tracing::debug!(
                    held = held.type_name(),
                    requested = std::any::type_name::<R>(),
                    "matched item has another type"
                );
                self.matched = Some(held);
                None
            }
        }
    }

    /// Reads and clears the mailbox, whatever its type
    pub fn take_matched(&mut self) -> Option<Box<dyn Any + Send + Sync>> {
        self.matched.take().map(AnyValue::into_inner)
    }

    /// Untyped multi-dispatch.
    ///
    /// Walks the declared types left to right. For each, the handlers
    /// taking that type try to coerce the held value; the first success
    /// runs and ends the dispatch. Failed coercions are skipped, and no
    /// match at all is a no-op.
    ///
    /// ```
    /// use sovran_outcome::{Handler, OneOf2, Outcome};
    ///
    /// let mut outcome: Outcome<OneOf2<u8, String>> = Outcome::from_value("hi".to_string());
    /// let got = std::cell::RefCell::new(String::new());
    ///
    /// outcome.try_handle_any([
    ///     Handler::new(|n: u8| *got.borrow_mut() = n.to_string()),
    ///     Handler::new(|s: String| *got.borrow_mut() = s),
    /// ]);
    ///
    /// assert_eq!(got.into_inner(), "hi");
    /// ```
    pub fn try_handle_any<'h>(
        &mut self,
        handlers: impl IntoIterator<Item = Handler<'h>>,
    ) -> &mut Self {
        let mut handlers: Vec<Handler<'h>> = handlers.into_iter().collect();

        let failure = {
            let Some(value) = self.value() else {
                return self;
            };
            if value.is_null(self.context.policy().default_as_null()) {
                return self;
            }
            let held = value.as_any();

            let mut verdict = None;
            'declared: for type_id in V::type_ids() {
                for handler in handlers.iter_mut().filter(|h| h.param == type_id) {
                    match guarded(|| (handler.call)(held)) {
                        Ok(true) => {
                            verdict = Some(None);
                            break 'declared;
                        }
                        Ok(false) => continue,
                        Err(failure) => {
                            verdict = Some(Some(failure));
                            break 'declared;
                        }
                    }
                }
            }

            match verdict {
                Some(failure) => failure,
                None => {
                    tracing::trace!(held = value.type_name(), "no handler accepted the held value");
                    None
                }
            }
        };

        if let Some(failure) = failure {
            self.absorb_failure(failure, None::<fn(&Exception)>);
        }
        self
    }

    /// Applies the failure policy to a panic caught in handling code
    pub(crate) fn absorb_failure<C>(&mut self, failure: Failure, catch: Option<C>)
    where
        C: FnOnce(&Exception),
    {
        let Failure { exception, payload } = failure;

        if let Some(catch) = catch {
            catch(&exception);
            return;
        }

        tracing::error!(
            type_name = exception.type_name(),
            message = exception.message(),
            "handler failed"
        );

        let policy = self.context.policy();
        let rethrow = policy.throw_exceptions_from_user_handling_code();
        if policy.treat_exceptions_as_errors() {
            self.add_error(
                Error::generic(format!("handler failed: {}", exception.message()))
                    .with_source(exception.type_name()),
            );
        }
        if rethrow {
            panic::resume_unwind(payload);
        }
    }
}
