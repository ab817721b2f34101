use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::any_value::AnyValue;
use crate::context::Context;
use crate::error::OutcomeError;
use crate::errors::Error;
use crate::exception::Exception;
use crate::kind::{Category, ErrorType};
use crate::state::State;
use crate::variants::{Member, Variants};

/// A value holding one of the declared types in `V`, or the errors that
/// prevented it.
///
/// `V` is one of the [`OneOf1`](crate::OneOf1)..[`OneOf16`](crate::OneOf16)
/// enums. The container is a plain value: clones own their error history
/// independently, and nothing in it is locked.
///
/// ```
/// use sovran_outcome::{Error, OneOf2, Outcome, State};
///
/// let mut found: Outcome<OneOf2<String, i32>> = Outcome::from_value(5i32);
/// assert_eq!(found.state(), State::Result);
/// assert_eq!(found.try_get_value::<i32>(), Some(&5));
///
/// found.add_error(Error::not_found("user 5 is gone"));
/// assert_eq!(found.state(), State::Error);
/// assert_eq!(found.try_get_value::<i32>(), None);
/// ```
pub struct Outcome<V: Variants> {
    pub(crate) state: State,
    pub(crate) value: Option<V>,
    pub(crate) errors: Arc<Vec<Error>>,
    pub(crate) matched: Option<AnyValue>,
    pub(crate) context: Arc<Context>,
}

impl<V: Variants> Outcome<V> {
    /// An empty container under the process-wide context
    pub fn empty() -> Self {
        Self::empty_in(&Context::global())
    }

    /// An empty container bound to `context`
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use sovran_outcome::{Context, OneOf1, Outcome};
    ///
    /// let ctx = Arc::new(Context::default());
    /// let outcome = Outcome::<OneOf1<u8>>::empty_in(&ctx);
    /// assert!(outcome.is_empty());
    /// assert!(Arc::ptr_eq(outcome.context(), &ctx));
    /// ```
    pub fn empty_in(context: &Arc<Context>) -> Self {
        Self {
            state: State::Empty,
            value: None,
            errors: Arc::new(Vec::new()),
            matched: None,
            context: Arc::clone(context),
        }
    }

    /// A container holding `value` in the slot declared for `T`
    pub fn from_value<T, I>(value: T) -> Self
    where
        V: Member<T, I>,
    {
        Self::from_variant(V::inject(value))
    }

    /// A container holding `value`, bound to `context`
    ///
    /// The context's `default_as_null` decides whether a zero `value` counts.
    pub fn from_value_in<T, I>(context: &Arc<Context>, value: T) -> Self
    where
        V: Member<T, I>,
    {
        Self::from_variant_in(context, V::inject(value))
    }

    /// A container holding an explicit variant
    ///
    /// Needed when `V` declares the same type twice and the slot matters.
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_outcome::{OneOf2, Outcome};
    ///
    /// let outcome = Outcome::from_variant(OneOf2::<u8, u8>::V2(7));
    /// assert_eq!(outcome.value(), Some(&OneOf2::V2(7)));
    /// ```
    pub fn from_variant(value: V) -> Self {
        Self::from_variant_in(&Context::global(), value)
    }

    /// A container holding an explicit variant, bound to `context`
    pub fn from_variant_in(context: &Arc<Context>, value: V) -> Self {
        let mut outcome = Self::empty_in(context);
        outcome.set_variant(value);
        outcome
    }

    /// A failed container holding a single error
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_outcome::{Error, OneOf1, Outcome, State};
    ///
    /// let outcome = Outcome::<OneOf1<u8>>::from_error(Error::timeout("no reply"));
    /// assert_eq!(outcome.state(), State::Error);
    /// assert_eq!(outcome.errors().len(), 1);
    /// ```
    pub fn from_error(error: Error) -> Self {
        Self::from_error_in(&Context::global(), error)
    }

    /// A failed container holding a single error, bound to `context`
    pub fn from_error_in(context: &Arc<Context>, error: Error) -> Self {
        let mut outcome = Self::empty_in(context);
        outcome.add_error(error);
        outcome
    }

    /// A container holding every error in `errors`, in order
    ///
    /// An empty iterator leaves the container empty.
    pub fn from_errors(errors: impl IntoIterator<Item = Error>) -> Self {
        Self::from_errors_in(&Context::global(), errors)
    }

    /// Like [`from_errors`](Outcome::from_errors), bound to `context`
    pub fn from_errors_in(context: &Arc<Context>, errors: impl IntoIterator<Item = Error>) -> Self {
        let mut outcome = Self::empty_in(context);
        outcome.add_errors(errors);
        outcome
    }

    /// A container for a failure. A converter registered for `E` turns it
    /// into a typed error (`State::Error`), otherwise it is wrapped
    /// (`State::Exception`).
    pub fn from_exception<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::from_exception_in(&Context::global(), error)
    }

    /// Like [`from_exception`](Outcome::from_exception), classified by `context`'s converters
    pub fn from_exception_in<E>(context: &Arc<Context>, error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::from_captured_in(context, Exception::new(error))
    }

    /// A container for an already captured failure
    pub fn from_captured(exception: Exception) -> Self {
        Self::from_captured_in(&Context::global(), exception)
    }

    /// Like [`from_captured`](Outcome::from_captured), classified by `context`'s converters
    pub fn from_captured_in(context: &Arc<Context>, exception: Exception) -> Self {
        let error = context.classify(exception);
        Self::from_error_in(context, error)
    }

    /// The context whose policy and registries this container uses
    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    /// The current state
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_outcome::{OneOf1, Outcome, State};
    ///
    /// let outcome: Outcome<OneOf1<String>> = Outcome::empty();
    /// assert_eq!(outcome.state(), State::Empty);
    /// ```
    pub fn state(&self) -> State {
        self.state
    }

    /// True in `State::Result`
    pub fn has_result(&self) -> bool {
        self.state == State::Result
    }

    /// True when at least one error has been recorded
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// True in `State::Exception`
    pub fn has_exception(&self) -> bool {
        self.state == State::Exception
    }

    /// True when there is no value. With `containers_not_empty_if_issues`
    /// on, a container holding errors is not empty.
    pub fn is_empty(&self) -> bool {
        if self.context.policy().containers_not_empty_if_issues() {
            self.state == State::Empty
        } else {
            self.state != State::Result
        }
    }

    /// The held variant, while the container is in `State::Result`
    pub fn value(&self) -> Option<&V> {
        match self.state {
            State::Result => self.value.as_ref(),
            _ => None,
        }
    }

    /// Consumes the container, returning the variant held in `State::Result`
    pub fn into_value(self) -> Option<V> {
        match self.state {
            State::Result => self.value,
            _ => None,
        }
    }

    /// The held value as the declared type `T`
    pub fn get<T, I>(&self) -> Option<&T>
    where
        V: Member<T, I>,
    {
        self.value().and_then(|v| v.project())
    }

    /// The held value if it is a `T`. Zero values read as absent while
    /// `default_as_null` is on.
    pub fn try_get_value<T: 'static>(&self) -> Option<&T> {
        let value = self.value()?;
        if value.is_null(self.context.policy().default_as_null()) {
            return None;
        }
        value.downcast_ref::<T>()
    }

    /// Like [`try_get_value`](Outcome::try_get_value), with the reason
    /// nothing came back
    ///
    /// # Errors
    ///
    /// Returns `OutcomeError::NotDeclared` if `T` is not a declared type, and
    /// `OutcomeError::TypeMismatch` if the container holds no `T`.
    pub fn value_of<T: 'static>(&self) -> Result<&T, OutcomeError> {
        let expected = std::any::type_name::<T>();
        if !V::declares::<T>() {
            return Err(OutcomeError::NotDeclared(expected));
        }
        self.try_get_value::<T>()
            .ok_or(OutcomeError::TypeMismatch { expected })
    }

    /// Sets the value in the slot declared for `T`
    pub fn set_value<T, I>(&mut self, value: T) -> &mut Self
    where
        V: Member<T, I>,
    {
        self.set_variant(V::inject(value))
    }

    /// Sets the held variant. A null value leaves the container empty; a
    /// failed container ignores the call.
    pub fn set_variant(&mut self, value: V) -> &mut Self {
        if self.state.is_failed() {
            tracing::debug!(state = %self.state, "ignoring value set on failed outcome");
            return self;
        }

        let is_null = value.is_null(self.context.policy().default_as_null());
        self.state = self.state.on_value(is_null);
        self.value = if is_null { None } else { Some(value) };
        self
    }

    /// Appends an error. The first error moves the container to `Error`,
    /// or to `Exception` if it wraps a captured failure.
    pub fn add_error(&mut self, error: Error) -> &mut Self {
        self.state = self.state.on_error(error.is_exception());
        Arc::make_mut(&mut self.errors).push(error);
        self
    }

    /// Appends each error in order, as [`add_error`](Outcome::add_error) would
    pub fn add_errors(&mut self, errors: impl IntoIterator<Item = Error>) -> &mut Self {
        for error in errors {
            self.add_error(error);
        }
        self
    }

    /// Every recorded error, oldest first
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_outcome::{Error, OneOf1, Outcome};
    ///
    /// let mut outcome: Outcome<OneOf1<u8>> = Outcome::empty();
    /// outcome.add_error(Error::timeout("first")).add_error(Error::not_found("second"));
    ///
    /// let messages: Vec<_> = outcome.errors().iter().map(|e| e.message()).collect();
    /// assert_eq!(messages, ["first", "second"]);
    /// ```
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Errors in `category`
    pub fn errors_of(&self, category: Category) -> Vec<&Error> {
        self.errors_where(|e| e.category() == category)
    }

    /// Errors of exactly `error_type`
    pub fn errors_of_type(&self, error_type: &ErrorType) -> Vec<&Error> {
        self.errors_where(|e| e.error_type() == error_type)
    }

    /// Errors for which `predicate` holds
    pub fn errors_where<P>(&self, mut predicate: P) -> Vec<&Error>
    where
        P: FnMut(&Error) -> bool,
    {
        self.errors.iter().filter(|e| predicate(e)).collect()
    }

    /// The failure that put the container in `State::Exception`
    pub fn exception(&self) -> Option<&Exception> {
        match self.state {
            State::Exception => self.errors.first()?.wrapped_exception(),
            _ => None,
        }
    }

    /// Copies this container into one with a wider declared set.
    ///
    /// The held value moves to the first slot of the same type in `W`;
    /// state and errors are copied verbatim.
    ///
    /// # Errors
    ///
    /// Returns `OutcomeError::NotSuperset` if `W` lacks any of `V`'s types.
    pub fn try_convert<W: Variants>(&self) -> Result<Outcome<W>, OutcomeError> {
        let target = W::type_ids();
        for (type_id, name) in V::type_ids().into_iter().zip(V::type_names()) {
            if !target.contains(&type_id) {
                return Err(OutcomeError::NotSuperset { missing: name });
            }
        }

        let value = match &self.value {
            Some(v) => Some(
                W::from_any(v.clone().into_any())
                    .map_err(|_| OutcomeError::NotDeclared(v.type_name()))?,
            ),
            None => None,
        };

        Ok(Outcome {
            state: self.state,
            value,
            errors: Arc::clone(&self.errors),
            matched: None,
            context: Arc::clone(&self.context),
        })
    }

    /// Splits into the standard library's `Result`. An empty container
    /// yields `Ok(None)`.
    pub fn into_result(self) -> Result<Option<V>, Vec<Error>> {
        match self.state {
            State::Result => Ok(self.value),
            State::Empty => Ok(None),
            State::Error | State::Exception => {
                Err(Arc::try_unwrap(self.errors).unwrap_or_else(|shared| (*shared).clone()))
            }
        }
    }
}

impl<V: Variants> Default for Outcome<V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<V: Variants> Clone for Outcome<V> {
    /// The matched-item mailbox is not cloned; a clone starts a fresh cycle.
    fn clone(&self) -> Self {
        Self {
            state: self.state,
            value: self.value.clone(),
            errors: Arc::clone(&self.errors),
            matched: None,
            context: Arc::clone(&self.context),
        }
    }
}

impl<V: Variants> PartialEq for Outcome<V> {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state && self.value == other.value && self.errors == other.errors
    }
}

impl<V: Variants> fmt::Debug for Outcome<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outcome")
            .field("state", &self.state)
            .field("value", &self.value)
            .field("errors", &self.errors)
            .field(
                "matched",
                &self.matched.as_ref().map(|m| m.type_name()),
            )
            .finish()
    }
}

impl<V: Variants> From<Error> for Outcome<V> {
    fn from(error: Error) -> Self {
        Self::from_error(error)
    }
}

impl<V: Variants> From<Exception> for Outcome<V> {
    fn from(exception: Exception) -> Self {
        Self::from_captured(exception)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::{OneOf1, OneOf2, OneOf3};

    fn ctx() -> Arc<Context> {
        Arc::new(Context::default())
    }

    #[test]
    fn test_value_enters_result() {
        let outcome = Outcome::<OneOf2<String, i32>>::from_value_in(&ctx(), 5i32);
        assert_eq!(outcome.state(), State::Result);
        assert_eq!(outcome.get::<i32, _>(), Some(&5));
        assert_eq!(outcome.try_get_value::<String>(), None);
        assert!(!outcome.is_empty());
    }

    #[test]
    fn test_absent_value_stays_empty() {
        let outcome = Outcome::<OneOf1<Option<i32>>>::from_value_in(&ctx(), None::<i32>);
        assert_eq!(outcome.state(), State::Empty);
        assert!(outcome.is_empty());
        assert!(outcome.value().is_none());
    }

    #[test]
    fn test_null_value_returns_to_empty() {
        let ctx = Arc::new(Context::builder().default_as_null(true).build().unwrap());
        let mut outcome = Outcome::<OneOf1<u32>>::from_value_in(&ctx, 3u32);
        assert!(outcome.has_result());

        outcome.set_value(0u32);
        assert_eq!(outcome.state(), State::Empty);
    }

    #[test]
    fn test_exception_after_error_keeps_error_state() {
        let mut outcome = Outcome::<OneOf1<i32>>::from_error_in(&ctx(), Error::validation("bad"));
        outcome.add_error(Error::exception(Exception::detached("panic", "boom")));
        assert_eq!(outcome.state(), State::Error);
        assert!(outcome.exception().is_none());
        assert_eq!(outcome.errors().len(), 2);
    }

    #[test]
    fn test_value_ignored_after_failure() {
        let mut outcome = Outcome::<OneOf1<i32>>::from_error_in(&ctx(), Error::timeout("slow"));
        outcome.set_value(4i32);
        assert_eq!(outcome.state(), State::Error);
        assert!(outcome.value().is_none());
    }

    #[test]
    fn test_is_empty_policy() {
        let strict = Arc::new(
            Context::builder()
                .containers_not_empty_if_issues(false)
                .build()
                .unwrap(),
        );
        let failed = Outcome::<OneOf1<i32>>::from_error_in(&strict, Error::generic("x"));
        assert!(failed.is_empty());

        let lenient = Outcome::<OneOf1<i32>>::from_error_in(&ctx(), Error::generic("x"));
        assert!(!lenient.is_empty());
    }

    #[test]
    fn test_clones_diverge() {
        let original = Outcome::<OneOf1<i32>>::empty_in(&ctx());
        let mut copy = original.clone();
        copy.add_error(Error::generic("only on the copy"));

        assert!(original.errors().is_empty());
        assert_eq!(original.state(), State::Empty);
        assert_eq!(copy.errors().len(), 1);
    }

    #[test]
    fn test_error_filters() {
        let mut outcome = Outcome::<OneOf1<i32>>::empty_in(&ctx());
        outcome.add_errors([
            Error::validation("a"),
            Error::timeout("b"),
            Error::not_found("c"),
        ]);

        assert_eq!(outcome.errors_of(Category::Client).len(), 2);
        assert_eq!(outcome.errors_of_type(&ErrorType::TIMEOUT).len(), 1);
        assert_eq!(outcome.errors_where(|e| e.message() == "c").len(), 1);
    }

    #[test]
    fn test_convert_rejects_narrower_target() {
        let outcome = Outcome::<OneOf2<String, i32>>::from_value_in(&ctx(), 1i32);
        let err = outcome.try_convert::<OneOf2<i32, u8>>().unwrap_err();
        assert!(matches!(err, OutcomeError::NotSuperset { .. }));
    }

    #[test]
    fn test_convert_rehomes_value() {
        let outcome = Outcome::<OneOf2<String, i32>>::from_value_in(&ctx(), 7i32);
        let wide = outcome.try_convert::<OneOf3<i32, bool, String>>().unwrap();
        assert_eq!(wide.value(), Some(&OneOf3::V1(7)));
        assert_eq!(wide.state(), State::Result);
    }

    #[test]
    fn test_value_of_explains_misses() {
        let outcome = Outcome::<OneOf2<String, i32>>::from_value_in(&ctx(), 3i32);
        assert_eq!(outcome.value_of::<i32>().unwrap(), &3);
        assert!(matches!(
            outcome.value_of::<String>(),
            Err(OutcomeError::TypeMismatch { .. })
        ));
        assert!(matches!(
            outcome.value_of::<bool>(),
            Err(OutcomeError::NotDeclared(_))
        ));
    }

    #[test]
    fn test_into_result() {
        let ok = Outcome::<OneOf1<i32>>::from_value_in(&ctx(), 2i32);
        assert_eq!(ok.into_result().unwrap(), Some(OneOf1::V1(2)));

        let failed = Outcome::<OneOf1<i32>>::from_error_in(&ctx(), Error::generic("x"));
        assert_eq!(failed.into_result().unwrap_err().len(), 1);
    }
}
