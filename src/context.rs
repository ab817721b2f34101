use std::error::Error as StdError;
use std::sync::{Arc, OnceLock};

use crate::error::OutcomeError;
use crate::errors::Error;
use crate::exception::Exception;
use crate::kind::ErrorType;
use crate::policy::{Policy, PolicySnapshot};
use crate::registry::{ConverterRegistry, HandlerRegistry};

static GLOBAL: OnceLock<Arc<Context>> = OnceLock::new();

/// Policy switches plus the converter and handler registries.
///
/// Every [`Outcome`](crate::Outcome) carries the context it was created
/// under. Constructors without an explicit context use the process-wide
/// one, which is a default context unless [`Context::install`] ran first.
///
/// ```
/// use sovran_outcome::{Context, Error, ErrorType, OneOf1, Outcome};
/// use std::num::ParseIntError;
/// use std::sync::Arc;
///
/// let ctx = Context::builder()
///     .default_as_null(true)
///     .converter::<ParseIntError, _>(ErrorType::VALIDATION, |e| {
///         Error::validation(e.to_string())
///     })
///     .build()
///     .map(Arc::new)?;
///
/// let parsed: Outcome<OneOf1<i32>> = ctx.try_invoke(|| "seven".parse::<i32>());
/// assert!(parsed.has_errors());
/// assert!(!parsed.has_exception());
/// # Ok::<(), sovran_outcome::OutcomeError>(())
/// ```
#[derive(Debug, Default)]
pub struct Context {
    policy: Policy,
    converters: ConverterRegistry,
    handlers: HandlerRegistry,
}

impl Context {
    /// A context with `policy` and empty registries
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            converters: ConverterRegistry::new(),
            handlers: HandlerRegistry::new(),
        }
    }

    /// Starts a [`ContextBuilder`]
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_outcome::Context;
    ///
    /// let ctx = Context::builder().treat_exceptions_as_errors(true).build()?;
    /// assert!(ctx.policy().treat_exceptions_as_errors());
    /// # Ok::<(), sovran_outcome::OutcomeError>(())
    /// ```
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    /// The process-wide context
    pub fn global() -> Arc<Context> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Context::default())))
    }

    /// Makes this context the process-wide one. Call once, at startup,
    /// before any container is created through the global context.
    ///
    /// # Errors
    ///
    /// Returns `OutcomeError::Config` if the global context was already
    /// installed or already used.
    pub fn install(self) -> Result<Arc<Context>, OutcomeError> {
        let ctx = Arc::new(self);
        GLOBAL
            .set(Arc::clone(&ctx))
            .map_err(|_| OutcomeError::Config("global context is already initialized".into()))?;
        tracing::debug!(policy = ?ctx.policy.snapshot(), "installed global outcome context");
        Ok(ctx)
    }

    /// The live policy switches; changes apply to every container sharing this context
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Exception converters, keyed by exception type name
    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    /// Error handlers, keyed by error type
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Turns a captured failure into the error a container records.
    ///
    /// A converter registered for the exception's exact type produces a
    /// typed error; anything else is wrapped with [`Error::exception`].
    pub fn classify(&self, exception: Exception) -> Error {
        match self.converters.convert(&exception) {
            Ok(Some(error)) => {
                tracing::trace!(type_name = exception.type_name(), "converted exception");
                error
            }
            Ok(None) => Error::exception(exception),
            Err(e) => {
                tracing::warn!(error = %e, "converter lookup failed, wrapping exception");
                Error::exception(exception)
            }
        }
    }

    /// Routes an error to the handler registered for its type
    pub(crate) fn route(&self, error: &Error) {
        if let Err(e) = self.handlers.handle(error) {
            tracing::warn!(error = %e, "error handler lookup failed");
        }
    }
}

type Registration = Box<dyn FnOnce(&Context) -> Result<(), OutcomeError>>;

/// Builds a [`Context`] at startup.
#[derive(Default)]
pub struct ContextBuilder {
    policy: PolicySnapshot,
    registrations: Vec<Registration>,
}

impl ContextBuilder {
    /// Replaces all four switches at once
    pub fn policy(mut self, policy: PolicySnapshot) -> Self {
        self.policy = policy;
        self
    }

    /// Treats zero values such as `0` or `false` as absent
    pub fn default_as_null(mut self, on: bool) -> Self {
        self.policy.default_as_null = on;
        self
    }

    /// Makes a container with errors report as not empty
    pub fn containers_not_empty_if_issues(mut self, on: bool) -> Self {
        self.policy.containers_not_empty_if_issues = on;
        self
    }

    /// Records a panicking handler as an error on its container
    pub fn treat_exceptions_as_errors(mut self, on: bool) -> Self {
        self.policy.treat_exceptions_as_errors = on;
        self
    }

    /// Re-raises a panicking handler after the policy has run
    pub fn throw_exceptions_from_user_handling_code(mut self, on: bool) -> Self {
        self.policy.throw_exceptions_from_user_handling_code = on;
        self
    }

    /// Registers a conversion for failures of exactly type `E`
    pub fn converter<E, F>(mut self, error_type: ErrorType, convert: F) -> Self
    where
        E: StdError + 'static,
        F: Fn(&E) -> Error + Send + Sync + 'static,
    {
        self.registrations.push(Box::new(move |ctx: &Context| {
            ctx.converters.register::<E, F>(error_type, convert)
        }));
        self
    }

    /// Registers the action run for unhandled errors of `error_type`
    pub fn handler<F>(mut self, error_type: ErrorType, handler: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.registrations.push(Box::new(move |ctx: &Context| {
            ctx.handlers.register(&error_type, handler)
        }));
        self
    }

    /// # Errors
    ///
    /// Returns the first registration failure.
    pub fn build(self) -> Result<Context, OutcomeError> {
        let ctx = Context::new(Policy::new(self.policy));
        for register in self.registrations {
            register(&ctx)?;
        }
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::ParseIntError;

    #[test]
    fn test_builder_sets_policy() -> Result<(), OutcomeError> {
        let ctx = Context::builder()
            .default_as_null(true)
            .containers_not_empty_if_issues(false)
            .treat_exceptions_as_errors(true)
            .build()?;

        let policy = ctx.policy().snapshot();
        assert!(policy.default_as_null);
        assert!(!policy.containers_not_empty_if_issues);
        assert!(policy.treat_exceptions_as_errors);
        assert!(!policy.throw_exceptions_from_user_handling_code);
        Ok(())
    }

    #[test]
    fn test_classify_without_converter_wraps() {
        let ctx = Context::default();
        let error = ctx.classify(Exception::new("x".parse::<u8>().unwrap_err()));
        assert!(error.is_exception());
        assert_eq!(error.error_type(), &ErrorType::EXCEPTION);
    }

    #[test]
    fn test_classify_with_converter() -> Result<(), OutcomeError> {
        let ctx = Context::builder()
            .converter::<ParseIntError, _>(ErrorType::BAD_REQUEST, |e| {
                Error::bad_request(e.to_string())
            })
            .build()?;

        let error = ctx.classify(Exception::new("x".parse::<u8>().unwrap_err()));
        assert!(!error.is_exception());
        assert_eq!(error.error_type(), &ErrorType::BAD_REQUEST);
        assert_eq!(ctx.converters().len()?, 1);
        Ok(())
    }
}
