use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

use crate::exception::Exception;
use crate::kind::{Category, ErrorType, Priority};

/// A structured failure record attached to an [`Outcome`](crate::Outcome).
///
/// Errors are built with the per-category factories and refined with the
/// `with_*` builders:
///
/// ```
/// use sovran_outcome::{Category, Error, ErrorType, Priority};
///
/// let err = Error::validation("email is required")
///     .with_source("signup form")
///     .with_priority(Priority::High)
///     .with_meta("field", "email");
///
/// assert_eq!(err.category(), Category::Client);
/// assert_eq!(err.error_type(), &ErrorType::VALIDATION);
/// assert_eq!(err.metadata().get("field").map(String::as_str), Some("email"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Error {
    name: String,
    message: String,
    created_at: DateTime<Utc>,
    source: String,
    priority: Priority,
    error_type: ErrorType,
    category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inner: Option<Box<Error>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exception: Option<Exception>,
}

impl Error {
    /// Creates an error with the type's default priority and display name
    pub fn new(category: Category, error_type: ErrorType, message: impl Into<String>) -> Self {
        Self {
            name: error_type.name().to_string(),
            message: message.into(),
            created_at: Utc::now(),
            source: String::new(),
            priority: error_type.default_priority(),
            error_type,
            category,
            inner: None,
            metadata: BTreeMap::new(),
            exception: None,
        }
    }

    /// A client-side error of `error_type`
    ///
    /// The per-kind factories below (`validation`, `timeout`, ...) pick the
    /// category and type for you.
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_outcome::{Category, Error, ErrorType, Priority};
    ///
    /// let error = Error::validation("age must be positive");
    /// assert_eq!(error.category(), Category::Client);
    /// assert_eq!(error.error_type(), &ErrorType::VALIDATION);
    /// assert_eq!(error.priority(), Priority::Low);
    /// ```
    pub fn client(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self::new(Category::Client, error_type, message)
    }

    pub fn server(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self::new(Category::Server, error_type, message)
    }

    pub fn network(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self::new(Category::Network, error_type, message)
    }

    pub fn security(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self::new(Category::Security, error_type, message)
    }

    pub fn resource(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self::new(Category::Resource, error_type, message)
    }

    // Client

    pub fn validation(message: impl Into<String>) -> Self {
        Self::client(ErrorType::VALIDATION, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::client(ErrorType::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::client(ErrorType::NOT_FOUND, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::client(ErrorType::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::client(ErrorType::FORBIDDEN, message)
    }

    pub fn missing_authentication(message: impl Into<String>) -> Self {
        Self::client(ErrorType::MISSING_AUTHENTICATION, message)
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::client(ErrorType::INVALID_OPERATION, message)
    }

    // Server

    pub fn failure(message: impl Into<String>) -> Self {
        Self::server(ErrorType::FAILURE, message)
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::server(ErrorType::UNEXPECTED, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::server(ErrorType::SERVICE_UNAVAILABLE, message)
    }

    pub fn circuit_breaker(message: impl Into<String>) -> Self {
        Self::server(ErrorType::CIRCUIT_BREAKER, message)
    }

    pub fn dependency_failure(message: impl Into<String>) -> Self {
        Self::server(ErrorType::DEPENDENCY_FAILURE, message)
    }

    pub fn data_integrity(message: impl Into<String>) -> Self {
        Self::server(ErrorType::DATA_INTEGRITY, message)
    }

    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::server(ErrorType::PRECONDITION_FAILED, message)
    }

    // Network

    pub fn networking(message: impl Into<String>) -> Self {
        Self::network(ErrorType::NETWORKING, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::network(ErrorType::RATE_LIMIT, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::network(ErrorType::TIMEOUT, message)
    }

    pub fn connection_failure(message: impl Into<String>) -> Self {
        Self::network(ErrorType::CONNECTION_FAILURE, message)
    }

    pub fn authentication_failure(message: impl Into<String>) -> Self {
        Self::network(ErrorType::AUTHENTICATION_FAILURE, message)
    }

    // Custom

    /// A custom error with its own display name
    pub fn custom(name: impl Into<String>, message: impl Into<String>) -> Self {
        let mut error = Self::new(Category::Custom, ErrorType::CUSTOM, message);
        error.name = name.into();
        error
    }

    /// Catch-all error, also used for failures inside handling code
    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(Category::Custom, ErrorType::GENERIC, message)
    }

    /// Wraps a captured failure. This is the only kind of error that moves
    /// an empty container into the `Exception` state.
    pub fn exception(exception: Exception) -> Self {
        let mut error = Self::new(Category::Custom, ErrorType::EXCEPTION, exception.message());
        error.source = exception.type_name().to_string();
        error.exception = Some(exception);
        error
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// UTC time the error was created
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Free-text origin of the error
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn error_type(&self) -> &ErrorType {
        &self.error_type
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// The error that caused this one
    pub fn inner(&self) -> Option<&Error> {
        self.inner.as_deref()
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// The wrapped failure, for exception-wrapper errors
    pub fn wrapped_exception(&self) -> Option<&Exception> {
        self.exception.as_ref()
    }

    /// True for errors built with [`Error::exception`]
    pub fn is_exception(&self) -> bool {
        self.exception.is_some()
    }

    /// Iterates this error and its chain of inner errors
    pub fn chain(&self) -> impl Iterator<Item = &Error> {
        std::iter::successors(Some(self), |e| e.inner())
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    pub fn set_inner(&mut self, inner: Error) {
        self.inner = Some(Box::new(inner));
    }

    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.set_source(source);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_inner(mut self, inner: Error) -> Self {
        self.set_inner(inner);
        self
    }

    /// Attaches a metadata entry, replacing any earlier value for `key`
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_outcome::Error;
    ///
    /// let error = Error::rate_limit("slow down")
    ///     .with_source("gateway")
    ///     .with_meta("retry_after", "30");
    /// assert_eq!(error.source(), "gateway");
    /// assert_eq!(error.metadata()["retry_after"], "30");
    /// ```
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert_metadata(key, value);
        self
    }

    pub(crate) fn with_error_type(mut self, error_type: ErrorType) -> Self {
        self.error_type = error_type;
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.category, self.name, self.message)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match (&self.inner, &self.exception) {
            (Some(inner), _) => Some(inner.as_ref()),
            (None, Some(exception)) => Some(exception),
            (None, None) => None,
        }
    }
}

impl From<Exception> for Error {
    fn from(exception: Exception) -> Self {
        Error::exception(exception)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factories_assign_category_and_type() {
        assert_eq!(Error::timeout("slow").category(), Category::Network);
        assert_eq!(Error::timeout("slow").error_type(), &ErrorType::TIMEOUT);
        assert_eq!(Error::data_integrity("bad row").category(), Category::Server);
        assert_eq!(
            Error::security(ErrorType::FORBIDDEN, "no").category(),
            Category::Security
        );
        assert_eq!(
            Error::resource(ErrorType::RATE_LIMIT, "slow down").category(),
            Category::Resource
        );
    }

    #[test]
    fn test_custom_name() {
        let err = Error::custom("Quota", "over budget");
        assert_eq!(err.name(), "Quota");
        assert_eq!(err.error_type(), &ErrorType::CUSTOM);
        assert_eq!(err.to_string(), "[custom] Quota: over budget");
    }

    #[test]
    fn test_inner_chain() {
        let root = Error::connection_failure("refused");
        let err = Error::dependency_failure("billing down").with_inner(root.clone());

        let messages: Vec<&str> = err.chain().map(Error::message).collect();
        assert_eq!(messages, vec!["billing down", "refused"]);
        assert!(StdError::source(&err).is_some());
    }

    #[test]
    fn test_exception_wrapper() {
        let err = Error::exception(Exception::detached("io::Error", "disk full"));
        assert!(err.is_exception());
        assert_eq!(err.message(), "disk full");
        assert_eq!(err.source(), "io::Error");
        assert_eq!(err.priority(), Priority::High);
    }

    #[test]
    fn test_setters() {
        let mut err = Error::generic("first");
        err.set_message("second");
        err.set_priority(Priority::Critical);
        err.insert_metadata("attempt", "2");

        assert_eq!(err.message(), "second");
        assert_eq!(err.priority(), Priority::Critical);
        assert_eq!(err.metadata().len(), 1);
    }
}
