//! Error classification: an open error-type enumeration, categories, and
//! priority levels.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// An extensible error type, identified by its integer id.
///
/// The built-in types use ids below 1000. Applications define their own
/// without touching existing ones:
///
/// ```
/// use sovran_outcome::ErrorType;
///
/// const QUOTA_EXCEEDED: ErrorType = ErrorType::new(1001, "QuotaExceeded");
/// assert_eq!(QUOTA_EXCEEDED.name(), "QuotaExceeded");
/// assert_ne!(QUOTA_EXCEEDED, ErrorType::RATE_LIMIT);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorType {
    id: i32,
    name: Cow<'static, str>,
}

impl ErrorType {
    /// Client errors, ids 1 to 9
    pub const VALIDATION: ErrorType = ErrorType::new(1, "Validation");
    pub const BAD_REQUEST: ErrorType = ErrorType::new(2, "BadRequest");
    pub const NOT_FOUND: ErrorType = ErrorType::new(3, "NotFound");
    pub const UNAUTHORIZED: ErrorType = ErrorType::new(4, "Unauthorized");
    pub const FORBIDDEN: ErrorType = ErrorType::new(5, "Forbidden");
    pub const MISSING_AUTHENTICATION: ErrorType = ErrorType::new(6, "MissingAuthentication");
    pub const INVALID_OPERATION: ErrorType = ErrorType::new(7, "InvalidOperation");

    /// Server errors, ids 10 to 19
    pub const FAILURE: ErrorType = ErrorType::new(10, "Failure");
    pub const UNEXPECTED: ErrorType = ErrorType::new(11, "Unexpected");
    pub const SERVICE_UNAVAILABLE: ErrorType = ErrorType::new(12, "ServiceUnavailable");
    pub const CIRCUIT_BREAKER: ErrorType = ErrorType::new(13, "CircuitBreaker");
    pub const DEPENDENCY_FAILURE: ErrorType = ErrorType::new(14, "DependencyFailure");
    pub const DATA_INTEGRITY: ErrorType = ErrorType::new(15, "DataIntegrity");
    pub const PRECONDITION_FAILED: ErrorType = ErrorType::new(16, "PreconditionFailed");

    /// Network errors, ids 20 to 29
    pub const NETWORKING: ErrorType = ErrorType::new(20, "Networking");
    pub const RATE_LIMIT: ErrorType = ErrorType::new(21, "RateLimit");
    pub const TIMEOUT: ErrorType = ErrorType::new(22, "Timeout");
    pub const CONNECTION_FAILURE: ErrorType = ErrorType::new(23, "ConnectionFailure");
    pub const AUTHENTICATION_FAILURE: ErrorType = ErrorType::new(24, "AuthenticationFailure");

    /// Custom errors, ids 30 to 39
    pub const CUSTOM: ErrorType = ErrorType::new(30, "Custom");
    pub const GENERIC: ErrorType = ErrorType::new(31, "Generic");
    pub const EXCEPTION: ErrorType = ErrorType::new(32, "Exception");

    /// Every built-in error type, in id order
    pub const BUILT_IN: [ErrorType; 22] = [
        Self::VALIDATION,
        Self::BAD_REQUEST,
        Self::NOT_FOUND,
        Self::UNAUTHORIZED,
        Self::FORBIDDEN,
        Self::MISSING_AUTHENTICATION,
        Self::INVALID_OPERATION,
        Self::FAILURE,
        Self::UNEXPECTED,
        Self::SERVICE_UNAVAILABLE,
        Self::CIRCUIT_BREAKER,
        Self::DEPENDENCY_FAILURE,
        Self::DATA_INTEGRITY,
        Self::PRECONDITION_FAILED,
        Self::NETWORKING,
        Self::RATE_LIMIT,
        Self::TIMEOUT,
        Self::CONNECTION_FAILURE,
        Self::AUTHENTICATION_FAILURE,
        Self::CUSTOM,
        Self::GENERIC,
        Self::EXCEPTION,
    ];

    /// Defines an error type. Usable in `const` items.
    pub const fn new(id: i32, name: &'static str) -> Self {
        Self {
            id,
            name: Cow::Borrowed(name),
        }
    }

    /// Defines an error type whose name is only known at runtime
    pub fn owned(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Cow::Owned(name.into()),
        }
    }

    /// Looks up a built-in error type by id
    pub fn from_id(id: i32) -> Option<ErrorType> {
        Self::BUILT_IN.iter().find(|t| t.id == id).cloned()
    }

    /// Numeric id; equality and hashing use only this
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Priority assigned by the factory functions when none is given
    pub fn default_priority(&self) -> Priority {
        match self.id {
            1 | 2 | 3 => Priority::Low,
            4..=7 => Priority::Medium,
            15 => Priority::Critical,
            10..=16 => Priority::High,
            20..=23 => Priority::Medium,
            24 => Priority::High,
            32 => Priority::High,
            _ => Priority::Unknown,
        }
    }
}

impl PartialEq for ErrorType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ErrorType {}

impl Hash for ErrorType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The family an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Client,
    Server,
    Network,
    Security,
    Resource,
    Custom,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Server => "server",
            Self::Network => "network",
            Self::Security => "security",
            Self::Resource => "resource",
            Self::Custom => "custom",
        }
    }

    /// The built-in error types that belong to this category
    pub fn error_types(&self) -> &'static [ErrorType] {
        static CLIENT: [ErrorType; 7] = [
            ErrorType::VALIDATION,
            ErrorType::BAD_REQUEST,
            ErrorType::NOT_FOUND,
            ErrorType::UNAUTHORIZED,
            ErrorType::FORBIDDEN,
            ErrorType::MISSING_AUTHENTICATION,
            ErrorType::INVALID_OPERATION,
        ];
        static SERVER: [ErrorType; 7] = [
            ErrorType::FAILURE,
            ErrorType::UNEXPECTED,
            ErrorType::SERVICE_UNAVAILABLE,
            ErrorType::CIRCUIT_BREAKER,
            ErrorType::DEPENDENCY_FAILURE,
            ErrorType::DATA_INTEGRITY,
            ErrorType::PRECONDITION_FAILED,
        ];
        static NETWORK: [ErrorType; 5] = [
            ErrorType::NETWORKING,
            ErrorType::RATE_LIMIT,
            ErrorType::TIMEOUT,
            ErrorType::CONNECTION_FAILURE,
            ErrorType::AUTHENTICATION_FAILURE,
        ];
        static SECURITY: [ErrorType; 3] = [
            ErrorType::UNAUTHORIZED,
            ErrorType::MISSING_AUTHENTICATION,
            ErrorType::FORBIDDEN,
        ];
        static RESOURCE: [ErrorType; 5] = [
            ErrorType::NOT_FOUND,
            ErrorType::SERVICE_UNAVAILABLE,
            ErrorType::RATE_LIMIT,
            ErrorType::CIRCUIT_BREAKER,
            ErrorType::DEPENDENCY_FAILURE,
        ];
        static CUSTOM: [ErrorType; 4] = [
            ErrorType::CUSTOM,
            ErrorType::FAILURE,
            ErrorType::GENERIC,
            ErrorType::EXCEPTION,
        ];

        match self {
            Self::Client => &CLIENT,
            Self::Server => &SERVER,
            Self::Network => &NETWORK,
            Self::Security => &SECURITY,
            Self::Resource => &RESOURCE,
            Self::Custom => &CUSTOM,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Severity of an error
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Priority {
    #[default]
    Unknown = 0,
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl Priority {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Numeric level, `0` for `Unknown` up to `4` for `Critical`
    pub fn level(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_type_identity_is_id() {
        let renamed = ErrorType::owned(3, "Missing");
        assert_eq!(renamed, ErrorType::NOT_FOUND);
        assert_eq!(renamed.name(), "Missing");
        assert_eq!(ErrorType::from_id(22), Some(ErrorType::TIMEOUT));
        assert_eq!(ErrorType::from_id(999), None);
    }

    #[test]
    fn test_built_in_ids_are_unique() {
        let mut ids: Vec<i32> = ErrorType::BUILT_IN.iter().map(ErrorType::id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), ErrorType::BUILT_IN.len());
    }

    #[test]
    fn test_category_membership() {
        assert!(Category::Security.error_types().contains(&ErrorType::FORBIDDEN));
        assert!(Category::Resource.error_types().contains(&ErrorType::RATE_LIMIT));
        assert!(!Category::Client.error_types().contains(&ErrorType::TIMEOUT));
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::Low > Priority::Unknown);
        assert_eq!(Priority::Medium.level(), 2);
        assert_eq!(ErrorType::DATA_INTEGRITY.default_priority(), Priority::Critical);
        assert_eq!(ErrorType::GENERIC.default_priority(), Priority::Unknown);
    }
}
