use thiserror::Error;

/// Errors returned by the container's own operations.
///
/// These never describe a failure of user code. Those are captured inside
/// an [`Outcome`](crate::Outcome) as [`Error`](crate::Error) records.
#[derive(Debug, Error)]
pub enum OutcomeError {
    /// Failed to acquire a registry lock
    #[error("Failed to acquire lock")]
    LockError,
    /// The requested type is not the type currently held
    #[error("Type mismatch: expected {expected}")]
    TypeMismatch {
        /// Name of the type that was asked for
        expected: &'static str,
    },
    /// A value's type is not part of the declared variant set
    #[error("Type {0} is not declared by this container")]
    NotDeclared(&'static str),
    /// The target variant set does not contain every source type
    #[error("Target variant set does not include {missing}")]
    NotSuperset {
        /// First source type absent from the target set
        missing: &'static str,
    },
    /// Invalid configuration input
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// Serialization or deserialization failed
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(OutcomeError::LockError.to_string(), "Failed to acquire lock");
        assert_eq!(
            OutcomeError::TypeMismatch { expected: "i32" }.to_string(),
            "Type mismatch: expected i32"
        );
        assert_eq!(
            OutcomeError::NotSuperset { missing: "alloc::string::String" }.to_string(),
            "Target variant set does not include alloc::string::String"
        );
        assert!(format!("{:?}", OutcomeError::LockError).contains("LockError"));
    }
}
