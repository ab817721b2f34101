use serde::{Deserialize, Serialize};
use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Type name recorded for failures that arrived as a panic
pub const PANIC_TYPE_NAME: &str = "panic";

/// A captured failure: an error value returned by user code, or a panic.
///
/// The live cause is shared, so cloning an `Exception` is cheap. Only the
/// type name and message survive serialization.
#[derive(Clone, Serialize, Deserialize)]
pub struct Exception {
    type_name: String,
    message: String,
    #[serde(skip)]
    cause: Option<Arc<dyn StdError + Send + Sync + 'static>>,
}

impl Exception {
    /// Captures an error, recording its concrete type name
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            type_name: std::any::type_name::<E>().to_string(),
            message: error.to_string(),
            cause: Some(Arc::new(error)),
        }
    }

    /// Captures an already boxed error. The concrete type name is not
    /// recoverable, but `downcast_ref` still sees the original value.
    pub fn from_boxed(error: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        Self {
            type_name: std::any::type_name::<Box<dyn StdError + Send + Sync>>().to_string(),
            message: error.to_string(),
            cause: Some(Arc::from(error)),
        }
    }

    /// Captures the payload of a caught panic
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic with a non-string payload".to_string()
        };

        Self {
            type_name: PANIC_TYPE_NAME.to_string(),
            message,
            cause: None,
        }
    }

    /// An exception with only a type name and message, e.g. one restored
    /// from a serialized form
    pub fn detached(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            cause: None,
        }
    }

    /// Exact type name of the failure, or `"panic"` for a caught panic
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The failure's display text, or the panic message
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_outcome::Exception;
    ///
    /// let exception = Exception::new("x".parse::<u8>().unwrap_err());
    /// assert_eq!(exception.message(), "invalid digit found in string");
    /// assert!(!exception.is_panic());
    /// ```
    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when this was captured from a panic
    pub fn is_panic(&self) -> bool {
        self.type_name == PANIC_TYPE_NAME
    }

    /// The original error, when it is still attached
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// The attached cause as `E`
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.cause.as_deref()?.downcast_ref::<E>()
    }

    pub fn is<E: StdError + 'static>(&self) -> bool {
        self.downcast_ref::<E>().is_some()
    }
}

impl PartialEq for Exception {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.message == other.message
    }
}

impl fmt::Debug for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exception")
            .field("type_name", &self.type_name)
            .field("message", &self.message)
            .field("attached", &self.cause.is_some())
            .finish()
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)
    }
}

impl StdError for Exception {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_deref().map(|e| e as &(dyn StdError + 'static))
    }
}
