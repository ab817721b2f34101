use crate::error::OutcomeError;
use crate::errors::Error;
use crate::exception::Exception;
use crate::kind::ErrorType;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

/// A thread-safe map shared by clones.
///
/// Backs the converter and handler registries. Entries are meant to be
/// registered at startup and only read afterwards, but every access is
/// locked so late registration is still sound.
#[derive(Debug)]
pub struct Registry<K, V>
where
    K: Clone + Eq + Hash + Debug,
    V: Clone + Send + Sync,
{
    items: Arc<Mutex<HashMap<K, V>>>,
}

impl<K, V> Registry<K, V>
where
    K: Clone + Eq + Hash + Debug,
    V: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Stores an entry, returning the one it replaced
    ///
    /// # Errors
    ///
    /// Returns `OutcomeError::LockError` if the internal lock cannot be acquired.
    pub fn set(&self, key: K, value: V) -> Result<Option<V>, OutcomeError> {
        let mut items = self.items.lock().map_err(|_| OutcomeError::LockError)?;
        Ok(items.insert(key, value))
    }

    /// Clones an entry out of the registry so it can be used without
    /// holding the lock
    ///
    /// # Errors
    ///
    /// Returns `OutcomeError::LockError` if the internal lock cannot be acquired.
    pub fn get(&self, key: &K) -> Result<Option<V>, OutcomeError> {
        let items = self.items.lock().map_err(|_| OutcomeError::LockError)?;
        Ok(items.get(key).cloned())
    }

    /// # Errors
    ///
    /// Returns `OutcomeError::LockError` if the internal lock cannot be acquired.
    pub fn remove(&self, key: &K) -> Result<bool, OutcomeError> {
        let mut items = self.items.lock().map_err(|_| OutcomeError::LockError)?;
        Ok(items.remove(key).is_some())
    }

    /// # Errors
    ///
    /// Returns `OutcomeError::LockError` if the internal lock cannot be acquired.
    pub fn contains_key(&self, key: &K) -> Result<bool, OutcomeError> {
        let items = self.items.lock().map_err(|_| OutcomeError::LockError)?;
        Ok(items.contains_key(key))
    }

    /// # Errors
    ///
    /// Returns `OutcomeError::LockError` if the internal lock cannot be acquired.
    pub fn len(&self) -> Result<usize, OutcomeError> {
        let items = self.items.lock().map_err(|_| OutcomeError::LockError)?;
        Ok(items.len())
    }

    /// # Errors
    ///
    /// Returns `OutcomeError::LockError` if the internal lock cannot be acquired.
    pub fn is_empty(&self) -> Result<bool, OutcomeError> {
        let items = self.items.lock().map_err(|_| OutcomeError::LockError)?;
        Ok(items.is_empty())
    }

    /// # Errors
    ///
    /// Returns `OutcomeError::LockError` if the internal lock cannot be acquired.
    pub fn keys(&self) -> Result<Vec<K>, OutcomeError> {
        let items = self.items.lock().map_err(|_| OutcomeError::LockError)?;
        Ok(items.keys().cloned().collect())
    }
}

impl<K, V> Default for Registry<K, V>
where
    K: Clone + Eq + Hash + Debug,
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

type ConvertFn = Arc<dyn Fn(&Exception) -> Option<Error> + Send + Sync>;

/// A registered exception-to-error conversion
#[derive(Clone)]
pub struct Converter {
    error_type: ErrorType,
    convert: ConvertFn,
}

impl Converter {
    /// The error type every converted error carries
    pub fn error_type(&self) -> &ErrorType {
        &self.error_type
    }

    /// Runs the conversion. The produced error always carries the
    /// registered error type.
    pub fn convert(&self, exception: &Exception) -> Option<Error> {
        (self.convert)(exception).map(|e| e.with_error_type(self.error_type.clone()))
    }
}

impl Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("error_type", &self.error_type)
            .finish_non_exhaustive()
    }
}

/// Maps the exact type name of a failure to the error it becomes.
#[derive(Debug, Default)]
pub struct ConverterRegistry {
    entries: Registry<String, Converter>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a conversion for failures of exactly type `E`
    ///
    /// # Errors
    ///
    /// Returns `OutcomeError::LockError` if the internal lock cannot be acquired.
    pub fn register<E, F>(&self, error_type: ErrorType, convert: F) -> Result<(), OutcomeError>
    where
        E: StdError + 'static,
        F: Fn(&E) -> Error + Send + Sync + 'static,
    {
        let convert: ConvertFn = Arc::new(move |exception: &Exception| {
            exception.downcast_ref::<E>().map(&convert)
        });
        self.insert(std::any::type_name::<E>(), error_type, convert)
    }

    /// Registers a conversion by type name, for failures that carry no
    /// concrete error value, such as panics (`"panic"`)
    ///
    /// # Errors
    ///
    /// Returns `OutcomeError::LockError` if the internal lock cannot be acquired.
    pub fn register_named<F>(
        &self,
        type_name: impl Into<String>,
        error_type: ErrorType,
        convert: F,
    ) -> Result<(), OutcomeError>
    where
        F: Fn(&Exception) -> Error + Send + Sync + 'static,
    {
        let convert: ConvertFn = Arc::new(move |exception: &Exception| Some(convert(exception)));
        self.insert(type_name, error_type, convert)
    }

    fn insert(
        &self,
        type_name: impl Into<String>,
        error_type: ErrorType,
        convert: ConvertFn,
    ) -> Result<(), OutcomeError> {
        let type_name = type_name.into();
        if self
            .entries
            .set(type_name.clone(), Converter { error_type, convert })?
            .is_some()
        {
            tracing::debug!(%type_name, "replaced exception converter");
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `OutcomeError::LockError` if the internal lock cannot be acquired.
    pub fn get(&self, type_name: &str) -> Result<Option<Converter>, OutcomeError> {
        self.entries.get(&type_name.to_string())
    }

    /// # Errors
    ///
    /// Returns `OutcomeError::LockError` if the internal lock cannot be acquired.
    pub fn remove(&self, type_name: &str) -> Result<bool, OutcomeError> {
        self.entries.remove(&type_name.to_string())
    }

    /// # Errors
    ///
    /// Returns `OutcomeError::LockError` if the internal lock cannot be acquired.
    pub fn len(&self) -> Result<usize, OutcomeError> {
        self.entries.len()
    }

    /// # Errors
    ///
    /// Returns `OutcomeError::LockError` if the internal lock cannot be acquired.
    pub fn is_empty(&self) -> Result<bool, OutcomeError> {
        self.entries.is_empty()
    }

    /// Converts an exception with the converter registered for its exact
    /// type name. `Ok(None)` means no converter applies.
    ///
    /// # Errors
    ///
    /// Returns `OutcomeError::LockError` if the internal lock cannot be acquired.
    pub fn convert(&self, exception: &Exception) -> Result<Option<Error>, OutcomeError> {
        let converter = self.get(exception.type_name())?;
        Ok(converter.and_then(|c| c.convert(exception)))
    }
}

type HandleFn = Arc<dyn Fn(&Error) + Send + Sync>;

/// Maps an error-type name to the action run for errors nobody handled
/// locally.
#[derive(Default)]
pub struct HandlerRegistry {
    entries: Registry<String, HandleFn>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns `OutcomeError::LockError` if the internal lock cannot be acquired.
    pub fn register<F>(&self, error_type: &ErrorType, handler: F) -> Result<(), OutcomeError>
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.entries
            .set(error_type.name().to_string(), Arc::new(handler))?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `OutcomeError::LockError` if the internal lock cannot be acquired.
    pub fn remove(&self, error_type: &ErrorType) -> Result<bool, OutcomeError> {
        self.entries.remove(&error_type.name().to_string())
    }

    /// # Errors
    ///
    /// Returns `OutcomeError::LockError` if the internal lock cannot be acquired.
    pub fn contains(&self, error_type: &ErrorType) -> Result<bool, OutcomeError> {
        self.entries.contains_key(&error_type.name().to_string())
    }

    /// # Errors
    ///
    /// Returns `OutcomeError::LockError` if the internal lock cannot be acquired.
    pub fn len(&self) -> Result<usize, OutcomeError> {
        self.entries.len()
    }

    /// # Errors
    ///
    /// Returns `OutcomeError::LockError` if the internal lock cannot be acquired.
    pub fn is_empty(&self) -> Result<bool, OutcomeError> {
        self.entries.is_empty()
    }

    /// Runs the handler registered for the error's type. Returns whether
    /// one was found.
    ///
    /// # Errors
    ///
    /// Returns `OutcomeError::LockError` if the internal lock cannot be acquired.
    pub fn handle(&self, error: &Error) -> Result<bool, OutcomeError> {
        match self.entries.get(&error.error_type().name().to_string())? {
            Some(handler) => {
                handler(error);
                Ok(true)
            }
            None => {
                tracing::debug!(error_type = %error.error_type(), "no handler registered");
                Ok(false)
            }
        }
    }
}

impl Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys = self.entries.keys().unwrap_or_default();
        f.debug_struct("HandlerRegistry").field("error_types", &keys).finish()
    }
}
