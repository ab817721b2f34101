use std::any::{Any, TypeId};

/// A type-erased value that remembers what it was.
///
/// Backs the matched-item mailbox, where a handler's return value waits
/// until the caller reads it back as a concrete type.
#[derive(Debug)]
pub(crate) struct AnyValue {
    type_id: TypeId,
    type_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

impl AnyValue {
    pub(crate) fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            value: Box::new(value),
        }
    }

    pub(crate) fn is_type<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Unwraps into `T`, handing the value back untouched on a mismatch
    pub(crate) fn downcast<T: 'static>(self) -> Result<T, Self> {
        if !self.is_type::<T>() {
            return Err(self);
        }
        let Self {
            type_id,
            type_name,
            value,
        } = self;
        value.downcast::<T>().map(|v| *v).map_err(|value| Self {
            type_id,
            type_name,
            value,
        })
    }

    pub(crate) fn into_inner(self) -> Box<dyn Any + Send + Sync> {
        self.value
    }
}
