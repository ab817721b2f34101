use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// A type that can occupy a variant slot of an [`Outcome`](crate::Outcome).
///
/// The two predicates decide whether a value counts as "no value":
/// `is_absent` is always honored, `is_zero` only when the
/// `default_as_null` policy is on.
///
/// Types without a meaningful absent or zero value opt in with an empty impl:
///
/// ```
/// use sovran_outcome::Value;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct User {
///     name: String,
/// }
///
/// impl Value for User {}
/// ```
pub trait Value: Any + Clone + Debug + PartialEq + Send + Sync {
    /// True when the value represents absence (`None`, JSON `null`)
    fn is_absent(&self) -> bool {
        false
    }

    /// True when the value equals its type's zero value
    fn is_zero(&self) -> bool {
        false
    }
}

macro_rules! zero_value {
    ($zero:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl Value for $ty {
                fn is_zero(&self) -> bool {
                    *self == $zero
                }
            }
        )+
    };
}

zero_value!(0 => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
zero_value!(0.0 => f32, f64);
zero_value!(false => bool);
zero_value!('\0' => char);
zero_value!(Duration::ZERO => Duration);

impl Value for () {
    fn is_zero(&self) -> bool {
        true
    }
}

impl Value for String {}

impl Value for &'static str {}

impl<T: Value> Value for Option<T> {
    fn is_absent(&self) -> bool {
        self.is_none()
    }
}

impl<T: Value> Value for Vec<T> {}

impl<T: Value> Value for Box<T> {
    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }

    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }
}

impl<T: Value> Value for Arc<T> {
    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }

    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }
}

impl<K, V> Value for HashMap<K, V>
where
    K: Value + Eq + Hash,
    V: Value,
{
}

impl<K, V> Value for BTreeMap<K, V>
where
    K: Value + Ord,
    V: Value,
{
}

impl Value for serde_json::Value {
    fn is_absent(&self) -> bool {
        self.is_null()
    }
}

impl Value for DateTime<Utc> {
    fn is_zero(&self) -> bool {
        *self == DateTime::<Utc>::default()
    }
}
