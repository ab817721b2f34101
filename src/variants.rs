//! Variant storage: the `OneOf1`..`OneOf16` slot enums.
//!
//! Each `OneOfN` holds exactly one value out of `N` declared types. Where a
//! declared type appears more than once, or a type-erased value is re-homed
//! with [`Variants::from_any`], the lowest-indexed matching slot wins.

use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::fmt::Debug;

use crate::value::Value;

/// A declared set of variant types.
///
/// Implemented by the `OneOfN` enums; not meant to be implemented by hand.
pub trait Variants: Clone + Debug + PartialEq + Send + Sync + Sized + 'static {
    /// Number of declared types
    const ARITY: usize;

    /// Zero-based index of the populated slot
    fn index(&self) -> usize;

    /// Declared types in slot order
    fn type_ids() -> Vec<TypeId>;

    /// Declared type names in slot order
    fn type_names() -> Vec<&'static str>;

    /// Name of the type in the populated slot
    fn type_name(&self) -> &'static str;

    /// True when the held value counts as "no value"
    fn is_null(&self, default_as_null: bool) -> bool;

    /// The held value, type-erased
    fn as_any(&self) -> &dyn Any;

    fn into_any(self) -> Box<dyn Any + Send + Sync>;

    /// Places a type-erased value into the first slot of its type, handing
    /// it back when no declared type matches
    fn from_any(value: Box<dyn Any + Send + Sync>) -> Result<Self, Box<dyn Any + Send + Sync>>;

    fn position_of(type_id: TypeId) -> Option<usize> {
        Self::type_ids().iter().position(|t| *t == type_id)
    }

    fn declares<T: 'static>() -> bool {
        Self::position_of(TypeId::of::<T>()).is_some()
    }

    fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Compile-time membership of `T` in a declared set.
///
/// `I` is a slot marker from [`index`]; it is inferred whenever `T` is
/// declared exactly once, so callers rarely name it.
pub trait Member<T, I>: Variants {
    const INDEX: usize;

    fn inject(value: T) -> Self;

    fn project(&self) -> Option<&T>;

    fn extract(self) -> Result<T, Self>;
}

/// Slot markers used by [`Member`]
pub mod index {
    pub enum I1 {}
    pub enum I2 {}
    pub enum I3 {}
    pub enum I4 {}
    pub enum I5 {}
    pub enum I6 {}
    pub enum I7 {}
    pub enum I8 {}
    pub enum I9 {}
    pub enum I10 {}
    pub enum I11 {}
    pub enum I12 {}
    pub enum I13 {}
    pub enum I14 {}
    pub enum I15 {}
    pub enum I16 {}
}

macro_rules! one_of {
    (@members $name:ident $all:tt $($v:ident($t:ident) @ $i:ident = $n:literal),+) => {
        $( one_of!(@member $name $all $v($t) @ $i = $n); )+
    };
    (@member $name:ident [$($g:ident),+] $v:ident($t:ident) @ $i:ident = $n:literal) => {
        impl<$($g: Value),+> Member<$t, index::$i> for $name<$($g),+> {
            const INDEX: usize = $n;

            fn inject(value: $t) -> Self {
                Self::$v(value)
            }

            #[allow(unreachable_patterns)]
            fn project(&self) -> Option<&$t> {
                match self {
                    Self::$v(v) => Some(v),
                    _ => None,
                }
            }

            #[allow(unreachable_patterns)]
            fn extract(self) -> Result<$t, Self> {
                match self {
                    Self::$v(v) => Ok(v),
                    other => Err(other),
                }
            }
        }
    };
    ($name:ident / $arity:literal { $($v:ident($t:ident) @ $i:ident = $n:literal),+ $(,)? }) => {
        #[doc = concat!("Holds exactly one value out of ", stringify!($arity), " declared types.")]
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub enum $name<$($t),+> {
            $($v($t)),+
        }

        impl<$($t: Value),+> Variants for $name<$($t),+> {
            const ARITY: usize = $arity;

            fn index(&self) -> usize {
                match self {
                    $(Self::$v(_) => $n),+
                }
            }

            fn type_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$t>()),+]
            }

            fn type_names() -> Vec<&'static str> {
                vec![$(std::any::type_name::<$t>()),+]
            }

            fn type_name(&self) -> &'static str {
                match self {
                    $(Self::$v(_) => std::any::type_name::<$t>()),+
                }
            }

            fn is_null(&self, default_as_null: bool) -> bool {
                match self {
                    $(Self::$v(v) => v.is_absent() || (default_as_null && v.is_zero())),+
                }
            }

            fn as_any(&self) -> &dyn Any {
                match self {
                    $(Self::$v(v) => v as &dyn Any),+
                }
            }

            fn into_any(self) -> Box<dyn Any + Send + Sync> {
                match self {
                    $(Self::$v(v) => Box::new(v) as Box<dyn Any + Send + Sync>),+
                }
            }

            fn from_any(
                value: Box<dyn Any + Send + Sync>,
            ) -> Result<Self, Box<dyn Any + Send + Sync>> {
                $(
                    let value = match value.downcast::<$t>() {
                        Ok(v) => return Ok(Self::$v(*v)),
                        Err(value) => value,
                    };
                )+
                Err(value)
            }
        }

        one_of!(@members $name [$($t),+] $($v($t) @ $i = $n),+);
    };
}

one_of!(OneOf1 / 1 { V1(T1) @ I1 = 0 });
one_of!(OneOf2 / 2 { V1(T1) @ I1 = 0, V2(T2) @ I2 = 1 });
one_of!(OneOf3 / 3 { V1(T1) @ I1 = 0, V2(T2) @ I2 = 1, V3(T3) @ I3 = 2 });
one_of!(OneOf4 / 4 {
    V1(T1) @ I1 = 0,
    V2(T2) @ I2 = 1,
    V3(T3) @ I3 = 2,
    V4(T4) @ I4 = 3,
});
one_of!(OneOf5 / 5 {
    V1(T1) @ I1 = 0,
    V2(T2) @ I2 = 1,
    V3(T3) @ I3 = 2,
    V4(T4) @ I4 = 3,
    V5(T5) @ I5 = 4,
});
one_of!(OneOf6 / 6 {
    V1(T1) @ I1 = 0,
    V2(T2) @ I2 = 1,
    V3(T3) @ I3 = 2,
    V4(T4) @ I4 = 3,
    V5(T5) @ I5 = 4,
    V6(T6) @ I6 = 5,
});
one_of!(OneOf7 / 7 {
    V1(T1) @ I1 = 0,
    V2(T2) @ I2 = 1,
    V3(T3) @ I3 = 2,
    V4(T4) @ I4 = 3,
    V5(T5) @ I5 = 4,
    V6(T6) @ I6 = 5,
    V7(T7) @ I7 = 6,
});
one_of!(OneOf8 / 8 {
    V1(T1) @ I1 = 0,
    V2(T2) @ I2 = 1,
    V3(T3) @ I3 = 2,
    V4(T4) @ I4 = 3,
    V5(T5) @ I5 = 4,
    V6(T6) @ I6 = 5,
    V7(T7) @ I7 = 6,
    V8(T8) @ I8 = 7,
});
one_of!(OneOf9 / 9 {
    V1(T1) @ I1 = 0,
    V2(T2) @ I2 = 1,
    V3(T3) @ I3 = 2,
    V4(T4) @ I4 = 3,
    V5(T5) @ I5 = 4,
    V6(T6) @ I6 = 5,
    V7(T7) @ I7 = 6,
    V8(T8) @ I8 = 7,
    V9(T9) @ I9 = 8,
});
one_of!(OneOf10 / 10 {
    V1(T1) @ I1 = 0,
    V2(T2) @ I2 = 1,
    V3(T3) @ I3 = 2,
    V4(T4) @ I4 = 3,
    V5(T5) @ I5 = 4,
    V6(T6) @ I6 = 5,
    V7(T7) @ I7 = 6,
    V8(T8) @ I8 = 7,
    V9(T9) @ I9 = 8,
    V10(T10) @ I10 = 9,
});
one_of!(OneOf11 / 11 {
    V1(T1) @ I1 = 0,
    V2(T2) @ I2 = 1,
    V3(T3) @ I3 = 2,
    V4(T4) @ I4 = 3,
    V5(T5) @ I5 = 4,
    V6(T6) @ I6 = 5,
    V7(T7) @ I7 = 6,
    V8(T8) @ I8 = 7,
    V9(T9) @ I9 = 8,
    V10(T10) @ I10 = 9,
    V11(T11) @ I11 = 10,
});
one_of!(OneOf12 / 12 {
    V1(T1) @ I1 = 0,
    V2(T2) @ I2 = 1,
    V3(T3) @ I3 = 2,
    V4(T4) @ I4 = 3,
    V5(T5) @ I5 = 4,
    V6(T6) @ I6 = 5,
    V7(T7) @ I7 = 6,
    V8(T8) @ I8 = 7,
    V9(T9) @ I9 = 8,
    V10(T10) @ I10 = 9,
    V11(T11) @ I11 = 10,
    V12(T12) @ I12 = 11,
});
one_of!(OneOf13 / 13 {
    V1(T1) @ I1 = 0,
    V2(T2) @ I2 = 1,
    V3(T3) @ I3 = 2,
    V4(T4) @ I4 = 3,
    V5(T5) @ I5 = 4,
    V6(T6) @ I6 = 5,
    V7(T7) @ I7 = 6,
    V8(T8) @ I8 = 7,
    V9(T9) @ I9 = 8,
    V10(T10) @ I10 = 9,
    V11(T11) @ I11 = 10,
    V12(T12) @ I12 = 11,
    V13(T13) @ I13 = 12,
});
one_of!(OneOf14 / 14 {
    V1(T1) @ I1 = 0,
    V2(T2) @ I2 = 1,
    V3(T3) @ I3 = 2,
    V4(T4) @ I4 = 3,
    V5(T5) @ I5 = 4,
    V6(T6) @ I6 = 5,
    V7(T7) @ I7 = 6,
    V8(T8) @ I8 = 7,
    V9(T9) @ I9 = 8,
    V10(T10) @ I10 = 9,
    V11(T11) @ I11 = 10,
    V12(T12) @ I12 = 11,
    V13(T13) @ I13 = 12,
    V14(T14) @ I14 = 13,
});
one_of!(OneOf15 / 15 {
    V1(T1) @ I1 = 0,
    V2(T2) @ I2 = 1,
    V3(T3) @ I3 = 2,
    V4(T4) @ I4 = 3,
    V5(T5) @ I5 = 4,
    V6(T6) @ I6 = 5,
    V7(T7) @ I7 = 6,
    V8(T8) @ I8 = 7,
    V9(T9) @ I9 = 8,
    V10(T10) @ I10 = 9,
    V11(T11) @ I11 = 10,
    V12(T12) @ I12 = 11,
    V13(T13) @ I13 = 12,
    V14(T14) @ I14 = 13,
    V15(T15) @ I15 = 14,
});
one_of!(OneOf16 / 16 {
    V1(T1) @ I1 = 0,
    V2(T2) @ I2 = 1,
    V3(T3) @ I3 = 2,
    V4(T4) @ I4 = 3,
    V5(T5) @ I5 = 4,
    V6(T6) @ I6 = 5,
    V7(T7) @ I7 = 6,
    V8(T8) @ I8 = 7,
    V9(T9) @ I9 = 8,
    V10(T10) @ I10 = 9,
    V11(T11) @ I11 = 10,
    V12(T12) @ I12 = 11,
    V13(T13) @ I13 = 12,
    V14(T14) @ I14 = 13,
    V15(T15) @ I15 = 14,
    V16(T16) @ I16 = 15,
});
