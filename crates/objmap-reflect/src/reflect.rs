//! The `Reflect` trait and its implementations for std types

use crate::descriptor::{PrimitiveKind, TypeDescriptor};
use crate::value::{ObjectValue, Value};
use crate::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::any::Any;
use std::collections::hash_map;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque, btree_map};
use std::hash::{BuildHasher, Hash};

/// A type that can describe its shape and move through the dynamic [`Value`] model.
///
/// `from_value` is strict: it accepts only values of the type's own kind.
/// Converting between kinds is the mapping engine's job.
pub trait Reflect: Sized + Send + Sync + 'static {
    /// Identity and shape of the type
    fn descriptor() -> TypeDescriptor;

    /// Read this instance as a dynamic value
    fn to_value(&self) -> Value;

    /// Rebuild an instance from a dynamic value
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not have this type's kind.
    fn from_value(value: Value) -> Result<Self>;
}

/// Extract an object-shaped value as `T`.
///
/// # Errors
///
/// Returns a type mismatch if the value is not an object holding a `T`.
pub fn object_from_value<T: Any + Send + Sync + Clone>(value: Value) -> Result<T> {
    match value {
        Value::Object(object) => object.into_inner::<T>().map_err(|object| {
            Error::type_mismatch(std::any::type_name::<T>(), object.type_key().name())
        }),
        other => Err(Error::type_mismatch(
            std::any::type_name::<T>(),
            other.kind_name(),
        )),
    }
}

macro_rules! impl_primitive {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::primitive::<$ty>(PrimitiveKind::$kind)
                }

                #[allow(clippy::clone_on_copy)]
                fn to_value(&self) -> Value {
                    Value::$kind(self.clone())
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::$kind(inner) => Ok(inner),
                        other => Err(Error::type_mismatch(
                            PrimitiveKind::$kind.name(),
                            other.kind_name(),
                        )),
                    }
                }
            }
        )*
    };
}

impl_primitive!(
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => DateTime,
);

// Pointer-sized integers travel as their 64-bit counterparts.

impl Reflect for usize {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::primitive::<usize>(PrimitiveKind::U64)
    }

    fn to_value(&self) -> Value {
        Value::U64(*self as u64)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::U64(inner) => {
                usize::try_from(inner).map_err(|_| Error::out_of_range("usize", inner.to_string()))
            }
            other => Err(Error::type_mismatch("u64", other.kind_name())),
        }
    }
}

impl Reflect for isize {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::primitive::<isize>(PrimitiveKind::I64)
    }

    fn to_value(&self) -> Value {
        Value::I64(*self as i64)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::I64(inner) => {
                isize::try_from(inner).map_err(|_| Error::out_of_range("isize", inner.to_string()))
            }
            other => Err(Error::type_mismatch("i64", other.kind_name())),
        }
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::optional::<Self>(T::descriptor())
    }

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// `Box<T>` is transparent: it reports `T`'s descriptor so a boxed member
/// maps exactly like an inline one.
impl<T: Reflect> Reflect for Box<T> {
    fn descriptor() -> TypeDescriptor {
        T::descriptor()
    }

    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn from_value(value: Value) -> Result<Self> {
        T::from_value(value).map(Box::new)
    }
}

fn expect_seq(value: Value, expected: &str) -> Result<Vec<Value>> {
    match value {
        Value::Seq(items) => Ok(items),
        other => Err(Error::type_mismatch(expected, other.kind_name())),
    }
}

fn expect_map(value: Value, expected: &str) -> Result<Vec<(Value, Value)>> {
    match value {
        Value::Map(entries) => Ok(entries),
        other => Err(Error::type_mismatch(expected, other.kind_name())),
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::sequence::<Self>(T::descriptor())
    }

    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(Reflect::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        expect_seq(value, "sequence")?
            .into_iter()
            .map(T::from_value)
            .collect()
    }
}

impl<T: Reflect> Reflect for VecDeque<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::sequence::<Self>(T::descriptor())
    }

    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(Reflect::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        expect_seq(value, "sequence")?
            .into_iter()
            .map(T::from_value)
            .collect()
    }
}

impl<T: Reflect + Ord> Reflect for BTreeSet<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::sequence::<Self>(T::descriptor())
    }

    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(Reflect::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        expect_seq(value, "sequence")?
            .into_iter()
            .map(T::from_value)
            .collect()
    }
}

impl<T, H> Reflect for HashSet<T, H>
where
    T: Reflect + Eq + Hash,
    H: BuildHasher + Default + Send + Sync + 'static,
{
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::sequence::<Self>(T::descriptor())
    }

    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(Reflect::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        expect_seq(value, "sequence")?
            .into_iter()
            .map(T::from_value)
            .collect()
    }
}

impl<K, V, H> Reflect for HashMap<K, V, H>
where
    K: Reflect + Eq + Hash,
    V: Reflect,
    H: BuildHasher + Default + Send + Sync + 'static,
{
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::dictionary::<Self>(K::descriptor(), V::descriptor())
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(key, value)| (key.to_value(), value.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self> {
        let entries = expect_map(value, "map")?;
        let mut map = HashMap::with_capacity_and_hasher(entries.len(), H::default());
        for (index, (key, value)) in entries.into_iter().enumerate() {
            match map.entry(K::from_value(key)?) {
                hash_map::Entry::Occupied(_) => {
                    return Err(Error::duplicate_key(std::any::type_name::<Self>(), index));
                }
                hash_map::Entry::Vacant(slot) => {
                    slot.insert(V::from_value(value)?);
                }
            }
        }
        Ok(map)
    }
}

impl<K: Reflect + Ord, V: Reflect> Reflect for BTreeMap<K, V> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::dictionary::<Self>(K::descriptor(), V::descriptor())
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(key, value)| (key.to_value(), value.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self> {
        let entries = expect_map(value, "map")?;
        let mut map = BTreeMap::new();
        for (index, (key, value)) in entries.into_iter().enumerate() {
            match map.entry(K::from_value(key)?) {
                btree_map::Entry::Occupied(_) => {
                    return Err(Error::duplicate_key(std::any::type_name::<Self>(), index));
                }
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(V::from_value(value)?);
                }
            }
        }
        Ok(map)
    }
}

/// JSON documents are iterable but carry no element type, so they are opaque
/// and only ever copied as a whole.
impl Reflect for serde_json::Value {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::opaque::<Self>()
    }

    fn to_value(&self) -> Value {
        Value::Object(ObjectValue::new(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self> {
        object_from_value(value)
    }
}
