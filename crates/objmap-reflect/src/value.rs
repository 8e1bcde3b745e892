//! Dynamic values exchanged between reflected types

use crate::descriptor::{PrimitiveKind, TypeKey};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A value read from, or about to be written to, a reflected member
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value (`None`)
    Null,

    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),

    /// Dictionary entries, in source iteration order
    Map(Vec<(Value, Value)>),

    /// Sequence elements, in source iteration order
    Seq(Vec<Value>),

    /// A record or opaque instance
    Object(ObjectValue),
}

impl Value {
    /// Short description of the value's kind, used in mismatch errors
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Map(_) => "map",
            Value::Seq(_) => "sequence",
            Value::Object(object) => object.type_key().name(),
            other => other.primitive_kind().map_or("value", PrimitiveKind::name),
        }
    }

    /// Primitive kind carried by this value, if it is a scalar
    #[must_use]
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        let kind = match self {
            Value::Bool(_) => PrimitiveKind::Bool,
            Value::Char(_) => PrimitiveKind::Char,
            Value::I8(_) => PrimitiveKind::I8,
            Value::I16(_) => PrimitiveKind::I16,
            Value::I32(_) => PrimitiveKind::I32,
            Value::I64(_) => PrimitiveKind::I64,
            Value::U8(_) => PrimitiveKind::U8,
            Value::U16(_) => PrimitiveKind::U16,
            Value::U32(_) => PrimitiveKind::U32,
            Value::U64(_) => PrimitiveKind::U64,
            Value::F32(_) => PrimitiveKind::F32,
            Value::F64(_) => PrimitiveKind::F64,
            Value::String(_) => PrimitiveKind::String,
            Value::Date(_) => PrimitiveKind::Date,
            Value::Time(_) => PrimitiveKind::Time,
            Value::DateTime(_) => PrimitiveKind::DateTime,
            Value::Null | Value::Map(_) | Value::Seq(_) | Value::Object(_) => return None,
        };
        Some(kind)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }
}

/// Shared, type-erased handle to a record or opaque instance.
///
/// Cloning the handle shares the instance; [`ObjectValue::identity`] is the
/// address of the instance and stays stable across clones.
#[derive(Clone)]
pub struct ObjectValue {
    key: TypeKey,
    inner: Arc<dyn Any + Send + Sync>,
}

impl ObjectValue {
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            inner: Arc::new(value),
        }
    }

    /// Wrap an already boxed instance whose dynamic type is `key`
    #[must_use]
    pub fn from_boxed(key: TypeKey, boxed: Box<dyn Any + Send + Sync>) -> Self {
        Self {
            key,
            inner: Arc::from(boxed),
        }
    }

    #[must_use]
    pub fn type_key(&self) -> TypeKey {
        self.key
    }

    /// Address of the shared instance
    #[must_use]
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner).cast::<()>() as usize
    }

    #[must_use]
    pub fn as_any(&self) -> &(dyn Any + Send + Sync) {
        &*self.inner
    }

    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.inner).downcast_ref::<T>()
    }

    /// Take the instance out as `T`, cloning only if the handle is shared.
    ///
    /// # Errors
    ///
    /// Returns the handle unchanged if the instance is not a `T`.
    pub fn into_inner<T: Any + Send + Sync + Clone>(self) -> std::result::Result<T, Self> {
        let key = self.key;
        match Arc::downcast::<T>(self.inner) {
            Ok(shared) => Ok(Arc::try_unwrap(shared).unwrap_or_else(|shared| (*shared).clone())),
            Err(inner) => Err(Self { key, inner }),
        }
    }
}

impl PartialEq for ObjectValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectValue({}@{:#x})", self.key, self.identity())
    }
}
