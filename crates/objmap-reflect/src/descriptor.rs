//! Type identity and shape descriptors
#![allow(clippy::must_use_candidate)] // Small accessors read clearly without #[must_use].

use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Runtime identity of a Rust type.
///
/// Equality and hashing use the [`TypeId`] only; the name is carried for
/// error messages and logs.
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for the type `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Key built from an already known id, e.g. the dynamic type of a `&dyn Any`
    pub fn from_parts(id: TypeId, name: &'static str) -> Self {
        Self { id, name }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A `(source, destination)` type pair, the key mappers are registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypePair {
    pub source: TypeKey,
    pub destination: TypeKey,
}

impl TypePair {
    pub fn new(source: TypeKey, destination: TypeKey) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Pair for the static types `S` and `D`
    pub fn of<S: ?Sized + 'static, D: ?Sized + 'static>() -> Self {
        Self::new(TypeKey::of::<S>(), TypeKey::of::<D>())
    }
}

impl fmt::Display for TypePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}

/// Scalar kinds with a well-defined conversion to and from each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
    Date,
    Time,
    DateTime,
}

impl PrimitiveKind {
    /// Fixed-width signed and unsigned integers (floats excluded)
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
                | Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_string(self) -> bool {
        self == Self::String
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, Self::Date | Self::Time | Self::DateTime)
    }

    /// Lower-case name used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char => "char",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::String => "string",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Structural shape of a type, as far as mapping is concerned
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Scalar value
    Primitive(PrimitiveKind),

    /// Nullable wrapper around another type
    Optional(Box<TypeDescriptor>),

    /// Key/value container
    Dictionary {
        key: Box<TypeDescriptor>,
        value: Box<TypeDescriptor>,
    },

    /// Iterable container with a single element type
    Sequence { element: Box<TypeDescriptor> },

    /// Composite type exposing named members
    Object,

    /// Type whose structure cannot be inspected (e.g. untyped collections)
    Opaque,
}

/// Identity plus shape of a reflected type.
///
/// Object descriptors do not list their members, so a type that contains
/// itself still has a finite descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    key: TypeKey,
    shape: Shape,
}

impl TypeDescriptor {
    pub fn new(key: TypeKey, shape: Shape) -> Self {
        Self { key, shape }
    }

    pub fn primitive<T: 'static>(kind: PrimitiveKind) -> Self {
        Self::new(TypeKey::of::<T>(), Shape::Primitive(kind))
    }

    pub fn optional<T: 'static>(inner: TypeDescriptor) -> Self {
        Self::new(TypeKey::of::<T>(), Shape::Optional(Box::new(inner)))
    }

    pub fn dictionary<T: 'static>(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::new(
            TypeKey::of::<T>(),
            Shape::Dictionary {
                key: Box::new(key),
                value: Box::new(value),
            },
        )
    }

    pub fn sequence<T: 'static>(element: TypeDescriptor) -> Self {
        Self::new(
            TypeKey::of::<T>(),
            Shape::Sequence {
                element: Box::new(element),
            },
        )
    }

    pub fn object<T: 'static>() -> Self {
        Self::new(TypeKey::of::<T>(), Shape::Object)
    }

    pub fn opaque<T: 'static>() -> Self {
        Self::new(TypeKey::of::<T>(), Shape::Opaque)
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn id(&self) -> TypeId {
        self.key.id()
    }

    pub fn name(&self) -> &'static str {
        self.key.name()
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Primitive kind, if this is a scalar type
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self.shape {
            Shape::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self.shape, Shape::Object)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
