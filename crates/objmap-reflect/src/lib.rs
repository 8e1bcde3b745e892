#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # objmap-reflect
//!
//! Dynamic value model and member introspection for object mapping.
//!
//! Rust has no runtime reflection, so every type that takes part in a mapping
//! describes itself through [`Reflect`] (its shape and how it converts to and
//! from a [`Value`]) and, for composite types, through [`Record`] (its named
//! members). The [`record!`] macro derives both for plain structs.

/// Type identity and shape descriptors.
pub mod descriptor;
/// Record members and the `record!` macro.
pub mod record;
/// `Reflect` implementations for primitives and standard containers.
pub mod reflect;
/// Dynamic value representation.
pub mod value;

pub use descriptor::{PrimitiveKind, Shape, TypeDescriptor, TypeKey, TypePair};
pub use record::{Access, Member, Record};
pub use reflect::{Reflect, object_from_value};
pub use value::{ObjectValue, Value};

/// Re-exported so record definitions can name date/time members without a
/// direct `chrono` dependency.
pub use chrono;

use thiserror::Error;

/// Errors raised while moving data in and out of the dynamic value model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Unknown member '{member}' on {type_name}")]
    UnknownMember { type_name: String, member: String },

    #[error("Member '{member}' on {type_name} is not {access}")]
    AccessDenied {
        type_name: String,
        member: String,
        access: &'static str,
    },

    #[error("Value {value} is out of range for {target}")]
    OutOfRange { target: String, value: String },

    #[error("Duplicate key at entry {index} while building {type_name}")]
    DuplicateKey { type_name: String, index: usize },
}

impl Error {
    /// Build a type-mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Build an unknown-member error.
    #[must_use]
    pub fn unknown_member(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        Self::UnknownMember {
            type_name: type_name.into(),
            member: member.into(),
        }
    }

    /// Build an error for a member that cannot be read or written.
    #[must_use]
    pub fn access_denied(
        type_name: impl Into<String>,
        member: impl Into<String>,
        access: &'static str,
    ) -> Self {
        Self::AccessDenied {
            type_name: type_name.into(),
            member: member.into(),
            access,
        }
    }

    /// Build an out-of-range error.
    #[must_use]
    pub fn out_of_range(target: impl Into<String>, value: impl Into<String>) -> Self {
        Self::OutOfRange {
            target: target.into(),
            value: value.into(),
        }
    }

    /// Build a duplicate-key error for map construction.
    #[must_use]
    pub fn duplicate_key(type_name: impl Into<String>, index: usize) -> Self {
        Self::DuplicateKey {
            type_name: type_name.into(),
            index,
        }
    }
}

/// Crate-local result type for reflection operations.
pub type Result<T> = std::result::Result<T, Error>;
