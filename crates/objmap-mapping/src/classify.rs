//! Type classification
//!
//! Pure decision table over [`TypeDescriptor`]s: given a source and a
//! destination type, decide which automatic mapping strategy applies. Nothing
//! here converts values; every function is total and side-effect free.

use objmap_reflect::{PrimitiveKind, Shape, TypeDescriptor};

/// Strategy chosen for a `(source, destination)` type pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classification<'a> {
    /// Same type: copy the value as is
    Identical,

    /// Both primitive, neither side textual
    Convertible { from: PrimitiveKind, to: PrimitiveKind },

    /// Exactly one side is `String`, the other a primitive
    StringCoercion { from: PrimitiveKind, to: PrimitiveKind },

    /// At least one side is `Option<_>`; the inner types are classified again
    Optional {
        source: &'a TypeDescriptor,
        destination: &'a TypeDescriptor,
        source_optional: bool,
        destination_optional: bool,
    },

    /// Both key/value containers
    Dictionary {
        source_key: &'a TypeDescriptor,
        source_value: &'a TypeDescriptor,
        destination_key: &'a TypeDescriptor,
        destination_value: &'a TypeDescriptor,
    },

    /// Both single-element-type containers
    Sequence {
        source_element: &'a TypeDescriptor,
        destination_element: &'a TypeDescriptor,
    },

    /// Both records: delegate to the mapper registered for the pair
    Nested,

    /// No automatic strategy exists
    Unsupported,
}

/// True if both types are primitive (numeric, bool, char, string, date/time).
#[must_use]
pub fn is_convertible_pair(source: &TypeDescriptor, destination: &TypeDescriptor) -> bool {
    source.primitive_kind().is_some() && destination.primitive_kind().is_some()
}

/// Key and value types of two dictionary-shaped types, in the order
/// `(source key, source value, destination key, destination value)`.
#[must_use]
pub fn dictionary_pair<'a>(
    source: &'a TypeDescriptor,
    destination: &'a TypeDescriptor,
) -> Option<(
    &'a TypeDescriptor,
    &'a TypeDescriptor,
    &'a TypeDescriptor,
    &'a TypeDescriptor,
)> {
    match (source.shape(), destination.shape()) {
        (
            Shape::Dictionary {
                key: source_key,
                value: source_value,
            },
            Shape::Dictionary {
                key: destination_key,
                value: destination_value,
            },
        ) => Some((
            source_key,
            source_value,
            destination_key,
            destination_value,
        )),
        _ => None,
    }
}

/// True if both types are dictionary-shaped. Key and value compatibility is
/// not inspected.
#[must_use]
pub fn is_dictionary_pair(source: &TypeDescriptor, destination: &TypeDescriptor) -> bool {
    dictionary_pair(source, destination).is_some()
}

/// Element types of two sequence-shaped types. Opaque iterables have no
/// discoverable element type and never qualify.
#[must_use]
pub fn sequence_pair<'a>(
    source: &'a TypeDescriptor,
    destination: &'a TypeDescriptor,
) -> Option<(&'a TypeDescriptor, &'a TypeDescriptor)> {
    match (source.shape(), destination.shape()) {
        (
            Shape::Sequence {
                element: source_element,
            },
            Shape::Sequence {
                element: destination_element,
            },
        ) => Some((source_element, destination_element)),
        _ => None,
    }
}

#[must_use]
pub fn is_sequence_pair(source: &TypeDescriptor, destination: &TypeDescriptor) -> bool {
    sequence_pair(source, destination).is_some()
}

/// True for the fixed-width integer kinds (`i8`..`i64`, `u8`..`u64`).
#[must_use]
pub fn is_integer_type(descriptor: &TypeDescriptor) -> bool {
    descriptor
        .primitive_kind()
        .is_some_and(PrimitiveKind::is_integer)
}

/// True only for `String` (a `char` is not a string).
#[must_use]
pub fn is_string_type(descriptor: &TypeDescriptor) -> bool {
    descriptor.primitive_kind() == Some(PrimitiveKind::String)
}

fn unwrap_optional(descriptor: &TypeDescriptor) -> (&TypeDescriptor, bool) {
    match descriptor.shape() {
        Shape::Optional(inner) => (inner, true),
        _ => (descriptor, false),
    }
}

/// Classify a `(source, destination)` pair.
///
/// Precedence: identical, optional, string coercion, primitive conversion,
/// dictionary, sequence, nested record, unsupported.
#[must_use]
pub fn classify<'a>(
    source: &'a TypeDescriptor,
    destination: &'a TypeDescriptor,
) -> Classification<'a> {
    if source.id() == destination.id() {
        return Classification::Identical;
    }

    let (source_inner, source_optional) = unwrap_optional(source);
    let (destination_inner, destination_optional) = unwrap_optional(destination);
    if source_optional || destination_optional {
        return Classification::Optional {
            source: source_inner,
            destination: destination_inner,
            source_optional,
            destination_optional,
        };
    }

    if let (Some(from), Some(to)) = (source.primitive_kind(), destination.primitive_kind()) {
        return if is_string_type(source) != is_string_type(destination) {
            Classification::StringCoercion { from, to }
        } else {
            Classification::Convertible { from, to }
        };
    }

    if let Some((source_key, source_value, destination_key, destination_value)) =
        dictionary_pair(source, destination)
    {
        return Classification::Dictionary {
            source_key,
            source_value,
            destination_key,
            destination_value,
        };
    }

    if let Some((source_element, destination_element)) = sequence_pair(source, destination) {
        return Classification::Sequence {
            source_element,
            destination_element,
        };
    }

    if source.is_object() && destination.is_object() {
        return Classification::Nested;
    }

    Classification::Unsupported
}
