//! Records: composite types with named members

use crate::Result;
use crate::descriptor::TypeDescriptor;
use crate::reflect::Reflect;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// How a member may be used by a mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    ReadWrite,
    ReadOnly,
    WriteOnly,
}

impl Access {
    #[must_use]
    pub fn is_readable(self) -> bool {
        matches!(self, Access::ReadWrite | Access::ReadOnly)
    }

    #[must_use]
    pub fn is_writable(self) -> bool {
        matches!(self, Access::ReadWrite | Access::WriteOnly)
    }
}

/// A named member of a record
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: &'static str,
    pub descriptor: TypeDescriptor,
    pub access: Access,
}

impl Member {
    #[must_use]
    pub fn new(name: &'static str, descriptor: TypeDescriptor, access: Access) -> Self {
        Self {
            name,
            descriptor,
            access,
        }
    }

    #[must_use]
    pub fn read_write<T: Reflect>(name: &'static str) -> Self {
        Self::new(name, T::descriptor(), Access::ReadWrite)
    }

    #[must_use]
    pub fn read_only<T: Reflect>(name: &'static str) -> Self {
        Self::new(name, T::descriptor(), Access::ReadOnly)
    }

    #[must_use]
    pub fn write_only<T: Reflect>(name: &'static str) -> Self {
        Self::new(name, T::descriptor(), Access::WriteOnly)
    }
}

/// A composite type whose members can be enumerated, read and written by name.
///
/// `Default` is how mapping constructs a destination; `Clone` is how a record
/// nested inside another one is read out as a [`Value::Object`].
pub trait Record: Reflect + Default + Clone {
    /// Members in declaration order
    fn members() -> Vec<Member>;

    /// Read a readable member; `None` if no such readable member exists
    fn get(&self, name: &str) -> Option<Value>;

    /// Write a writable member
    ///
    /// # Errors
    ///
    /// Returns an error if the member is unknown, not writable, or the value
    /// does not have the member's type.
    fn set(&mut self, name: &str, value: Value) -> Result<()>;

    /// Look up one member by name
    #[must_use]
    fn member(name: &str) -> Option<Member> {
        Self::members().into_iter().find(|member| member.name == name)
    }
}

/// Define a struct and derive [`Reflect`] and [`Record`] for it.
///
/// Every field becomes a read-write member named after the field. The struct
/// must also derive (or implement) `Clone` and `Default`.
///
/// ```
/// use objmap_reflect::{Record, Value, record};
///
/// record! {
///     #[derive(Debug, Clone, Default, PartialEq)]
///     pub struct Person {
///         pub name: String,
///         pub age: i32,
///     }
/// }
///
/// let mut person = Person::default();
/// person.set("age", Value::I32(30)).unwrap();
/// assert_eq!(person.get("age"), Some(Value::I32(30)));
/// assert_eq!(Person::members().len(), 2);
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::Reflect for $name {
            fn descriptor() -> $crate::TypeDescriptor {
                $crate::TypeDescriptor::object::<Self>()
            }

            fn to_value(&self) -> $crate::Value {
                $crate::Value::Object($crate::ObjectValue::new(
                    ::std::clone::Clone::clone(self),
                ))
            }

            fn from_value(value: $crate::Value) -> $crate::Result<Self> {
                $crate::object_from_value::<Self>(value)
            }
        }

        impl $crate::Record for $name {
            fn members() -> ::std::vec::Vec<$crate::Member> {
                ::std::vec![
                    $($crate::Member::read_write::<$ty>(::std::stringify!($field)),)*
                ]
            }

            #[allow(unused_variables)]
            fn get(&self, name: &str) -> ::std::option::Option<$crate::Value> {
                match name {
                    $(
                        ::std::stringify!($field) => ::std::option::Option::Some(
                            $crate::Reflect::to_value(&self.$field),
                        ),
                    )*
                    _ => ::std::option::Option::None,
                }
            }

            #[allow(unused_variables)]
            fn set(&mut self, name: &str, value: $crate::Value) -> $crate::Result<()> {
                match name {
                    $(
                        ::std::stringify!($field) => {
                            self.$field = <$ty as $crate::Reflect>::from_value(value)?;
                            ::std::result::Result::Ok(())
                        }
                    )*
                    _ => ::std::result::Result::Err($crate::Error::unknown_member(
                        ::std::stringify!($name),
                        name,
                    )),
                }
            }
        }
    };
}
