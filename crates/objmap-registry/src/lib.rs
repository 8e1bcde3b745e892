#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # objmap-registry
//!
//! Central mapper store for objmap.
//!
//! A [`MapperRegistry`] holds one mapper per `(source, destination)` type
//! pair and is the entry point for mapping: it resolves the pair at call
//! time and hands mappers a facade through which nested members are mapped
//! with the same registry.

pub mod registry;

pub use objmap_mapping::{Error, ErrorKind, MapperConfig, ObjectMapper, Result};
pub use registry::MapperRegistry;
