#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # objmap-mapping
//!
//! Per-pair object mappers for objmap.
//!
//! An [`ObjectMapper`] maps one source type onto one destination type. It is
//! configured (ignored members, custom member expressions, after-map
//! callbacks) before first use, then compiles that configuration into an
//! immutable plan the first time it maps. Members without configuration are
//! mapped automatically according to the [`classify`] decision table.

pub mod classify;
pub mod config;
pub mod convert;
pub mod facade;
pub mod mapper;
pub mod plan;

pub use classify::Classification;
pub use config::MapperConfig;
pub use facade::{ErasedMapper, Facade, MapperResolver};
pub use mapper::ObjectMapper;

use objmap_reflect::TypePair;
use thiserror::Error;

/// Errors that can occur while configuring or running a mapper
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration for {pair}: {message}")]
    InvalidConfiguration { pair: String, message: String },

    #[error("No mapper registered for {pair}")]
    MissingMapper { pair: String },

    #[error("Cannot convert {value} from {from} to {to}: {reason}")]
    Conversion {
        from: String,
        to: String,
        value: String,
        reason: String,
    },

    #[error("Cycle detected while mapping {pair}: the source instance is already being mapped")]
    CycleDetected { pair: String },

    #[error("Recursion limit of {limit} exceeded while mapping {pair}")]
    RecursionLimit { pair: String, limit: usize },

    /// A registered mapper did not produce its declared destination type
    #[error("The function to map {pair} is not defined")]
    NotConfigured { pair: String },

    #[error("Property '{property}': {source}")]
    Property {
        property: String,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Reflect(#[from] objmap_reflect::Error),

    #[error("Config error: {0}")]
    Config(String),
}

/// Error categories, independent of the member path an error was raised on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidConfiguration,
    MissingMapper,
    Conversion,
    CycleDetected,
    RecursionLimit,
    NotConfigured,
    Reflect,
    Config,
}

impl Error {
    /// Build an invalid-configuration error for a mapper pair.
    #[must_use]
    pub fn invalid_configuration(pair: &TypePair, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            pair: pair.to_string(),
            message: message.into(),
        }
    }

    /// Build a missing-mapper error naming the unmapped pair.
    #[must_use]
    pub fn missing_mapper(pair: &TypePair) -> Self {
        Self::MissingMapper {
            pair: pair.to_string(),
        }
    }

    /// Build a conversion error.
    #[must_use]
    pub fn conversion(
        from: impl Into<String>,
        to: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Conversion {
            from: from.into(),
            to: to.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Attach the destination member the error was raised for.
    #[must_use]
    pub fn in_property(self, property: impl Into<String>) -> Self {
        Self::Property {
            property: property.into(),
            source: Box::new(self),
        }
    }

    /// Category of the underlying error, looking through member context.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::InvalidConfiguration { .. } => ErrorKind::InvalidConfiguration,
            Self::MissingMapper { .. } => ErrorKind::MissingMapper,
            Self::Conversion { .. } => ErrorKind::Conversion,
            Self::CycleDetected { .. } => ErrorKind::CycleDetected,
            Self::RecursionLimit { .. } => ErrorKind::RecursionLimit,
            Self::NotConfigured { .. } => ErrorKind::NotConfigured,
            Self::Property { source, .. } => source.kind(),
            Self::Reflect(_) => ErrorKind::Reflect,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Dotted member path the error was raised on, e.g. `address.zip`.
    #[must_use]
    pub fn property_path(&self) -> Option<String> {
        let mut names = Vec::new();
        let mut current = self;
        while let Self::Property { property, source } = current {
            names.push(property.as_str());
            current = source;
        }
        if names.is_empty() {
            None
        } else {
            Some(names.join("."))
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
