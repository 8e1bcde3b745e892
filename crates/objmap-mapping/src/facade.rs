//! The mapper facade handed to member expressions and callbacks
//!
//! A [`Facade`] lets mapping code map further values without knowing where
//! mappers live. It borrows a [`MapperResolver`] (normally the registry) and
//! keeps the chain of mapper calls active on the current path, which is how
//! cycles and runaway recursion are detected.

use crate::config::MapperConfig;
use crate::{Error, Result};
use objmap_reflect::{ObjectValue, TypeKey, TypePair, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// A mapper with its source and destination types erased
pub trait ErasedMapper: Send + Sync {
    /// Pair this mapper is registered under
    fn pair(&self) -> TypePair;

    /// Whether the mapping plan has been built
    fn is_built(&self) -> bool;

    /// Map `source`, which must be an instance of `pair().source`, returning
    /// an instance of `pair().destination`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `source` has the wrong type, or
    /// any error raised while mapping.
    fn map_erased(
        &self,
        source: &dyn Any,
        facade: &Facade<'_>,
    ) -> Result<Box<dyn Any + Send + Sync>>;
}

/// Lookup of the mapper registered for a pair
pub trait MapperResolver: Send + Sync {
    fn resolve(&self, pair: &TypePair) -> Option<Arc<dyn ErasedMapper>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    identity: usize,
    pair: TypePair,
}

/// Mapping entry point available to mapper code.
///
/// The root facade is created by the registry for each top-level call; every
/// mapper call on the path gets a child facade linked to its parent.
pub struct Facade<'a> {
    resolver: &'a dyn MapperResolver,
    config: &'a MapperConfig,
    parent: Option<&'a Facade<'a>>,
    frame: Option<Frame>,
    depth: usize,
}

impl<'a> Facade<'a> {
    /// Root facade with no mapper call active
    #[must_use]
    pub fn new(resolver: &'a dyn MapperResolver, config: &'a MapperConfig) -> Self {
        Self {
            resolver,
            config,
            parent: None,
            frame: None,
            depth: 0,
        }
    }

    /// Number of mapper calls active on the current path
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub fn config(&self) -> &MapperConfig {
        self.config
    }

    /// Mapper registered for `pair`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingMapper`] if none is registered.
    pub fn resolve(&self, pair: &TypePair) -> Result<Arc<dyn ErasedMapper>> {
        self.resolver
            .resolve(pair)
            .ok_or_else(|| Error::missing_mapper(pair))
    }

    /// Map `source` with the mapper registered for `S -> D`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingMapper`] if no mapper is registered for the
    /// pair, or any error raised by the mapper.
    pub fn map<S, D>(&self, source: &S) -> Result<D>
    where
        S: Any + Send + Sync,
        D: Any,
    {
        let pair = TypePair::of::<S, D>();
        let mapper = self.resolve(&pair)?;
        let output = mapper.map_erased(source, self)?;
        downcast(output, &pair)
    }

    /// Map a source whose type is only known at runtime to `D`, using the
    /// mapper registered for `(dynamic type of source) -> D`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingMapper`] if no mapper is registered for the
    /// pair, or any error raised by the mapper.
    pub fn map_dyn<D: Any>(&self, source: &dyn Any) -> Result<D> {
        let source_id = source.type_id();
        let destination = TypeKey::of::<D>();
        let lookup = TypePair::new(
            TypeKey::from_parts(source_id, "<dynamic source>"),
            destination,
        );
        let mapper = self
            .resolver
            .resolve(&lookup)
            .ok_or_else(|| Error::MissingMapper {
                pair: format!("{source_id:?} -> {destination}"),
            })?;
        let pair = mapper.pair();
        let output = mapper.map_erased(source, self)?;
        downcast(output, &pair)
    }

    /// Map every source in order.
    ///
    /// # Errors
    ///
    /// Stops at, and returns, the first error.
    pub fn map_all<'s, S, D, I>(&self, sources: I) -> Result<Vec<D>>
    where
        S: Any + Send + Sync,
        D: Any,
        I: IntoIterator<Item = &'s S>,
    {
        sources.into_iter().map(|source| self.map(source)).collect()
    }

    /// Map every source in order, each by its own runtime type.
    ///
    /// # Errors
    ///
    /// Stops at, and returns, the first error.
    pub fn map_all_dyn<'s, D, I>(&self, sources: I) -> Result<Vec<D>>
    where
        D: Any,
        I: IntoIterator<Item = &'s dyn Any>,
    {
        sources.into_iter().map(|source| self.map_dyn(source)).collect()
    }

    /// Map a nested record carried as a [`Value::Object`].
    pub(crate) fn map_value(&self, value: Value, pair: &TypePair) -> Result<Value> {
        let object = match value {
            Value::Object(object) => object,
            Value::Null => {
                return Err(Error::InvalidArgument(format!(
                    "cannot map a missing {} value",
                    pair.source
                )));
            }
            other => {
                return Err(
                    objmap_reflect::Error::type_mismatch(pair.source.name(), other.kind_name())
                        .into(),
                );
            }
        };
        if object.type_key() != pair.source {
            return Err(objmap_reflect::Error::type_mismatch(
                pair.source.name(),
                object.type_key().name(),
            )
            .into());
        }

        let mapper = self.resolve(pair)?;
        let output = mapper.map_erased(object.as_any(), self)?;
        Ok(Value::Object(ObjectValue::from_boxed(
            pair.destination,
            output,
        )))
    }

    /// Child facade for a mapper call on `(identity, pair)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleDetected`] if the same source instance is already
    /// being mapped to the same pair on this path, or
    /// [`Error::RecursionLimit`] if the call would exceed the configured depth.
    pub(crate) fn enter(&self, identity: usize, pair: TypePair) -> Result<Facade<'_>> {
        let frame = Frame { identity, pair };

        if self.config.detect_cycles {
            let mut current = Some(self);
            while let Some(facade) = current {
                if facade.frame == Some(frame) {
                    return Err(Error::CycleDetected {
                        pair: pair.to_string(),
                    });
                }
                current = facade.parent;
            }
        }

        let depth = self.depth + 1;
        if depth > self.config.max_depth {
            return Err(Error::RecursionLimit {
                pair: pair.to_string(),
                limit: self.config.max_depth,
            });
        }

        trace!(%pair, depth, "Entering mapper");
        Ok(Facade {
            resolver: self.resolver,
            config: self.config,
            parent: Some(self),
            frame: Some(frame),
            depth,
        })
    }
}

impl fmt::Debug for Facade<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Facade")
            .field("depth", &self.depth)
            .field("frame", &self.frame)
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}

/// A mapper producing anything but its declared destination is a broken
/// registration, reported as not configured.
fn downcast<D: Any>(output: Box<dyn Any + Send + Sync>, pair: &TypePair) -> Result<D> {
    output
        .downcast::<D>()
        .map(|boxed| *boxed)
        .map_err(|_| Error::NotConfigured {
            pair: pair.to_string(),
        })
}
