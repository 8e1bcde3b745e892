//! Concurrent mapper registry

use dashmap::DashMap;
use objmap_mapping::{ErasedMapper, Facade, MapperConfig, MapperResolver, ObjectMapper, Result};
use objmap_reflect::{Record, TypePair};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Registry of mappers keyed by `(source, destination)` type pair.
///
/// Registration normally happens once at startup; lookups are concurrent and
/// never hold a shard lock while a mapper runs.
pub struct MapperRegistry {
    mappers: DashMap<TypePair, Arc<dyn ErasedMapper>>,
    config: MapperConfig,
}

impl MapperRegistry {
    /// Create an empty registry with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MapperConfig::default())
    }

    #[must_use]
    pub fn with_config(config: MapperConfig) -> Self {
        Self {
            mappers: DashMap::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Register a mapper under its pair, returning the mapper it replaces
    pub fn register<S: Record, D: Record>(
        &self,
        mapper: ObjectMapper<S, D>,
    ) -> Option<Arc<dyn ErasedMapper>> {
        self.register_erased(Arc::new(mapper))
    }

    /// Register an already type-erased mapper under its pair
    pub fn register_erased(&self, mapper: Arc<dyn ErasedMapper>) -> Option<Arc<dyn ErasedMapper>> {
        let pair = mapper.pair();
        let replaced = self.mappers.insert(pair, mapper);
        if replaced.is_some() {
            warn!("Replacing mapper for {}", pair);
        } else {
            debug!("Registered mapper for {}", pair);
        }
        replaced
    }

    /// Create a mapper for `S -> D`, let `configure` customise it, then
    /// register it.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error; nothing is registered then.
    pub fn configure<S, D, F>(&self, configure: F) -> Result<()>
    where
        S: Record,
        D: Record,
        F: FnOnce(&mut ObjectMapper<S, D>) -> Result<()>,
    {
        let mut mapper = ObjectMapper::new();
        configure(&mut mapper)?;
        self.register(mapper);
        Ok(())
    }

    /// Register an explicit mapping function for `S -> D`
    pub fn register_fn<S, D, F>(&self, function: F) -> Option<Arc<dyn ErasedMapper>>
    where
        S: Record,
        D: Record,
        F: Fn(&S, &Facade<'_>) -> Result<D> + Send + Sync + 'static,
    {
        self.register(ObjectMapper::from_fn(function))
    }

    #[must_use]
    pub fn contains<S: 'static, D: 'static>(&self) -> bool {
        self.mappers.contains_key(&TypePair::of::<S, D>())
    }

    /// Remove the mapper for `S -> D`
    pub fn unregister<S: 'static, D: 'static>(&self) -> Option<Arc<dyn ErasedMapper>> {
        let pair = TypePair::of::<S, D>();
        let removed = self.mappers.remove(&pair).map(|(_, mapper)| mapper);
        if removed.is_some() {
            debug!("Unregistered mapper for {}", pair);
        }
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }

    /// Registered pairs, in no particular order
    #[must_use]
    pub fn pairs(&self) -> Vec<TypePair> {
        self.mappers.iter().map(|entry| *entry.key()).collect()
    }

    /// Root facade for mapping through this registry
    #[must_use]
    pub fn facade(&self) -> Facade<'_> {
        Facade::new(self, &self.config)
    }

    /// Map `source` with the mapper registered for `S -> D`.
    ///
    /// # Errors
    ///
    /// Returns [`objmap_mapping::Error::MissingMapper`] if no mapper is
    /// registered for the pair, or the first error raised while mapping.
    pub fn map<S, D>(&self, source: &S) -> Result<D>
    where
        S: Any + Send + Sync,
        D: Any,
    {
        self.facade().map(source)
    }

    /// Map a source by its runtime type.
    ///
    /// # Errors
    ///
    /// See [`MapperRegistry::map`].
    pub fn map_dyn<D: Any>(&self, source: &dyn Any) -> Result<D> {
        self.facade().map_dyn(source)
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
        self.facade().map_all(sources)
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
        self.facade().map_all_dyn(sources)
    }
}

impl MapperResolver for MapperRegistry {
    fn resolve(&self, pair: &TypePair) -> Option<Arc<dyn ErasedMapper>> {
        self.mappers.get(pair).map(|entry| Arc::clone(entry.value()))
    }
}

impl Default for MapperRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MapperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pairs: Vec<String> = self.pairs().iter().map(ToString::to_string).collect();
        pairs.sort_unstable();
        f.debug_struct("MapperRegistry")
            .field("mappers", &pairs)
            .field("config", &self.config)
            .finish()
    }
}
