//! Per-pair object mapper
//!
//! An [`ObjectMapper`] is configured through `&mut self` methods, then frozen
//! the first time it maps: the configuration is compiled into a plan exactly
//! once, even when the first calls race on several threads, and every later
//! call reuses that plan.

use crate::facade::{ErasedMapper, Facade};
use crate::plan::{AfterMapFn, MemberFn, Plan};
use crate::{Error, Result};
use objmap_reflect::{Member, Record, Reflect, TypePair};
use std::any::{Any, type_name};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::trace;

/// Maps instances of `S` onto new instances of `D`.
///
/// ```
/// use objmap_mapping::ObjectMapper;
/// use objmap_reflect::record;
///
/// record! {
///     #[derive(Debug, Clone, Default)]
///     pub struct Order { pub id: u32, pub total: f64, pub note: String }
/// }
///
/// record! {
///     #[derive(Debug, Clone, Default)]
///     pub struct OrderDto { pub id: String, pub total: f64, pub note: String }
/// }
///
/// let mut mapper = ObjectMapper::<Order, OrderDto>::new();
/// mapper
///     .ignore("note")?
///     .map_property("total", |order: &Order, _| Ok(order.total * 1.25))?;
/// # Ok::<(), objmap_mapping::Error>(())
/// ```
pub struct ObjectMapper<S: Record, D: Record> {
    ignored: HashSet<String>,
    custom: HashMap<String, MemberFn<S>>,
    after_map: Vec<AfterMapFn<S, D>>,
    plan: OnceLock<Arc<Plan<S, D>>>,
}

impl<S: Record, D: Record> ObjectMapper<S, D> {
    /// Mapper that maps every member automatically until configured otherwise
    #[must_use]
    pub fn new() -> Self {
        Self {
            ignored: HashSet::new(),
            custom: HashMap::new(),
            after_map: Vec::new(),
            plan: OnceLock::new(),
        }
    }

    /// Mapper backed by an explicit function. It is built from the start and
    /// rejects all configuration.
    #[must_use]
    pub fn from_fn<F>(function: F) -> Self
    where
        F: Fn(&S, &Facade<'_>) -> Result<D> + Send + Sync + 'static,
    {
        Self {
            plan: OnceLock::from(Arc::new(Plan::Explicit(Arc::new(function)))),
            ..Self::new()
        }
    }

    /// Pair this mapper maps
    #[must_use]
    pub fn pair(&self) -> TypePair {
        TypePair::of::<S, D>()
    }

    /// Whether the mapping plan exists; configuration is rejected once it does
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.plan.get().is_some()
    }

    /// Leave the destination member `name` at its default value.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `name` is empty or not a member of `D`
    /// - [`Error::InvalidConfiguration`] if `name` has a custom mapping or the
    ///   mapper is already built
    pub fn ignore(&mut self, name: &str) -> Result<&mut Self> {
        self.ensure_configurable()?;
        Self::destination_member(name)?;

        if self.custom.contains_key(name) {
            return Err(Error::invalid_configuration(
                &self.pair(),
                format!("Property '{name}' has a custom mapping and cannot be ignored"),
            ));
        }

        trace!(pair = %self.pair(), member = name, "Ignoring member");
        self.ignored.insert(name.to_string());
        Ok(self)
    }

    /// Compute the destination member `name` with `expression` on every call.
    /// A later call for the same member replaces the earlier expression.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `name` is empty, not a writable member
    ///   of `D`, or `M` is not the member's type
    /// - [`Error::InvalidConfiguration`] if `name` is ignored or the mapper is
    ///   already built
    pub fn map_property<M, F>(&mut self, name: &str, expression: F) -> Result<&mut Self>
    where
        M: Reflect,
        F: Fn(&S, &Facade<'_>) -> Result<M> + Send + Sync + 'static,
    {
        self.ensure_configurable()?;
        let member = Self::destination_member(name)?;

        if !member.access.is_writable() {
            return Err(Error::InvalidArgument(format!(
                "Property '{name}' of {} is not writable",
                type_name::<D>()
            )));
        }
        if M::descriptor().id() != member.descriptor.id() {
            return Err(Error::InvalidArgument(format!(
                "Property '{name}' has type {} but the expression yields {}",
                member.descriptor,
                type_name::<M>()
            )));
        }
        if self.ignored.contains(name) {
            return Err(Error::invalid_configuration(
                &self.pair(),
                format!("Property '{name}' is ignored and cannot be mapped"),
            ));
        }

        trace!(pair = %self.pair(), member = name, "Custom member expression");
        let expression: MemberFn<S> = Arc::new(move |source: &S, facade: &Facade<'_>| {
            expression(source, facade).map(|value| value.to_value())
        });
        self.custom.insert(name.to_string(), expression);
        Ok(self)
    }

    /// Run `callback` after all members are assigned. Callbacks run in the
    /// order they were added.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the mapper is already built.
    pub fn after_map<F>(&mut self, callback: F) -> Result<&mut Self>
    where
        F: Fn(&S, &mut D, &Facade<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.ensure_configurable()?;
        self.after_map.push(Arc::new(callback));
        Ok(self)
    }

    /// Map `source` to a new `D`, building the plan on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleDetected`] or [`Error::RecursionLimit`] from the
    /// recursion guard, or the first error raised by a member, a nested
    /// mapper or a callback.
    pub fn map(&self, source: &S, facade: &Facade<'_>) -> Result<D> {
        let identity = std::ptr::from_ref(source).cast::<()>() as usize;
        let facade = facade.enter(identity, self.pair())?;
        self.plan().execute(source, &facade)
    }

    fn plan(&self) -> &Arc<Plan<S, D>> {
        self.plan
            .get_or_init(|| Arc::new(Plan::build(&self.ignored, &self.custom, &self.after_map)))
    }

    fn ensure_configurable(&self) -> Result<()> {
        if self.is_built() {
            return Err(Error::invalid_configuration(
                &self.pair(),
                "The mapper function cannot be modified after it has been created",
            ));
        }
        Ok(())
    }

    fn destination_member(name: &str) -> Result<Member> {
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "Property name must not be empty".to_string(),
            ));
        }
        D::member(name).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "'{name}' is not a member of {}",
                type_name::<D>()
            ))
        })
    }
}

impl<S: Record, D: Record> Default for ObjectMapper<S, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Record, D: Record> fmt::Debug for ObjectMapper<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut custom: Vec<&str> = self.custom.keys().map(String::as_str).collect();
        custom.sort_unstable();
        let mut ignored: Vec<&str> = self.ignored.iter().map(String::as_str).collect();
        ignored.sort_unstable();

        f.debug_struct("ObjectMapper")
            .field("pair", &self.pair().to_string())
            .field("ignored", &ignored)
            .field("custom", &custom)
            .field("after_map", &self.after_map.len())
            .field("built", &self.is_built())
            .finish()
    }
}

impl<S: Record, D: Record> ErasedMapper for ObjectMapper<S, D> {
    fn pair(&self) -> TypePair {
        ObjectMapper::pair(self)
    }

    fn is_built(&self) -> bool {
        ObjectMapper::is_built(self)
    }

    fn map_erased(
        &self,
        source: &dyn Any,
        facade: &Facade<'_>,
    ) -> Result<Box<dyn Any + Send + Sync>> {
        let source = source.downcast_ref::<S>().ok_or_else(|| {
            Error::InvalidArgument(format!("Expected a {} source", type_name::<S>()))
        })?;
        Ok(Box::new(self.map(source, facade)?))
    }
}
