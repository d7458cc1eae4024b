//! # The Container
//!
//! Turns a validated descriptor graph into live components, at most one
//! instance per descriptor.
//!
//! # Architecture
//! ```text
//! DescriptorSource ──contribute()──>  ContainerBuilder
//!                                           │
//!                                        build()
//!                                           │  CycleValidator::validate
//!                                           │  eager singleton instantiation
//!                                           ▼
//!                                       Container ──get_component()──> Component
//! ```
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use sandiq_container::prelude::*;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, msg: &str) -> String;
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, msg: &str) -> String { format!("[console] {msg}") }
//! }
//!
//! struct UserService {
//!     logger: Arc<dyn Logger>,
//! }
//!
//! let container = Container::builder()
//!     .component(
//!         ComponentDescriptor::with_factory("consoleLogger", |_| Ok(ConsoleLogger))
//!             .provides(|l: Arc<ConsoleLogger>| l as Arc<dyn Logger>),
//!     )
//!     .component(
//!         ComponentDescriptor::with_factory("userService", |args| {
//!             Ok(UserService { logger: args.get::<dyn Logger>(0)? })
//!         })
//!         .depends_on(DependencyRequirement::of::<dyn Logger>()),
//!     )
//!     .build()
//!     .expect("Failed to build container");
//!
//! let service: Arc<UserService> = container.get("userService").expect("Failed to resolve");
//! assert_eq!(service.logger.log("hi"), "[console] hi");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use tracing::{debug, info, instrument, trace};

use crate::descriptor::{Arguments, ComponentDescriptor};
use crate::error::{Lookup, MismatchedTypeError, NotFoundError, Result, SandiqError, Unresolved};
use crate::graph::CycleValidator;
use crate::instance::Component;
use crate::key::TypeKey;
use crate::provider::{DescriptorSink, DescriptorSource};
use crate::registry::DescriptorRegistry;
use crate::resolver::DependencyResolver;
use crate::settings::ContainerSettings;

// ============================================================
// ContainerBuilder
// ============================================================

/// Collects descriptors, then builds a validated [`Container`].
///
/// Registration errors do not interrupt the chain: the first one is kept
/// and returned by [`build()`](ContainerBuilder::build).
///
/// # Examples
/// ```rust,ignore
/// let container = Container::builder()
///     .add_source(&DatabaseModule)
///     .component(ComponentDescriptor::with_factory("clock", |_| Ok(SystemClock)))
///     .alias("clock", "time")
///     .build()?;
/// ```
pub struct ContainerBuilder {
    registry: DescriptorRegistry,
    settings: ContainerSettings,
    first_error: Option<SandiqError>,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            registry: DescriptorRegistry::new(),
            settings: ContainerSettings::default(),
            first_error: None,
        }
    }

    pub fn settings(mut self, settings: ContainerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Registers `descriptor` under its declared name.
    pub fn component(mut self, descriptor: ComponentDescriptor) -> Self {
        let result = self.registry.register_descriptor(descriptor);
        self.keep_first_error(result);
        self
    }

    /// Registers `descriptor` under `name`.
    pub fn component_named(mut self, name: &str, descriptor: ComponentDescriptor) -> Self {
        let result = self.registry.register(name, descriptor);
        self.keep_first_error(result);
        self
    }

    /// Registers `alias` as a secondary name for `name`.
    pub fn alias(mut self, name: &str, alias: &str) -> Self {
        let result = self.registry.register_alias(name, alias);
        self.keep_first_error(result);
        self
    }

    /// Lets a [`DescriptorSource`] register its descriptors.
    pub fn add_source(mut self, source: &dyn DescriptorSource) -> Self {
        debug!(source = source.name(), "Collecting descriptors");
        let result = source.contribute(&mut self);
        self.keep_first_error(result);
        self
    }

    /// Validates the graph and builds the container.
    ///
    /// # Errors
    /// The first registration error, then any validation error, then any
    /// eager instantiation error. Nothing is instantiated unless validation
    /// passes.
    pub fn build(self) -> Result<Container> {
        if let Some(err) = self.first_error {
            return Err(err);
        }
        Container::from_registry(self.registry, self.settings)
    }

    fn keep_first_error(&mut self, result: Result<()>) {
        if let Err(err) = result {
            if self.first_error.is_none() {
                self.first_error = Some(err);
            }
        }
    }
}

// Sources registering through the builder see errors immediately
impl DescriptorSink for ContainerBuilder {
    fn register(&mut self, name: &str, descriptor: ComponentDescriptor) -> Result<()> {
        self.registry.register(name, descriptor)
    }

    fn register_alias(&mut self, name: &str, alias: &str) -> Result<()> {
        self.registry.register_alias(name, alias)
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// Thread-safe container of singleton components.
///
/// Each descriptor owns one write-once slot; concurrent first requests for
/// the same component construct it once, and everyone gets that instance.
pub struct Container {
    registry: DescriptorRegistry,
    settings: ContainerSettings,
    /// name → instance, one slot per registered descriptor
    instances: HashMap<String, OnceCell<Component>>,
    /// type → instance, for unambiguous type lookups
    by_type: DashMap<TypeKey, Component>,
    /// concrete type → the component a type-only lookup lands on, if any
    type_owners: HashMap<TypeKey, Option<String>>,
}

impl Container {
    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Validates `registry` and, if enabled, instantiates every singleton.
    ///
    /// Singletons are built in dependency order, so each factory call finds
    /// its arguments already constructed.
    #[instrument(skip_all, name = "container_build")]
    pub fn from_registry(registry: DescriptorRegistry, settings: ContainerSettings) -> Result<Self> {
        info!(registered = registry.len(), "Building container");

        let order: Vec<String> = CycleValidator::new(&registry)
            .validate()?
            .into_iter()
            .map(str::to_string)
            .collect();

        let instances = registry
            .names()
            .map(|name| (name.to_string(), OnceCell::new()))
            .collect();

        let resolver = DependencyResolver::new(&registry);
        let mut type_owners = HashMap::new();
        for descriptor in registry.all() {
            type_owners.entry(descriptor.type_key()).or_insert_with(|| {
                resolver
                    .resolve_type(descriptor.type_key())
                    .ok()
                    .map(|owner| owner.name().to_string())
            });
        }

        let container = Self {
            registry,
            settings,
            instances,
            by_type: DashMap::new(),
            type_owners,
        };

        if container.settings.eager_singletons {
            for name in &order {
                let descriptor = container.registry.get(name)?;
                if descriptor.scope().is_eager() {
                    container.instantiate_one(descriptor)?;
                }
            }
        }

        info!(
            instantiated = container.instantiated_count(),
            "Container built successfully"
        );
        Ok(container)
    }

    /// Returns the component registered under `name` (or an alias of it),
    /// constructing it on first use.
    ///
    /// # Errors
    /// - [`SandiqError::NotFound`] if nothing is registered under `name`
    /// - resolution errors for its dependencies, unchanged
    /// - [`SandiqError::InstanceCreation`] if a factory fails
    pub fn get_component(&self, name: &str) -> Result<Component> {
        let descriptor = self
            .registry
            .find(name)
            .ok_or_else(|| self.registry.name_not_found(name, self.settings.max_suggestions))?;
        self.instantiate(descriptor)
    }

    /// Returns the component that a type-only requirement for `key` resolves
    /// to, viewed as `key`.
    ///
    /// # Errors
    /// - [`SandiqError::NotFound`] if no component is assignable to `key`
    /// - [`SandiqError::DependencyNotResolved`] if the type is ambiguous
    pub fn get_component_by_type(&self, key: TypeKey) -> Result<Component> {
        if let Some(hit) = self.by_type.get(&key) {
            return Ok(hit.value().clone());
        }

        let descriptor = DependencyResolver::new(&self.registry)
            .resolve_type(key)
            .map_err(|err| match err {
                SandiqError::DependencyNotResolved(e) if e.reason == Unresolved::NoCandidates => {
                    SandiqError::NotFound(NotFoundError {
                        lookup: Lookup::Type(key),
                        suggestions: Vec::new(),
                    })
                }
                other => other,
            })?;

        let instance = self.instantiate(descriptor)?;
        let component = view(descriptor, &instance, key);
        Ok(self
            .by_type
            .entry(key)
            .or_insert(component)
            .value()
            .clone())
    }

    /// Every registered component, in name order, constructing any that
    /// are not built yet.
    pub fn get_all_components(&self) -> Result<Vec<Component>> {
        self.registry
            .all()
            .map(|descriptor| self.instantiate(descriptor))
            .collect()
    }

    /// Typed [`get_component`](Self::get_component).
    ///
    /// `T` may be the concrete type or any interface the component
    /// `provides`.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>> {
        let descriptor = self
            .registry
            .find(name)
            .ok_or_else(|| self.registry.name_not_found(name, self.settings.max_suggestions))?;

        let key = TypeKey::of::<T>();
        let component = view(descriptor, &self.instantiate(descriptor)?, key);
        downcast(&component, key)
    }

    /// Typed [`get_component_by_type`](Self::get_component_by_type).
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let key = TypeKey::of::<T>();
        let component = self.get_component_by_type(key)?;
        downcast(&component, key)
    }

    /// Returns `true` if the component behind `name` has been constructed.
    pub fn is_instantiated(&self, name: &str) -> bool {
        self.registry
            .canonical_name(name)
            .and_then(|canonical| self.instances.get(canonical))
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Number of constructed components.
    pub fn instantiated_count(&self) -> usize {
        self.instances.values().filter(|slot| slot.get().is_some()).count()
    }

    pub fn registry(&self) -> &DescriptorRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    // ── Internal ──

    /// Returns the cached instance of `descriptor`, constructing it first if
    /// needed.
    ///
    /// On a miss the reachable subgraph is built leaves first, so every
    /// factory finds its arguments already cached and graph depth never
    /// turns into call-stack depth.
    fn instantiate(&self, descriptor: &ComponentDescriptor) -> Result<Component> {
        if let Some(component) = self.slot(descriptor)?.get() {
            trace!(name = descriptor.name(), "Cache hit");
            return Ok(component.clone());
        }

        let order = CycleValidator::new(&self.registry).validate_from(descriptor.name())?;
        trace!(name = descriptor.name(), subgraph = order.len(), "Building subgraph");
        for name in order {
            self.instantiate_one(self.registry.get(name)?)?;
        }
        self.instantiate_one(descriptor)
    }

    /// Constructs `descriptor` alone if its slot is empty. Racing callers
    /// block on the slot; one of them constructs.
    fn instantiate_one(&self, descriptor: &ComponentDescriptor) -> Result<Component> {
        self.slot(descriptor)?
            .get_or_try_init(|| self.construct(descriptor))
            .cloned()
    }

    fn slot(&self, descriptor: &ComponentDescriptor) -> Result<&OnceCell<Component>> {
        self.instances
            .get(descriptor.name())
            .ok_or_else(|| self.registry.name_not_found(descriptor.name(), 0))
    }

    fn construct(&self, descriptor: &ComponentDescriptor) -> Result<Component> {
        let name = descriptor.name();
        let resolver = DependencyResolver::new(&self.registry);

        let mut arguments = Vec::with_capacity(descriptor.dependencies().len());
        for requirement in descriptor.dependencies() {
            let dependency = resolver.resolve_for(Some(name), requirement)?;
            let instance = self.instantiate(dependency)?;
            arguments.push(view(dependency, &instance, requirement.type_key()));
        }

        let factory = descriptor.factory().ok_or_else(|| SandiqError::InstanceCreation {
            name: name.to_string(),
            source: "no factory registered for this component".into(),
        })?;

        debug!(
            name,
            ty = %descriptor.type_key(),
            arguments = arguments.len(),
            "Instantiating component"
        );
        let erased = factory(&Arguments::new(name, &arguments)).map_err(|source| {
            SandiqError::InstanceCreation {
                name: name.to_string(),
                source,
            }
        })?;
        let component = Component::new(Arc::from(name), descriptor.type_key(), erased);

        // only when a by-type lookup would land on this very component
        let key = descriptor.type_key();
        if matches!(self.type_owners.get(&key), Some(Some(owner)) if owner == name) {
            self.by_type.entry(key).or_insert_with(|| component.clone());
        }

        Ok(component)
    }
}

/// `instance` (of `descriptor`) as seen through a requirement for `key`.
///
/// Falls back to the concrete instance when the descriptor has no cast to
/// `key`; the consumer's typed access reports the mismatch.
fn view(descriptor: &ComponentDescriptor, instance: &Component, key: TypeKey) -> Component {
    if key == instance.type_key() {
        return instance.clone();
    }
    match descriptor.view_as(instance.erased(), key) {
        Some(erased) => Component::new(Arc::from(descriptor.name()), key, erased),
        None => instance.clone(),
    }
}

fn downcast<T: ?Sized + Send + Sync + 'static>(component: &Component, key: TypeKey) -> Result<Arc<T>> {
    component.downcast::<T>().ok_or_else(|| {
        SandiqError::MismatchedType(MismatchedTypeError {
            name: component.name().to_string(),
            expected: key,
            actual: component.type_key(),
            required_by: None,
        })
    })
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registered", &self.registry.len())
            .field("instantiated", &self.instantiated_count())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerBuilder};
    pub use crate::descriptor::{Arguments, BoxError, ComponentDescriptor, DependencyRequirement};
    pub use crate::error::{Result, SandiqError};
    pub use crate::graph::CycleValidator;
    pub use crate::instance::Component;
    pub use crate::key::TypeKey;
    pub use crate::provider::{DescriptorSink, DescriptorSource};
    pub use crate::registry::DescriptorRegistry;
    pub use crate::resolver::DependencyResolver;
    pub use crate::scope::Scope;
    pub use crate::settings::ContainerSettings;
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
