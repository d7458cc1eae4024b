//! Component descriptors and dependency requirements.
//!
//! A [`ComponentDescriptor`] is the blueprint the discovery step hands to the
//! registry: name, concrete type, ordered dependencies, scope, primary flag,
//! the interface types it is assignable to and, optionally, the factory that
//! builds it.

use std::collections::HashMap;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use crate::instance::{Component, ErasedArc};
use crate::key::TypeKey;
use crate::scope::Scope;

/// Boxed error returned by component factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub(crate) type FactoryFn = Arc<dyn Fn(&Arguments<'_>) -> Result<ErasedArc, BoxError> + Send + Sync>;

/// Upcasts an erased concrete instance to an interface view.
pub(crate) type ViewFn = Arc<dyn Fn(&ErasedArc) -> Option<ErasedArc> + Send + Sync>;

/// Where a descriptor was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    file: &'static str,
    line: u32,
    column: u32,
}

impl SourceLocation {
    pub const fn new(file: &'static str, line: u32, column: u32) -> Self {
        Self { file, line, column }
    }

    /// The location of the caller of the enclosing `#[track_caller]` function.
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }

    pub fn file(&self) -> &'static str {
        self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }
}

impl From<&'static Location<'static>> for SourceLocation {
    fn from(location: &'static Location<'static>) -> Self {
        Self::new(location.file(), location.line(), location.column())
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// One constructor argument a descriptor needs.
///
/// Resolution precedence is qualifier, then requested name, then type;
/// see [`DependencyResolver`](crate::resolver::DependencyResolver).
///
/// # Examples
/// ```
/// use sandiq_container::descriptor::DependencyRequirement;
///
/// trait Store {}
///
/// let by_type = DependencyRequirement::of::<dyn Store>();
/// assert_eq!(by_type.qualifier(), None);
///
/// let pinned = DependencyRequirement::of::<dyn Store>().with_qualifier("redisStore");
/// assert_eq!(pinned.qualifier(), Some("redisStore"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRequirement {
    requested_name: Option<String>,
    qualifier: Option<String>,
    type_key: TypeKey,
}

impl DependencyRequirement {
    /// A requirement for type `T` (concrete or `dyn Trait`).
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::of_type(TypeKey::of::<T>())
    }

    pub fn of_type(type_key: TypeKey) -> Self {
        Self {
            requested_name: None,
            qualifier: None,
            type_key,
        }
    }

    /// A requirement for type `T` that prefers the component called `name`.
    pub fn named<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::of::<T>().with_name(name)
    }

    /// A requirement for type `T` pinned to the component called `qualifier`.
    pub fn qualified<T: ?Sized + 'static>(qualifier: impl Into<String>) -> Self {
        Self::of::<T>().with_qualifier(qualifier)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.requested_name = Some(name.into());
        self
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    pub fn requested_name(&self) -> Option<&str> {
        self.requested_name.as_deref()
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }
}

impl fmt::Display for DependencyRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_key)?;
        if let Some(ref qualifier) = self.qualifier {
            write!(f, " (qualifier={qualifier:?})")?;
        }
        if let Some(ref name) = self.requested_name {
            write!(f, " (name={name:?})")?;
        }
        Ok(())
    }
}

/// Identity and blueprint for one component.
///
/// Descriptors built with [`ComponentDescriptor::new`] describe the graph
/// only; descriptors built with [`ComponentDescriptor::with_factory`] can
/// also be instantiated. Both record the caller's source location for
/// diagnostics.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use sandiq_container::descriptor::{ComponentDescriptor, DependencyRequirement};
/// use sandiq_container::key::TypeKey;
///
/// trait Store: Send + Sync {}
/// struct MemoryStore;
/// impl Store for MemoryStore {}
///
/// let store = ComponentDescriptor::with_factory("memoryStore", |_| Ok(MemoryStore))
///     .provides(|s: Arc<MemoryStore>| s as Arc<dyn Store>)
///     .primary();
///
/// assert!(store.is_primary());
/// assert!(store.is_assignable_to(TypeKey::of::<dyn Store>()));
/// assert!(store.dependencies().is_empty());
/// ```
#[derive(Clone)]
pub struct ComponentDescriptor {
    name: String,
    type_key: TypeKey,
    dependencies: Vec<DependencyRequirement>,
    primary: bool,
    scope: Scope,
    assignable_to: Vec<TypeKey>,
    views: HashMap<TypeKey, ViewFn>,
    factory: Option<FactoryFn>,
    source: Option<SourceLocation>,
}

impl ComponentDescriptor {
    /// A descriptor without a factory: usable for graph analysis, but
    /// instantiating it fails.
    #[track_caller]
    pub fn new(name: impl Into<String>, type_key: TypeKey) -> Self {
        Self {
            name: name.into(),
            type_key,
            dependencies: Vec::new(),
            primary: false,
            scope: Scope::Singleton,
            assignable_to: Vec::new(),
            views: HashMap::new(),
            factory: None,
            source: Some(SourceLocation::caller()),
        }
    }

    /// A factory-less descriptor for type `T`.
    #[track_caller]
    pub fn of<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::new(name, TypeKey::of::<T>())
    }

    /// A descriptor whose concrete type is the factory's output.
    ///
    /// The factory receives the resolved dependencies in declared order.
    #[track_caller]
    pub fn with_factory<T, F>(name: impl Into<String>, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Arguments<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let erased: FactoryFn = Arc::new(move |args: &Arguments<'_>| {
            factory(args).map(|value| ErasedArc::new(Arc::new(value)))
        });
        let mut descriptor = Self::new(name, TypeKey::of::<T>());
        descriptor.factory = Some(erased);
        descriptor
    }

    /// Appends a dependency; order matches the factory's argument order.
    pub fn depends_on(mut self, requirement: DependencyRequirement) -> Self {
        self.dependencies.push(requirement);
        self
    }

    /// Marks this descriptor as the preferred candidate for type lookups.
    pub fn primary(self) -> Self {
        self.with_primary(true)
    }

    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Declares that this component satisfies requirements for `I`, and how
    /// to view the concrete instance as `I`.
    pub fn provides<T, I>(mut self, cast: impl Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static) -> Self
    where
        T: Send + Sync + 'static,
        I: ?Sized + Send + Sync + 'static,
    {
        let key = TypeKey::of::<I>();
        let view: ViewFn = Arc::new(move |erased: &ErasedArc| {
            erased.downcast::<T>().map(|concrete| ErasedArc::new(cast(concrete)))
        });
        self.views.insert(key, view);
        self.assignable_to(key)
    }

    /// Declares assignability to `key` for graph analysis only.
    ///
    /// A descriptor with a factory must use [`provides`](Self::provides)
    /// instead; the registry rejects an interface it could not cast to.
    pub fn assignable_to(mut self, key: TypeKey) -> Self {
        if key != self.type_key && !self.assignable_to.contains(&key) {
            self.assignable_to.push(key);
        }
        self
    }

    /// Overrides the recorded declaration site.
    pub fn located_at(mut self, source: SourceLocation) -> Self {
        self.source = Some(source);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    pub fn dependencies(&self) -> &[DependencyRequirement] {
        &self.dependencies
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn source(&self) -> Option<SourceLocation> {
        self.source
    }

    pub fn has_factory(&self) -> bool {
        self.factory.is_some()
    }

    /// Every type this descriptor can be injected as, concrete type first.
    pub fn assignable_types(&self) -> impl Iterator<Item = TypeKey> + '_ {
        std::iter::once(self.type_key).chain(self.assignable_to.iter().copied())
    }

    /// Returns `true` if this component can satisfy a requirement for `key`.
    pub fn is_assignable_to(&self, key: TypeKey) -> bool {
        self.type_key == key || self.assignable_to.contains(&key)
    }

    /// The first declared interface this descriptor's instances cannot be
    /// viewed as. Graph-only descriptors never need a cast.
    pub(crate) fn uncast_interface(&self) -> Option<TypeKey> {
        if self.factory.is_none() {
            return None;
        }
        self.assignable_to
            .iter()
            .copied()
            .find(|key| !self.views.contains_key(key))
    }

    // The registry owns identity: the registered name replaces the declared one.
    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn factory(&self) -> Option<&FactoryFn> {
        self.factory.as_ref()
    }

    /// Views `erased` (an instance of this descriptor) as `key`.
    ///
    /// The concrete type needs no view. `None` means the descriptor declared
    /// `key` without a cast.
    pub(crate) fn view_as(&self, erased: &ErasedArc, key: TypeKey) -> Option<ErasedArc> {
        if key == self.type_key {
            return Some(erased.clone());
        }
        self.views.get(&key).and_then(|view| view(erased))
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("name", &self.name)
            .field("type", &self.type_key)
            .field("dependencies", &self.dependencies)
            .field("primary", &self.primary)
            .field("scope", &self.scope)
            .field("assignable_to", &self.assignable_to)
            .field("has_factory", &self.factory.is_some())
            .field("source", &self.source)
            .finish()
    }
}

/// Why a factory could not read one of its arguments.
#[derive(Debug, thiserror::Error)]
pub enum ArgumentError {
    #[error("{component}: no argument at index {index} ({len} declared)")]
    OutOfRange {
        component: String,
        index: usize,
        len: usize,
    },

    #[error("{component}: argument {index} is {actual}, not {expected}")]
    WrongType {
        component: String,
        index: usize,
        expected: &'static str,
        actual: TypeKey,
    },
}

/// Resolved dependencies passed to a factory, in declared order.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use sandiq_container::prelude::*;
///
/// struct Config { url: String }
/// struct Pool { config: Arc<Config> }
///
/// let container = Container::builder()
///     .component(ComponentDescriptor::with_factory("config", |_| {
///         Ok(Config { url: "postgres://localhost".into() })
///     }))
///     .component(
///         ComponentDescriptor::with_factory("pool", |args| {
///             Ok(Pool { config: args.get::<Config>(0)? })
///         })
///         .depends_on(DependencyRequirement::of::<Config>()),
///     )
///     .build()
///     .unwrap();
///
/// let pool: Arc<Pool> = container.get("pool").unwrap();
/// assert_eq!(pool.config.url, "postgres://localhost");
/// ```
pub struct Arguments<'a> {
    component: &'a str,
    values: &'a [Component],
}

impl<'a> Arguments<'a> {
    pub(crate) fn new(component: &'a str, values: &'a [Component]) -> Self {
        Self { component, values }
    }

    /// Name of the component being constructed.
    pub fn component(&self) -> &str {
        self.component
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The erased handle at `index`.
    pub fn component_at(&self, index: usize) -> Option<&Component> {
        self.values.get(index)
    }

    /// The argument at `index` as `Arc<T>`.
    ///
    /// `T` is the type the requirement asked for: the concrete type, or the
    /// interface for `dyn Trait` requirements.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>, ArgumentError> {
        let value = self.values.get(index).ok_or_else(|| ArgumentError::OutOfRange {
            component: self.component.to_string(),
            index,
            len: self.values.len(),
        })?;

        value.downcast::<T>().ok_or_else(|| ArgumentError::WrongType {
            component: self.component.to_string(),
            index,
            expected: std::any::type_name::<T>(),
            actual: value.type_key(),
        })
    }
}
