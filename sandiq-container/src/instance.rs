//! Type-erased handles on live component instances.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::key::TypeKey;

/// An erased `Arc<T>` plus the address of the object it points to.
///
/// The address survives upcasts (`Arc<T>` → `Arc<dyn I>` point at the same
/// object), which is what identity checks compare.
#[derive(Clone)]
pub(crate) struct ErasedArc {
    value: Arc<dyn Any + Send + Sync>,
    addr: usize,
}

impl ErasedArc {
    pub(crate) fn new<T: ?Sized + Send + Sync + 'static>(arc: Arc<T>) -> Self {
        let addr = Arc::as_ptr(&arc) as *const () as usize;
        Self {
            value: Arc::new(arc),
            addr,
        }
    }

    pub(crate) fn downcast<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.value.downcast_ref::<Arc<T>>().cloned()
    }
}

/// A live component, as handed out by the [`Container`](crate::container::Container).
///
/// Cloning is cheap and never clones the component itself.
///
/// # Examples
/// ```
/// use sandiq_container::prelude::*;
///
/// struct Clock;
///
/// let container = Container::builder()
///     .component(ComponentDescriptor::with_factory("clock", |_| Ok(Clock)))
///     .build()
///     .unwrap();
///
/// let first = container.get_component("clock").unwrap();
/// let second = container.get_component("clock").unwrap();
/// assert!(first.same_instance(&second));
/// assert!(first.downcast::<Clock>().is_some());
/// ```
#[derive(Clone)]
pub struct Component {
    name: Arc<str>,
    type_key: TypeKey,
    erased: ErasedArc,
}

impl Component {
    pub(crate) fn new(name: Arc<str>, type_key: TypeKey, erased: ErasedArc) -> Self {
        Self {
            name,
            type_key,
            erased,
        }
    }

    /// Name of the descriptor this instance was built from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type this handle exposes: the concrete type, or the interface
    /// it was requested as.
    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    /// Returns the shared instance as `Arc<T>`, if this handle holds a `T`.
    ///
    /// `T` is the concrete type for handles obtained by name, or the
    /// interface (`dyn Trait`) for handles obtained through an interface
    /// requirement.
    pub fn downcast<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.erased.downcast::<T>()
    }

    /// Returns `true` if both handles point at the same object,
    /// regardless of the type each one exposes.
    pub fn same_instance(&self, other: &Component) -> bool {
        self.erased.addr == other.erased.addr
    }

    pub(crate) fn erased(&self) -> &ErasedArc {
        &self.erased
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("type", &self.type_key)
            .finish()
    }
}
