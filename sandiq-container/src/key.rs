//! Runtime type identity.
//!
//! [`TypeKey`] names a Rust type without reflection: a [`TypeId`] for
//! comparisons plus the `type_name` for diagnostics. Interface targets are
//! spelled as trait objects (`TypeKey::of::<dyn Repository>()`).

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifies a concrete or interface type in the container.
///
/// # Examples
/// ```
/// use sandiq_container::key::TypeKey;
///
/// trait Greeter {}
/// struct English;
///
/// let concrete = TypeKey::of::<English>();
/// let interface = TypeKey::of::<dyn Greeter>();
/// assert_ne!(concrete, interface);
/// assert!(concrete.type_name().ends_with("English"));
/// ```
#[derive(Clone, Copy)]
pub struct TypeKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl TypeKey {
    /// Creates a key for type `T`. `T` may be unsized (`dyn Trait`).
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    /// Creates a key from a raw [`TypeId`] and type name.
    ///
    /// Prefer [`TypeKey::of`]; this is for code generators that only
    /// carry the pieces.
    #[inline]
    pub fn from_raw(type_id: TypeId, type_name: &'static str) -> Self {
        Self { type_id, type_name }
    }

    /// Returns the [`TypeId`].
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the fully qualified type name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the type name without module paths.
    pub fn short_name(&self) -> String {
        sandiq_support::rendering::shorten_type_name(self.type_name)
    }
}

// identity is the TypeId alone; type_name is informational
impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.type_name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}
