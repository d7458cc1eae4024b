//! Component lifecycle scopes.
//!
//! - [`Scope::Singleton`]: one instance for the container's lifetime
//! - [`Scope::Prototype`]: recorded for collaborators; the container
//!   does not create per-request instances
use std::fmt;

use serde::Deserialize;

/// Declared lifetime of a component.
///
/// # Examples
/// ```
/// use sandiq_container::scope::Scope;
///
/// assert_eq!(Scope::default(), Scope::Singleton);
/// assert!(Scope::Singleton.is_eager());
/// assert!(!Scope::Prototype.is_eager());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// One instance shared across the application.
    ///
    /// Constructed during startup (or on first request when eager
    /// instantiation is disabled) and reused afterwards.
    #[default]
    Singleton,

    /// One instance per request, managed outside the container.
    ///
    /// The container skips prototypes during eager instantiation; when one
    /// is requested directly it is materialized once and cached.
    Prototype,
}

impl Scope {
    /// Returns `true` if the container instantiates this scope at startup.
    #[inline]
    pub fn is_eager(&self) -> bool {
        matches!(self, Scope::Singleton)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Singleton => write!(f, "Singleton"),
            Scope::Prototype => write!(f, "Prototype"),
        }
    }
}
