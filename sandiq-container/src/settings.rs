//! Container settings.
//!
//! Plain data with serde support, so an embedding application can read it
//! from whatever configuration format it already uses.

use serde::Deserialize;

/// Tunables for [`ContainerBuilder::build`](crate::container::ContainerBuilder::build).
///
/// # Examples
/// ```
/// use sandiq_container::settings::ContainerSettings;
///
/// let lazy = ContainerSettings { eager_singletons: false, ..Default::default() };
/// assert_eq!(lazy.max_suggestions, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    /// Instantiate every singleton during build. When off, components are
    /// built on first request.
    pub eager_singletons: bool,

    /// How many "did you mean?" names a not-found error lists.
    pub max_suggestions: usize,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            eager_singletons: true,
            max_suggestions: 3,
        }
    }
}
