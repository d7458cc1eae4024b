//! Descriptor registry: every component descriptor plus name aliases.
//!
//! The registry is populated once during startup and read-only afterwards.
//! It is a plain value: resolvers and validators borrow it, tests build
//! their own.

use std::collections::BTreeMap;

use sandiq_support::naming::check_name;
use sandiq_support::rendering::suggest_similar;
use tracing::{debug, trace};

use crate::descriptor::ComponentDescriptor;
use crate::error::{
    DuplicateDescriptorError, InvalidNameError, Lookup, MissingCastError, NameConflict,
    NotFoundError, Result, SandiqError,
};
use crate::key::TypeKey;

const DEFAULT_SUGGESTIONS: usize = 3;

/// Stores component descriptors by name, and aliases to those names.
///
/// Names and aliases share one namespace. Iteration is in name order, so
/// everything derived from the registry is deterministic.
///
/// # Examples
/// ```
/// use sandiq_container::registry::DescriptorRegistry;
/// use sandiq_container::descriptor::ComponentDescriptor;
///
/// struct Mailer;
///
/// let mut registry = DescriptorRegistry::new();
/// registry.register("mailer", ComponentDescriptor::of::<Mailer>("mailer")).unwrap();
/// registry.register_alias("mailer", "smtp").unwrap();
///
/// assert!(registry.contains("mailer"));
/// assert_eq!(registry.get("smtp").unwrap().name(), "mailer");
/// assert!(registry.register("smtp", ComponentDescriptor::of::<Mailer>("smtp")).is_err());
/// ```
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    descriptors: BTreeMap<String, ComponentDescriptor>,
    aliases: BTreeMap<String, String>,
}

impl DescriptorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `descriptor` under `name`.
    ///
    /// The registered name becomes the descriptor's identity, replacing the
    /// name it was declared with.
    ///
    /// # Errors
    /// - [`SandiqError::InvalidName`] if `name` is blank or contains
    ///   whitespace/control characters
    /// - [`SandiqError::DuplicateDescriptor`] if `name` is already a
    ///   component name or an alias
    /// - [`SandiqError::MissingCast`] if the descriptor has a factory and
    ///   declares an interface through `assignable_to` alone
    pub fn register(
        &mut self,
        name: impl Into<String>,
        mut descriptor: ComponentDescriptor,
    ) -> Result<()> {
        let name = name.into();
        validate_name(&name)?;
        self.ensure_unused(&name)?;
        if let Some(interface) = descriptor.uncast_interface() {
            return Err(SandiqError::MissingCast(MissingCastError {
                name,
                actual: descriptor.type_key(),
                interface,
            }));
        }

        descriptor.rename(name.clone());
        debug!(
            name = %name,
            ty = %descriptor.type_key(),
            scope = %descriptor.scope(),
            primary = descriptor.is_primary(),
            dependencies = descriptor.dependencies().len(),
            "Registered component"
        );
        self.descriptors.insert(name, descriptor);
        Ok(())
    }

    /// Registers `descriptor` under its declared name.
    pub fn register_descriptor(&mut self, descriptor: ComponentDescriptor) -> Result<()> {
        let name = descriptor.name().to_string();
        self.register(name, descriptor)
    }

    /// Looks up a descriptor by name or alias.
    ///
    /// # Errors
    /// [`SandiqError::NotFound`], with "did you mean?" suggestions.
    pub fn get(&self, name: &str) -> Result<&ComponentDescriptor> {
        self.find(name)
            .ok_or_else(|| self.name_not_found(name, DEFAULT_SUGGESTIONS))
    }

    /// Looks up a descriptor by name or alias.
    pub fn find(&self, name: &str) -> Option<&ComponentDescriptor> {
        self.canonical_name(name)
            .and_then(|canonical| self.descriptors.get(canonical))
    }

    /// Returns `true` if a descriptor is registered under exactly `name`.
    ///
    /// Aliases do not count; see [`is_alias`](Self::is_alias).
    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    /// Follows aliases from `name` to a registered component name.
    pub fn canonical_name<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        let mut current = name;
        // alias targets always exist and new aliases are fresh names,
        // so chains end; the bound only guards against a corrupted map
        for _ in 0..=self.aliases.len() {
            if let Some((key, _)) = self.descriptors.get_key_value(current) {
                return Some(key.as_str());
            }
            match self.aliases.get(current) {
                Some(target) => {
                    trace!(from = %current, to = %target, "Following alias");
                    current = target.as_str();
                }
                None => return None,
            }
        }
        None
    }

    /// All descriptors assignable to `key`, in name order.
    pub fn get_by_type(&self, key: TypeKey) -> Vec<&ComponentDescriptor> {
        self.descriptors
            .values()
            .filter(|d| d.is_assignable_to(key))
            .collect()
    }

    /// All descriptors, in name order.
    pub fn all(&self) -> impl Iterator<Item = &ComponentDescriptor> + '_ {
        self.descriptors.values()
    }

    /// All component names, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.descriptors.keys().map(String::as_str)
    }

    /// Returns the number of registered descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if no descriptors are registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    // ── Aliases ──

    /// Registers `alias` as a secondary name for `name` (a component name
    /// or another alias).
    ///
    /// # Errors
    /// - [`SandiqError::InvalidName`] if `alias` is not a valid name
    /// - [`SandiqError::DuplicateDescriptor`] if `alias` is already a
    ///   component name or an alias
    /// - [`SandiqError::NotFound`] if `name` resolves to no component
    pub fn register_alias(&mut self, name: &str, alias: impl Into<String>) -> Result<()> {
        let alias = alias.into();
        validate_name(&alias)?;
        self.ensure_unused(&alias)?;

        if self.canonical_name(name).is_none() {
            return Err(self.name_not_found(name, DEFAULT_SUGGESTIONS));
        }

        debug!(alias = %alias, name = %name, "Registered alias");
        self.aliases.insert(alias, name.to_string());
        Ok(())
    }

    /// Removes `alias`, returning the name it pointed to.
    ///
    /// # Errors
    /// [`SandiqError::NotFound`] if `alias` is not registered as an alias.
    pub fn remove_alias(&mut self, alias: &str) -> Result<String> {
        let target = self.aliases.remove(alias).ok_or_else(|| {
            SandiqError::NotFound(NotFoundError {
                lookup: Lookup::Alias(alias.to_string()),
                suggestions: suggest_similar(
                    alias,
                    &self.aliases.keys().collect::<Vec<_>>(),
                    DEFAULT_SUGGESTIONS,
                ),
            })
        })?;

        // aliases pointing at the removed one would dangle
        let dangling: Vec<String> = self
            .aliases
            .iter()
            .filter(|(_, t)| t.as_str() == alias)
            .map(|(a, _)| a.clone())
            .collect();
        for other in dangling {
            trace!(alias = %other, to = %target, "Re-pointing alias");
            self.aliases.insert(other, target.clone());
        }

        debug!(alias = %alias, name = %target, "Removed alias");
        Ok(target)
    }

    /// Returns `true` if `name` is registered as an alias.
    pub fn is_alias(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    /// Every alias that leads to the same component as `name`, in order.
    pub fn aliases_of(&self, name: &str) -> Vec<&str> {
        let Some(canonical) = self.canonical_name(name) else {
            return Vec::new();
        };

        self.aliases
            .keys()
            .map(String::as_str)
            .filter(|alias| *alias != name && self.canonical_name(alias) == Some(canonical))
            .collect()
    }

    // ── Derived flags ──

    /// Returns `true` if another descriptor declares a requirement that
    /// `name` is assignable to.
    pub fn is_autowire_candidate(&self, name: &str) -> bool {
        let Some(candidate) = self.find(name) else {
            return false;
        };

        self.descriptors
            .values()
            .filter(|d| d.name() != candidate.name())
            .flat_map(|d| d.dependencies())
            .any(|req| candidate.is_assignable_to(req.type_key()))
    }

    /// Names of all autowire candidates, in order.
    pub fn autowire_candidates(&self) -> Vec<&str> {
        self.names()
            .filter(|name| self.is_autowire_candidate(name))
            .collect()
    }

    // ── Internal ──

    pub(crate) fn name_not_found(&self, name: &str, max_suggestions: usize) -> SandiqError {
        let known: Vec<&str> = self
            .descriptors
            .keys()
            .chain(self.aliases.keys())
            .map(String::as_str)
            .collect();

        SandiqError::NotFound(NotFoundError {
            lookup: Lookup::Name(name.to_string()),
            suggestions: suggest_similar(name, &known, max_suggestions),
        })
    }

    fn ensure_unused(&self, name: &str) -> Result<()> {
        if self.descriptors.contains_key(name) {
            return Err(SandiqError::DuplicateDescriptor(DuplicateDescriptorError {
                name: name.to_string(),
                conflict: NameConflict::Descriptor,
            }));
        }
        if let Some(target) = self.aliases.get(name) {
            return Err(SandiqError::DuplicateDescriptor(DuplicateDescriptorError {
                name: name.to_string(),
                conflict: NameConflict::Alias {
                    target: target.clone(),
                },
            }));
        }
        Ok(())
    }
}

/// Checks a component name or alias, as a [`SandiqError::InvalidName`].
pub fn validate_name(name: &str) -> Result<()> {
    check_name(name).map_err(|problem| {
        SandiqError::InvalidName(InvalidNameError {
            name: name.to_string(),
            problem,
        })
    })
}
