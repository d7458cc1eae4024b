//! Dependency resolution: which descriptor satisfies a requirement.
//!
//! Precedence, first match wins:
//! 1. **Qualifier**: must name a registered component assignable to the
//!    required type.
//! 2. **Requested name**: a registered name wins outright, without a type
//!    check.
//! 3. **Type**: the only assignable component, or else the only *primary*
//!    one among several.
//!
//! Resolution is a pure query over a borrowed [`DescriptorRegistry`].

use tracing::{trace, warn};

use crate::descriptor::{ComponentDescriptor, DependencyRequirement};
use crate::error::{
    DependencyNotResolvedError, MismatchedTypeError, Result, SandiqError, Unresolved,
};
use crate::key::TypeKey;
use crate::registry::DescriptorRegistry;

/// Resolves requirements against one registry.
///
/// # Examples
/// ```
/// use sandiq_container::prelude::*;
///
/// trait Cache {}
/// struct Local;
/// struct Remote;
///
/// let mut registry = DescriptorRegistry::new();
/// registry.register_descriptor(
///     ComponentDescriptor::of::<Local>("local").assignable_to(TypeKey::of::<dyn Cache>()),
/// ).unwrap();
/// registry.register_descriptor(
///     ComponentDescriptor::of::<Remote>("remote")
///         .assignable_to(TypeKey::of::<dyn Cache>())
///         .primary(),
/// ).unwrap();
///
/// let resolver = DependencyResolver::new(&registry);
/// let by_type = resolver.resolve(&DependencyRequirement::of::<dyn Cache>()).unwrap();
/// assert_eq!(by_type.name(), "remote");
///
/// let pinned = resolver
///     .resolve(&DependencyRequirement::qualified::<dyn Cache>("local"))
///     .unwrap();
/// assert_eq!(pinned.name(), "local");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DependencyResolver<'r> {
    registry: &'r DescriptorRegistry,
}

impl<'r> DependencyResolver<'r> {
    pub fn new(registry: &'r DescriptorRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r DescriptorRegistry {
        self.registry
    }

    /// Resolves `requirement` to exactly one descriptor.
    ///
    /// # Errors
    /// - [`SandiqError::DependencyNotResolved`]: unknown qualifier, no
    ///   candidate, or an ambiguous type without a single primary
    /// - [`SandiqError::MismatchedType`]: the qualified component is not
    ///   assignable to the required type
    pub fn resolve(&self, requirement: &DependencyRequirement) -> Result<&'r ComponentDescriptor> {
        self.resolve_for(None, requirement)
    }

    /// Like [`resolve`](Self::resolve), naming `consumer` in errors.
    pub fn resolve_for(
        &self,
        consumer: Option<&str>,
        requirement: &DependencyRequirement,
    ) -> Result<&'r ComponentDescriptor> {
        if let Some(qualifier) = requirement.qualifier() {
            return self.by_qualifier(consumer, requirement, qualifier);
        }

        if let Some(name) = requirement.requested_name() {
            if let Some(descriptor) = self.registry.find(name) {
                trace!(
                    consumer = consumer.unwrap_or("-"),
                    name,
                    resolved = descriptor.name(),
                    "Resolved by name"
                );
                return Ok(descriptor);
            }
        }

        self.by_type(consumer, requirement)
    }

    /// Resolves a type-only lookup (step 3 alone).
    pub fn resolve_type(&self, key: TypeKey) -> Result<&'r ComponentDescriptor> {
        self.by_type(None, &DependencyRequirement::of_type(key))
    }

    /// Resolves every dependency of `descriptor`, in declared order.
    pub fn resolve_all(&self, descriptor: &ComponentDescriptor) -> Result<Vec<&'r ComponentDescriptor>> {
        descriptor
            .dependencies()
            .iter()
            .map(|req| self.resolve_for(Some(descriptor.name()), req))
            .collect()
    }

    fn by_qualifier(
        &self,
        consumer: Option<&str>,
        requirement: &DependencyRequirement,
        qualifier: &str,
    ) -> Result<&'r ComponentDescriptor> {
        let descriptor = self.registry.find(qualifier).ok_or_else(|| {
            SandiqError::DependencyNotResolved(DependencyNotResolvedError {
                requirement: requirement.clone(),
                required_by: consumer.map(str::to_string),
                reason: Unresolved::UnknownQualifier(qualifier.to_string()),
            })
        })?;

        if !descriptor.is_assignable_to(requirement.type_key()) {
            warn!(
                consumer = consumer.unwrap_or("-"),
                qualifier,
                expected = %requirement.type_key(),
                actual = %descriptor.type_key(),
                "Qualified component has the wrong type"
            );
            return Err(SandiqError::MismatchedType(MismatchedTypeError {
                name: descriptor.name().to_string(),
                expected: requirement.type_key(),
                actual: descriptor.type_key(),
                required_by: consumer.map(str::to_string),
            }));
        }

        trace!(
            consumer = consumer.unwrap_or("-"),
            qualifier,
            resolved = descriptor.name(),
            "Resolved by qualifier"
        );
        Ok(descriptor)
    }

    fn by_type(
        &self,
        consumer: Option<&str>,
        requirement: &DependencyRequirement,
    ) -> Result<&'r ComponentDescriptor> {
        let candidates = self.registry.get_by_type(requirement.type_key());

        let unresolved = |reason| {
            SandiqError::DependencyNotResolved(DependencyNotResolvedError {
                requirement: requirement.clone(),
                required_by: consumer.map(str::to_string),
                reason,
            })
        };

        match candidates.as_slice() {
            [] => Err(unresolved(Unresolved::NoCandidates)),
            [only] => {
                trace!(
                    consumer = consumer.unwrap_or("-"),
                    ty = %requirement.type_key(),
                    resolved = only.name(),
                    "Resolved by type"
                );
                Ok(*only)
            }
            _ => {
                let primaries: Vec<&'r ComponentDescriptor> =
                    candidates.iter().copied().filter(|d| d.is_primary()).collect();

                if let [primary] = primaries.as_slice() {
                    trace!(
                        consumer = consumer.unwrap_or("-"),
                        ty = %requirement.type_key(),
                        resolved = primary.name(),
                        "Resolved by primary"
                    );
                    return Ok(*primary);
                }

                warn!(
                    consumer = consumer.unwrap_or("-"),
                    ty = %requirement.type_key(),
                    candidates = candidates.len(),
                    primaries = primaries.len(),
                    "Ambiguous dependency"
                );
                Err(unresolved(Unresolved::Ambiguous {
                    candidates: candidates.iter().map(|d| d.name().to_string()).collect(),
                    primaries: primaries.iter().map(|d| d.name().to_string()).collect(),
                }))
            }
        }
    }
}
