//! Descriptor sources: the seam between discovery and the registry.
//!
//! Whatever finds components (a scanner, generated code, a hand-written
//! module) implements [`DescriptorSource`] and contributes descriptors to a
//! [`DescriptorSink`]. Both the [`DescriptorRegistry`] and the
//! [`ContainerBuilder`](crate::container::ContainerBuilder) are sinks.
//!
//! # Examples
//! ```rust
//! use sandiq_container::prelude::*;
//!
//! struct Smtp;
//! struct Outbox;
//!
//! struct MailModule;
//!
//! impl DescriptorSource for MailModule {
//!     fn contribute(&self, sink: &mut dyn DescriptorSink) -> Result<()> {
//!         sink.register("smtp", ComponentDescriptor::of::<Smtp>("smtp"))?;
//!         sink.register(
//!             "outbox",
//!             ComponentDescriptor::of::<Outbox>("outbox")
//!                 .depends_on(DependencyRequirement::of::<Smtp>()),
//!         )?;
//!         sink.register_alias("smtp", "mailTransport")
//!     }
//! }
//!
//! let mut registry = DescriptorRegistry::new();
//! MailModule.contribute(&mut registry).unwrap();
//! assert_eq!(registry.len(), 2);
//! ```

use tracing::debug;

use crate::descriptor::ComponentDescriptor;
use crate::error::Result;
use crate::registry::DescriptorRegistry;

/// A group of component descriptors handed over by discovery.
pub trait DescriptorSource: Send + Sync {
    /// Registers this source's descriptors and aliases into `sink`.
    ///
    /// Called once, during startup.
    fn contribute(&self, sink: &mut dyn DescriptorSink) -> Result<()>;

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Where descriptor sources register into.
///
/// Errors are the registry's: invalid or duplicate names, unknown alias
/// targets.
pub trait DescriptorSink {
    fn register(&mut self, name: &str, descriptor: ComponentDescriptor) -> Result<()>;

    fn register_alias(&mut self, name: &str, alias: &str) -> Result<()>;
}

impl DescriptorSink for DescriptorRegistry {
    fn register(&mut self, name: &str, descriptor: ComponentDescriptor) -> Result<()> {
        DescriptorRegistry::register(self, name, descriptor)
    }

    fn register_alias(&mut self, name: &str, alias: &str) -> Result<()> {
        DescriptorRegistry::register_alias(self, name, alias)
    }
}

/// Runs every source against `sink`, stopping at the first error.
pub fn contribute_all(sources: &[&dyn DescriptorSource], sink: &mut dyn DescriptorSink) -> Result<()> {
    for source in sources {
        debug!(source = source.name(), "Collecting descriptors");
        source.contribute(sink)?;
    }
    Ok(())
}
