//! Core container implementation for Sandiq.

pub mod container;
pub mod descriptor;
pub mod error;
pub mod graph;
pub mod instance;
pub mod key;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod scope;
pub mod settings;

pub use container::{prelude, Container, ContainerBuilder};
pub use descriptor::{ComponentDescriptor, DependencyRequirement};
pub use error::{Result, SandiqError};
pub use instance::Component;
pub use key::TypeKey;
pub use scope::Scope;
