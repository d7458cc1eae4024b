//! # Sandiq: Embedded IoC Container for Rust
//!
//! Register component descriptors, let the container check the dependency
//! graph, then ask it for fully wired singletons by name or by type.
//!
//! ```rust
//! use std::sync::Arc;
//! use sandiq::prelude::*;
//!
//! struct Config { url: &'static str }
//! struct Database { config: Arc<Config> }
//!
//! let container = Container::builder()
//!     .component(ComponentDescriptor::with_factory("config", |_| Ok(Config { url: "mem://" })))
//!     .component(
//!         ComponentDescriptor::with_factory("database", |args| {
//!             Ok(Database { config: args.get::<Config>(0)? })
//!         })
//!         .depends_on(DependencyRequirement::of::<Config>()),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let db: Arc<Database> = container.resolve().unwrap();
//! assert_eq!(db.config.url, "mem://");
//! ```

pub use sandiq_container::*;
pub use sandiq_support::*;
