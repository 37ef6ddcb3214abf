//! # Wiring: a service container for Rust
//!
//! Register services with a lifetime, resolve them by type or by name, and
//! let the container build the dependency graph for you.
//!
//! - Singleton, scoped and transient lifetimes with nested scopes
//! - Named, conditional and collection bindings
//! - Decorators and open-generic families
//! - Cycle detection and whole-graph verification
//! - Disposal in reverse creation order
//!
//! ```rust
//! use std::sync::Arc;
//! use wiring::prelude::*;
//! use wiring::Injectable;
//!
//! struct Config {
//!     url: String,
//! }
//!
//! #[derive(Injectable)]
//! struct Database {
//!     config: Arc<Config>,
//! }
//!
//! let container = Container::builder()
//!     .configure(|b| {
//!         b.register_singleton_instance(Arc::new(Config { url: "postgres://localhost".into() }))?
//!             .register_singleton::<Database, Database>()?;
//!         Ok(())
//!     })
//!     .build()
//!     .unwrap();
//!
//! let db = container.resolve::<Database>().unwrap();
//! assert_eq!(db.config.url, "postgres://localhost");
//! ```

pub use wiring_container::*;
pub use wiring_derive::*;
pub use wiring_support::*;
