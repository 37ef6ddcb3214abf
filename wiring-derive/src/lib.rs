//! Derive macros for wiring.
//!
//! Re-exports the procedural macros so users depend on a regular crate.

pub use wiring_macros::Injectable;
