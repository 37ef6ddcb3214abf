//! # Wiring Support
//!
//! Shared utilities for the Wiring service container.
//!
//! This crate provides:
//! - Text rendering for diagnostics (resolution paths, short type names, suggestions)
//! - Tracing subscriber bootstrap for hosts and demos

pub mod rendering;
pub mod telemetry;
