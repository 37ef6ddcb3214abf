//! Service lifetimes.
//!
//! Lifetimes determine how long a resolved instance is reused:
//! - [`Lifetime::Singleton`]: one instance per defining container
//! - [`Lifetime::Scoped`]: one instance per scope (e.g., a unit of work)
//! - [`Lifetime::Transient`]: new instance every time
//!
//! # Ordering
//! Lifetimes have a natural ordering: `Singleton > Scoped > Transient`.
//! A Singleton "outlives" a Scoped, which "outlives" a Transient.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Defines the reuse policy of a binding.
///
/// # Examples
/// ```
/// use wiring_container::lifetime::Lifetime;
///
/// assert!(Lifetime::Singleton > Lifetime::Scoped);
/// assert!(Lifetime::Scoped > Lifetime::Transient);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifetime {
    /// One instance shared by the defining container and all its scopes.
    ///
    /// Created on first resolve, disposed with the container that
    /// defines the binding.
    Singleton,

    /// One instance per scope.
    ///
    /// Created on first resolve within a scope, disposed when the scope
    /// is disposed. Resolving in a sibling scope creates a distinct instance.
    Scoped,

    /// New instance created on every resolve call.
    ///
    /// Never cached; the caller owns it.
    Transient,
}

impl Lifetime {
    /// Returns `true` if instances of this lifetime are cached.
    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(self, Lifetime::Singleton | Lifetime::Scoped)
    }

    /// Returns `true` for [`Lifetime::Singleton`].
    #[inline]
    pub fn is_singleton(&self) -> bool {
        matches!(self, Lifetime::Singleton)
    }

    #[inline]
    fn ordering(&self) -> u8 {
        match self {
            Lifetime::Singleton => 2,
            Lifetime::Scoped => 1,
            Lifetime::Transient => 0,
        }
    }
}

impl PartialOrd for Lifetime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Lifetime {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ordering().cmp(&other.ordering())
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Singleton => write!(f, "Singleton"),
            Lifetime::Scoped => write!(f, "Scoped"),
            Lifetime::Transient => write!(f, "Transient"),
        }
    }
}
