//! Service identification keys.
//!
//! [`ServiceKey`] uniquely identifies a service within the container.
//! It combines a [`TypeId`] with an optional name for named bindings.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Uniquely identifies a service in the container.
///
/// Each service is identified by its abstract Rust type ([`TypeId`]) and
/// an optional name for cases where several bindings of the same type
/// must coexist.
///
/// # Examples
/// ```
/// use wiring_container::key::ServiceKey;
///
/// // Simple key: just a type
/// let key = ServiceKey::of::<String>();
/// assert_eq!(key.type_name(), "alloc::string::String");
/// assert_eq!(key.name(), None);
///
/// // Named key: type + name
/// let key = ServiceKey::named::<String>("database_url");
/// assert_eq!(key.name(), Some("database_url"));
/// ```
#[derive(Clone)]
pub struct ServiceKey {
    type_id: TypeId,
    type_name: &'static str,
    name: Option<Arc<str>>,
}

impl ServiceKey {
    /// Creates a key for type `T`.
    ///
    /// `T` is usually a trait object such as `dyn Logger`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            name: None,
        }
    }

    /// Creates a named key for type `T`.
    ///
    /// # Examples
    /// ```
    /// use wiring_container::key::ServiceKey;
    ///
    /// let primary = ServiceKey::named::<String>("primary_db");
    /// let replica = ServiceKey::named::<String>("replica_db");
    /// assert_ne!(primary, replica);
    /// ```
    #[inline]
    pub fn named<T: ?Sized + 'static>(name: impl Into<Arc<str>>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            name: Some(name.into()),
        }
    }

    /// Creates a key from a raw [`TypeId`] and type name.
    ///
    /// Prefer [`ServiceKey::of`] when possible: this is for
    /// advanced use cases (e.g., inside proc-macros).
    #[inline]
    pub fn from_raw(type_id: TypeId, type_name: &'static str) -> Self {
        Self { type_id, type_name, name: None }
    }

    /// Returns the [`TypeId`] of the service type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the human-readable type name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the optional name for named bindings.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns `true` if this key carries a name.
    #[inline]
    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }

    /// The same service type without the name.
    pub fn unnamed(&self) -> Self {
        Self {
            type_id: self.type_id,
            type_name: self.type_name,
            name: None,
        }
    }

    /// Returns `true` if both keys refer to the same service type,
    /// regardless of name.
    #[inline]
    pub fn same_type(&self, other: &ServiceKey) -> bool {
        self.type_id == other.type_id
    }

    /// The type name with module paths stripped, for reports.
    pub fn short_name(&self) -> String {
        let short = wiring_support::rendering::shorten_type_name(self.type_name);
        match &self.name {
            Some(name) => format!("{short}[{name}]"),
            None => short,
        }
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.name == other.name
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "ServiceKey({}, name={:?})", self.type_name, name),
            None => write!(f, "ServiceKey({})", self.type_name),
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} (name={:?})", self.type_name, name),
            None => write!(f, "{}", self.type_name),
        }
    }
}
