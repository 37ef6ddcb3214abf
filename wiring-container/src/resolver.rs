//! The resolution interface handed to factories and consumers.
//!
//! [`Resolver`] is object-safe and type-erased; [`ResolverApi`] layers the
//! typed `resolve::<T>()` family on top of it for every resolver, including
//! `&dyn Resolver` inside factories.

use std::any::{Any, type_name};
use std::sync::Arc;

use crate::error::{Result, WiringError};
use crate::generic::GenericService;
use crate::key::ServiceKey;

/// A type-erased service instance.
///
/// The container always stores an `Arc<T>` inside the `Any`, where `T` is the
/// service type (often a trait object). [`downcast`] recovers it.
pub type AnyInstance = Arc<dyn Any + Send + Sync>;

/// Trait for resolving services by key.
///
/// This is what factory functions and [`Injectable`](crate::injectable::Injectable)
/// implementations receive to pull their own dependencies.
pub trait Resolver: Send + Sync {
    /// Resolves the binding for `key`.
    fn resolve_key(&self, key: &ServiceKey) -> Result<AnyInstance>;

    /// Like [`resolve_key`](Resolver::resolve_key) but yields `None` when
    /// `key` itself is not registered. Every other failure propagates.
    fn try_resolve_key(&self, key: &ServiceKey) -> Result<Option<AnyInstance>> {
        match self.resolve_key(key) {
            Ok(instance) => Ok(Some(instance)),
            Err(e) if e.is_not_registered(key) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Resolves every collection member bound under `key`, in registration
    /// order. An unknown key yields an empty vector.
    fn resolve_all_key(&self, key: &ServiceKey) -> Result<Vec<AnyInstance>>;

    /// Returns `true` if any binding exists for `key`.
    fn contains_key(&self, key: &ServiceKey) -> bool;
}

/// Recovers a typed `Arc<T>` from a type-erased instance.
pub fn downcast<T>(key: &ServiceKey, instance: &AnyInstance) -> Result<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    instance
        .downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or_else(|| WiringError::TypeMismatch {
            key: key.clone(),
            expected: type_name::<T>(),
        })
}

/// Typed resolution API, available on every [`Resolver`].
///
/// ```rust
/// use std::sync::Arc;
/// use wiring_container::prelude::*;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
///
/// let mut container = Container::new();
/// container.register_singleton_instance::<dyn Greeter>(Arc::new(English)).unwrap();
///
/// let greeter = container.resolve::<dyn Greeter>().unwrap();
/// assert_eq!(greeter.greet(), "hello");
/// ```
pub trait ResolverApi: Resolver {
    /// Resolves the primary (or matching conditional) binding of `T`.
    fn resolve<T>(&self) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = ServiceKey::of::<T>();
        let instance = self.resolve_key(&key)?;
        downcast(&key, &instance)
    }

    /// Resolves `T`, returning `None` if `T` is not registered.
    fn try_resolve<T>(&self) -> Result<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = ServiceKey::of::<T>();
        match self.try_resolve_key(&key)? {
            Some(instance) => downcast(&key, &instance).map(Some),
            None => Ok(None),
        }
    }

    /// Resolves the binding of `T` registered under `name`.
    fn resolve_named<T>(&self, name: &str) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = ServiceKey::named::<T>(name);
        let instance = self.resolve_key(&key)?;
        downcast(&key, &instance)
    }

    /// Resolves every collection member of `T` in registration order.
    fn resolve_all<T>(&self) -> Result<Vec<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = ServiceKey::of::<T>();
        self.resolve_all_key(&key)?
            .iter()
            .map(|instance| downcast(&key, instance))
            .collect()
    }

    /// Resolves every collection member of `T`, keeping those accepted by
    /// `predicate`.
    fn resolve_where<T, P>(&self, mut predicate: P) -> Result<Vec<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
        P: FnMut(&Arc<T>) -> bool,
    {
        let mut all = self.resolve_all::<T>()?;
        all.retain(|instance| predicate(instance));
        Ok(all)
    }

    /// Resolves the closed form `S::Closed<A>` of an open-generic service.
    fn resolve_generic<S, A>(&self) -> Result<Arc<S::Closed<A>>>
    where
        S: GenericService,
        A: Send + Sync + 'static,
    {
        self.resolve::<S::Closed<A>>()
    }

    /// Returns `true` if `T` has any binding.
    fn is_registered<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        self.contains_key(&ServiceKey::of::<T>())
    }
}

impl<R: Resolver + ?Sized> ResolverApi for R {}

/// Resolves a typed service from a [`Resolver`].
///
/// Use this inside factory closures when the method form reads awkwardly:
///
/// ```rust,ignore
/// builder.register_factory::<dyn Mailer, _>(Lifetime::Singleton, |r| {
///     let transport = wiring_container::resolver::resolve::<dyn Transport>(r)?;
///     Ok(Arc::new(SmtpMailer::new(transport)) as Arc<dyn Mailer>)
/// })?;
/// ```
pub fn resolve<T>(resolver: &dyn Resolver) -> Result<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    resolver.resolve::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotRegisteredError;
    use std::collections::HashMap;

    /// A resolver backed by a fixed map, for exercising the typed layer alone.
    struct MapResolver {
        entries: HashMap<ServiceKey, AnyInstance>,
    }

    impl Resolver for MapResolver {
        fn resolve_key(&self, key: &ServiceKey) -> Result<AnyInstance> {
            self.entries.get(key).cloned().ok_or_else(|| {
                WiringError::ServiceNotRegistered(NotRegisteredError {
                    requested: key.clone(),
                    required_by: None,
                    path: vec![],
                    suggestions: vec![],
                })
            })
        }

        fn resolve_all_key(&self, _key: &ServiceKey) -> Result<Vec<AnyInstance>> {
            Ok(Vec::new())
        }

        fn contains_key(&self, key: &ServiceKey) -> bool {
            self.entries.contains_key(key)
        }
    }

    fn erased<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> AnyInstance {
        Arc::new(value)
    }

    #[test]
    fn typed_resolve_downcasts() {
        let mut entries = HashMap::new();
        entries.insert(ServiceKey::of::<String>(), erased(Arc::new(String::from("x"))));
        let resolver = MapResolver { entries };

        let value = resolver.resolve::<String>().unwrap();
        assert_eq!(value.as_str(), "x");
        assert!(resolver.is_registered::<String>());
    }

    #[test]
    fn try_resolve_returns_none_for_missing() {
        let resolver = MapResolver { entries: HashMap::new() };
        assert!(resolver.try_resolve::<String>().unwrap().is_none());
    }

    #[test]
    fn mismatched_instance_is_reported() {
        let mut entries = HashMap::new();
        entries.insert(ServiceKey::of::<String>(), erased(Arc::new(7u32)));
        let resolver = MapResolver { entries };

        match resolver.resolve::<String>() {
            Err(WiringError::TypeMismatch { expected, .. }) => {
                assert!(expected.contains("String"));
            }
            other => panic!("Expected TypeMismatch, got: {other:?}"),
        }
    }

    #[test]
    fn works_through_dyn_resolver() {
        let mut entries = HashMap::new();
        entries.insert(ServiceKey::named::<u8>("port"), erased(Arc::new(8u8)));
        let resolver = MapResolver { entries };
        let dynamic: &dyn Resolver = &resolver;

        assert_eq!(*dynamic.resolve_named::<u8>("port").unwrap(), 8);
        assert_eq!(*resolve::<u8>(dynamic).unwrap_or_else(|_| Arc::new(0)), 0);
    }
}
