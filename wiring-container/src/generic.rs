//! Open-generic bindings.
//!
//! A generic service family such as `dyn Repository<A>` is described by a
//! marker type implementing [`GenericService`]; an implementation family
//! implements [`GenericImplementation`] for it. Registering an
//! [`OpenGeneric`] stores one constructor per argument type it closes over;
//! the closed binding for `S::Closed<A>` is built the first time that type
//! is requested and then kept in the registration store.
//!
//! ```rust
//! use std::marker::PhantomData;
//! use std::sync::Arc;
//! use wiring_container::prelude::*;
//! use wiring_container::generic::{GenericImplementation, GenericService, OpenGeneric};
//!
//! trait Repository<A>: Send + Sync {
//!     fn entity(&self) -> &'static str;
//! }
//!
//! struct Repositories;
//! impl GenericService for Repositories {
//!     type Closed<A: Send + Sync + 'static> = dyn Repository<A>;
//! }
//!
//! struct MemoryRepository<A>(PhantomData<fn() -> A>);
//! impl<A: 'static> Repository<A> for MemoryRepository<A> {
//!     fn entity(&self) -> &'static str {
//!         std::any::type_name::<A>()
//!     }
//! }
//!
//! struct MemoryRepositories;
//! impl GenericImplementation<Repositories> for MemoryRepositories {
//!     fn construct<A: Send + Sync + 'static>(
//!         _resolver: &dyn Resolver,
//!     ) -> Result<Arc<dyn Repository<A>>> {
//!         Ok(Arc::new(MemoryRepository::<A>(PhantomData)))
//!     }
//! }
//!
//! struct User;
//! struct Order;
//!
//! let mut container = Container::new();
//! container.register_open_generic(
//!     OpenGeneric::new::<Repositories, MemoryRepositories>(Lifetime::Singleton)
//!         .closing::<User>()
//!         .closing::<Order>(),
//! )
//! .unwrap();
//!
//! let users = container.resolve_generic::<Repositories, User>().unwrap();
//! assert!(users.entity().ends_with("User"));
//! ```

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::binding::{Binding, Constructed, FactoryFn, Implementation};
use crate::error::Result;
use crate::key::ServiceKey;
use crate::lifetime::Lifetime;
use crate::resolver::Resolver;

/// A family of service types indexed by one type argument.
pub trait GenericService: 'static {
    /// The service type for argument `A`, usually a trait object.
    type Closed<A: Send + Sync + 'static>: ?Sized + Send + Sync + 'static;
}

/// A family of implementations of a [`GenericService`].
pub trait GenericImplementation<S: GenericService>: 'static {
    /// Keys the closed implementation for `A` pulls from the resolver.
    fn dependencies<A: Send + Sync + 'static>() -> Vec<ServiceKey> {
        Vec::new()
    }

    /// Builds the implementation closed over `A`.
    fn construct<A: Send + Sync + 'static>(resolver: &dyn Resolver) -> Result<Arc<S::Closed<A>>>;
}

#[derive(Clone)]
struct Closer {
    key: ServiceKey,
    dependencies: Vec<ServiceKey>,
    factory: FactoryFn,
}

/// An open-generic registration together with the arguments it can close over.
#[derive(Clone)]
pub struct OpenGeneric {
    family: TypeId,
    family_name: &'static str,
    implementation_name: &'static str,
    lifetime: Lifetime,
    closers: HashMap<TypeId, Closer>,
}

impl OpenGeneric {
    /// Starts an open-generic registration of `G` for the family `S`.
    pub fn new<S, G>(lifetime: Lifetime) -> OpenGenericBuilder<S, G>
    where
        S: GenericService,
        G: GenericImplementation<S>,
    {
        OpenGenericBuilder {
            inner: OpenGeneric {
                family: TypeId::of::<S>(),
                family_name: type_name::<S>(),
                implementation_name: type_name::<G>(),
                lifetime,
                closers: HashMap::new(),
            },
            _family: PhantomData,
        }
    }

    pub(crate) fn family(&self) -> TypeId {
        self.family
    }

    pub fn family_name(&self) -> &'static str {
        self.family_name
    }

    pub fn implementation_name(&self) -> &'static str {
        self.implementation_name
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Returns `true` if this registration can close over the requested type.
    pub fn can_close(&self, key: &ServiceKey) -> bool {
        !key.is_named() && self.closers.contains_key(&key.type_id())
    }

    /// Keys of every closed service this registration can produce.
    pub fn closed_keys(&self) -> impl Iterator<Item = &ServiceKey> {
        self.closers.values().map(|closer| &closer.key)
    }

    /// Builds the closed binding for `key`, if this family covers it.
    pub(crate) fn close(&self, key: &ServiceKey) -> Option<Binding> {
        if key.is_named() {
            return None;
        }
        let closer = self.closers.get(&key.type_id())?;
        Some(Binding::raw(
            closer.key.clone(),
            Implementation::Type {
                type_name: self.implementation_name,
                factory: Arc::clone(&closer.factory),
            },
            self.lifetime,
            closer.dependencies.clone(),
        ))
    }
}

impl fmt::Debug for OpenGeneric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenGeneric")
            .field("family", &self.family_name)
            .field("implementation", &self.implementation_name)
            .field("lifetime", &self.lifetime)
            .field("arguments", &self.closers.len())
            .finish()
    }
}

/// Typed builder returned by [`OpenGeneric::new`].
pub struct OpenGenericBuilder<S, G> {
    inner: OpenGeneric,
    _family: PhantomData<fn() -> (S, G)>,
}

impl<S, G> OpenGenericBuilder<S, G>
where
    S: GenericService,
    G: GenericImplementation<S>,
{
    /// Allows the family to be requested for argument `A`.
    pub fn closing<A: Send + Sync + 'static>(mut self) -> Self {
        let key = ServiceKey::of::<S::Closed<A>>();
        let factory: FactoryFn = Arc::new(|resolver: &dyn Resolver| {
            Ok(Constructed::new::<S::Closed<A>>(G::construct::<A>(resolver)?, None))
        });
        self.inner.closers.insert(
            key.type_id(),
            Closer {
                key,
                dependencies: G::dependencies::<A>(),
                factory,
            },
        );
        self
    }

    pub fn build(self) -> OpenGeneric {
        self.inner
    }
}

impl<S, G> From<OpenGenericBuilder<S, G>> for OpenGeneric
where
    S: GenericService,
    G: GenericImplementation<S>,
{
    fn from(builder: OpenGenericBuilder<S, G>) -> Self {
        builder.build()
    }
}
