//! Provider modules and the typed registration API.
//!
//! Providers group related registrations, like a `ServiceProvider` in
//! other containers. Both [`ContainerBuilder`](crate::builder::ContainerBuilder)
//! and a live [`Container`](crate::container::Container) implement
//! [`ProviderRegistry`], so a provider can populate either, and
//! [`RegistrationApi`] adds the typed `register_*` methods to all of them.
//!
//! Registration is fallible: a disposed container refuses new bindings with
//! [`WiringError::ContainerDisposed`](crate::error::WiringError::ContainerDisposed),
//! so every method returns a [`Result`] and chains with `?`.
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use wiring_container::prelude::*;
//!
//! trait Clock: Send + Sync {}
//! struct SystemClock;
//! impl Clock for SystemClock {}
//!
//! struct TimeProvider;
//!
//! impl Provider for TimeProvider {
//!     fn register(&self, registry: &mut dyn ProviderRegistry) -> Result<()> {
//!         registry.register_singleton_instance::<dyn Clock>(Arc::new(SystemClock))?;
//!         Ok(())
//!     }
//! }
//!
//! let container = Container::builder()
//!     .add_provider(&TimeProvider)
//!     .build()
//!     .unwrap();
//! assert!(container.is_registered::<dyn Clock>());
//! ```

use std::sync::Arc;

use crate::binding::{Binding, ConditionContext, DecoratorBinding};
use crate::error::Result;
use crate::generic::OpenGeneric;
use crate::injectable::{Decorator, Injectable, Upcast};
use crate::lifetime::Lifetime;
use crate::resolver::Resolver;

/// A module that registers related services.
///
/// Split registrations by domain instead of one giant block:
///
/// ```rust,ignore
/// let container = Container::builder()
///     .add_provider(&DatabaseProvider)
///     .add_provider(&AuthProvider)
///     .add_provider(&EmailProvider)
///     .build()?;
/// ```
pub trait Provider: Send + Sync {
    /// Adds this module's bindings to `registry`.
    fn register(&self, registry: &mut dyn ProviderRegistry) -> Result<()>;

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Type-erased registration surface shared by builders and containers.
pub trait ProviderRegistry {
    fn add_binding(&mut self, binding: Binding) -> Result<()>;

    fn add_decorator(&mut self, decorator: DecoratorBinding) -> Result<()>;

    fn add_open_generic(&mut self, open: OpenGeneric) -> Result<()>;
}

/// Typed registration methods, available on every [`ProviderRegistry`].
///
/// Each returns `&mut Self` on success so calls chain with `?`.
pub trait RegistrationApi: ProviderRegistry {
    /// Adds a fully configured [`Binding`].
    fn register_binding(&mut self, binding: impl Into<Binding>) -> Result<&mut Self> {
        self.add_binding(binding.into())?;
        Ok(self)
    }

    /// Binds `I` to `T`, one instance per defining container.
    fn register_singleton<I, T>(&mut self) -> Result<&mut Self>
    where
        I: ?Sized + Send + Sync + 'static,
        T: Injectable + Upcast<I>,
    {
        self.register_binding(Binding::implemented_by::<I, T>().singleton())
    }

    /// Binds `I` to a pre-built instance. The container never disposes it.
    fn register_singleton_instance<I>(&mut self, instance: Arc<I>) -> Result<&mut Self>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.register_binding(Binding::instance(instance))
    }

    /// Binds `I` to `T`, a new instance per resolution.
    fn register_transient<I, T>(&mut self) -> Result<&mut Self>
    where
        I: ?Sized + Send + Sync + 'static,
        T: Injectable + Upcast<I>,
    {
        self.register_binding(Binding::implemented_by::<I, T>().transient())
    }

    /// Binds `I` to `T`, one instance per scope.
    fn register_scoped<I, T>(&mut self) -> Result<&mut Self>
    where
        I: ?Sized + Send + Sync + 'static,
        T: Injectable + Upcast<I>,
    {
        self.register_binding(Binding::implemented_by::<I, T>().scoped())
    }

    /// Binds `I` to a factory closure.
    fn register_factory<I, F>(&mut self, lifetime: Lifetime, factory: F) -> Result<&mut Self>
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn Resolver) -> Result<Arc<I>> + Send + Sync + 'static,
    {
        self.register_binding(Binding::factory(factory).lifetime(lifetime))
    }

    /// Binds `I` under `name` to `T`. Named bindings coexist.
    fn register_named<I, T>(&mut self, name: &str, lifetime: Lifetime) -> Result<&mut Self>
    where
        I: ?Sized + Send + Sync + 'static,
        T: Injectable + Upcast<I>,
    {
        self.register_binding(
            Binding::implemented_by::<I, T>()
                .named(name)
                .lifetime(lifetime),
        )
    }

    /// Binds `I` to `T` while `condition` holds.
    fn register_conditional<I, T, P>(&mut self, lifetime: Lifetime, condition: P) -> Result<&mut Self>
    where
        I: ?Sized + Send + Sync + 'static,
        T: Injectable + Upcast<I>,
        P: Fn(&ConditionContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.register_binding(
            Binding::implemented_by::<I, T>()
                .lifetime(lifetime)
                .when(condition),
        )
    }

    /// Adds `T` as a member of the collection for `I`.
    fn register_collection<I, T>(&mut self, lifetime: Lifetime) -> Result<&mut Self>
    where
        I: ?Sized + Send + Sync + 'static,
        T: Injectable + Upcast<I>,
    {
        self.register_binding(
            Binding::implemented_by::<I, T>()
                .lifetime(lifetime)
                .in_collection(),
        )
    }

    /// Wraps every binding of `I` with the decorator `D`.
    fn register_decorator<I, D>(&mut self) -> Result<&mut Self>
    where
        I: ?Sized + Send + Sync + 'static,
        D: Decorator<I>,
    {
        self.add_decorator(DecoratorBinding::of::<I, D>())?;
        Ok(self)
    }

    /// Wraps every binding of `I` with a closure.
    fn register_decorator_fn<I, F>(&mut self, decorate: F) -> Result<&mut Self>
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<I>, &dyn Resolver) -> Result<Arc<I>> + Send + Sync + 'static,
    {
        self.add_decorator(DecoratorBinding::from_fn(decorate))?;
        Ok(self)
    }

    /// Registers an open-generic family.
    fn register_open_generic(&mut self, open: impl Into<OpenGeneric>) -> Result<&mut Self> {
        self.add_open_generic(open.into())?;
        Ok(self)
    }
}

impl<R: ProviderRegistry + ?Sized> RegistrationApi for R {}

/// A provider discovered at link time.
///
/// Created by [`submit_provider!`](crate::submit_provider) and applied by
/// [`ContainerBuilder::discover_providers`](crate::builder::ContainerBuilder::discover_providers).
pub struct ProviderRegistration {
    pub name: &'static str,
    pub register: fn(&mut dyn ProviderRegistry) -> Result<()>,
}

inventory::collect!(ProviderRegistration);

/// Every provider submitted anywhere in the final binary.
pub fn discovered_providers() -> impl Iterator<Item = &'static ProviderRegistration> {
    inventory::iter::<ProviderRegistration>.into_iter()
}

/// Submits a [`Provider`] value for link-time discovery.
///
/// The expression must be usable in a `static` context, typically a unit
/// struct.
///
/// ```rust,ignore
/// struct MailProvider;
/// impl Provider for MailProvider { /* ... */ }
///
/// wiring_container::submit_provider!(MailProvider);
/// ```
#[macro_export]
macro_rules! submit_provider {
    ($provider:expr) => {
        $crate::inventory::submit! {
            $crate::provider::ProviderRegistration {
                name: ::core::stringify!($provider),
                register: |registry: &mut dyn $crate::provider::ProviderRegistry| {
                    $crate::provider::Provider::register(&$provider, registry)
                },
            }
        }
    };
}
