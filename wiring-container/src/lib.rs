//! Core container implementation for wiring.
//!
//! Registration, lookup, lifetime management, scopes, decorators, open
//! generics and verification live here; the `wiring` crate re-exports it
//! together with the derive macro.

pub mod binding;
pub mod builder;
pub(crate) mod cache;
pub mod container;
pub mod error;
pub mod events;
pub mod generic;
pub mod injectable;
pub mod key;
pub mod lifetime;
pub mod options;
pub mod provider;
pub(crate) mod registry;
pub mod resolver;
pub mod verify;

#[doc(hidden)]
pub use inventory;

pub use binding::{Binding, BindingDescriptor, BindingKind, ConditionContext, DecoratorBinding};
pub use builder::ContainerBuilder;
pub use container::{Container, prelude};
pub use error::{Result, WiringError};
pub use events::EventBus;
pub use generic::{GenericImplementation, GenericService, OpenGeneric};
pub use injectable::{Decorator, Dispose, Injectable, Upcast};
pub use key::ServiceKey;
pub use lifetime::Lifetime;
pub use options::ContainerOptions;
pub use provider::{Provider, ProviderRegistry, RegistrationApi};
pub use resolver::{AnyInstance, Resolver, ResolverApi};
pub use verify::{AbortSignal, VerificationResult, VerifyOptions};
