//! Capabilities a component implements to take part in injection.
//!
//! There is no runtime field scanning: a component declares the keys it
//! needs in [`Injectable::dependencies`] and pulls exactly those from the
//! resolver in [`Injectable::inject`]. `#[derive(Injectable)]` writes both
//! for structs whose fields are `Arc<T>` services.
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use wiring_container::prelude::*;
//!
//! trait Clock: Send + Sync {
//!     fn now(&self) -> u64;
//! }
//!
//! struct FixedClock;
//! impl Clock for FixedClock {
//!     fn now(&self) -> u64 { 42 }
//! }
//!
//! struct Scheduler {
//!     clock: Arc<dyn Clock>,
//! }
//!
//! impl Injectable for Scheduler {
//!     fn dependencies() -> Vec<ServiceKey> {
//!         vec![ServiceKey::of::<dyn Clock>()]
//!     }
//!
//!     fn inject(resolver: &dyn Resolver) -> Result<Self> {
//!         Ok(Scheduler { clock: resolver.resolve()? })
//!     }
//! }
//!
//! let mut container = Container::new();
//! container
//!     .register_singleton_instance::<dyn Clock>(Arc::new(FixedClock))
//!     .unwrap()
//!     .register_transient::<Scheduler, Scheduler>()
//!     .unwrap();
//!
//! let scheduler = container.resolve::<Scheduler>().unwrap();
//! assert_eq!(scheduler.clock.now(), 42);
//! ```

use std::sync::Arc;

use crate::error::Result;
use crate::key::ServiceKey;
use crate::resolver::Resolver;

/// A component the container can construct.
pub trait Injectable: Send + Sync + Sized + 'static {
    /// Keys this component pulls in [`inject`](Injectable::inject).
    ///
    /// Used by verification; resolution itself follows what `inject` does.
    fn dependencies() -> Vec<ServiceKey> {
        Vec::new()
    }

    /// Builds the component from its dependencies.
    fn inject(resolver: &dyn Resolver) -> Result<Self>;

    /// Returns the disposal hook for a freshly built instance, if any.
    ///
    /// Cached (singleton and scoped) instances with a hook are disposed in
    /// reverse creation order when their owning container is disposed.
    fn disposer(_this: &Arc<Self>) -> Option<Arc<dyn Dispose>> {
        None
    }
}

/// Synchronous teardown hook.
pub trait Dispose: Send + Sync + 'static {
    /// Releases resources. Called at most once by the container.
    fn dispose(&self);
}

/// Converts `Arc<Self>` into `Arc<I>`, usually a trait object.
///
/// Stable Rust cannot coerce `Arc<T>` to `Arc<dyn Trait>` through a generic
/// parameter, so each implementation states which services it provides,
/// either by hand, with [`provides!`](crate::provides), or with
/// `#[injectable(provides = "dyn Trait")]`.
pub trait Upcast<I: ?Sized>: Send + Sync + 'static {
    /// Performs the conversion.
    fn upcast(self: Arc<Self>) -> Arc<I>;
}

impl<T: Send + Sync + 'static> Upcast<T> for T {
    #[inline]
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// Implements [`Upcast`] from a concrete type to one or more services.
///
/// ```rust
/// use std::sync::Arc;
/// use wiring_container::injectable::Upcast;
///
/// trait Reader: Send + Sync {}
/// trait Writer: Send + Sync {}
///
/// struct File;
/// impl Reader for File {}
/// impl Writer for File {}
///
/// wiring_container::provides!(File => dyn Reader, dyn Writer);
///
/// let reader = Upcast::<dyn Reader>::upcast(Arc::new(File));
/// let _: Arc<dyn Reader> = reader;
/// ```
#[macro_export]
macro_rules! provides {
    ($implementation:ty => $($service:ty),+ $(,)?) => {
        $(
            impl $crate::injectable::Upcast<$service> for $implementation {
                #[inline]
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$service> {
                    self
                }
            }
        )+
    };
}

/// A component that wraps another implementation of `I`.
///
/// Decorators registered for `I` are applied in registration order, so
/// the last registered decorator ends up outermost.
pub trait Decorator<I>: Upcast<I> + Sized
where
    I: ?Sized + Send + Sync + 'static,
{
    /// Keys the decorator pulls in addition to the wrapped instance.
    fn dependencies() -> Vec<ServiceKey> {
        Vec::new()
    }

    /// Wraps `inner`.
    fn decorate(inner: Arc<I>, resolver: &dyn Resolver) -> Result<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    trait Shape: Send + Sync {
        fn area(&self) -> u32;
    }

    struct Square(u32);

    impl Shape for Square {
        fn area(&self) -> u32 {
            self.0 * self.0
        }
    }

    crate::provides!(Square => dyn Shape);

    #[test]
    fn identity_upcast() {
        let value = Arc::new(5u32);
        let same: Arc<u32> = Arc::clone(&value).upcast();
        assert!(Arc::ptr_eq(&value, &same));
    }

    #[test]
    fn macro_upcast_to_trait_object() {
        let shape = Upcast::<dyn Shape>::upcast(Arc::new(Square(3)));
        assert_eq!(shape.area(), 9);
    }

    #[test]
    fn default_disposer_is_none() {
        struct Plain;
        impl Injectable for Plain {
            fn inject(_: &dyn Resolver) -> Result<Self> {
                Ok(Plain)
            }
        }

        assert!(Plain::disposer(&Arc::new(Plain)).is_none());
        assert!(Plain::dependencies().is_empty());
    }

    #[test]
    fn custom_disposer_is_invoked() {
        struct Handle(AtomicBool);
        impl Dispose for Handle {
            fn dispose(&self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }
        impl Injectable for Handle {
            fn inject(_: &dyn Resolver) -> Result<Self> {
                Ok(Handle(AtomicBool::new(false)))
            }
            fn disposer(this: &Arc<Self>) -> Option<Arc<dyn Dispose>> {
                Some(Arc::clone(this) as Arc<dyn Dispose>)
            }
        }

        let handle = Arc::new(Handle(AtomicBool::new(false)));
        let hook = Handle::disposer(&handle).expect("disposer");
        hook.dispose();
        assert!(handle.0.load(Ordering::SeqCst));
    }
}
