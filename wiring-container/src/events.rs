//! Notification bus for registration and resolution events.
//!
//! Subscribers run synchronously, in subscription order, on the thread that
//! triggered the event. A panicking subscriber is logged and skipped; it
//! never changes the outcome of the operation that fired the event.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use tracing::warn;

use crate::binding::BindingDescriptor;
use crate::error::WiringError;
use crate::key::ServiceKey;
use crate::resolver::AnyInstance;

/// Handle returned by every subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A binding was added to a container.
#[derive(Debug, Clone)]
pub struct RegistrationEvent {
    pub descriptor: BindingDescriptor,
    /// `true` if the binding replaced an earlier primary binding.
    pub replaced: bool,
}

/// A top-level resolution succeeded.
pub struct ResolvedEvent<'a> {
    pub key: &'a ServiceKey,
    pub instance: &'a AnyInstance,
    pub elapsed: Duration,
}

/// A top-level resolution failed.
pub struct ResolutionFailedEvent<'a> {
    pub key: &'a ServiceKey,
    pub error: &'a WiringError,
}

type RegisteredHandler = dyn Fn(&RegistrationEvent) + Send + Sync;
type ResolvedHandler = dyn for<'a> Fn(&ResolvedEvent<'a>) + Send + Sync;
type FailedHandler = dyn for<'a> Fn(&ResolutionFailedEvent<'a>) + Send + Sync;

struct Channel<H: ?Sized> {
    name: &'static str,
    subscribers: RwLock<Vec<(SubscriptionId, Arc<H>)>>,
}

impl<H: ?Sized> Channel<H> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            subscribers: RwLock::new(Vec::new()),
        }
    }

    fn add(&self, id: SubscriptionId, handler: Arc<H>) {
        self.subscribers.write().push((id, handler));
    }

    fn remove(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }

    fn is_empty(&self) -> bool {
        self.subscribers.read().is_empty()
    }

    /// Calls every subscriber outside the lock, so handlers may subscribe
    /// or unsubscribe.
    fn notify(&self, call: impl Fn(&H)) {
        let snapshot: Vec<Arc<H>> = self
            .subscribers
            .read()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in snapshot {
            if catch_unwind(AssertUnwindSafe(|| call(&*handler))).is_err() {
                warn!(channel = self.name, "Event subscriber panicked; ignoring");
            }
        }
    }
}

/// Event channels shared by a container and all of its scopes.
pub struct EventBus {
    next_id: AtomicU64,
    registered: Channel<RegisteredHandler>,
    resolved: Channel<ResolvedHandler>,
    failed: Channel<FailedHandler>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            registered: Channel::new("registered"),
            resolved: Channel::new("resolved"),
            failed: Channel::new("resolution_failed"),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Subscribes to binding registrations.
    pub fn on_registered<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&RegistrationEvent) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.registered.add(id, Arc::new(handler));
        id
    }

    /// Subscribes to successful top-level resolutions.
    pub fn on_resolved<F>(&self, handler: F) -> SubscriptionId
    where
        F: for<'a> Fn(&ResolvedEvent<'a>) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.resolved.add(id, Arc::new(handler));
        id
    }

    /// Subscribes to failed top-level resolutions.
    pub fn on_resolution_failed<F>(&self, handler: F) -> SubscriptionId
    where
        F: for<'a> Fn(&ResolutionFailedEvent<'a>) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.failed.add(id, Arc::new(handler));
        id
    }

    /// Removes a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.registered.remove(id) || self.resolved.remove(id) || self.failed.remove(id)
    }

    pub(crate) fn emit_registered(&self, event: &RegistrationEvent) {
        self.registered.notify(|handler| handler(event));
    }

    pub(crate) fn emit_resolved(&self, event: &ResolvedEvent<'_>) {
        self.resolved.notify(|handler| handler(event));
    }

    pub(crate) fn emit_failed(&self, event: &ResolutionFailedEvent<'_>) {
        self.failed.notify(|handler| handler(event));
    }

    /// Lets the engine skip timing work nobody listens to.
    pub(crate) fn wants_resolved(&self) -> bool {
        !self.resolved.is_empty()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("registered", &self.registered.subscribers.read().len())
            .field("resolved", &self.resolved.subscribers.read().len())
            .field("resolution_failed", &self.failed.subscribers.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Binding;
    use parking_lot::Mutex;

    fn registration() -> RegistrationEvent {
        RegistrationEvent {
            descriptor: Binding::instance::<u32>(Arc::new(1)).build().descriptor(),
            replaced: false,
        }
    }

    #[test]
    fn subscribers_run_in_order() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second"] {
            let seen = Arc::clone(&seen);
            bus.on_registered(move |_| seen.lock().push(label));
        }

        bus.emit_registered(&registration());
        assert_eq!(*seen.lock(), vec!["first", "second"]);
    }

    #[test]
    fn panicking_subscriber_does_not_stop_others() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(0));

        bus.on_registered(|_| panic!("bad subscriber"));
        {
            let seen = Arc::clone(&seen);
            bus.on_registered(move |_| *seen.lock() += 1);
        }

        bus.emit_registered(&registration());
        assert_eq!(*seen.lock(), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(0));
        let id = {
            let seen = Arc::clone(&seen);
            bus.on_resolution_failed(move |_| *seen.lock() += 1)
        };

        let key = ServiceKey::of::<u32>();
        let error = WiringError::ContainerDisposed;
        bus.emit_failed(&ResolutionFailedEvent { key: &key, error: &error });
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit_failed(&ResolutionFailedEvent { key: &key, error: &error });

        assert_eq!(*seen.lock(), 1);
    }

    #[test]
    fn resolved_listener_presence_is_tracked() {
        let bus = EventBus::new();
        assert!(!bus.wants_resolved());
        let id = bus.on_resolved(|_| {});
        assert!(bus.wants_resolved());
        bus.unsubscribe(id);
        assert!(!bus.wants_resolved());
    }
}
