//! # The Container
//!
//! A container owns a registration store and an instance cache, and
//! optionally points at a parent. Scopes are child containers: lookups fall
//! back to the parent, cached instances stay private.
//!
//! # Architecture
//! ```text
//! ContainerBuilder ──build()──> Container (root)
//!                                   │
//!                             create_scope()
//!                                   │
//!                                   ▼
//!                           Container (scope) ──create_scope()──> ...
//! ```
//!
//! Resolution walks the scope chain from the requesting container upwards:
//! at each level satisfied conditional bindings win over the primary
//! binding; if no level has a binding, open generics are closed on demand.
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use wiring_container::prelude::*;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, msg: &str);
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, msg: &str) { println!("{msg}"); }
//! }
//! impl Injectable for ConsoleLogger {
//!     fn inject(_: &dyn Resolver) -> Result<Self> { Ok(ConsoleLogger) }
//! }
//! wiring_container::provides!(ConsoleLogger => dyn Logger);
//!
//! let mut container = Container::new();
//! container.register_singleton::<dyn Logger, ConsoleLogger>().unwrap();
//!
//! let a = container.resolve::<dyn Logger>().unwrap();
//! let b = container.resolve::<dyn Logger>().unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, trace, warn};
use wiring_support::rendering::suggest_similar;

use crate::binding::{
    Binding, BindingDescriptor, BindingKind, ConditionContext, Constructed, DecoratorBinding,
    Implementation,
};
use crate::builder::ContainerBuilder;
use crate::cache::InstanceCache;
use crate::error::{
    CircularDependencyError, NamedServiceNotFoundError, NotRegisteredError, Result, WiringError,
};
use crate::events::{EventBus, RegistrationEvent, ResolutionFailedEvent, ResolvedEvent};
use crate::generic::OpenGeneric;
use crate::key::ServiceKey;
use crate::lifetime::Lifetime;
use crate::options::ContainerOptions;
use crate::provider::{Provider, ProviderRegistry};
use crate::registry::{Registered, Registry};
use crate::resolver::{AnyInstance, Resolver};
use crate::verify::{GraphSnapshot, VerificationResult, VerifyOptions, verify_snapshot};

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// Thread-safe dependency injection container.
///
/// `Container` is a cheap handle; clones share the same store and cache.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

struct ContainerInner {
    id: u64,
    depth: usize,
    parent: Option<Container>,
    registry: RwLock<Registry>,
    cache: InstanceCache,
    children: Mutex<Vec<Weak<ContainerInner>>>,
    events: Arc<EventBus>,
    options: ContainerOptions,
    disposed: AtomicBool,
    /// Verification scopes keep singletons to themselves.
    isolated: bool,
}

fn next_container_id() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

impl Container {
    /// Creates an empty root container with default options.
    pub fn new() -> Self {
        Self::with_options(ContainerOptions::default())
    }

    /// Creates an empty root container.
    pub fn with_options(options: ContainerOptions) -> Self {
        Self::from_inner(ContainerInner {
            id: next_container_id(),
            depth: 0,
            parent: None,
            registry: RwLock::new(Registry::new()),
            cache: InstanceCache::new(),
            children: Mutex::new(Vec::new()),
            events: Arc::new(EventBus::new()),
            options,
            disposed: AtomicBool::new(false),
            isolated: false,
        })
    }

    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    fn from_inner(inner: ContainerInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// 0 for a root container, parent depth + 1 for scopes.
    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    pub fn parent(&self) -> Option<&Container> {
        self.inner.parent.as_ref()
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.inner.options
    }

    /// Event channels, shared with every scope of the same root.
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(WiringError::ContainerDisposed);
        }
        Ok(())
    }

    /// This container, then each ancestor up to the root.
    fn levels(&self) -> impl Iterator<Item = &Container> {
        std::iter::successors(Some(self), |level| level.inner.parent.as_ref())
    }

    /// The root first, this container last.
    fn chain(&self) -> Vec<&Container> {
        let mut chain: Vec<&Container> = self.levels().collect();
        chain.reverse();
        chain
    }

    // ── Registration ──

    /// Adds a binding to this container.
    ///
    /// An unnamed primary binding replaces the previous one for its key;
    /// named, conditional and collection bindings accumulate.
    pub fn register(&self, binding: impl Into<Binding>) -> Result<()> {
        self.ensure_live()?;
        let Registered { binding, replaced } = self.inner.registry.write().register(binding.into());

        if let Some(previous) = &replaced {
            debug!(
                key = %binding.key(),
                previous = %previous.implementation().describe(),
                "Replaced primary binding"
            );
        }

        self.inner.events.emit_registered(&RegistrationEvent {
            descriptor: binding.descriptor(),
            replaced: replaced.is_some(),
        });
        Ok(())
    }

    /// Adds a decorator for every binding of its service type.
    pub fn decorate(&self, decorator: DecoratorBinding) -> Result<()> {
        self.ensure_live()?;
        self.inner.registry.write().add_decorator(decorator);
        Ok(())
    }

    /// Adds an open-generic family.
    pub fn register_family(&self, open: OpenGeneric) -> Result<()> {
        self.ensure_live()?;
        self.inner.registry.write().add_open_generic(open);
        Ok(())
    }

    /// Applies a [`Provider`] module to this container.
    ///
    /// # Errors
    /// The first error the provider returns, including
    /// [`WiringError::ContainerDisposed`].
    pub fn add_provider(&mut self, provider: &dyn Provider) -> Result<&mut Self> {
        debug!(provider = provider.name(), container = self.inner.id, "Applying provider");
        provider.register(self)?;
        Ok(self)
    }

    /// Removes every binding registered under `key` in this container.
    ///
    /// Returns `false` if there was none. Ancestors are not touched.
    pub fn unregister(&self, key: &ServiceKey) -> Result<bool> {
        self.ensure_live()?;
        Ok(self.inner.registry.write().unregister(key))
    }

    /// The primary binding that serves `key`, searching up the scope chain.
    pub fn binding(&self, key: &ServiceKey) -> Option<Arc<Binding>> {
        self.levels()
            .find_map(|level| level.inner.registry.read().get(key).cloned())
    }

    /// Every binding registered in this container, in registration order.
    pub fn all_bindings(&self) -> Vec<Arc<Binding>> {
        self.inner.registry.read().all_bindings()
    }

    /// Descriptors of every binding visible from this container, grouped by
    /// key, ancestors first.
    pub fn registrations(&self) -> HashMap<ServiceKey, Vec<BindingDescriptor>> {
        let mut registrations: HashMap<ServiceKey, Vec<BindingDescriptor>> = HashMap::new();
        for level in self.chain() {
            let bindings = level.inner.registry.read().all_bindings();
            for binding in bindings {
                registrations
                    .entry(binding.key().clone())
                    .or_default()
                    .push(binding.descriptor());
            }
        }
        registrations
    }

    /// Number of singleton and scoped instances this container holds.
    pub fn instance_count(&self) -> usize {
        self.inner.cache.len()
    }

    /// Keys of the instances this container holds, in creation order.
    pub fn cached_keys(&self) -> Vec<ServiceKey> {
        self.inner.cache.keys()
    }

    // ── Scopes & lifecycle ──

    /// Creates a child scope.
    ///
    /// The scope sees every binding of this container (and may shadow them
    /// with its own) but keeps its own scoped instances.
    ///
    /// # Errors
    /// [`WiringError::ContainerDisposed`] if this container was disposed.
    pub fn create_scope(&self) -> Result<Container> {
        self.ensure_live()?;
        let scope = self.child(false);

        {
            let mut children = self.inner.children.lock();
            children.retain(|child| child.strong_count() > 0);
            children.push(Arc::downgrade(&scope.inner));
        }

        if self.is_disposed() {
            scope.dispose();
            return Err(WiringError::ContainerDisposed);
        }

        debug!(
            parent = self.inner.id,
            scope = scope.inner.id,
            depth = scope.inner.depth,
            "Created scope"
        );
        Ok(scope)
    }

    fn child(&self, isolated: bool) -> Container {
        Self::from_inner(ContainerInner {
            id: next_container_id(),
            depth: self.inner.depth + 1,
            parent: Some(self.clone()),
            registry: RwLock::new(Registry::new()),
            cache: InstanceCache::new(),
            children: Mutex::new(Vec::new()),
            events: Arc::clone(&self.inner.events),
            options: self.inner.options.clone(),
            disposed: AtomicBool::new(false),
            isolated,
        })
    }

    /// Disposes this container's cached instances in reverse creation
    /// order, then every scope still alive below it.
    ///
    /// Further resolutions fail with [`WiringError::ContainerDisposed`].
    /// Calling it again does nothing.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        let disposed = self.inner.cache.dispose_all();

        let children: Vec<Container> = self
            .inner
            .children
            .lock()
            .drain(..)
            .filter_map(|child| child.upgrade())
            .map(|inner| Container { inner })
            .collect();
        for child in &children {
            child.dispose();
        }

        info!(
            container = self.inner.id,
            disposed,
            scopes = children.len(),
            "Container disposed"
        );
    }

    /// Removes every binding of this container and disposes its cached
    /// instances. The container stays usable.
    ///
    /// # Errors
    /// [`WiringError::ContainerDisposed`] if this container was disposed.
    pub fn clear(&self) -> Result<()> {
        self.ensure_live()?;
        self.inner.registry.write().clear();
        let disposed = self.inner.cache.clear();
        info!(container = self.inner.id, disposed, "Container cleared");
        Ok(())
    }

    // ── Verification ──

    /// Verifies every binding visible from this container, dry-running
    /// each one in an isolated verification scope.
    pub fn verify(&self) -> VerificationResult {
        self.verify_with(VerifyOptions::default())
    }

    /// Verifies with explicit options.
    ///
    /// A dry run builds every binding inside an isolated verification scope
    /// that shares no cached instances with this container and is disposed
    /// before returning.
    pub fn verify_with(&self, options: VerifyOptions) -> VerificationResult {
        let snapshot = self.graph_snapshot();
        if !options.dry_run {
            return verify_snapshot(&snapshot, &options, |_| Ok(()));
        }

        let scope = self.child(true);
        let result = verify_snapshot(&snapshot, &options, |binding| {
            let frame = Frame {
                key: binding.key(),
                all: binding.kind() == BindingKind::Collection,
                parent: None,
            };
            scope.instantiate(binding, &scope, &frame).map(drop)
        });
        scope.dispose();
        result
    }

    /// Runs [`verify_with`](Container::verify_with) on Tokio's blocking pool.
    ///
    /// Must be called from within a Tokio runtime.
    #[cfg(feature = "async")]
    pub fn verify_in_background(
        &self,
        options: VerifyOptions,
    ) -> tokio::task::JoinHandle<VerificationResult> {
        let container = self.clone();
        tokio::task::spawn_blocking(move || container.verify_with(options))
    }

    fn graph_snapshot(&self) -> GraphSnapshot {
        let mut snapshot = GraphSnapshot::default();
        let mut primaries: HashMap<ServiceKey, (usize, Arc<Binding>)> = HashMap::new();
        let mut others: Vec<(usize, Arc<Binding>)> = Vec::new();

        for (level, container) in self.chain().into_iter().enumerate() {
            let registry = container.inner.registry.read();
            for binding in registry.all_bindings() {
                if binding.kind() == BindingKind::Primary {
                    primaries.insert(binding.key().clone(), (level, binding));
                } else {
                    others.push((level, binding));
                }
            }
            for closed in registry.pending_generic_bindings() {
                primaries
                    .entry(closed.key().clone())
                    .or_insert((level, Arc::new(closed)));
            }
            snapshot.decorators.extend(registry.all_decorators());
        }

        for (key, (_, binding)) in &primaries {
            snapshot.unconditional.insert(key.clone(), binding.lifetime());
        }
        for (_, binding) in &others {
            if binding.kind() == BindingKind::Conditional {
                snapshot
                    .conditional
                    .entry(binding.key().clone())
                    .or_insert(binding.lifetime());
            }
        }

        let mut nodes: Vec<(usize, Arc<Binding>)> = primaries.into_values().chain(others).collect();
        nodes.sort_by_key(|(level, binding)| (*level, binding.sequence()));
        snapshot.nodes = nodes.into_iter().map(|(_, binding)| binding).collect();
        snapshot
    }

    // ── Resolution engine ──

    fn resolve_in(&self, key: &ServiceKey, parent: Option<&Frame<'_>>) -> Result<AnyInstance> {
        self.ensure_live()?;
        check_cycle(key, false, parent)?;

        let frame = Frame {
            key,
            all: false,
            parent,
        };
        let consumer = parent.map(|p| p.key);

        let Some((binding, owner)) = self.find_binding(key, consumer) else {
            return Err(self.missing(key, &frame));
        };

        trace!(
            key = %key,
            lifetime = %binding.lifetime(),
            container = self.inner.id,
            owner = owner.inner.id,
            "Resolving"
        );
        self.instantiate(&binding, &owner, &frame)
    }

    fn resolve_all_in(&self, key: &ServiceKey, parent: Option<&Frame<'_>>) -> Result<Vec<AnyInstance>> {
        self.ensure_live()?;
        check_cycle(key, true, parent)?;

        let frame = Frame {
            key,
            all: true,
            parent,
        };
        let context = ConditionContext {
            requested: key,
            container: self,
            consumer: parent.map(|p| p.key),
        };

        let mut members: Vec<(Arc<Binding>, Container)> = Vec::new();
        for level in self.chain() {
            let level_members = level.inner.registry.read().collection(key).to_vec();
            members.extend(level_members.into_iter().map(|member| (member, level.clone())));
        }

        trace!(key = %key, members = members.len(), "Resolving collection");
        members
            .into_iter()
            .filter(|(member, _)| member.applies(&context))
            .map(|(member, owner)| self.instantiate(&member, &owner, &frame))
            .collect()
    }

    /// Finds the binding serving `key` and the container that defines it.
    fn find_binding(
        &self,
        key: &ServiceKey,
        consumer: Option<&ServiceKey>,
    ) -> Option<(Arc<Binding>, Container)> {
        let context = ConditionContext {
            requested: key,
            container: self,
            consumer,
        };

        for level in self.levels() {
            // Predicates run without holding the lock.
            let (conditionals, primary) = {
                let registry = level.inner.registry.read();
                (registry.conditionals(key).to_vec(), registry.get(key).cloned())
            };

            if let Some(binding) = conditionals.into_iter().find(|b| b.applies(&context)) {
                return Some((binding, level.clone()));
            }
            if let Some(binding) = primary {
                return Some((binding, level.clone()));
            }
        }

        for level in self.levels() {
            let Some(open) = level.inner.registry.read().open_generic_for(key) else {
                continue;
            };
            let Some(closed) = open.close(key) else {
                continue;
            };
            let binding = level.inner.registry.write().materialize(open.family(), closed);
            return Some((binding, level.clone()));
        }

        None
    }

    fn missing(&self, key: &ServiceKey, frame: &Frame<'_>) -> WiringError {
        if key.is_named() {
            let mut available: Vec<String> = self
                .levels()
                .flat_map(|level| level.inner.registry.read().names_for(key))
                .collect();
            available.sort();
            available.dedup();
            return WiringError::NamedServiceNotFound(NamedServiceNotFoundError {
                requested: key.clone(),
                available,
            });
        }

        let mut known: Vec<&'static str> = self
            .levels()
            .flat_map(|level| level.inner.registry.read().type_names())
            .collect();
        known.sort_unstable();
        known.dedup();

        WiringError::ServiceNotRegistered(NotRegisteredError {
            requested: key.clone(),
            required_by: frame.parent.map(|p| p.key.clone()),
            path: frame.path(),
            suggestions: suggest_similar(key.type_name(), &known, self.inner.options.suggestion_limit),
        })
    }

    /// Produces an instance of `binding` according to its lifetime.
    fn instantiate(&self, binding: &Arc<Binding>, owner: &Container, frame: &Frame<'_>) -> Result<AnyInstance> {
        match binding.lifetime() {
            Lifetime::Transient => self.construct(binding, frame).map(|c| c.instance),
            Lifetime::Scoped => {
                self.inner
                    .cache
                    .get_or_create(binding, || frame.path(), || self.construct(binding, frame))
            }
            Lifetime::Singleton => {
                let home = if self.inner.isolated { self } else { owner };
                home.ensure_live()?;
                home.inner
                    .cache
                    .get_or_create(binding, || frame.path(), || home.construct(binding, frame))
            }
        }
    }

    /// Runs the binding's factory against this container, then applies
    /// decorators from the root down.
    fn construct(&self, binding: &Binding, frame: &Frame<'_>) -> Result<Constructed> {
        let context = ResolutionContext {
            container: self,
            frame,
        };
        let resolver: &dyn Resolver = &context;

        let mut constructed = match binding.implementation() {
            Implementation::Type { factory, .. } | Implementation::Factory(factory) => {
                factory(resolver).map_err(|e| e.during_construction(binding.key(), frame.path()))?
            }
            Implementation::Instance(instance) => Constructed {
                instance: Arc::clone(instance),
                disposer: None,
            },
        };

        for decorator in self.decorators_for(binding.key()) {
            trace!(key = %binding.key(), decorator = decorator.decorator_name(), "Decorating");
            constructed.instance = (decorator.apply)(constructed.instance, resolver)
                .map_err(|e| e.during_construction(binding.key(), frame.path()))?;
        }

        Ok(constructed)
    }

    fn decorators_for(&self, key: &ServiceKey) -> Vec<Arc<DecoratorBinding>> {
        self.chain()
            .into_iter()
            .flat_map(|level| level.inner.registry.read().decorators(key).to_vec())
            .collect()
    }

    fn report_success(&self, key: &ServiceKey, instance: &AnyInstance, started: Option<Instant>) {
        if let Some(started) = started {
            self.inner.events.emit_resolved(&ResolvedEvent {
                key,
                instance,
                elapsed: started.elapsed(),
            });
        }
    }

    fn report_failure(&self, key: &ServiceKey, error: &WiringError) {
        warn!(key = %key, container = self.inner.id, error = %error, "Resolution failed");
        self.inner
            .events
            .emit_failed(&ResolutionFailedEvent { key, error });
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

/// Top-level entry point: fires events, unlike nested resolutions.
impl Resolver for Container {
    fn resolve_key(&self, key: &ServiceKey) -> Result<AnyInstance> {
        let started = self.inner.events.wants_resolved().then(Instant::now);
        match self.resolve_in(key, None) {
            Ok(instance) => {
                self.report_success(key, &instance, started);
                Ok(instance)
            }
            Err(error) => {
                self.report_failure(key, &error);
                Err(error)
            }
        }
    }

    fn try_resolve_key(&self, key: &ServiceKey) -> Result<Option<AnyInstance>> {
        let started = self.inner.events.wants_resolved().then(Instant::now);
        match self.resolve_in(key, None) {
            Ok(instance) => {
                self.report_success(key, &instance, started);
                Ok(Some(instance))
            }
            Err(error) if error.is_not_registered(key) => Ok(None),
            Err(error) => {
                self.report_failure(key, &error);
                Err(error)
            }
        }
    }

    /// Fires one resolved event per member.
    fn resolve_all_key(&self, key: &ServiceKey) -> Result<Vec<AnyInstance>> {
        let started = self.inner.events.wants_resolved().then(Instant::now);
        match self.resolve_all_in(key, None) {
            Ok(members) => {
                for member in &members {
                    self.report_success(key, member, started);
                }
                Ok(members)
            }
            Err(error) => {
                self.report_failure(key, &error);
                Err(error)
            }
        }
    }

    fn contains_key(&self, key: &ServiceKey) -> bool {
        self.levels()
            .any(|level| level.inner.registry.read().contains(key))
    }
}

impl ProviderRegistry for Container {
    fn add_binding(&mut self, binding: Binding) -> Result<()> {
        self.register(binding)
    }

    fn add_decorator(&mut self, decorator: DecoratorBinding) -> Result<()> {
        self.decorate(decorator)
    }

    fn add_open_generic(&mut self, open: OpenGeneric) -> Result<()> {
        self.register_family(open)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .field("depth", &self.inner.depth)
            .field("bindings", &self.inner.registry.read().len())
            .field("instances", &self.inner.cache.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        if self.options.dispose_on_drop && !self.disposed.swap(true, Ordering::SeqCst) {
            let disposed = self.cache.dispose_all();
            if disposed > 0 {
                debug!(container = self.id, disposed, "Disposed instances on drop");
            }
        }
    }
}

// ═══════════════════════════════════════════
// Resolution path
// ═══════════════════════════════════════════

/// One step of the current resolution, linked to the step that caused it.
///
/// Lives on the stack of the resolving thread, so independent resolutions
/// never see each other's paths.
struct Frame<'a> {
    key: &'a ServiceKey,
    /// `true` for a collection request, which may legitimately sit under a
    /// request for the same key's primary binding.
    all: bool,
    parent: Option<&'a Frame<'a>>,
}

impl Frame<'_> {
    /// Frames from the outermost request down to this one.
    fn outermost_first(&self) -> Vec<&Frame<'_>> {
        let mut frames = Vec::new();
        let mut current = Some(self);
        while let Some(frame) = current {
            frames.push(frame);
            current = frame.parent;
        }
        frames.reverse();
        frames
    }

    fn path(&self) -> Vec<ServiceKey> {
        self.outermost_first()
            .into_iter()
            .map(|frame| frame.key.clone())
            .collect()
    }
}

fn check_cycle(key: &ServiceKey, all: bool, parent: Option<&Frame<'_>>) -> Result<()> {
    let Some(parent) = parent else {
        return Ok(());
    };

    let frames = parent.outermost_first();
    let Some(start) = frames.iter().position(|f| f.key == key && f.all == all) else {
        return Ok(());
    };

    let mut chain: Vec<ServiceKey> = frames[start..].iter().map(|f| f.key.clone()).collect();
    chain.push(key.clone());
    warn!(cycle = ?chain, "Circular dependency detected");
    Err(WiringError::CircularDependency(CircularDependencyError { chain }))
}

/// Resolver handed to factories while an instance is being built.
struct ResolutionContext<'a> {
    container: &'a Container,
    frame: &'a Frame<'a>,
}

impl Resolver for ResolutionContext<'_> {
    fn resolve_key(&self, key: &ServiceKey) -> Result<AnyInstance> {
        self.container.resolve_in(key, Some(self.frame))
    }

    fn resolve_all_key(&self, key: &ServiceKey) -> Result<Vec<AnyInstance>> {
        self.container.resolve_all_in(key, Some(self.frame))
    }

    fn contains_key(&self, key: &ServiceKey) -> bool {
        self.container.contains_key(key)
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::Container;
    pub use crate::binding::{Binding, ConditionContext};
    pub use crate::builder::ContainerBuilder;
    pub use crate::error::{Result, WiringError};
    pub use crate::injectable::{Decorator, Dispose, Injectable, Upcast};
    pub use crate::key::ServiceKey;
    pub use crate::lifetime::Lifetime;
    pub use crate::provider::{Provider, ProviderRegistry, RegistrationApi};
    pub use crate::resolver::{Resolver, ResolverApi};
    pub use crate::verify::{VerificationResult, VerifyOptions};
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
