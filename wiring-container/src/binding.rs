//! Bindings: how a service key is turned into an instance.
//!
//! A [`Binding`] pairs a [`ServiceKey`] with exactly one way of producing
//! the service (an [`Injectable`] type, a factory closure, or a fixed
//! instance) plus its lifetime, optional condition, priority and tags.
//! Bindings are built with the typed [`BindingBuilder`].

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use serde::Serialize;

use crate::container::Container;
use crate::error::Result;
use crate::injectable::{Decorator, Dispose, Injectable, Upcast};
use crate::key::ServiceKey;
use crate::lifetime::Lifetime;
use crate::resolver::{AnyInstance, Resolver, downcast};

/// Output of a factory: the erased instance plus its disposal hook.
pub struct Constructed {
    pub instance: AnyInstance,
    pub disposer: Option<Arc<dyn Dispose>>,
}

impl Constructed {
    /// Erases a typed service instance.
    pub fn new<I>(service: Arc<I>, disposer: Option<Arc<dyn Dispose>>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        Self {
            instance: Arc::new(service),
            disposer,
        }
    }
}

/// Type-erased constructor stored in a binding.
///
/// A factory takes the [`Resolver`] (to pull sub-dependencies) and returns
/// the constructed instance or an error.
pub type FactoryFn = Arc<dyn Fn(&dyn Resolver) -> Result<Constructed> + Send + Sync>;

/// Type-erased decoration step.
pub type DecorateFn = Arc<dyn Fn(AnyInstance, &dyn Resolver) -> Result<AnyInstance> + Send + Sync>;

/// Predicate deciding whether a conditional binding applies.
pub type Condition = Arc<dyn Fn(&ConditionContext<'_>) -> bool + Send + Sync>;

/// Unique identity of a binding, used to key cached instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BindingId(u64);

impl BindingId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        BindingId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// What a condition sees when it is evaluated.
///
/// Conditions are evaluated on every resolution, against the container the
/// request was made on.
pub struct ConditionContext<'a> {
    /// The key being resolved.
    pub requested: &'a ServiceKey,
    /// The container the resolution was requested on.
    pub container: &'a Container,
    /// The service that depends on `requested`, if this is a nested resolution.
    pub consumer: Option<&'a ServiceKey>,
}

impl ConditionContext<'_> {
    /// Returns `true` if the service being built is injected into `T`.
    pub fn injected_into<T: ?Sized + 'static>(&self) -> bool {
        self.consumer
            .is_some_and(|consumer| consumer.type_id() == std::any::TypeId::of::<T>())
    }
}

/// How a binding takes part in lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BindingKind {
    /// The single binding for its key; registering again replaces it.
    Primary,
    /// Applies only while its condition holds; additive.
    Conditional,
    /// One member of a multi-binding; additive.
    Collection,
}

/// The three ways of producing a service.
#[derive(Clone)]
pub enum Implementation {
    /// A concrete [`Injectable`] type.
    Type {
        type_name: &'static str,
        factory: FactoryFn,
    },
    /// A user-supplied factory closure.
    Factory(FactoryFn),
    /// A pre-built instance, owned by the caller and never disposed.
    Instance(AnyInstance),
}

impl Implementation {
    /// Display name of the implementation.
    pub fn describe(&self) -> String {
        match self {
            Implementation::Type { type_name, .. } => (*type_name).to_string(),
            Implementation::Factory(_) => "<factory>".to_string(),
            Implementation::Instance(_) => "<instance>".to_string(),
        }
    }
}

/// A registered association between a service key and its implementation.
#[derive(Clone)]
pub struct Binding {
    pub(crate) id: BindingId,
    pub(crate) key: ServiceKey,
    pub(crate) implementation: Implementation,
    pub(crate) lifetime: Lifetime,
    pub(crate) kind: BindingKind,
    pub(crate) condition: Option<Condition>,
    pub(crate) priority: i32,
    pub(crate) tags: Vec<String>,
    pub(crate) dependencies: Vec<ServiceKey>,
    pub(crate) sequence: u64,
    pub(crate) registered_at: SystemTime,
}

impl Binding {
    /// Starts a binding of `I` to the injectable type `T`.
    ///
    /// Defaults to [`Lifetime::Transient`].
    pub fn implemented_by<I, T>() -> BindingBuilder<I>
    where
        I: ?Sized + Send + Sync + 'static,
        T: Injectable + Upcast<I>,
    {
        let factory: FactoryFn = Arc::new(|resolver: &dyn Resolver| {
            let concrete = Arc::new(T::inject(resolver)?);
            let disposer = T::disposer(&concrete);
            Ok(Constructed::new::<I>(<T as Upcast<I>>::upcast(concrete), disposer))
        });

        BindingBuilder::new(
            Implementation::Type {
                type_name: type_name::<T>(),
                factory,
            },
            Lifetime::Transient,
            T::dependencies(),
        )
    }

    /// Starts a binding of `I` to a factory closure.
    ///
    /// Declare what the closure resolves with
    /// [`depends_on`](BindingBuilder::depends_on) so verification can see it.
    pub fn factory<I, F>(factory: F) -> BindingBuilder<I>
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn Resolver) -> Result<Arc<I>> + Send + Sync + 'static,
    {
        let factory: FactoryFn = Arc::new(move |resolver: &dyn Resolver| {
            Ok(Constructed::new::<I>(factory(resolver)?, None))
        });
        BindingBuilder::new(Implementation::Factory(factory), Lifetime::Transient, Vec::new())
    }

    /// Like [`factory`](Binding::factory), for closures producing a
    /// disposable concrete type.
    pub fn disposable_factory<I, T, F>(factory: F) -> BindingBuilder<I>
    where
        I: ?Sized + Send + Sync + 'static,
        T: Dispose + Upcast<I>,
        F: Fn(&dyn Resolver) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        let factory: FactoryFn = Arc::new(move |resolver: &dyn Resolver| {
            let concrete = factory(resolver)?;
            let disposer: Arc<dyn Dispose> = concrete.clone();
            Ok(Constructed::new::<I>(<T as Upcast<I>>::upcast(concrete), Some(disposer)))
        });
        BindingBuilder::new(Implementation::Factory(factory), Lifetime::Transient, Vec::new())
    }

    /// Starts a binding of `I` to a fixed instance.
    ///
    /// Always [`Lifetime::Singleton`]; the container never disposes it.
    pub fn instance<I>(instance: Arc<I>) -> BindingBuilder<I>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let erased: AnyInstance = Arc::new(instance);
        BindingBuilder::new(Implementation::Instance(erased), Lifetime::Singleton, Vec::new())
    }

    pub(crate) fn raw(
        key: ServiceKey,
        implementation: Implementation,
        lifetime: Lifetime,
        dependencies: Vec<ServiceKey>,
    ) -> Binding {
        Binding {
            id: BindingId::next(),
            key,
            implementation,
            lifetime,
            kind: BindingKind::Primary,
            condition: None,
            priority: 0,
            tags: Vec::new(),
            dependencies,
            sequence: 0,
            registered_at: SystemTime::now(),
        }
    }

    pub fn id(&self) -> BindingId {
        self.id
    }

    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    pub fn implementation(&self) -> &Implementation {
        &self.implementation
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn dependencies(&self) -> &[ServiceKey] {
        &self.dependencies
    }

    /// Position in the owning store's registration order.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn registered_at(&self) -> SystemTime {
        self.registered_at
    }

    /// Evaluates the condition; unconditional bindings always apply.
    pub fn applies(&self, context: &ConditionContext<'_>) -> bool {
        self.condition.as_ref().is_none_or(|condition| condition(context))
    }

    /// Serializable summary of this binding.
    pub fn descriptor(&self) -> BindingDescriptor {
        BindingDescriptor {
            service: self.key.type_name().to_string(),
            name: self.key.name().map(str::to_string),
            implementation: self.implementation.describe(),
            lifetime: self.lifetime,
            kind: self.kind,
            priority: self.priority,
            tags: self.tags.clone(),
            dependencies: self.dependencies.iter().map(ToString::to_string).collect(),
            sequence: self.sequence,
            registered_at: self.registered_at,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("implementation", &self.implementation.describe())
            .field("lifetime", &self.lifetime)
            .field("kind", &self.kind)
            .field("priority", &self.priority)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// Typed builder for a [`Binding`] of service `I`.
///
/// ```rust
/// use std::sync::Arc;
/// use wiring_container::binding::{Binding, BindingKind};
/// use wiring_container::lifetime::Lifetime;
///
/// let binding: Binding = Binding::instance::<str>(Arc::from("eu-west-1"))
///     .named("region")
///     .tag("config")
///     .into();
///
/// assert_eq!(binding.key().name(), Some("region"));
/// assert_eq!(binding.lifetime(), Lifetime::Singleton);
/// assert_eq!(binding.kind(), BindingKind::Primary);
/// ```
pub struct BindingBuilder<I: ?Sized> {
    binding: Binding,
    _service: PhantomData<fn() -> Arc<I>>,
}

impl<I> BindingBuilder<I>
where
    I: ?Sized + Send + Sync + 'static,
{
    fn new(implementation: Implementation, lifetime: Lifetime, dependencies: Vec<ServiceKey>) -> Self {
        Self {
            binding: Binding::raw(ServiceKey::of::<I>(), implementation, lifetime, dependencies),
            _service: PhantomData,
        }
    }

    /// Sets the lifetime. Fixed instances stay singletons.
    pub fn lifetime(mut self, lifetime: Lifetime) -> Self {
        if !matches!(self.binding.implementation, Implementation::Instance(_)) {
            self.binding.lifetime = lifetime;
        }
        self
    }

    pub fn singleton(self) -> Self {
        self.lifetime(Lifetime::Singleton)
    }

    pub fn scoped(self) -> Self {
        self.lifetime(Lifetime::Scoped)
    }

    pub fn transient(self) -> Self {
        self.lifetime(Lifetime::Transient)
    }

    /// Registers under `ServiceKey::named::<I>(name)`.
    pub fn named(mut self, name: impl Into<Arc<str>>) -> Self {
        self.binding.key = ServiceKey::named::<I>(name);
        self
    }

    /// Makes the binding conditional on `condition`.
    ///
    /// Collection members keep their kind and are filtered by the condition
    /// when the collection is resolved.
    pub fn when<F>(mut self, condition: F) -> Self
    where
        F: Fn(&ConditionContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.binding.condition = Some(Arc::new(condition));
        if self.binding.kind == BindingKind::Primary {
            self.binding.kind = BindingKind::Conditional;
        }
        self
    }

    /// Higher priorities are tried first among conditional bindings.
    pub fn priority(mut self, priority: i32) -> Self {
        self.binding.priority = priority;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.binding.tags.push(tag.into());
        self
    }

    /// Declares a dependency the implementation resolves.
    pub fn depends_on(mut self, key: ServiceKey) -> Self {
        if !self.binding.dependencies.contains(&key) {
            self.binding.dependencies.push(key);
        }
        self
    }

    /// Makes this binding a member of the collection for `I`.
    pub fn in_collection(mut self) -> Self {
        self.binding.kind = BindingKind::Collection;
        self
    }

    pub fn build(self) -> Binding {
        self.binding
    }
}

impl<I> From<BindingBuilder<I>> for Binding
where
    I: ?Sized + Send + Sync + 'static,
{
    fn from(builder: BindingBuilder<I>) -> Self {
        builder.build()
    }
}

/// Serializable view of a binding, used by diagnostics and events.
#[derive(Debug, Clone, Serialize)]
pub struct BindingDescriptor {
    pub service: String,
    pub name: Option<String>,
    pub implementation: String,
    pub lifetime: Lifetime,
    pub kind: BindingKind,
    pub priority: i32,
    pub tags: Vec<String>,
    pub dependencies: Vec<String>,
    pub sequence: u64,
    pub registered_at: SystemTime,
}

/// A decorator registered for a service type.
#[derive(Clone)]
pub struct DecoratorBinding {
    pub(crate) service: ServiceKey,
    pub(crate) decorator_name: &'static str,
    pub(crate) dependencies: Vec<ServiceKey>,
    pub(crate) apply: DecorateFn,
}

impl DecoratorBinding {
    /// Decorates every binding of `I` with `D`.
    pub fn of<I, D>() -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        D: Decorator<I>,
    {
        let service = ServiceKey::of::<I>();
        let key = service.clone();
        let apply: DecorateFn = Arc::new(move |inner: AnyInstance, resolver: &dyn Resolver| {
            let inner = downcast::<I>(&key, &inner)?;
            let wrapped: Arc<I> = <D as Upcast<I>>::upcast(Arc::new(D::decorate(inner, resolver)?));
            Ok(Arc::new(wrapped) as AnyInstance)
        });

        Self {
            service,
            decorator_name: type_name::<D>(),
            dependencies: D::dependencies(),
            apply,
        }
    }

    /// Decorates every binding of `I` with a closure.
    pub fn from_fn<I, F>(decorate: F) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<I>, &dyn Resolver) -> Result<Arc<I>> + Send + Sync + 'static,
    {
        let service = ServiceKey::of::<I>();
        let key = service.clone();
        let apply: DecorateFn = Arc::new(move |inner: AnyInstance, resolver: &dyn Resolver| {
            let inner = downcast::<I>(&key, &inner)?;
            Ok(Arc::new(decorate(inner, resolver)?) as AnyInstance)
        });

        Self {
            service,
            decorator_name: type_name::<F>(),
            dependencies: Vec::new(),
            apply,
        }
    }

    pub fn service(&self) -> &ServiceKey {
        &self.service
    }

    pub fn decorator_name(&self) -> &'static str {
        self.decorator_name
    }

    pub fn dependencies(&self) -> &[ServiceKey] {
        &self.dependencies
    }
}

impl fmt::Debug for DecoratorBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratorBinding")
            .field("service", &self.service)
            .field("decorator", &self.decorator_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Store: Send + Sync {}
    struct MemoryStore;
    impl Store for MemoryStore {}
    impl Injectable for MemoryStore {
        fn dependencies() -> Vec<ServiceKey> {
            vec![ServiceKey::of::<String>()]
        }
        fn inject(_: &dyn Resolver) -> Result<Self> {
            Ok(MemoryStore)
        }
    }
    crate::provides!(MemoryStore => dyn Store);

    #[test]
    fn implemented_by_defaults() {
        let binding: Binding = Binding::implemented_by::<dyn Store, MemoryStore>().into();
        assert_eq!(binding.key(), &ServiceKey::of::<dyn Store>());
        assert_eq!(binding.lifetime(), Lifetime::Transient);
        assert_eq!(binding.kind(), BindingKind::Primary);
        assert_eq!(binding.dependencies(), &[ServiceKey::of::<String>()]);
        assert!(binding.implementation().describe().contains("MemoryStore"));
    }

    #[test]
    fn instance_lifetime_cannot_change() {
        let binding = Binding::instance::<u32>(Arc::new(1)).transient().build();
        assert_eq!(binding.lifetime(), Lifetime::Singleton);
    }

    #[test]
    fn when_makes_conditional_but_keeps_collection() {
        let conditional = Binding::instance::<u32>(Arc::new(1)).when(|_| true).build();
        assert_eq!(conditional.kind(), BindingKind::Conditional);

        let member = Binding::instance::<u32>(Arc::new(1))
            .in_collection()
            .when(|_| true)
            .build();
        assert_eq!(member.kind(), BindingKind::Collection);
    }

    #[test]
    fn ids_are_unique() {
        let a = Binding::instance::<u32>(Arc::new(1)).build();
        let b = Binding::instance::<u32>(Arc::new(1)).build();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn depends_on_deduplicates() {
        let binding = Binding::factory::<u32, _>(|_| Ok(Arc::new(1)))
            .depends_on(ServiceKey::of::<String>())
            .depends_on(ServiceKey::of::<String>())
            .build();
        assert_eq!(binding.dependencies().len(), 1);
    }

    #[test]
    fn descriptor_serializes() {
        let binding = Binding::implemented_by::<dyn Store, MemoryStore>()
            .scoped()
            .named("primary")
            .tag("storage")
            .build();

        let json = serde_json::to_value(binding.descriptor()).unwrap();
        assert_eq!(json["lifetime"], "Scoped");
        assert_eq!(json["name"], "primary");
        assert_eq!(json["kind"], "Primary");
        assert_eq!(json["tags"][0], "storage");
    }

    #[test]
    fn factory_output_downcasts_to_service_type() {
        let binding = Binding::implemented_by::<dyn Store, MemoryStore>().build();
        let Implementation::Type { factory, .. } = binding.implementation() else {
            panic!("expected a type implementation");
        };

        struct Nothing;
        impl Resolver for Nothing {
            fn resolve_key(&self, key: &ServiceKey) -> Result<AnyInstance> {
                Err(crate::error::WiringError::TypeMismatch { key: key.clone(), expected: "" })
            }
            fn resolve_all_key(&self, _: &ServiceKey) -> Result<Vec<AnyInstance>> {
                Ok(Vec::new())
            }
            fn contains_key(&self, _: &ServiceKey) -> bool {
                false
            }
        }

        let constructed = factory(&Nothing).unwrap();
        assert!(downcast::<dyn Store>(binding.key(), &constructed.instance).is_ok());
        assert!(constructed.disposer.is_none());
    }
}
