//! Registration store: every binding known to one container level.
//!
//! The registry maps [`ServiceKey`]s to bindings. Primary bindings replace
//! each other; conditional bindings, collection members and decorators
//! accumulate. It holds no instances and performs no resolution.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, trace};

use crate::binding::{Binding, BindingKind, DecoratorBinding};
use crate::generic::OpenGeneric;
use crate::key::ServiceKey;

/// Result of inserting a binding.
pub(crate) struct Registered {
    pub binding: Arc<Binding>,
    pub replaced: Option<Arc<Binding>>,
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    primary: HashMap<ServiceKey, Arc<Binding>>,
    conditionals: HashMap<ServiceKey, Vec<Arc<Binding>>>,
    collections: HashMap<ServiceKey, Vec<Arc<Binding>>>,
    decorators: HashMap<ServiceKey, Vec<Arc<DecoratorBinding>>>,
    open_generics: HashMap<TypeId, Arc<OpenGeneric>>,
    /// Closed keys materialized from an open generic, by family.
    materialized: HashMap<ServiceKey, TypeId>,
    next_sequence: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a binding, stamping its registration sequence and time.
    pub fn register(&mut self, mut binding: Binding) -> Registered {
        binding.sequence = self.bump();
        binding.registered_at = SystemTime::now();
        let binding = Arc::new(binding);
        let key = binding.key.clone();

        let replaced = match binding.kind {
            BindingKind::Primary => {
                self.materialized.remove(&key);
                self.primary.insert(key.clone(), Arc::clone(&binding))
            }
            BindingKind::Conditional => {
                let entries = self.conditionals.entry(key.clone()).or_default();
                entries.push(Arc::clone(&binding));
                entries.sort_by(|a, b| {
                    b.priority
                        .cmp(&a.priority)
                        .then_with(|| a.sequence.cmp(&b.sequence))
                });
                None
            }
            BindingKind::Collection => {
                self.collections
                    .entry(key.clone())
                    .or_default()
                    .push(Arc::clone(&binding));
                None
            }
        };

        debug!(
            key = %key,
            lifetime = %binding.lifetime,
            kind = ?binding.kind,
            replaced = replaced.is_some(),
            "Registered binding"
        );

        Registered { binding, replaced }
    }

    /// Removes every binding registered under exactly `key`.
    ///
    /// Decorators and open generics are left in place.
    pub fn unregister(&mut self, key: &ServiceKey) -> bool {
        let primary = self.primary.remove(key).is_some();
        let conditional = self.conditionals.remove(key).is_some();
        let collection = self.collections.remove(key).is_some();
        self.materialized.remove(key);

        let removed = primary || conditional || collection;
        if removed {
            debug!(key = %key, "Unregistered binding");
        }
        removed
    }

    pub fn add_decorator(&mut self, mut decorator: DecoratorBinding) -> Arc<DecoratorBinding> {
        decorator.service = decorator.service.unnamed();
        let decorator = Arc::new(decorator);
        debug!(
            service = %decorator.service,
            decorator = decorator.decorator_name,
            "Registered decorator"
        );
        self.decorators
            .entry(decorator.service.clone())
            .or_default()
            .push(Arc::clone(&decorator));
        decorator
    }

    /// Stores an open-generic family, replacing an earlier one and dropping
    /// the closed bindings it had produced.
    pub fn add_open_generic(&mut self, open: OpenGeneric) -> bool {
        let family = open.family();
        debug!(
            family = open.family_name(),
            implementation = open.implementation_name(),
            "Registered open generic"
        );

        let replaced = self.open_generics.insert(family, Arc::new(open)).is_some();
        if replaced {
            let stale: Vec<ServiceKey> = self
                .materialized
                .iter()
                .filter(|(_, origin)| **origin == family)
                .map(|(key, _)| key.clone())
                .collect();
            for key in stale {
                self.materialized.remove(&key);
                self.primary.remove(&key);
            }
        }
        replaced
    }

    /// Finds an open generic able to close over `key`.
    pub fn open_generic_for(&self, key: &ServiceKey) -> Option<Arc<OpenGeneric>> {
        self.open_generics
            .values()
            .find(|open| open.can_close(key))
            .cloned()
    }

    /// Stores the closed binding for a requested generic instantiation.
    ///
    /// If another caller got there first, its binding wins.
    pub fn materialize(&mut self, family: TypeId, binding: Binding) -> Arc<Binding> {
        if let Some(existing) = self.primary.get(&binding.key) {
            return Arc::clone(existing);
        }
        trace!(key = %binding.key, "Closing open generic");
        let key = binding.key.clone();
        let Registered { binding, .. } = self.register(binding);
        self.materialized.insert(key, family);
        binding
    }

    pub fn get(&self, key: &ServiceKey) -> Option<&Arc<Binding>> {
        self.primary.get(key)
    }

    /// Conditional bindings for `key`, highest priority first.
    pub fn conditionals(&self, key: &ServiceKey) -> &[Arc<Binding>] {
        self.conditionals.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Collection members for `key`, in registration order.
    pub fn collection(&self, key: &ServiceKey) -> &[Arc<Binding>] {
        self.collections.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Decorators for the service type of `key`, in registration order.
    pub fn decorators(&self, key: &ServiceKey) -> &[Arc<DecoratorBinding>] {
        let service = key.unnamed();
        self.decorators.get(&service).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, key: &ServiceKey) -> bool {
        self.primary.contains_key(key)
            || self.conditionals.contains_key(key)
            || self.collections.contains_key(key)
            || self.open_generics.values().any(|open| open.can_close(key))
    }

    /// Names registered for the service type of `key`.
    pub fn names_for(&self, key: &ServiceKey) -> Vec<String> {
        let mut names: Vec<String> = self
            .primary
            .keys()
            .chain(self.conditionals.keys())
            .filter(|candidate| candidate.same_type(key))
            .filter_map(|candidate| candidate.name().map(str::to_string))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Type names of everything resolvable by key, for suggestions.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .primary
            .keys()
            .chain(self.conditionals.keys())
            .chain(self.collections.keys())
            .map(ServiceKey::type_name)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Every binding, in registration order.
    pub fn all_bindings(&self) -> Vec<Arc<Binding>> {
        let mut all: Vec<Arc<Binding>> = self
            .primary
            .values()
            .chain(self.conditionals.values().flatten())
            .chain(self.collections.values().flatten())
            .cloned()
            .collect();
        all.sort_by_key(|binding| binding.sequence);
        all
    }

    /// Every decorator, in registration order per service.
    pub fn all_decorators(&self) -> Vec<Arc<DecoratorBinding>> {
        self.decorators.values().flatten().cloned().collect()
    }

    /// Closed bindings an open generic can still produce.
    pub fn pending_generic_bindings(&self) -> Vec<Binding> {
        self.open_generics
            .values()
            .flat_map(|open| {
                open.closed_keys()
                    .filter(|key| !self.primary.contains_key(*key))
                    .filter_map(|key| open.close(key))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.primary.len()
            + self.conditionals.values().map(Vec::len).sum::<usize>()
            + self.collections.values().map(Vec::len).sum::<usize>()
    }

    pub fn clear(&mut self) {
        self.primary.clear();
        self.conditionals.clear();
        self.collections.clear();
        self.decorators.clear();
        self.open_generics.clear();
        self.materialized.clear();
    }

    fn bump(&mut self) -> u64 {
        self.next_sequence += 1;
        self.next_sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Database;

    fn instance(value: u32) -> Binding {
        Binding::instance::<u32>(Arc::new(value)).build()
    }

    #[test]
    fn register_and_get() {
        let mut reg = Registry::new();
        reg.register(instance(1));
        assert!(reg.get(&ServiceKey::of::<u32>()).is_some());
        assert!(reg.contains(&ServiceKey::of::<u32>()));
    }

    #[test]
    fn primary_replaces() {
        let mut reg = Registry::new();
        let first = reg.register(instance(1));
        let second = reg.register(instance(2));

        assert!(first.replaced.is_none());
        let replaced = second.replaced.expect("replaced binding");
        assert_eq!(replaced.id(), first.binding.id());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn named_bindings_coexist() {
        let mut reg = Registry::new();
        reg.register(Binding::instance::<u32>(Arc::new(1)).named("a").build());
        reg.register(Binding::instance::<u32>(Arc::new(2)).named("b").build());
        reg.register(instance(3));

        assert_eq!(reg.len(), 3);
        assert_eq!(reg.names_for(&ServiceKey::of::<u32>()), vec!["a", "b"]);
    }

    #[test]
    fn collection_is_additive_and_ordered() {
        let mut reg = Registry::new();
        let a = reg.register(Binding::instance::<u32>(Arc::new(1)).in_collection().build());
        let b = reg.register(Binding::instance::<u32>(Arc::new(2)).in_collection().build());

        let members: Vec<_> = reg.collection(&ServiceKey::of::<u32>()).iter().map(|b| b.id()).collect();
        assert_eq!(members, vec![a.binding.id(), b.binding.id()]);
        assert!(reg.get(&ServiceKey::of::<u32>()).is_none());
    }

    #[test]
    fn conditionals_sorted_by_priority_then_sequence() {
        let mut reg = Registry::new();
        let low = reg.register(Binding::instance::<u32>(Arc::new(1)).when(|_| true).build());
        let high = reg.register(
            Binding::instance::<u32>(Arc::new(2))
                .when(|_| true)
                .priority(10)
                .build(),
        );
        let low_later = reg.register(Binding::instance::<u32>(Arc::new(3)).when(|_| true).build());

        let order: Vec<_> = reg.conditionals(&ServiceKey::of::<u32>()).iter().map(|b| b.id()).collect();
        assert_eq!(order, vec![high.binding.id(), low.binding.id(), low_later.binding.id()]);
    }

    #[test]
    fn unregister_is_idempotent() {
        let mut reg = Registry::new();
        reg.register(instance(1));
        assert!(reg.unregister(&ServiceKey::of::<u32>()));
        assert!(!reg.unregister(&ServiceKey::of::<u32>()));
        assert!(!reg.unregister(&ServiceKey::of::<Database>()));
    }

    #[test]
    fn all_bindings_in_registration_order() {
        let mut reg = Registry::new();
        reg.register(Binding::instance::<String>(Arc::new("x".into())).build());
        reg.register(Binding::instance::<u32>(Arc::new(1)).in_collection().build());
        reg.register(Binding::instance::<u8>(Arc::new(1)).when(|_| false).build());

        let keys: Vec<_> = reg.all_bindings().iter().map(|b| b.key().clone()).collect();
        assert_eq!(
            keys,
            vec![ServiceKey::of::<String>(), ServiceKey::of::<u32>(), ServiceKey::of::<u8>()]
        );
        assert!(reg.all_bindings().windows(2).all(|w| w[0].sequence() < w[1].sequence()));
    }

    #[test]
    fn decorators_keyed_by_unnamed_type() {
        let mut reg = Registry::new();
        reg.add_decorator(DecoratorBinding::from_fn::<u32, _>(|inner, _| Ok(inner)));
        assert_eq!(reg.decorators(&ServiceKey::named::<u32>("x")).len(), 1);
        assert!(reg.decorators(&ServiceKey::of::<Database>()).is_empty());
    }

    #[test]
    fn type_names_for_suggestions() {
        let mut reg = Registry::new();
        reg.register(instance(1));
        reg.register(Binding::instance::<u32>(Arc::new(2)).named("x").build());
        assert_eq!(reg.type_names(), vec!["u32"]);
    }

    #[test]
    fn clear_removes_everything() {
        let mut reg = Registry::new();
        reg.register(instance(1));
        reg.add_decorator(DecoratorBinding::from_fn::<u32, _>(|inner, _| Ok(inner)));
        reg.clear();
        assert_eq!(reg.len(), 0);
        assert!(reg.all_decorators().is_empty());
    }
}
