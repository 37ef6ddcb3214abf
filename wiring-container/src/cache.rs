//! Instance cache: singleton and scoped instances owned by one container.
//!
//! Each binding gets its own slot, so first-time construction is
//! at-most-once per binding without serializing unrelated keys. Created
//! instances are also logged in creation order for disposal.
//!
//! A thread that finds a slot under construction by another thread waits
//! for it. Every wait is recorded in a process-wide wait-for graph; a wait
//! that would close a loop of threads blocked on each other fails with
//! [`WiringError::CircularDependency`] instead of blocking.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::binding::{Binding, BindingId, Constructed};
use crate::error::{CircularDependencyError, Result, WiringError};
use crate::injectable::Dispose;
use crate::key::ServiceKey;
use crate::resolver::AnyInstance;

/// Creation log entry for one cached instance.
pub(crate) struct InstanceRecord {
    pub key: ServiceKey,
    pub disposer: Option<Arc<dyn Dispose>>,
}

#[derive(Default)]
struct Ledger {
    records: Vec<InstanceRecord>,
    disposed: bool,
}

type SlotId = u64;

enum SlotState {
    Empty,
    Building(ThreadId),
    Ready(AnyInstance),
}

struct Slot {
    id: SlotId,
    state: Mutex<SlotState>,
    settled: Condvar,
}

impl Slot {
    fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self {
            id: NEXT.fetch_add(1, Ordering::Relaxed),
            state: Mutex::new(SlotState::Empty),
            settled: Condvar::new(),
        }
    }
}

/// Which thread builds each slot, and which slot each blocked thread waits on.
#[derive(Default)]
struct WaitGraph {
    builders: HashMap<SlotId, (ThreadId, ServiceKey)>,
    waiting: HashMap<ThreadId, SlotId>,
}

static WAITS: Lazy<Mutex<WaitGraph>> = Lazy::new(Mutex::default);

impl WaitGraph {
    /// Records that `me` waits on `slot`.
    ///
    /// Fails with the keys of the slots after `slot` along the loop if the
    /// chain of builders and their own waits leads back to `me`.
    fn wait_on(&mut self, me: ThreadId, slot: SlotId) -> std::result::Result<(), Vec<ServiceKey>> {
        let mut loop_keys = Vec::new();
        let mut current = slot;
        for _ in 0..=self.builders.len() {
            let Some((builder, key)) = self.builders.get(&current) else {
                break;
            };
            if current != slot {
                loop_keys.push(key.clone());
            }
            if *builder == me {
                return Err(loop_keys);
            }
            let Some(next) = self.waiting.get(builder) else {
                break;
            };
            current = *next;
        }

        self.waiting.insert(me, slot);
        Ok(())
    }
}

/// Settles a slot when construction ends, including by panic.
struct Construction<'a> {
    slot: &'a Slot,
    instance: Option<AnyInstance>,
}

impl Drop for Construction<'_> {
    fn drop(&mut self) {
        let mut state = self.slot.state.lock();
        *state = match self.instance.take() {
            Some(instance) => SlotState::Ready(instance),
            None => SlotState::Empty,
        };
        WAITS.lock().builders.remove(&self.slot.id);
        self.slot.settled.notify_all();
    }
}

fn circular(path: Vec<ServiceKey>, loop_keys: Vec<ServiceKey>) -> WiringError {
    let mut chain = path;
    chain.extend(loop_keys);
    if let Some(last) = chain.last().cloned() {
        match chain.iter().position(|key| *key == last) {
            Some(start) if start + 1 < chain.len() => {
                chain.drain(..start);
            }
            _ => chain = vec![last.clone(), last],
        }
    }
    warn!(cycle = ?chain, "Circular dependency detected between resolving threads");
    WiringError::CircularDependency(CircularDependencyError { chain })
}

#[derive(Default)]
pub(crate) struct InstanceCache {
    slots: DashMap<BindingId, Arc<Slot>>,
    ledger: Mutex<Ledger>,
}

impl InstanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached instance for `binding`, creating it with `create`
    /// if this is the first request.
    ///
    /// Concurrent first requests for the same binding wait for a single
    /// construction. A failed construction leaves the slot empty. `path`
    /// is the resolution path ending in `binding`'s key, used to report a
    /// cycle.
    pub fn get_or_create<P, F>(&self, binding: &Binding, path: P, create: F) -> Result<AnyInstance>
    where
        P: Fn() -> Vec<ServiceKey>,
        F: FnOnce() -> Result<Constructed>,
    {
        let slot = Arc::clone(
            self.slots
                .entry(binding.id())
                .or_insert_with(|| Arc::new(Slot::new()))
                .value(),
        );
        let me = thread::current().id();

        {
            let mut state = slot.state.lock();
            loop {
                let builder = match &*state {
                    SlotState::Ready(instance) => return Ok(Arc::clone(instance)),
                    SlotState::Empty => break,
                    SlotState::Building(builder) => *builder,
                };
                if builder == me {
                    return Err(circular(path(), Vec::new()));
                }

                let registered = WAITS.lock().wait_on(me, slot.id);
                if let Err(loop_keys) = registered {
                    return Err(circular(path(), loop_keys));
                }
                slot.settled.wait(&mut state);
                WAITS.lock().waiting.remove(&me);
            }
            *state = SlotState::Building(me);
            WAITS
                .lock()
                .builders
                .insert(slot.id, (me, binding.key().clone()));
        }

        let mut construction = Construction {
            slot: &slot,
            instance: None,
        };
        let constructed = create()?;
        self.record(binding, &constructed)?;
        construction.instance = Some(Arc::clone(&constructed.instance));
        Ok(constructed.instance)
    }

    #[cfg(test)]
    pub fn get(&self, id: BindingId) -> Option<AnyInstance> {
        let slot = self.slots.get(&id).map(|slot| Arc::clone(slot.value()))?;
        let state = slot.state.lock();
        match &*state {
            SlotState::Ready(instance) => Some(Arc::clone(instance)),
            _ => None,
        }
    }

    fn record(&self, binding: &Binding, constructed: &Constructed) -> Result<()> {
        let mut ledger = self.ledger.lock();
        if ledger.disposed {
            drop(ledger);
            // Built while the owner was being disposed; nobody will receive it.
            if let Some(disposer) = &constructed.disposer {
                run_disposer(binding.key(), disposer.as_ref());
            }
            return Err(WiringError::ContainerDisposed);
        }

        ledger.records.push(InstanceRecord {
            key: binding.key().clone(),
            disposer: constructed.disposer.clone(),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.ledger.lock().records.len()
    }

    /// Keys of cached instances, in creation order.
    pub fn keys(&self) -> Vec<ServiceKey> {
        self.ledger.lock().records.iter().map(|r| r.key.clone()).collect()
    }

    /// Disposes every cached instance in reverse creation order and refuses
    /// new ones. Returns how many disposers ran.
    pub fn dispose_all(&self) -> usize {
        self.release(true)
    }

    /// Disposes every cached instance in reverse creation order but keeps
    /// accepting new ones.
    pub fn clear(&self) -> usize {
        self.release(false)
    }

    fn release(&self, close: bool) -> usize {
        // Held for the whole teardown so no resolution observes a
        // half-disposed cache.
        let mut ledger = self.ledger.lock();
        if close {
            ledger.disposed = true;
        }

        let records = std::mem::take(&mut ledger.records);
        self.slots.clear();

        let mut disposed = 0;
        for record in records.iter().rev() {
            if let Some(disposer) = &record.disposer {
                run_disposer(&record.key, disposer.as_ref());
                disposed += 1;
            }
        }

        debug!(instances = records.len(), disposed, "Released cached instances");
        disposed
    }
}

/// Runs one disposer, containing any panic it raises.
fn run_disposer(key: &ServiceKey, disposer: &dyn Dispose) {
    if catch_unwind(AssertUnwindSafe(|| disposer.dispose())).is_err() {
        warn!(key = %key, "Disposer panicked; continuing teardown");
    }
}

impl std::fmt::Debug for InstanceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceCache")
            .field("instances", &self.len())
            .finish()
    }
}
