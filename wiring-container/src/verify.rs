//! Batch verification of a container's registration graph.
//!
//! Checks performed for every binding visible from the verified container:
//! 1. **Completeness**: every declared dependency has a binding
//! 2. **Acyclicity**: no dependency cycles (depth-first search over keys)
//! 3. **Lifetime compatibility**: no long-lived consumer captures a
//!    shorter-lived dependency (reported as a warning)
//!
//! By default each statically valid binding is also constructed inside a
//! throwaway verification scope, which catches the dependencies of factory
//! closures that declare none. [`VerifyOptions::static_only`] skips that.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, instrument, warn};
use wiring_support::rendering::{render_chain, render_section};

use crate::binding::{Binding, BindingKind, DecoratorBinding};
use crate::error::Result;
use crate::key::ServiceKey;
use crate::lifetime::Lifetime;

/// Aggregate report produced by [`Container::verify`](crate::container::Container::verify).
#[derive(Debug, Clone, Serialize)]
pub struct VerificationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub total_services: usize,
    pub verified_services: usize,
    /// `true` if an [`AbortSignal`] stopped the run early.
    pub aborted: bool,
    pub elapsed: Duration,
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Verification {}: {}/{} services verified in {:?}",
            if self.is_valid { "passed" } else { "failed" },
            self.verified_services,
            self.total_services,
            self.elapsed
        )?;
        write!(f, "{}", render_section("Errors", &self.errors))?;
        write!(f, "{}", render_section("Warnings", &self.warnings))
    }
}

/// Best-effort cancellation flag, checked between bindings.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Knobs for a verification run.
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    /// Also construct every binding in an isolated verification scope.
    pub dry_run: bool,
    pub abort: Option<AbortSignal>,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self::dry_run()
    }
}

impl VerifyOptions {
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            abort: None,
        }
    }

    /// Checks declared dependencies only; nothing is constructed.
    pub fn static_only() -> Self {
        Self {
            dry_run: false,
            abort: None,
        }
    }

    pub fn with_abort(mut self, signal: AbortSignal) -> Self {
        self.abort = Some(signal);
        self
    }

    fn aborted(&self) -> bool {
        self.abort.as_ref().is_some_and(AbortSignal::is_aborted)
    }
}

/// Point-in-time view of every binding visible from one container.
#[derive(Default)]
pub(crate) struct GraphSnapshot {
    /// Bindings to verify, outermost level first.
    pub nodes: Vec<Arc<Binding>>,
    pub decorators: Vec<Arc<DecoratorBinding>>,
    /// Keys resolvable without a condition, with their lifetime.
    pub unconditional: HashMap<ServiceKey, Lifetime>,
    /// Keys that only have conditional bindings, with the first one's lifetime.
    pub conditional: HashMap<ServiceKey, Lifetime>,
}

impl GraphSnapshot {
    fn lifetime_of(&self, key: &ServiceKey) -> Option<Lifetime> {
        self.unconditional
            .get(key)
            .or_else(|| self.conditional.get(key))
            .copied()
    }

    /// Dependencies reachable when `key` is resolved, over every binding
    /// that can serve it.
    fn edges(&self) -> HashMap<ServiceKey, Vec<ServiceKey>> {
        let mut edges: HashMap<ServiceKey, Vec<ServiceKey>> = HashMap::new();
        for node in &self.nodes {
            if node.kind() == BindingKind::Collection {
                continue;
            }
            let entry = edges.entry(node.key().clone()).or_default();
            for dependency in node.dependencies() {
                if !entry.contains(dependency) {
                    entry.push(dependency.clone());
                }
            }
        }
        edges
    }
}

/// Depth-first cycle finder over the key graph.
///
/// Unlike resolution, it keeps going after the first cycle so the report
/// lists each one once.
struct CycleFinder<'a> {
    edges: &'a HashMap<ServiceKey, Vec<ServiceKey>>,
    visiting: HashSet<ServiceKey>,
    validated: HashSet<ServiceKey>,
    path: Vec<ServiceKey>,
    found: Vec<Vec<ServiceKey>>,
    seen: HashSet<Vec<ServiceKey>>,
}

impl<'a> CycleFinder<'a> {
    fn new(edges: &'a HashMap<ServiceKey, Vec<ServiceKey>>) -> Self {
        Self {
            edges,
            visiting: HashSet::new(),
            validated: HashSet::new(),
            path: Vec::new(),
            found: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn run(mut self) -> Vec<Vec<ServiceKey>> {
        let edges = self.edges;
        let mut keys: Vec<&ServiceKey> = edges.keys().collect();
        keys.sort_by_key(|key| key.to_string());
        for key in keys {
            self.visit(key);
        }
        self.found
    }

    fn visit(&mut self, key: &ServiceKey) {
        if self.validated.contains(key) {
            return;
        }

        if self.visiting.contains(key) {
            let start = self.path.iter().position(|k| k == key).unwrap_or(0);
            let mut chain: Vec<ServiceKey> = self.path[start..].to_vec();
            chain.push(key.clone());
            if self.seen.insert(canonical(&chain)) {
                warn!(cycle = ?chain, "Circular dependency detected");
                self.found.push(chain);
            }
            return;
        }

        let edges = self.edges;
        let Some(dependencies) = edges.get(key) else {
            return;
        };

        self.visiting.insert(key.clone());
        self.path.push(key.clone());

        for dependency in dependencies {
            self.visit(dependency);
        }

        self.path.pop();
        self.visiting.remove(key);
        self.validated.insert(key.clone());
    }
}

/// Rotation-independent form of a cycle, for de-duplication.
fn canonical(chain: &[ServiceKey]) -> Vec<ServiceKey> {
    let ring = &chain[..chain.len().saturating_sub(1)];
    let Some(start) = (0..ring.len()).min_by_key(|&i| ring[i].to_string()) else {
        return Vec::new();
    };
    ring[start..].iter().chain(&ring[..start]).cloned().collect()
}

/// Runs every check over `snapshot`.
///
/// `construct` is called for each statically valid binding when
/// `options.dry_run` is set.
#[instrument(skip_all, name = "verify", fields(bindings = snapshot.nodes.len(), dry_run = options.dry_run))]
pub(crate) fn verify_snapshot<F>(
    snapshot: &GraphSnapshot,
    options: &VerifyOptions,
    mut construct: F,
) -> VerificationResult
where
    F: FnMut(&Arc<Binding>) -> Result<()>,
{
    let started = Instant::now();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let edges = snapshot.edges();
    let cycles = CycleFinder::new(&edges).run();
    let in_cycle: HashSet<&ServiceKey> = cycles.iter().flatten().collect();
    for cycle in &cycles {
        let names: Vec<String> = cycle.iter().map(ServiceKey::short_name).collect();
        errors.push(format!("Circular dependency: {}", render_chain(&names)));
    }

    for decorator in &snapshot.decorators {
        for dependency in decorator.dependencies() {
            if snapshot.lifetime_of(dependency).is_none() {
                errors.push(format!(
                    "Decorator {} requires {}, which is not registered",
                    wiring_support::rendering::shorten_type_name(decorator.decorator_name()),
                    dependency
                ));
            }
        }
    }

    let mut verified = 0;
    let mut aborted = false;
    for (checked, node) in snapshot.nodes.iter().enumerate() {
        if options.aborted() {
            aborted = true;
            warnings.push(format!(
                "Verification aborted after {checked} of {} services",
                snapshot.nodes.len()
            ));
            break;
        }

        let consumer = node.key().short_name();
        let mut failed = in_cycle.contains(node.key());

        for dependency in node.dependencies() {
            let Some(dependency_lifetime) = snapshot.lifetime_of(dependency) else {
                failed = true;
                errors.push(format!("{consumer} requires {dependency}, which is not registered"));
                continue;
            };

            if !snapshot.unconditional.contains_key(dependency) {
                warnings.push(format!(
                    "{consumer} depends on {}, which only has conditional bindings",
                    dependency.short_name()
                ));
            }

            if node.lifetime() > dependency_lifetime {
                warnings.push(format!(
                    "{consumer} ({}) depends on {} ({dependency_lifetime}); the shorter-lived \
                     instance is captured for the consumer's lifetime",
                    node.lifetime(),
                    dependency.short_name()
                ));
            }
        }

        if !failed
            && options.dry_run
            && let Err(error) = construct(node)
        {
            failed = true;
            errors.push(format!("{consumer} failed to construct: {error}"));
        }

        if !failed {
            verified += 1;
        }
    }

    let result = VerificationResult {
        is_valid: errors.is_empty() && !aborted,
        errors,
        warnings,
        total_services: snapshot.nodes.len(),
        verified_services: verified,
        aborted,
        elapsed: started.elapsed(),
    };

    debug!(
        valid = result.is_valid,
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "Verification finished"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Database;
    struct UserRepo;
    struct UserService;

    fn node<T: Send + Sync + 'static>(lifetime: Lifetime, deps: Vec<ServiceKey>) -> Arc<Binding> {
        let mut builder = Binding::factory::<T, _>(|_| Err(crate::error::WiringError::custom("unused")))
            .lifetime(lifetime);
        for dep in deps {
            builder = builder.depends_on(dep);
        }
        Arc::new(builder.build())
    }

    fn snapshot(nodes: Vec<Arc<Binding>>) -> GraphSnapshot {
        let mut snapshot = GraphSnapshot::default();
        for node in &nodes {
            match node.kind() {
                BindingKind::Primary => {
                    snapshot.unconditional.insert(node.key().clone(), node.lifetime());
                }
                BindingKind::Conditional => {
                    snapshot.conditional.entry(node.key().clone()).or_insert(node.lifetime());
                }
                BindingKind::Collection => {}
            }
        }
        snapshot.nodes = nodes;
        snapshot
    }

    fn static_check(snapshot: &GraphSnapshot) -> VerificationResult {
        verify_snapshot(snapshot, &VerifyOptions::static_only(), |_| Ok(()))
    }

    #[test]
    fn valid_simple_graph() {
        let graph = snapshot(vec![
            node::<Database>(Lifetime::Singleton, vec![]),
            node::<UserRepo>(Lifetime::Singleton, vec![ServiceKey::of::<Database>()]),
            node::<UserService>(Lifetime::Scoped, vec![ServiceKey::of::<UserRepo>()]),
        ]);

        let result = static_check(&graph);
        assert!(result.is_valid, "{result}");
        assert_eq!(result.verified_services, 3);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn one_dangling_dependency_is_one_error() {
        let graph = snapshot(vec![node::<UserRepo>(
            Lifetime::Singleton,
            vec![ServiceKey::of::<Database>()],
        )]);

        let result = static_check(&graph);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("Database"));
        assert_eq!(result.verified_services, 0);
    }

    #[test]
    fn cycle_reported_once() {
        struct A;
        struct B;
        struct C;

        let graph = snapshot(vec![
            node::<A>(Lifetime::Transient, vec![ServiceKey::of::<B>()]),
            node::<B>(Lifetime::Transient, vec![ServiceKey::of::<C>()]),
            node::<C>(Lifetime::Transient, vec![ServiceKey::of::<A>()]),
        ]);

        let result = static_check(&graph);
        assert_eq!(result.errors.len(), 1, "{result}");
        assert!(result.errors[0].starts_with("Circular dependency"));
        assert_eq!(result.verified_services, 0);
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        struct A;
        let graph = snapshot(vec![node::<A>(Lifetime::Transient, vec![ServiceKey::of::<A>()])]);
        assert!(!static_check(&graph).is_valid);
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        struct A;
        struct B;
        struct C;
        struct D;

        let graph = snapshot(vec![
            node::<D>(Lifetime::Singleton, vec![]),
            node::<B>(Lifetime::Singleton, vec![ServiceKey::of::<D>()]),
            node::<C>(Lifetime::Singleton, vec![ServiceKey::of::<D>()]),
            node::<A>(Lifetime::Singleton, vec![ServiceKey::of::<B>(), ServiceKey::of::<C>()]),
        ]);

        assert!(static_check(&graph).is_valid);
    }

    #[test]
    fn lifetime_mismatch_is_a_warning() {
        let graph = snapshot(vec![
            node::<Database>(Lifetime::Transient, vec![]),
            node::<UserService>(Lifetime::Singleton, vec![ServiceKey::of::<Database>()]),
        ]);

        let result = static_check(&graph);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("Singleton"));
    }

    #[test]
    fn conditional_only_dependency_is_a_warning() {
        let conditional = Arc::new(
            Binding::factory::<Database, _>(|_| Ok(Arc::new(Database)))
                .when(|_| true)
                .build(),
        );
        let graph = snapshot(vec![
            conditional,
            node::<UserRepo>(Lifetime::Transient, vec![ServiceKey::of::<Database>()]),
        ]);

        let result = static_check(&graph);
        assert!(result.is_valid);
        assert!(result.warnings[0].contains("conditional"));
    }

    #[test]
    fn dry_run_reports_construction_failures() {
        let graph = snapshot(vec![node::<Database>(Lifetime::Singleton, vec![])]);
        let options = VerifyOptions::dry_run();

        let result = verify_snapshot(&graph, &options, |_| Err(crate::error::WiringError::custom("refused")));
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("refused"));
    }

    #[test]
    fn abort_stops_between_bindings() {
        let graph = snapshot(vec![
            node::<Database>(Lifetime::Singleton, vec![]),
            node::<UserRepo>(Lifetime::Singleton, vec![]),
        ]);
        let signal = AbortSignal::new();
        let options = VerifyOptions::default().with_abort(signal.clone());

        let mut calls = 0;
        let result = verify_snapshot(&graph, &options, |_| {
            calls += 1;
            signal.abort();
            Ok(())
        });

        assert!(result.aborted);
        assert!(!result.is_valid);
        assert_eq!(calls, 1);
        assert_eq!(result.verified_services, 1);
    }

    #[test]
    fn report_display_and_serialization() {
        let graph = snapshot(vec![node::<UserRepo>(
            Lifetime::Singleton,
            vec![ServiceKey::of::<Database>()],
        )]);
        let result = static_check(&graph);

        let text = result.to_string();
        assert!(text.starts_with("Verification failed"));
        assert!(text.contains("Errors (1):"));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["is_valid"], false);
        assert_eq!(json["total_services"], 1);
    }
}
