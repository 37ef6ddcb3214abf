//! Basic example of the wiring container.
//!
//! Run with `RUST_LOG=wiring_container=debug cargo run --example basic`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use wiring::Injectable;
use wiring::prelude::*;
use wiring::telemetry::init_tracing;

// === Define your traits and types ===

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

#[derive(Injectable)]
#[injectable(provides = "dyn Logger")]
struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

struct Config {
    database_url: String,
}

#[derive(Injectable)]
#[injectable(dispose)]
struct Database {
    config: Arc<Config>,
    logger: Arc<dyn Logger>,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.config.database_url)
    }
}

impl Dispose for Database {
    fn dispose(&self) {
        self.logger.log("Closing database connection");
    }
}

/// One per request scope.
#[derive(Injectable)]
struct RequestContext {
    #[inject(default)]
    id: AtomicU64,
}

#[derive(Injectable)]
struct UserService {
    db: Arc<Database>,
    logger: Arc<dyn Logger>,
    request: Arc<RequestContext>,
}

impl UserService {
    fn get_user(&self, id: u64) -> String {
        self.logger.log(&format!(
            "Getting user {id} (request {})",
            self.request.id.load(Ordering::Relaxed)
        ));
        self.db.query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

/// Prefixes every message with a timestamp-like tag.
struct TaggedLogger(Arc<dyn Logger>);

impl Logger for TaggedLogger {
    fn log(&self, msg: &str) {
        self.0.log(&format!("[app] {msg}"));
    }
}

struct CoreProvider;

impl Provider for CoreProvider {
    fn register(&self, registry: &mut dyn ProviderRegistry) -> Result<()> {
        registry
            .register_singleton_instance(Arc::new(Config {
                database_url: "postgres://localhost/myapp".to_string(),
            }))?
            .register_singleton::<dyn Logger, ConsoleLogger>()?
            .register_decorator_fn::<dyn Logger, _>(|inner, _| {
                Ok(Arc::new(TaggedLogger(inner)) as Arc<dyn Logger>)
            })?
            .register_singleton::<Database, Database>()?;
        Ok(())
    }
}

fn main() -> Result<()> {
    init_tracing("wiring_container=info");

    let container = Container::builder()
        .add_provider(&CoreProvider)
        .configure(|b| {
            b.register_scoped::<RequestContext, RequestContext>()?
                .register_transient::<UserService, UserService>()?;
            Ok(())
        })
        .build()?;

    container.events().on_resolved(|event| {
        tracing::debug!(key = %event.key, elapsed = ?event.elapsed, "Resolved");
    });

    println!("{}", container.verify());

    for request in 1..=2 {
        let scope = container.create_scope()?;
        let service = scope.resolve::<UserService>()?;
        service.request.id.store(request, Ordering::Relaxed);
        println!("{}", service.get_user(42));
        scope.dispose();
    }

    container.dispose();
    Ok(())
}
