//! Verification on the tokio blocking pool.
#![cfg(feature = "async")]

use std::sync::Arc;

use wiring::prelude::*;

struct Settings;
struct Service;

impl Injectable for Service {
    fn dependencies() -> Vec<ServiceKey> {
        vec![ServiceKey::of::<Settings>()]
    }
    fn inject(resolver: &dyn Resolver) -> Result<Self> {
        resolver.resolve::<Settings>()?;
        Ok(Service)
    }
}

#[tokio::test]
async fn background_dry_run_reports_valid_graph() {
    let mut container = Container::new();
    container
        .register_singleton_instance(Arc::new(Settings))
        .unwrap()
        .register_singleton::<Service, Service>()
        .unwrap();

    let report = container
        .verify_in_background(VerifyOptions::dry_run())
        .await
        .unwrap();

    assert!(report.is_valid, "{report}");
    assert_eq!(report.verified_services, 2);
    assert_eq!(container.instance_count(), 0);
}

#[tokio::test]
async fn background_run_does_not_block_resolution() {
    let mut container = Container::new();
    container.register_transient::<Service, Service>().unwrap();

    let handle = container.verify_in_background(VerifyOptions::default());
    assert!(container.resolve::<Service>().is_err());

    let report = handle.await.unwrap();
    assert!(!report.is_valid);
    assert_eq!(report.errors.len(), 1);
}
