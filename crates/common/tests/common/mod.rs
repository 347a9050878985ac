//! Shared test utilities for pod integration tests
#![allow(dead_code)]

use std::sync::Once;

use common::prelude::*;
use tempfile::TempDir;

static TRACING: Once = Once::new();

/// Install a subscriber honouring RUST_LOG, once per test binary
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A fresh identity over an in-memory store
pub fn setup_pods() -> Pods {
    init_tracing();
    let ctx = Context::new(Store::memory(), Config::default());
    Pods::new(ctx, SecretKey::generate().unwrap())
}

/// Another identity over the same store as `pods`
pub fn other_identity(pods: &Pods) -> Pods {
    Pods::new(pods.context().clone(), SecretKey::generate().unwrap())
}

/// A fresh identity with one pod named "test"
pub async fn setup_test_env() -> (Pods, Pod) {
    let pods = setup_pods();
    let pod = pods.create("test").await.unwrap();
    (pods, pod)
}

/// Like [`setup_test_env`] but persisted in a temporary directory
pub async fn setup_fs_env() -> (Pods, Pod, TempDir) {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let store = Store::fs(&temp_dir.path().join("chunks")).await.unwrap();
    let pods = Pods::new(
        Context::new(store, Config::default()),
        SecretKey::generate().unwrap(),
    );
    let pod = pods.create("test").await.unwrap();
    (pods, pod, temp_dir)
}

/// Deterministic test payload
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}
