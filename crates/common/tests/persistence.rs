//! Integration tests for the filesystem-backed store

mod common;

use ::common::prelude::*;
use tempfile::TempDir;

#[tokio::test]
async fn test_pods_survive_reopening_the_store() {
    common::init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("chunks");
    let root = SecretKey::generate().unwrap();

    {
        let store = Store::fs(&path).await.unwrap();
        let pods = Pods::new(Context::new(store, Config::default()), root.clone());
        let pod = pods.create("home").await.unwrap();
        pod.mkdir("/docs").await.unwrap();
        pod.upload_with_block_size("/docs/a.bin", common::payload(1000), 64)
            .await
            .unwrap();
    }

    let store = Store::fs(&path).await.unwrap();
    let pods = Pods::new(Context::new(store, Config::default()), root);
    assert_eq!(pods.list().await.unwrap().pods.len(), 1);

    let pod = pods.open("home").await.unwrap();
    assert_eq!(
        pod.download("/docs/a.bin").await.unwrap().as_ref(),
        common::payload(1000).as_slice()
    );

    // keep writing where the previous session left off
    pod.rm("/docs/a.bin").await.unwrap();
    assert!(pod.read_dir("/docs", false).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fs_env() {
    let (pods, pod, _temp) = common::setup_fs_env().await;
    pod.upload("/x.txt", b"x".to_vec()).await.unwrap();
    let reopened = pods.open("test").await.unwrap();
    assert_eq!(reopened.download("/x.txt").await.unwrap().as_ref(), b"x");
}
