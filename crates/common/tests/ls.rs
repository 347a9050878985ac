//! Integration tests for directory listings

mod common;

use ::common::error::FsError;
use ::common::pod::DirItem;

#[tokio::test]
async fn test_ls_empty_root() {
    let (_pods, pod) = common::setup_test_env().await;

    let root = pod.stat_dir("/").await.unwrap();
    assert_eq!(root.path, "");
    assert_eq!(root.name, "/");
    assert!(pod.read_dir("/", false).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_ls_one_level() {
    let (_pods, pod) = common::setup_test_env().await;

    pod.mkdir("/dir").await.unwrap();
    pod.mkdir("/dir/inner").await.unwrap();
    pod.upload("/top.txt", b"top".to_vec()).await.unwrap();
    pod.upload("/dir/nested.txt", b"nested".to_vec())
        .await
        .unwrap();

    let items = pod.read_dir("/", false).await.unwrap();
    let paths: Vec<_> = items.keys().map(String::as_str).collect();
    assert_eq!(paths, ["/dir", "/top.txt"]);

    match items.get("/top.txt").unwrap() {
        DirItem::File(file) => {
            assert_eq!(file.size, 3);
            assert_eq!(file.content_type, "text/plain");
        }
        other => panic!("expected a file, got {:?}", other),
    }

    let items = pod.read_dir("/dir", false).await.unwrap();
    let paths: Vec<_> = items.keys().map(String::as_str).collect();
    assert_eq!(paths, ["/dir/inner", "/dir/nested.txt"]);
}

#[tokio::test]
async fn test_ls_recursive() {
    let (_pods, pod) = common::setup_test_env().await;

    pod.mkdir("/a").await.unwrap();
    pod.mkdir("/a/b").await.unwrap();
    pod.mkdir("/a/b/c").await.unwrap();
    pod.upload("/a/b/c/deep.bin", vec![0u8; 10]).await.unwrap();
    pod.upload("/a/one.txt", b"1".to_vec()).await.unwrap();
    pod.mkdir("/z").await.unwrap();

    let items = pod.read_dir("/", true).await.unwrap();
    let paths: Vec<_> = items.keys().map(String::as_str).collect();
    assert_eq!(
        paths,
        ["/a", "/a/b", "/a/b/c", "/a/b/c/deep.bin", "/a/one.txt", "/z"]
    );
    assert_eq!(items.values().filter(|i| i.is_dir()).count(), 4);
    assert_eq!(items.get("/a/b/c/deep.bin").unwrap().name(), "deep.bin");

    let items = pod.read_dir("/a/b", true).await.unwrap();
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn test_ls_missing_or_file() {
    let (_pods, pod) = common::setup_test_env().await;
    pod.upload("/f.txt", b"x".to_vec()).await.unwrap();

    assert!(matches!(
        pod.read_dir("/nope", false).await,
        Err(FsError::NotFound(_))
    ));
    assert!(matches!(
        pod.read_dir("/f.txt", false).await,
        Err(FsError::NotFound(_))
    ));
}
