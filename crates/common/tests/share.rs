//! Integration tests for sharing files and directories between identities

mod common;

use ::common::error::FsError;

#[tokio::test]
async fn test_share_file_to_another_identity() {
    let (alice, pod) = common::setup_test_env().await;
    pod.mkdir("/d").await.unwrap();
    let data = common::payload(100);
    let original = pod
        .upload_with_block_size("/d/f.txt", data.clone(), 32)
        .await
        .unwrap();

    let reference = pod.share_file("/d/f.txt").await.unwrap();
    assert_eq!(reference.to_hex().len(), 128);

    let bob = common::other_identity(&alice);
    let bob_pod = bob.create("mine").await.unwrap();
    let imported = bob_pod
        .save_shared_file(&reference.to_hex(), "/", Some("g.txt"))
        .await
        .unwrap();

    assert_eq!(imported.path, "/");
    assert_eq!(imported.name, "g.txt");
    assert_eq!(imported.size, original.size);
    assert_eq!(imported.block_size, original.block_size);
    assert_eq!(imported.content_type, original.content_type);
    assert_eq!(imported.manifest, original.manifest);
    assert_eq!(imported.creation_time, original.creation_time);
    assert!(imported.content_key.is_some());

    assert_eq!(bob_pod.stat("/g.txt").await.unwrap(), imported);
    assert_eq!(
        bob_pod.download("/g.txt").await.unwrap().as_ref(),
        data.as_slice()
    );
}

#[tokio::test]
async fn test_reshare_imported_file() {
    let (alice, pod) = common::setup_test_env().await;
    pod.upload("/f.txt", b"passed along".to_vec()).await.unwrap();
    let reference = pod.share_file("/f.txt").await.unwrap();

    let bob = common::other_identity(&alice);
    let bob_pod = bob.create("b").await.unwrap();
    bob_pod
        .save_shared_file(&reference.to_hex(), "/", None)
        .await
        .unwrap();
    let reference = bob_pod.share_file("/f.txt").await.unwrap();

    let carol = common::other_identity(&alice);
    let carol_pod = carol.create("c").await.unwrap();
    carol_pod
        .save_shared_file(&reference.to_hex(), "/", None)
        .await
        .unwrap();
    assert_eq!(
        carol_pod.download("/f.txt").await.unwrap().as_ref(),
        b"passed along"
    );
}

#[tokio::test]
async fn test_import_into_own_pod() {
    let (_alice, pod) = common::setup_test_env().await;
    pod.upload("/f.txt", b"mine".to_vec()).await.unwrap();
    let reference = pod.share_file("/f.txt").await.unwrap();

    let copy = pod
        .save_shared_file(&reference.to_hex(), "/", Some("copy.txt"))
        .await
        .unwrap();
    assert!(copy.content_key.is_none());
    assert_eq!(pod.download("/copy.txt").await.unwrap().as_ref(), b"mine");

    let result = pod.save_shared_file(&reference.to_hex(), "/", None).await;
    assert!(matches!(result, Err(FsError::AlreadyExists(_))));
}

#[tokio::test]
async fn test_shared_info() {
    let (alice, pod) = common::setup_test_env().await;
    pod.upload("/f.txt", b"x".to_vec()).await.unwrap();
    let file_ref = pod.share_file("/f.txt").await.unwrap();
    let dir_ref = pod.share_dir("/").await.unwrap();

    let bob = common::other_identity(&alice);

    let info = bob.shared_info(&file_ref.to_hex()).await.unwrap();
    assert_eq!(info.pod_name(), "test");
    assert_eq!(info.address(), pod.address());
    assert!(!info.is_dir());
    assert_eq!(info.file().unwrap().unwrap().name, "f.txt");

    let info = bob.shared_info(&dir_ref.to_hex()).await.unwrap();
    assert!(info.is_dir());
    let dir = info.directory().unwrap();
    assert_eq!(dir.full_path(), "/");
    assert_eq!(dir.files().count(), 1);
}

#[tokio::test]
async fn test_save_shared_pod() {
    let (alice, pod) = common::setup_test_env().await;
    pod.mkdir("/d").await.unwrap();
    pod.upload("/d/f.txt", b"shared".to_vec()).await.unwrap();
    let reference = pod.share_dir("/d").await.unwrap();

    let bob = common::other_identity(&alice);
    let shared = bob
        .save_shared_pod(&reference.to_hex(), None)
        .await
        .unwrap();
    assert_eq!(shared.name, "test");
    assert_eq!(shared.address, pod.address());

    let list = bob.list().await.unwrap();
    assert!(list.pods.is_empty());
    assert_eq!(list.shared_pods, vec![shared]);

    let view = bob.open("test").await.unwrap();
    assert!(view.is_shared());
    assert_eq!(
        view.read_dir("/", true).await.unwrap(),
        pod.read_dir("/", true).await.unwrap()
    );
    assert_eq!(view.download("/d/f.txt").await.unwrap().as_ref(), b"shared");

    // later writes by the owner are visible
    pod.upload("/d/later.txt", b"later".to_vec()).await.unwrap();
    assert_eq!(
        view.download("/d/later.txt").await.unwrap().as_ref(),
        b"later"
    );
}

#[tokio::test]
async fn test_shared_pod_is_read_only() {
    let (alice, pod) = common::setup_test_env().await;
    pod.upload("/f.txt", b"x".to_vec()).await.unwrap();
    let reference = pod.share_dir("/").await.unwrap();

    let bob = common::other_identity(&alice);
    bob.save_shared_pod(&reference.to_hex(), Some("alice"))
        .await
        .unwrap();
    let view = bob.open("alice").await.unwrap();

    assert!(matches!(
        view.mkdir("/new").await,
        Err(FsError::Unauthorized(_))
    ));
    assert!(matches!(
        view.upload("/new.txt", b"x".to_vec()).await,
        Err(FsError::Unauthorized(_))
    ));
    assert!(matches!(view.rm("/f.txt").await, Err(FsError::Unauthorized(_))));
    assert!(matches!(
        view.rmdir("/").await,
        Err(FsError::Unauthorized(_))
    ));
    assert_eq!(pod.read_dir("/", false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_save_shared_pod_name_taken() {
    let (alice, pod) = common::setup_test_env().await;
    let reference = pod.share_dir("/").await.unwrap().to_hex();

    let bob = common::other_identity(&alice);
    bob.create("mine").await.unwrap();
    bob.save_shared_pod(&reference, None).await.unwrap();

    assert!(matches!(
        bob.save_shared_pod(&reference, None).await,
        Err(FsError::AlreadyExists(_))
    ));
    assert!(matches!(
        bob.save_shared_pod(&reference, Some("mine")).await,
        Err(FsError::AlreadyExists(_))
    ));
    bob.save_shared_pod(&reference, Some("again")).await.unwrap();

    bob.delete("test").await.unwrap();
    let list = bob.list().await.unwrap();
    assert_eq!(list.shared_pods.len(), 1);
    assert_eq!(list.pods.len(), 1);
}

#[tokio::test]
async fn test_wrong_kind_of_capsule() {
    let (alice, pod) = common::setup_test_env().await;
    pod.upload("/f.txt", b"x".to_vec()).await.unwrap();
    let file_ref = pod.share_file("/f.txt").await.unwrap().to_hex();
    let dir_ref = pod.share_dir("/").await.unwrap().to_hex();

    let bob = common::other_identity(&alice);
    let bob_pod = bob.create("b").await.unwrap();

    assert!(matches!(
        bob.save_shared_pod(&file_ref, None).await,
        Err(FsError::InvalidArgument(_))
    ));
    assert!(matches!(
        bob_pod.save_shared_file(&dir_ref, "/", None).await,
        Err(FsError::InvalidArgument(_))
    ));
    assert!(bob.list().await.unwrap().shared_pods.is_empty());
    assert!(bob_pod.read_dir("/", false).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_reference() {
    let pods = common::setup_pods();
    let pod = pods.create("p").await.unwrap();

    for reference in ["", "not hex", "ab"] {
        assert!(matches!(
            pods.shared_info(reference).await,
            Err(FsError::NotFound(_))
        ));
    }
    let unknown = "00".repeat(64);
    assert!(matches!(
        pods.save_shared_pod(&unknown, None).await,
        Err(FsError::NotFound(_))
    ));
    assert!(matches!(
        pod.save_shared_file(&unknown, "/", None).await,
        Err(FsError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_share_missing() {
    let (_alice, pod) = common::setup_test_env().await;
    assert!(matches!(
        pod.share_file("/nope").await,
        Err(FsError::NotFound(_))
    ));
    assert!(matches!(
        pod.share_dir("/nope").await,
        Err(FsError::NotFound(_))
    ));
}
