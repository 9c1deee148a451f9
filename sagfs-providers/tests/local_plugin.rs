// SPDX-License-Identifier: AGPL-3.0-or-later
//! Local plugin against a real directory tree

use sagfs_core::{ChangeBatch, ChangeKind, PluginConfig, Role, SagfsError, StorageBackend};
use sagfs_providers::build_local_plugin;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

fn tree() -> (TempDir, PluginConfig) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("sub/file.txt"), b"hello world").unwrap();
    std::fs::write(dir.path().join("b.txt"), b"b").unwrap();
    std::fs::write(dir.path().join("a.txt"), b"a").unwrap();

    let root = dir.path().canonicalize().unwrap();
    let config = PluginConfig::new(root.to_string_lossy());
    (dir, config)
}

#[tokio::test]
async fn test_queries() {
    let (_dir, config) = tree();
    let plugin = build_local_plugin("local", &config, Role::Passive).unwrap();
    plugin.connect().await.unwrap();

    let meta = plugin.stat("/sub/file.txt").await.unwrap();
    assert!(!meta.is_directory);
    assert_eq!(meta.size, 11);
    assert_eq!(meta.name, "file.txt");
    assert_eq!(meta.path, "/sub/file.txt");
    assert!(meta.checksum.is_none());

    let meta = plugin.stat("/sub").await.unwrap();
    assert!(meta.is_directory);
    assert_eq!(meta.size, 0);

    assert_eq!(plugin.list_dir("/").await.unwrap(), vec!["a.txt", "b.txt", "sub"]);
    assert!(plugin.exists("/a.txt").await);
    assert!(!plugin.exists("/nope").await);
    assert!(plugin.is_dir("/sub").await);
    assert!(!plugin.is_dir("/a.txt").await);

    plugin.close().await.unwrap();
}

#[tokio::test]
async fn test_error_taxonomy() {
    let (_dir, config) = tree();
    let plugin = build_local_plugin("local", &config, Role::Passive).unwrap();
    plugin.connect().await.unwrap();

    assert!(matches!(plugin.stat("/missing").await, Err(SagfsError::NotFound(_))));
    assert!(matches!(plugin.list_dir("/a.txt").await, Err(SagfsError::NotADirectory(_))));
    assert!(matches!(plugin.list_dir("/missing").await, Err(SagfsError::NotFound(_))));
}

#[tokio::test]
async fn test_read_ranges() {
    let (_dir, config) = tree();
    let plugin = build_local_plugin("local", &config, Role::Passive).unwrap();
    plugin.connect().await.unwrap();

    let data = plugin.read("/sub/file.txt", 6, 5).await.unwrap();
    assert_eq!(&data[..], b"world");

    let data = plugin.read("/sub/file.txt", 6, 100).await.unwrap();
    assert_eq!(&data[..], b"world");

    let data = plugin.read("/sub/file.txt", 50, 10).await.unwrap();
    assert!(data.is_empty());

    assert!(plugin.read("/missing", 0, 10).await.is_none());
}

#[tokio::test]
async fn test_missing_root_fails_connect() {
    let dir = tempfile::tempdir().unwrap();
    let config = PluginConfig::new(dir.path().join("absent").to_string_lossy());
    let plugin = build_local_plugin("local", &config, Role::Discover).unwrap();

    assert!(matches!(plugin.connect().await, Err(SagfsError::Connection(_))));
    assert!(!plugin.is_connected());
}

#[tokio::test]
async fn test_discover_reports_new_file() {
    let (dir, config) = tree();
    let plugin = build_local_plugin("local", &config, Role::Discover).unwrap();

    let seen: Arc<Mutex<Vec<ChangeBatch>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    plugin.observe(move |batch: &ChangeBatch| sink.lock().unwrap().push(batch.clone()));
    plugin.connect().await.unwrap();
    assert!(plugin.event_sink().is_some());

    std::fs::write(dir.path().join("sub/new.txt"), b"fresh").unwrap();

    let found = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let hit = seen.lock().unwrap().iter().any(|b| {
                b.kind() != Some(ChangeKind::Removed)
                    && b.created.iter().chain(b.modified.iter()).any(|e| e.path == "/sub/new.txt")
            });
            if hit {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;
    assert!(found.is_ok(), "no change reported for /sub/new.txt");

    for batch in seen.lock().unwrap().iter() {
        assert_eq!(batch.len(), 1);
    }

    plugin.close().await.unwrap();
    assert!(plugin.event_sink().is_none());
}

#[tokio::test]
async fn test_rename_reports_one_removal_and_one_creation() {
    let (dir, config) = tree();
    let plugin = build_local_plugin("local", &config, Role::Discover).unwrap();

    let seen: Arc<Mutex<Vec<ChangeBatch>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    plugin.observe(move |batch: &ChangeBatch| sink.lock().unwrap().push(batch.clone()));
    plugin.connect().await.unwrap();

    std::fs::rename(dir.path().join("a.txt"), dir.path().join("renamed.txt")).unwrap();

    let count = |seen: &Mutex<Vec<ChangeBatch>>| {
        let seen = seen.lock().unwrap();
        let removed = seen
            .iter()
            .filter(|b| b.removed.iter().any(|e| e.path == "/a.txt"))
            .count();
        let created = seen
            .iter()
            .filter(|b| b.created.iter().any(|e| e.path == "/renamed.txt"))
            .count();
        (removed, created)
    };

    let found = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let (removed, created) = count(&*seen);
            if removed > 0 && created > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;
    assert!(found.is_ok(), "rename not reported");

    // Give any duplicate report time to arrive
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(count(&*seen), (1, 1));

    plugin.close().await.unwrap();
}
