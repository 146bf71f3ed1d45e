mod support;

use std::path::Path;

use magblocks::cache::CacheConfig;
use magblocks::infra::memory::ContentRecord;
use serde_json::{Value, json};
use tempfile::TempDir;

use support::{COLUMN, VERTICAL, attributes, five_items, item, repository, runtime, titles};

fn persisted(path: &Path) -> CacheConfig {
    CacheConfig {
        snapshot_path: Some(path.to_path_buf()),
        ..CacheConfig::default()
    }
}

async fn warm_and_save(path: &Path) {
    let repository = repository(five_items());
    let runtime = runtime(&repository, persisted(path));
    runtime.registry().render(COLUMN, &attributes(json!({}))).await;
    runtime.registry().render(VERTICAL, &attributes(json!({}))).await;
    runtime.shutdown().await.expect("snapshot saved");
}

#[tokio::test]
async fn fragments_survive_a_restart() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("cache").join("fragments.json");
    warm_and_save(&path).await;
    assert!(path.exists());

    let repository = repository(five_items());
    let runtime = runtime(&repository, persisted(&path));
    assert_eq!(runtime.cache().len(), 2);

    let html = runtime.registry().render(COLUMN, &attributes(json!({}))).await;
    assert_eq!(titles(html.as_str()), vec!["D5", "D4", "D3"]);
    assert_eq!(repository.query_count(), 0);
}

#[tokio::test]
async fn changed_content_discards_the_snapshot() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("fragments.json");
    warm_and_save(&path).await;

    let mut records = five_items();
    records[0].item.title = "Retitled".to_string();
    let repository = repository(records);
    let runtime = runtime(&repository, persisted(&path));

    assert!(runtime.cache().is_empty());
}

#[tokio::test]
async fn corrupted_entry_is_treated_as_a_miss() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("fragments.json");
    warm_and_save(&path).await;

    let mut snapshot: Value =
        serde_json::from_slice(&std::fs::read(&path).expect("read snapshot")).expect("json");
    let entries = snapshot["entries"].as_array_mut().expect("entries");
    assert_eq!(entries.len(), 2);
    entries[0]["fragment"] = json!("<p>tampered</p>");
    std::fs::write(&path, serde_json::to_vec(&snapshot).expect("encode")).expect("write");

    let repository = repository(five_items());
    let runtime = runtime(&repository, persisted(&path));
    assert_eq!(runtime.cache().len(), 1);

    let column = runtime.registry().render(COLUMN, &attributes(json!({}))).await;
    let vertical = runtime.registry().render(VERTICAL, &attributes(json!({}))).await;
    assert!(!column.as_str().contains("tampered"));
    assert!(!vertical.as_str().contains("tampered"));
    assert_eq!(repository.query_count(), 1);
}

#[tokio::test]
async fn unreadable_snapshot_starts_cold() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("fragments.json");
    std::fs::write(&path, b"not json").expect("write");

    let repository = repository(five_items());
    let runtime = runtime(&repository, persisted(&path));
    assert!(runtime.cache().is_empty());

    runtime.registry().render(COLUMN, &attributes(json!({}))).await;
    runtime.shutdown().await.expect("snapshot overwritten");

    let snapshot: Value =
        serde_json::from_slice(&std::fs::read(&path).expect("read snapshot")).expect("json");
    assert_eq!(snapshot["entries"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn edit_just_before_shutdown_is_not_saved_stale() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("fragments.json");

    let repository = repository(five_items());
    let runtime = runtime(&repository, persisted(&path));
    runtime.registry().render(COLUMN, &attributes(json!({}))).await;
    repository.upsert(ContentRecord::published(item(6, "D6")));
    runtime.shutdown().await.expect("snapshot saved");

    let mut records = five_items();
    records.push(ContentRecord::published(item(6, "D6")));
    let repository = support::repository(records);
    let runtime = support::runtime(&repository, persisted(&path));

    let html = runtime.registry().render(COLUMN, &attributes(json!({}))).await;
    assert_eq!(titles(html.as_str()), vec!["D6", "D5", "D4"]);
}
