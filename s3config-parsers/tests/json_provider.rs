//! JSON parser driven through a full provider load/reload cycle.

use std::time::Duration;

use s3config::{MemoryObjectStore, S3ConfigurationSource};
use s3config_parsers::{JsonObjectParser, json_source_builder, json_source_with_reload};

#[tokio::test]
async fn json_object_load_and_reload() {
    let store = MemoryObjectStore::new();
    store.put("cfg", "app.json", br#"{"k1": "v1"}"#.to_vec());

    let provider = S3ConfigurationSource::builder()
        .bucket("cfg")
        .key("app.json")
        .parser(JsonObjectParser)
        .store(store.clone())
        .build()
        .unwrap()
        .load()
        .await
        .unwrap();

    assert_eq!(provider.get("k1").as_deref(), Some("v1"));

    // Unchanged object: reload is a no-op.
    let token = provider.change_token();
    provider.reload().await;
    assert!(
        tokio::time::timeout(Duration::from_millis(50), token.changed())
            .await
            .is_err()
    );

    // New content: swapped in with one notification.
    store.put("cfg", "app.json", br#"{"k1": "v2"}"#.to_vec());
    let token = provider.change_token();
    provider.reload().await;
    tokio::time::timeout(Duration::from_secs(1), token.changed())
        .await
        .expect("reload must notify");
    assert_eq!(provider.get("k1").as_deref(), Some("v2"));
}

#[tokio::test]
async fn nested_json_is_exposed_under_flattened_keys() {
    let store = MemoryObjectStore::new();
    store.put(
        "cfg",
        "app.json",
        br#"{"logging": {"level": "info"}, "features": ["alpha", "beta"]}"#.to_vec(),
    );

    let provider = json_source_builder("cfg", "app.json")
        .store(store)
        .build()
        .unwrap()
        .load()
        .await
        .unwrap();

    assert_eq!(provider.get("logging:level").as_deref(), Some("info"));
    assert_eq!(provider.get("features:0").as_deref(), Some("alpha"));
    assert_eq!(provider.get("features:1").as_deref(), Some("beta"));
}

#[tokio::test]
async fn reload_shorthand_picks_up_changes() {
    let store = MemoryObjectStore::new();
    store.put("cfg", "app.json", br#"{"k1": "v1"}"#.to_vec());

    let provider = json_source_with_reload("cfg", "app.json", Duration::from_millis(50))
        .store(store.clone())
        .build()
        .unwrap()
        .load()
        .await
        .unwrap();

    let token = provider.change_token();
    store.put("cfg", "app.json", br#"{"k1": "v2"}"#.to_vec());

    tokio::time::timeout(Duration::from_secs(5), token.changed())
        .await
        .expect("periodic reload must observe the update");
    assert_eq!(provider.get("k1").as_deref(), Some("v2"));
    provider.stop_auto_reload();
}

#[tokio::test]
async fn malformed_json_on_reload_keeps_previous_data() {
    let store = MemoryObjectStore::new();
    store.put("cfg", "app.json", br#"{"k1": "v1"}"#.to_vec());

    let provider = json_source_builder("cfg", "app.json")
        .store(store.clone())
        .build()
        .unwrap()
        .load()
        .await
        .unwrap();

    store.put("cfg", "app.json", b"{broken".to_vec());
    provider.reload().await;

    assert_eq!(provider.get("k1").as_deref(), Some("v1"));
}
