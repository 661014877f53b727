//! Demonstrates a periodically reloading configuration source without
//! touching real AWS: a background task edits an in-memory store while the
//! provider picks the changes up through its etag checks.
//!
//! Point the same builder at S3 by dropping the `.store(...)` call; the
//! source then builds a client from the ambient AWS environment.

use std::time::Duration;

use s3config::MemoryObjectStore;
use s3config_parsers::json_source_builder;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store = MemoryObjectStore::new();
    store.put(
        "demo-bucket",
        "settings.json",
        br#"{"greeting": "hello", "app": {"log_level": "info"}}"#.to_vec(),
    );

    let provider = json_source_builder("demo-bucket", "settings.json")
        .reload_every(Duration::from_secs(2))
        .store(store.clone())
        .build()?
        .load()
        .await?;

    info!(
        greeting = provider.get("greeting").as_deref().unwrap_or("<unset>"),
        log_level = provider.get("app:log_level").as_deref().unwrap_or("<unset>"),
        "initial configuration loaded"
    );

    // Simulate an out-of-band configuration edit a few seconds in.
    let editor_store = store.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        editor_store.put(
            "demo-bucket",
            "settings.json",
            br#"{"greeting": "bonjour", "app": {"log_level": "debug"}}"#.to_vec(),
        );
        info!("settings.json updated in the store");
    });

    let token = provider.change_token();
    token.changed().await;
    info!(
        greeting = provider.get("greeting").as_deref().unwrap_or("<unset>"),
        log_level = provider.get("app:log_level").as_deref().unwrap_or("<unset>"),
        "configuration change observed"
    );

    // A suspend-prone host would call this before yielding control.
    provider
        .wait_for_reload_to_complete(Duration::from_secs(5))
        .await;
    provider.stop_auto_reload();

    Ok(())
}
