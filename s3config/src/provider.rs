//! Configuration provider: fetch, conditional-skip, parse, atomic swap,
//! change notification.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::S3ConfigResult;
use crate::parser::{ConfigData, ObjectParser};
use crate::store::{ObjectFetch, ObjectStore};
use crate::trigger::ReloadTrigger;

/// The provider's published state: data and its cache validator, replaced
/// together in a single swap and never mutated in place.
#[derive(Debug, Default)]
pub struct ConfigSnapshot {
    pub data: ConfigData,
    pub etag: String,
}

/// One-shot change subscription handle.
///
/// `changed()` consumes the token; to observe further changes a consumer
/// obtains a fresh token from
/// [`S3ConfigurationProvider::change_token`]. This is the re-armable reload
/// token pattern, not a persistent listener list.
pub struct ChangeToken {
    version: watch::Receiver<u64>,
}

impl ChangeToken {
    /// Resolves the next time the provider publishes new data (or when the
    /// provider is dropped).
    pub async fn changed(mut self) {
        let _ = self.version.changed().await;
    }
}

/// Loads a configuration object from the backing store and keeps it fresh
/// via conditional re-fetching.
///
/// Reload outcomes: unchanged validator is a no-op, new content is parsed
/// and swapped in with exactly one change notification, and any reload
/// failure leaves the last-known-good snapshot authoritative.
pub struct S3ConfigurationProvider {
    bucket: String,
    key: String,
    optional: bool,
    store: Arc<dyn ObjectStore>,
    parser: Arc<dyn ObjectParser>,
    snapshot: RwLock<Arc<ConfigSnapshot>>,
    version: watch::Sender<u64>,
    // Serializes timer-driven and externally-driven reloads; overlapping
    // fetches for the same object would reorder notifications.
    in_flight: tokio::sync::Mutex<()>,
    trigger: Option<ReloadTrigger>,
}

impl std::fmt::Debug for S3ConfigurationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ConfigurationProvider")
            .field("bucket", &self.bucket)
            .field("key", &self.key)
            .field("optional", &self.optional)
            .finish_non_exhaustive()
    }
}

impl S3ConfigurationProvider {
    pub(crate) fn new(
        bucket: String,
        key: String,
        optional: bool,
        store: Arc<dyn ObjectStore>,
        parser: Arc<dyn ObjectParser>,
        trigger: Option<ReloadTrigger>,
    ) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            bucket,
            key,
            optional,
            store,
            parser,
            snapshot: RwLock::new(Arc::new(ConfigSnapshot::default())),
            version,
            in_flight: tokio::sync::Mutex::new(()),
            trigger,
        }
    }

    /// Initial load. Downloads unconditionally, parses, publishes, and fires
    /// one change notification. For an optional source any failure settles
    /// the provider on an empty mapping instead of propagating.
    pub async fn load(&self) -> S3ConfigResult<()> {
        let _flight = self.in_flight.lock().await;
        match self.fetch_and_publish(None).await {
            Ok(_) => Ok(()),
            Err(err) if self.optional => {
                warn!(
                    bucket = %self.bucket,
                    key = %self.key,
                    error = %err,
                    "optional configuration source failed to load; starting empty"
                );
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Background reload. Never fails: errors are logged and the previous
    /// snapshot stays in effect.
    pub async fn reload(&self) {
        if let Err(err) = self.try_reload().await {
            warn!(
                bucket = %self.bucket,
                key = %self.key,
                error = %err,
                "configuration reload failed; keeping previous data"
            );
        }
    }

    async fn try_reload(&self) -> S3ConfigResult<()> {
        let _flight = self.in_flight.lock().await;
        let previous = self.current();

        // Etag comparison against a HEAD response avoids downloading a
        // payload that would only be discarded.
        let metadata = self.store.head(&self.bucket, &self.key).await?;
        if !previous.etag.is_empty() && metadata.etag == previous.etag {
            debug!(
                bucket = %self.bucket,
                key = %self.key,
                etag = %previous.etag,
                "configuration unchanged"
            );
            return Ok(());
        }

        let validator = (!previous.etag.is_empty()).then_some(previous.etag.as_str());
        self.fetch_and_publish(validator).await?;
        Ok(())
    }

    /// Conditional fetch, parse, and single-swap publish. Returns whether
    /// new data was published.
    async fn fetch_and_publish(&self, if_none_match: Option<&str>) -> S3ConfigResult<bool> {
        match self
            .store
            .get(&self.bucket, &self.key, if_none_match)
            .await?
        {
            // The object raced back to the known version between the HEAD
            // check and the GET. Not an error.
            ObjectFetch::NotModified => Ok(false),
            ObjectFetch::Fetched { bytes, etag } => {
                let data = self.parser.parse(&bytes)?;
                let keys = data.len();
                self.publish(data, etag.clone());
                info!(
                    bucket = %self.bucket,
                    key = %self.key,
                    etag = %etag,
                    keys,
                    "configuration loaded"
                );
                Ok(true)
            }
        }
    }

    fn publish(&self, data: ConfigData, etag: String) {
        *self.snapshot.write() = Arc::new(ConfigSnapshot { data, etag });
        self.version.send_modify(|v| *v += 1);
    }

    fn current(&self) -> Arc<ConfigSnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// Value for a single key in the current snapshot.
    pub fn get(&self, key: &str) -> Option<String> {
        self.current().data.get(key).cloned()
    }

    /// The current snapshot; data and etag are always consistent with each
    /// other.
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.current()
    }

    pub fn data(&self) -> ConfigData {
        self.current().data.clone()
    }

    pub fn etag(&self) -> String {
        self.current().etag.clone()
    }

    /// A fresh one-shot token that resolves on the next published change.
    pub fn change_token(&self) -> ChangeToken {
        ChangeToken {
            version: self.version.subscribe(),
        }
    }

    pub(crate) fn trigger(&self) -> Option<&ReloadTrigger> {
        self.trigger.as_ref()
    }

    /// Block until any in-flight periodic reload completes, or `timeout`
    /// elapses. Immediate `true` when no reload is running (or no periodic
    /// reload is configured). Intended for suspend-prone hosts such as
    /// Lambda functions.
    pub async fn wait_for_reload_to_complete(&self, timeout: Duration) -> bool {
        match &self.trigger {
            Some(trigger) => trigger.block_until_idle(timeout).await,
            None => true,
        }
    }

    /// Stop the periodic schedule. Does not abort an in-flight reload.
    pub fn stop_auto_reload(&self) {
        if let Some(trigger) = &self.trigger {
            trigger.stop();
        }
    }
}
