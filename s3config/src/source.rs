//! Declarative source descriptor and provider construction.

use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tracing::info;

use crate::error::{S3ConfigError, S3ConfigResult};
use crate::parser::ObjectParser;
use crate::provider::S3ConfigurationProvider;
use crate::s3::S3ObjectStore;
use crate::store::ObjectStore;
use crate::trigger::ReloadTrigger;

/// Immutable descriptor for one configuration object: which bucket and key
/// to read, whether its absence is fatal, how often to re-check, and how to
/// parse it. The sole input needed to construct a provider/trigger pair.
pub struct S3ConfigurationSource {
    bucket: String,
    key: String,
    optional: bool,
    reload_interval: Option<Duration>,
    parser: Arc<dyn ObjectParser>,
    store: Option<Arc<dyn ObjectStore>>,
}

impl std::fmt::Debug for S3ConfigurationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ConfigurationSource")
            .field("bucket", &self.bucket)
            .field("key", &self.key)
            .field("optional", &self.optional)
            .field("reload_interval", &self.reload_interval)
            .finish_non_exhaustive()
    }
}

impl S3ConfigurationSource {
    pub fn builder() -> S3ConfigurationSourceBuilder {
        S3ConfigurationSourceBuilder::default()
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn optional(&self) -> bool {
        self.optional
    }

    pub fn reload_interval(&self) -> Option<Duration> {
        self.reload_interval
    }

    /// Build the provider, perform the initial load, and start the periodic
    /// reload schedule when an interval is configured.
    ///
    /// Initial-load failures propagate unless the source is optional.
    /// When no store was supplied explicitly, an S3 client is constructed
    /// from the ambient AWS environment.
    pub async fn load(self) -> S3ConfigResult<Arc<S3ConfigurationProvider>> {
        let store: Arc<dyn ObjectStore> = match self.store {
            Some(store) => store,
            None => Arc::new(S3ObjectStore::from_env().await),
        };

        let trigger = self.reload_interval.map(ReloadTrigger::new);
        let provider = Arc::new(S3ConfigurationProvider::new(
            self.bucket,
            self.key,
            self.optional,
            store,
            self.parser,
            trigger,
        ));

        provider.load().await?;

        if let Some(trigger) = provider.trigger() {
            // Weak reference: the trigger task must not keep a dropped
            // provider alive.
            let weak = Arc::downgrade(&provider);
            trigger.on_triggered(move || {
                let weak = weak.clone();
                async move {
                    if let Some(provider) = weak.upgrade() {
                        provider.reload().await;
                    }
                }
                .boxed()
            });
            trigger.start();
            info!(
                interval_secs = trigger.interval().as_secs_f64(),
                "periodic configuration reload started"
            );
        }

        Ok(provider)
    }
}

/// Builder for [`S3ConfigurationSource`].
#[derive(Default)]
pub struct S3ConfigurationSourceBuilder {
    bucket: Option<String>,
    key: Option<String>,
    optional: bool,
    reload_interval: Option<Duration>,
    parser: Option<Arc<dyn ObjectParser>>,
    store: Option<Arc<dyn ObjectStore>>,
}

impl S3ConfigurationSourceBuilder {
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Whether a fetch failure at initial load is tolerated. Defaults to
    /// `false` (mandatory).
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Re-check the object at this interval. Absence disables periodic
    /// reload.
    pub fn reload_every(mut self, interval: Duration) -> Self {
        self.reload_interval = Some(interval);
        self
    }

    pub fn parser(mut self, parser: impl ObjectParser + 'static) -> Self {
        self.parser = Some(Arc::new(parser));
        self
    }

    /// Override the backing store. Without this the source talks to S3 via
    /// the ambient AWS environment.
    pub fn store(mut self, store: impl ObjectStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Validate the descriptor. Missing bucket, key, or parser is a
    /// construction-time error and never swallowed, regardless of
    /// `optional`.
    pub fn build(self) -> S3ConfigResult<S3ConfigurationSource> {
        let bucket = self
            .bucket
            .filter(|b| !b.is_empty())
            .ok_or_else(|| S3ConfigError::configuration("bucket must be set"))?;
        let key = self
            .key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| S3ConfigError::configuration("key must be set"))?;
        let parser = self
            .parser
            .ok_or_else(|| S3ConfigError::configuration("parser must be set"))?;

        Ok(S3ConfigurationSource {
            bucket,
            key,
            optional: self.optional,
            reload_interval: self.reload_interval,
            parser,
            store: self.store,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::parser::ConfigData;

    struct NoopParser;

    impl ObjectParser for NoopParser {
        fn parse(&self, _bytes: &[u8]) -> Result<ConfigData, ParseError> {
            Ok(ConfigData::new())
        }
    }

    #[test]
    fn build_requires_bucket() {
        let err = S3ConfigurationSource::builder()
            .key("app.json")
            .parser(NoopParser)
            .build()
            .unwrap_err();
        assert!(matches!(err, S3ConfigError::Configuration { .. }));
    }

    #[test]
    fn build_requires_key() {
        let err = S3ConfigurationSource::builder()
            .bucket("cfg")
            .parser(NoopParser)
            .build()
            .unwrap_err();
        assert!(matches!(err, S3ConfigError::Configuration { .. }));
    }

    #[test]
    fn build_requires_parser() {
        let err = S3ConfigurationSource::builder()
            .bucket("cfg")
            .key("app.json")
            .build()
            .unwrap_err();
        assert!(matches!(err, S3ConfigError::Configuration { .. }));
    }

    #[test]
    fn build_rejects_empty_bucket() {
        let err = S3ConfigurationSource::builder()
            .bucket("")
            .key("app.json")
            .parser(NoopParser)
            .build()
            .unwrap_err();
        assert!(matches!(err, S3ConfigError::Configuration { .. }));
    }

    #[test]
    fn descriptor_defaults() {
        let source = S3ConfigurationSource::builder()
            .bucket("cfg")
            .key("app.json")
            .parser(NoopParser)
            .build()
            .unwrap();
        assert_eq!(source.bucket(), "cfg");
        assert_eq!(source.key(), "app.json");
        assert!(!source.optional());
        assert!(source.reload_interval().is_none());
    }
}
