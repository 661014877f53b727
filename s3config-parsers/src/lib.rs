//! # s3config-parsers
//!
//! Concrete [`ObjectParser`](s3config::ObjectParser) implementations for
//! JSON, TOML, and YAML configuration objects.
//!
//! All three flatten nested structure into the `section:key` convention
//! consumed by flat key/value configuration systems: object/table members
//! are joined with `:`, array elements are addressed by index
//! (`servers:0:host`), and scalars are rendered as strings.

pub mod json;
pub mod toml;
pub mod yaml;

pub use json::JsonObjectParser;
pub use toml::TomlObjectParser;
pub use yaml::YamlObjectParser;

use std::time::Duration;

use s3config::{S3ConfigurationSource, S3ConfigurationSourceBuilder};

/// Hierarchy delimiter in flattened keys.
pub const KEY_DELIMITER: &str = ":";

pub(crate) fn join_key(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}{KEY_DELIMITER}{segment}")
    }
}

/// Start a source builder for a JSON object in S3, preconfigured with
/// [`JsonObjectParser`].
///
/// ```rust,no_run
/// # async fn example() -> Result<(), s3config::S3ConfigError> {
/// use s3config_parsers::json_source;
///
/// let provider = json_source("my-config-bucket", "app-settings.json")?
///     .load()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub fn json_source(
    bucket: impl Into<String>,
    key: impl Into<String>,
) -> Result<S3ConfigurationSource, s3config::S3ConfigError> {
    json_source_builder(bucket, key).build()
}

/// Builder variant of [`json_source`] for callers that still need to set
/// `optional`, the reload interval, or a custom store.
pub fn json_source_builder(
    bucket: impl Into<String>,
    key: impl Into<String>,
) -> S3ConfigurationSourceBuilder {
    S3ConfigurationSource::builder()
        .bucket(bucket)
        .key(key)
        .parser(JsonObjectParser)
}

/// Shorthand for a JSON source reloaded at `interval`.
pub fn json_source_with_reload(
    bucket: impl Into<String>,
    key: impl Into<String>,
    interval: Duration,
) -> S3ConfigurationSourceBuilder {
    json_source_builder(bucket, key).reload_every(interval)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_key_without_prefix() {
        assert_eq!(join_key("", "database"), "database");
    }

    #[test]
    fn join_key_nests_with_delimiter() {
        assert_eq!(join_key("database", "url"), "database:url");
        assert_eq!(join_key("a:b", "c"), "a:b:c");
    }
}
