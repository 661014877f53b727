//! # s3config
//!
//! Configuration source backed by a single S3 object, kept fresh via
//! periodic conditional re-fetching.
//!
//! This crate provides:
//! - A declarative [`S3ConfigurationSource`] descriptor (bucket, key,
//!   optional flag, reload interval, parser)
//! - The [`S3ConfigurationProvider`] state machine: fetch, conditional skip
//!   on an unchanged etag, parse, atomic snapshot swap, change notification
//! - A [`ReloadTrigger`] with a resettable one-shot delay schedule and a
//!   blocking-wait primitive for suspend-prone hosts
//! - The [`ObjectStore`] contract with S3 ([`S3ObjectStore`]) and in-memory
//!   ([`MemoryObjectStore`]) implementations
//! - The [`ObjectParser`] contract; concrete parsers live in
//!   `s3config-parsers`
//!
//! Reload failures never take down a running process: once an initial load
//! has succeeded, the last-known-good configuration remains authoritative
//! through any transport, credential, or parse failure.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use s3config::{ObjectParser, S3ConfigurationSource};
//! # struct MyParser;
//! # impl ObjectParser for MyParser {
//! #     fn parse(&self, _: &[u8]) -> Result<s3config::ConfigData, s3config::ParseError> {
//! #         Ok(s3config::ConfigData::new())
//! #     }
//! # }
//!
//! # async fn example() -> Result<(), s3config::S3ConfigError> {
//! let provider = S3ConfigurationSource::builder()
//!     .bucket("my-config-bucket")
//!     .key("app-settings.json")
//!     .reload_every(Duration::from_secs(30))
//!     .parser(MyParser)
//!     .build()?
//!     .load()
//!     .await?;
//!
//! let database_url = provider.get("database:url");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod parser;
pub mod provider;
pub mod s3;
pub mod source;
pub mod store;
pub mod trigger;

pub use error::{ParseError, S3ConfigError, S3ConfigResult, StoreError};
pub use parser::{ConfigData, ObjectParser};
pub use provider::{ChangeToken, ConfigSnapshot, S3ConfigurationProvider};
pub use s3::S3ObjectStore;
pub use source::{S3ConfigurationSource, S3ConfigurationSourceBuilder};
pub use store::{MemoryObjectStore, ObjectFetch, ObjectMetadata, ObjectStore};
pub use trigger::ReloadTrigger;
