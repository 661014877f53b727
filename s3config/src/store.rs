//! Object store abstraction used by the provider for conditional fetches.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::StoreError;

/// Metadata returned by a lightweight existence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Opaque cache validator for the object's current version. Equality
    /// implies the content is unchanged.
    pub etag: String,
}

/// Result of a (possibly conditional) object fetch.
#[derive(Debug, Clone)]
pub enum ObjectFetch {
    /// The supplied validator still matches; no payload was transferred.
    NotModified,
    /// New content, together with its validator.
    Fetched { bytes: Vec<u8>, etag: String },
}

/// Conditional access to a named object in a named bucket.
///
/// `head` exists so revalidation can skip downloading a payload that is only
/// going to be discarded; `get` additionally accepts a validator to not match
/// for stores that support conditional GET. Implementations signal
/// "unchanged" through [`ObjectFetch::NotModified`] rather than an error.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Cheap metadata check for the object's current validator.
    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, StoreError>;

    /// Fetch the object, short-circuiting to [`ObjectFetch::NotModified`]
    /// when `if_none_match` equals the object's current validator.
    async fn get(
        &self,
        bucket: &str,
        key: &str,
        if_none_match: Option<&str>,
    ) -> Result<ObjectFetch, StoreError>;
}

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    version: u64,
}

impl StoredObject {
    fn etag(&self) -> String {
        self.version.to_string()
    }
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    objects: HashMap<(String, String), StoredObject>,
    offline: bool,
}

/// In-memory [`ObjectStore`] for tests and local development.
///
/// Each `put` bumps a per-object version counter that doubles as the etag.
/// Toggling `set_offline(true)` makes every call fail with a transport
/// error, which is how reload-failure behavior is exercised without a
/// network.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or replace an object, bumping its version.
    pub fn put(&self, bucket: &str, key: &str, bytes: impl Into<Vec<u8>>) {
        let mut inner = self.inner.write();
        let entry = inner
            .objects
            .entry((bucket.to_string(), key.to_string()))
            .or_insert(StoredObject {
                bytes: Vec::new(),
                version: 0,
            });
        entry.bytes = bytes.into();
        entry.version += 1;
    }

    pub fn remove(&self, bucket: &str, key: &str) {
        self.inner
            .write()
            .objects
            .remove(&(bucket.to_string(), key.to_string()));
    }

    /// While offline, every call fails with [`StoreError::Transport`].
    pub fn set_offline(&self, offline: bool) {
        self.inner.write().offline = offline;
    }

    /// Current etag of an object, if present. Test helper.
    pub fn etag_of(&self, bucket: &str, key: &str) -> Option<String> {
        self.inner
            .read()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(StoredObject::etag)
    }

    fn lookup(&self, bucket: &str, key: &str) -> Result<StoredObject, StoreError> {
        let inner = self.inner.read();
        if inner.offline {
            return Err(StoreError::Transport {
                reason: "memory store is offline".to_string(),
            });
        }
        inner
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, StoreError> {
        let object = self.lookup(bucket, key)?;
        Ok(ObjectMetadata {
            etag: object.etag(),
        })
    }

    async fn get(
        &self,
        bucket: &str,
        key: &str,
        if_none_match: Option<&str>,
    ) -> Result<ObjectFetch, StoreError> {
        let object = self.lookup(bucket, key)?;
        if if_none_match == Some(object.etag().as_str()) {
            return Ok(ObjectFetch::NotModified);
        }
        Ok(ObjectFetch::Fetched {
            etag: object.etag(),
            bytes: object.bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_bumps_the_etag() {
        let store = MemoryObjectStore::new();
        store.put("cfg", "app.json", b"one".to_vec());
        let first = store.head("cfg", "app.json").await.unwrap().etag;
        store.put("cfg", "app.json", b"two".to_vec());
        let second = store.head("cfg", "app.json").await.unwrap().etag;
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn get_honors_if_none_match() {
        let store = MemoryObjectStore::new();
        store.put("cfg", "app.json", b"payload".to_vec());
        let etag = store.etag_of("cfg", "app.json").unwrap();

        let unconditional = store.get("cfg", "app.json", None).await.unwrap();
        assert!(matches!(unconditional, ObjectFetch::Fetched { .. }));

        let conditional = store.get("cfg", "app.json", Some(&etag)).await.unwrap();
        assert!(matches!(conditional, ObjectFetch::NotModified));
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let store = MemoryObjectStore::new();
        let err = store.head("cfg", "absent.json").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn offline_store_fails_with_transport_error() {
        let store = MemoryObjectStore::new();
        store.put("cfg", "app.json", b"payload".to_vec());
        store.set_offline(true);
        let err = store.get("cfg", "app.json", None).await.unwrap_err();
        assert!(matches!(err, StoreError::Transport { .. }));

        store.set_offline(false);
        assert!(store.get("cfg", "app.json", None).await.is_ok());
    }
}
