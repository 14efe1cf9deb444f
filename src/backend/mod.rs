//! Backing store implementations.

use crate::error::Result;
use crate::options::{GetOptions, ListOptions, PutOptions};
use crate::raw::{RawType, RawValue};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod inmemory;
#[cfg(feature = "redis")]
pub mod redis;

pub use inmemory::InMemoryBackend;
#[cfg(feature = "redis")]
pub use redis::{PoolStats, RedisBackend, RedisConfig};

/// Raw value plus metadata, as returned by [`KvBackend::get_with_metadata`].
#[derive(Debug)]
pub struct RawWithMetadata<M> {
    pub value: Option<RawValue>,
    pub metadata: Option<M>,
    /// Store-specific cache status, passed through untouched.
    pub cache_status: Option<String>,
}

impl<M> RawWithMetadata<M> {
    pub fn absent() -> Self {
        RawWithMetadata {
            value: None,
            metadata: None,
            cache_status: None,
        }
    }
}

/// One key of a list page.
#[derive(Clone, Debug, PartialEq)]
pub struct ListKey<M> {
    pub name: String,
    /// Absolute expiration, seconds since the Unix epoch.
    pub expiration: Option<u64>,
    pub metadata: Option<M>,
}

impl<M> ListKey<M> {
    pub fn new(name: impl Into<String>) -> Self {
        ListKey {
            name: name.into(),
            expiration: None,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: M) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// One page of a list call.
#[derive(Clone, Debug, PartialEq)]
pub struct ListResult<M> {
    pub keys: Vec<ListKey<M>>,
    /// True if no further pages exist.
    pub list_complete: bool,
    /// Cursor for the next page when `list_complete` is false.
    pub cursor: Option<String>,
}

impl<M> ListResult<M> {
    pub fn names(&self) -> Vec<&str> {
        self.keys.iter().map(|k| k.name.as_str()).collect()
    }
}

/// Trait for namespaced key-value stores.
///
/// Abstracts the store the façade wraps, allowing swappable backends.
/// Implementations: InMemory (default), Redis, or any cloud KV service.
///
/// Keys passed in are physical keys: prefixing happens in the façade.
/// Metadata is serialized and deserialized by the backend itself.
///
/// **IMPORTANT:** All methods use `&self` instead of `&mut self` to allow concurrent access.
/// Backend implementations should use interior mutability or external storage.
///
/// **ASYNC:** All methods are async and must be awaited.
#[allow(async_fn_in_trait)]
pub trait KvBackend: Send + Sync + Clone {
    /// Retrieve a value by key in the requested raw representation.
    ///
    /// # Returns
    /// - `Ok(Some(raw))` - Value found
    /// - `Ok(None)` - Key not found (or expired)
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs (connection lost, etc.)
    async fn get(
        &self,
        key: &str,
        options: &GetOptions,
        raw_type: RawType,
    ) -> Result<Option<RawValue>>;

    /// Retrieve a value together with its metadata.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs or stored metadata does not
    /// deserialize into `M`.
    async fn get_with_metadata<M: DeserializeOwned>(
        &self,
        key: &str,
        options: &GetOptions,
        raw_type: RawType,
    ) -> Result<RawWithMetadata<M>>;

    /// Store a value with optional expiration and metadata.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn put<M: Serialize + Sync>(
        &self,
        key: &str,
        value: RawValue,
        options: &PutOptions<M>,
    ) -> Result<()>;

    /// Remove a value. Removing a missing key is not an error.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn delete(&self, key: &str) -> Result<()>;

    /// List keys starting with `prefix`, one page at a time.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs or the cursor is invalid
    async fn list<M: DeserializeOwned>(
        &self,
        prefix: &str,
        options: &ListOptions,
    ) -> Result<ListResult<M>>;

    /// Health check - verify backend is accessible.
    ///
    /// # Errors
    /// Returns `Err` if backend is not accessible
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_backend_health_check_default() {
        let backend = InMemoryBackend::new();
        assert!(backend
            .health_check()
            .await
            .expect("Failed to check health"));
    }

    #[test]
    fn test_list_result_names() {
        let result: ListResult<()> = ListResult {
            keys: vec![ListKey::new("a"), ListKey::new("b")],
            list_complete: true,
            cursor: None,
        };
        assert_eq!(result.names(), vec!["a", "b"]);
    }
}
