//! In-memory KV backend (default, thread-safe, async).
//!
//! Uses DashMap for lock-free concurrent access with per-key sharding.
//! Expired entries are dropped lazily on access.

use super::{KvBackend, ListKey, ListResult, RawWithMetadata};
use crate::error::{Error, Result};
use crate::options::{GetOptions, ListOptions, PutOptions};
use crate::raw::{RawType, RawValue};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Page size used when a list call doesn't set a limit.
pub const DEFAULT_LIST_LIMIT: usize = 1000;

/// Stored entry: raw bytes, JSON metadata, optional expiration.
#[derive(Clone)]
struct StoredEntry {
    data: Vec<u8>,
    metadata: Option<serde_json::Value>,
    expires_at: Option<SystemTime>,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| SystemTime::now() >= exp)
    }

    fn expiration_secs(&self) -> Option<u64> {
        self.expires_at
            .and_then(|exp| exp.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
    }
}

fn decode_metadata<M: DeserializeOwned>(
    key: &str,
    metadata: Option<serde_json::Value>,
) -> Result<Option<M>> {
    metadata
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| {
            Error::DeserializationError(format!("Invalid metadata for key {}: {}", key, e))
        })
}

/// Thread-safe async in-memory KV backend.
///
/// Values are kept as bytes and converted to the requested raw type on read,
/// metadata as `serde_json::Value`. `list` returns keys in lexicographic order;
/// the cursor is the last key name of the previous page.
///
/// # Example
///
/// ```no_run
/// use typed_kv::backend::{InMemoryBackend, KvBackend};
/// use typed_kv::options::{GetOptions, PutOptions};
/// use typed_kv::raw::{RawType, RawValue};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryBackend::new();
///
///     backend
///         .put("key1", RawValue::Text("value".to_string()), &PutOptions::<()>::default())
///         .await?;
///
///     let value = backend.get("key1", &GetOptions::default(), RawType::Text).await?;
///     assert!(value.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, StoredEntry>>,
}

impl InMemoryBackend {
    /// Create a new in-memory backend.
    pub fn new() -> Self {
        InMemoryBackend {
            store: Arc::new(DashMap::new()),
        }
    }

    /// Get the current number of entries, expired ones included until touched.
    pub async fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Remove every entry.
    pub async fn clear_all(&self) -> Result<()> {
        self.store.clear();
        warn!("⚠ InMemory CLEAR_ALL executed - all entries removed!");
        Ok(())
    }

    /// Live entry for `key`; drops it if expired.
    fn live_entry(&self, key: &str) -> Option<StoredEntry> {
        if let Some(entry) = self.store.get(key) {
            if !entry.is_expired() {
                return Some(entry.clone());
            }
        }
        self.store.remove_if(key, |_, entry| entry.is_expired());
        None
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl KvBackend for InMemoryBackend {
    async fn get(
        &self,
        key: &str,
        _options: &GetOptions,
        raw_type: RawType,
    ) -> Result<Option<RawValue>> {
        match self.live_entry(key) {
            Some(entry) => {
                debug!("✓ InMemory GET {} -> HIT", key);
                RawValue::from_bytes(entry.data, raw_type).map(Some)
            }
            None => {
                debug!("✓ InMemory GET {} -> MISS", key);
                Ok(None)
            }
        }
    }

    async fn get_with_metadata<M: DeserializeOwned>(
        &self,
        key: &str,
        _options: &GetOptions,
        raw_type: RawType,
    ) -> Result<RawWithMetadata<M>> {
        let Some(entry) = self.live_entry(key) else {
            debug!("✓ InMemory GET_WITH_METADATA {} -> MISS", key);
            return Ok(RawWithMetadata::absent());
        };

        debug!("✓ InMemory GET_WITH_METADATA {} -> HIT", key);
        Ok(RawWithMetadata {
            value: Some(RawValue::from_bytes(entry.data, raw_type)?),
            metadata: decode_metadata(key, entry.metadata)?,
            cache_status: None,
        })
    }

    async fn put<M: Serialize + Sync>(
        &self,
        key: &str,
        value: RawValue,
        options: &PutOptions<M>,
    ) -> Result<()> {
        let metadata = options
            .metadata
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| {
                Error::SerializationError(format!("Invalid metadata for key {}: {}", key, e))
            })?;
        let expires_at = options.expires_at();

        let entry = StoredEntry {
            data: value.into_bytes().await?,
            metadata,
            expires_at,
        };
        self.store.insert(key.to_string(), entry);

        match expires_at {
            Some(exp) => debug!("✓ InMemory PUT {} (expires: {:?})", key, exp),
            None => debug!("✓ InMemory PUT {}", key),
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.remove(key);
        debug!("✓ InMemory DELETE {}", key);
        Ok(())
    }

    async fn list<M: DeserializeOwned>(
        &self,
        prefix: &str,
        options: &ListOptions,
    ) -> Result<ListResult<M>> {
        let limit = options.limit.unwrap_or(DEFAULT_LIST_LIMIT);
        if limit == 0 {
            return Err(Error::BackendError(
                "list limit must be greater than zero".to_string(),
            ));
        }

        let mut matching: Vec<(String, StoredEntry)> = self
            .store
            .iter()
            .filter(|entry| entry.key().starts_with(prefix) && !entry.value().is_expired())
            .filter(|entry| match &options.cursor {
                Some(cursor) => entry.key().as_str() > cursor.as_str(),
                None => true,
            })
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        matching.sort_by(|a, b| a.0.cmp(&b.0));

        let list_complete = matching.len() <= limit;
        matching.truncate(limit);

        let cursor = if list_complete {
            None
        } else {
            matching.last().map(|(name, _)| name.clone())
        };

        let mut keys = Vec::with_capacity(matching.len());
        for (name, entry) in matching {
            let expiration = entry.expiration_secs();
            let metadata = decode_metadata(&name, entry.metadata)?;
            keys.push(ListKey {
                name,
                expiration,
                metadata,
            });
        }

        debug!(
            "✓ InMemory LIST {}* -> {} keys (complete: {})",
            prefix,
            keys.len(),
            list_complete
        );

        Ok(ListResult {
            keys,
            list_complete,
            cursor,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        // In-memory backend is always healthy
        Ok(true)
    }
}
