//! Redis KV backend implementation.
//!
//! Each key is a Redis hash with two fields: `v` holds the value bytes and
//! `m` holds the JSON-encoded metadata (absent when none was given).

use super::{KvBackend, ListKey, ListResult, RawWithMetadata};
use crate::error::{Error, Result};
use crate::options::{GetOptions, ListOptions, PutOptions};
use crate::raw::{RawType, RawValue};
use deadpool_redis::{redis, Config as PoolConfig, Connection, Pool, Runtime};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Pool statistics information.
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub connections: u32,
    pub idle_connections: u32,
}

/// Default Redis connection pool size.
/// Override with REDIS_POOL_SIZE environment variable
const DEFAULT_POOL_SIZE: u32 = 16;

/// Page size used when a list call doesn't set a limit.
const DEFAULT_LIST_LIMIT: usize = 1000;

/// COUNT hint for each SCAN round trip.
const SCAN_BATCH: usize = 500;

const VALUE_FIELD: &str = "v";
const METADATA_FIELD: &str = "m";

/// Configuration for Redis backend.
#[derive(Clone, Debug)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: u32,
    pub pool_size: u32,
    pub connection_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        RedisConfig {
            host: "localhost".to_string(),
            port: 6379,
            username: None,
            password: None,
            database: 0,
            pool_size: DEFAULT_POOL_SIZE,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisConfig {
    /// Build Redis connection string.
    pub fn connection_string(&self) -> String {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => format!(
                "redis://{}:{}@{}:{}/{}",
                username, password, self.host, self.port, self.database
            ),
            (None, Some(password)) => format!(
                "redis://default:{}@{}:{}/{}",
                password, self.host, self.port, self.database
            ),
            _ => format!("redis://{}:{}/{}", self.host, self.port, self.database),
        }
    }
}

/// Escape glob metacharacters so a key prefix matches literally in `SCAN MATCH`.
fn scan_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

fn decode_metadata<M: DeserializeOwned>(key: &str, metadata: Option<String>) -> Result<Option<M>> {
    metadata
        .map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(|e| {
            Error::DeserializationError(format!("Invalid metadata for key {}: {}", key, e))
        })
}

/// Redis backend with connection pooling and async operations.
///
/// Uses deadpool for efficient async resource management and pooling.
/// `list` walks the whole `SCAN` result for the prefix and pages it in
/// lexicographic order, so cursors are key names and survive restarts.
///
/// # Example
///
/// ```no_run
/// # use typed_kv::backend::{RedisBackend, RedisConfig, KvBackend};
/// # use typed_kv::options::{GetOptions, PutOptions};
/// # use typed_kv::raw::{RawType, RawValue};
/// # use typed_kv::error::Result;
/// # async fn example() -> Result<()> {
/// let backend = RedisBackend::new(RedisConfig::default()).await?;
///
/// backend
///     .put("key", RawValue::Text("value".to_string()), &PutOptions::<()>::default())
///     .await?;
/// let value = backend.get("key", &GetOptions::default(), RawType::Text).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisBackend {
    pool: Pool,
}

impl RedisBackend {
    /// Create new Redis backend from configuration.
    ///
    /// # Errors
    /// Returns `Err` if pool creation fails.
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let pool = Self::create_pool(&config.connection_string(), config.pool_size)?;

        info!(
            "✓ Redis backend initialized: {}:{}",
            config.host, config.port
        );

        Ok(RedisBackend { pool })
    }

    /// Create from connection string directly.
    ///
    /// Pool size is determined by:
    /// 1. `REDIS_POOL_SIZE` environment variable (if set)
    /// 2. `DEFAULT_POOL_SIZE` constant (16)
    ///
    /// # Errors
    /// Returns `Err` if pool creation fails.
    pub async fn from_connection_string(conn_str: &str) -> Result<Self> {
        let pool_size = std::env::var("REDIS_POOL_SIZE")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_POOL_SIZE);

        let pool = Self::create_pool(conn_str, pool_size)?;

        info!(
            "✓ Redis backend initialized from connection string (pool size: {})",
            pool_size
        );

        Ok(RedisBackend { pool })
    }

    fn create_pool(conn_str: &str, pool_size: u32) -> Result<Pool> {
        let mut cfg = PoolConfig::from_url(conn_str);
        cfg.pool = Some(deadpool_redis::PoolConfig::new(pool_size as usize));

        cfg.create_pool(Some(Runtime::Tokio1))
            .map_err(|e| Error::BackendError(format!("Failed to create Redis pool: {}", e)))
    }

    /// Get current pool statistics.
    pub fn pool_stats(&self) -> PoolStats {
        let status = self.pool.status();
        PoolStats {
            connections: status.size as u32,
            idle_connections: status.available as u32,
        }
    }

    async fn connection(&self) -> Result<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| Error::BackendError(format!("Failed to get Redis connection: {}", e)))
    }

    /// Every key under `prefix`, sorted.
    async fn scan_prefix(&self, conn: &mut Connection, prefix: &str) -> Result<Vec<String>> {
        let pattern = scan_pattern(prefix);
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut **conn)
                .await
                .map_err(|e| Error::BackendError(format!("Redis SCAN failed: {}", e)))?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}

impl KvBackend for RedisBackend {
    async fn get(
        &self,
        key: &str,
        _options: &GetOptions,
        raw_type: RawType,
    ) -> Result<Option<RawValue>> {
        let mut conn = self.connection().await?;

        let value: Option<Vec<u8>> = redis::cmd("HGET")
            .arg(key)
            .arg(VALUE_FIELD)
            .query_async(&mut *conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis HGET failed for key {}: {}", key, e)))?;

        match value {
            Some(bytes) => {
                debug!("✓ Redis GET {} -> HIT", key);
                RawValue::from_bytes(bytes, raw_type).map(Some)
            }
            None => {
                debug!("✓ Redis GET {} -> MISS", key);
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
        let mut conn = self.connection().await?;

        let (value, metadata): (Option<Vec<u8>>, Option<String>) = redis::cmd("HMGET")
            .arg(key)
            .arg(VALUE_FIELD)
            .arg(METADATA_FIELD)
            .query_async(&mut *conn)
            .await
            .map_err(|e| {
                Error::BackendError(format!("Redis HMGET failed for key {}: {}", key, e))
            })?;

        let Some(bytes) = value else {
            debug!("✓ Redis GET_WITH_METADATA {} -> MISS", key);
            return Ok(RawWithMetadata::absent());
        };

        debug!("✓ Redis GET_WITH_METADATA {} -> HIT", key);
        Ok(RawWithMetadata {
            value: Some(RawValue::from_bytes(bytes, raw_type)?),
            metadata: decode_metadata(key, metadata)?,
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
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| {
                Error::SerializationError(format!("Invalid metadata for key {}: {}", key, e))
            })?;
        let bytes = value.into_bytes().await?;

        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.cmd("DEL").arg(key).ignore();
        pipe.cmd("HSET").arg(key).arg(VALUE_FIELD).arg(bytes).ignore();
        if let Some(json) = &metadata {
            pipe.cmd("HSET").arg(key).arg(METADATA_FIELD).arg(json).ignore();
        }

        let expires_at = options.expires_at();
        if let Some(exp) = expires_at {
            let millis = exp
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0);
            pipe.cmd("PEXPIREAT").arg(key).arg(millis).ignore();
        }

        let mut conn = self.connection().await?;
        pipe.query_async::<()>(&mut *conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis PUT failed for key {}: {}", key, e)))?;

        match expires_at {
            Some(exp) => debug!("✓ Redis PUT {} (expires: {:?})", key, exp),
            None => debug!("✓ Redis PUT {}", key),
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;

        redis::cmd("DEL")
            .arg(key)
            .query_async::<()>(&mut *conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis DEL failed for key {}: {}", key, e)))?;

        debug!("✓ Redis DELETE {}", key);
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

        let mut conn = self.connection().await?;
        let mut names = self.scan_prefix(&mut conn, prefix).await?;

        if let Some(cursor) = &options.cursor {
            names.retain(|name| name.as_str() > cursor.as_str());
        }
        let list_complete = names.len() <= limit;
        names.truncate(limit);

        let cursor = if list_complete {
            None
        } else {
            names.last().cloned()
        };

        let mut keys = Vec::with_capacity(names.len());
        if !names.is_empty() {
            let mut meta_pipe = redis::pipe();
            let mut ttl_pipe = redis::pipe();
            for name in &names {
                meta_pipe.cmd("HGET").arg(name).arg(METADATA_FIELD);
                ttl_pipe.cmd("PTTL").arg(name);
            }

            let metadata: Vec<Option<String>> = meta_pipe
                .query_async(&mut *conn)
                .await
                .map_err(|e| Error::BackendError(format!("Redis LIST metadata failed: {}", e)))?;
            let ttls: Vec<i64> = ttl_pipe
                .query_async(&mut *conn)
                .await
                .map_err(|e| Error::BackendError(format!("Redis LIST ttl failed: {}", e)))?;

            let now = SystemTime::now();
            for ((name, metadata), ttl) in names.into_iter().zip(metadata).zip(ttls) {
                // PTTL is negative for keys without expiry (-1) or gone (-2)
                let expiration = (ttl > 0)
                    .then(|| now + Duration::from_millis(ttl as u64))
                    .and_then(|exp| exp.duration_since(UNIX_EPOCH).ok())
                    .map(|d| d.as_secs());
                let metadata = decode_metadata(&name, metadata)?;
                keys.push(ListKey {
                    name,
                    expiration,
                    metadata,
                });
            }
        }

        debug!(
            "✓ Redis LIST {}* -> {} keys (complete: {})",
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
        let mut conn = self.connection().await?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis PING failed: {}", e)))?;

        Ok(pong.contains("PONG"))
    }
}
