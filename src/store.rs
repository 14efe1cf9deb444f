//! The typed KV façade.
//!
//! [`TypedKv`] wraps a [`KvBackend`] and exposes typed `get`/`put`/`delete`,
//! `get_with_metadata` and `list`. Every operation maps the logical key into
//! the instance namespace, merges per-call options over the instance defaults,
//! runs the value through the codec and, for reads, applies the default policy.
//!
//! # Memory cache
//!
//! With `memcache(true)` the instance remembers the last known state of each
//! logical key it touched:
//!
//! - `get` answers from the cache when the key's state is known, otherwise it
//!   reads the store and records the decoded result (present or absent);
//! - `put` records the value before writing to the store;
//! - `delete` records absence before deleting from the store.
//!
//! Failed store writes are not rolled back, so a failed `put` or `delete` can
//! leave the cache ahead of the store. Writes from other processes or other
//! instances are not seen. `get_with_metadata` and `list` always go to the store.

use crate::backend::{KvBackend, ListResult};
use crate::codec::{decode_optional, Codec, JsonCodec};
use crate::config::KvConfig;
use crate::default_value::{DefaultPolicy, NoDefault, WithDefault};
use crate::error::{Error, Result};
use crate::key::KeyNamespace;
use crate::memcache::MemCache;
use crate::observability::{KvMetrics, NoOpMetrics};
use crate::options::{GetOptions, ListOptions, PutOptions};
use crate::raw::RawType;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::time::Instant;

/// A read value together with the metadata stored alongside it.
///
/// `V` is the store's read type: `Option<T>` without a default, `T` with one.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueWithMetadata<V, M> {
    pub value: V,
    pub metadata: Option<M>,
    /// Store-specific cache status, passed through untouched.
    pub cache_status: Option<String>,
}

/// Typed view over a namespaced key-value store.
///
/// Type parameters:
/// - `B`: the backing store
/// - `T`: the value type
/// - `M`: the metadata type (`()` if unused)
/// - `C`: the codec, [`JsonCodec`] unless replaced
/// - `D`: the default policy, which decides whether reads return `Option<T>` or `T`
///
/// Instances are `Send + Sync` when their parameters are; share one behind an
/// `Arc` to share its memory cache.
///
/// # Example
///
/// ```
/// use typed_kv::{backend::InMemoryBackend, TypedKv};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// struct User { name: String }
///
/// # #[tokio::main]
/// # async fn main() -> typed_kv::Result<()> {
/// let users: TypedKv<InMemoryBackend, User> = TypedKv::builder(InMemoryBackend::new())
///     .prefix("users:")
///     .memcache(true)
///     .build()?;
///
/// users.put("1", User { name: "Ada".to_string() }).await?;
/// assert_eq!(users.get("1").await?, Some(User { name: "Ada".to_string() }));
/// assert_eq!(users.get("2").await?, None);
/// # Ok(())
/// # }
/// ```
pub struct TypedKv<B, T, M = (), C = JsonCodec, D = NoDefault> {
    backend: B,
    keys: KeyNamespace,
    codec: C,
    default: D,
    raw_type: RawType,
    cache: Option<MemCache<T>>,
    default_get_options: GetOptions,
    default_put_options: PutOptions<M>,
    default_list_options: ListOptions,
    metrics: Box<dyn KvMetrics>,
}

impl<B, T, M> TypedKv<B, T, M>
where
    B: KvBackend,
{
    /// Start building a store over `backend` with the JSON codec and no default.
    pub fn builder(backend: B) -> TypedKvBuilder<B, T, M> {
        TypedKvBuilder {
            backend,
            config: KvConfig::default(),
            codec: JsonCodec,
            default: NoDefault,
            default_put_options: PutOptions::default(),
            metrics: Box::new(NoOpMetrics),
            _value: PhantomData,
        }
    }
}

impl<B, T, M, C, D> TypedKv<B, T, M, C, D>
where
    B: KvBackend,
    T: Clone + Send + Sync,
    M: Serialize + DeserializeOwned + Clone + Send + Sync,
    C: Codec<T>,
    D: DefaultPolicy<T>,
{
    /// Read a value with the instance default get options.
    ///
    /// # Errors
    /// Returns `Err` if the store read fails or the stored value does not decode.
    pub async fn get(&self, key: &str) -> Result<D::Output> {
        self.get_with_options(key, &GetOptions::default()).await
    }

    /// Read a value; `options` fields that are set override the instance defaults.
    ///
    /// # Errors
    /// Returns `Err` if the store read fails or the stored value does not decode.
    /// Nothing is cached on error.
    pub async fn get_with_options(&self, key: &str, options: &GetOptions) -> Result<D::Output> {
        let start = Instant::now();

        if let Some(slot) = self.cache.as_ref().and_then(|cache| cache.lookup(key)) {
            self.metrics.record_memcache_hit(key);
            return Ok(self.default.resolve(slot.into_option()));
        }

        let physical = self.keys.to_physical(key);
        let options = self.default_get_options.merge(options);

        let raw = self
            .backend
            .get(&physical, &options, self.raw_type)
            .await
            .map_err(|e| self.report(key, e))?;
        let value = decode_optional(&self.codec, raw)
            .await
            .map_err(|e| self.report(key, e))?;

        self.record_read(key, value.is_some(), start);

        if let Some(cache) = &self.cache {
            cache.store(key, value.clone());
        }

        Ok(self.default.resolve(value))
    }

    /// Read a value and its metadata with the instance default get options.
    ///
    /// # Errors
    /// Returns `Err` if the store read fails, or the value or metadata does not decode.
    pub async fn get_with_metadata(&self, key: &str) -> Result<ValueWithMetadata<D::Output, M>> {
        self.get_with_metadata_options(key, &GetOptions::default())
            .await
    }

    /// Read a value and its metadata, bypassing the memory cache.
    ///
    /// The default policy applies to the value; metadata and cache status are
    /// returned as the store reported them.
    ///
    /// # Errors
    /// Returns `Err` if the store read fails, or the value or metadata does not decode.
    pub async fn get_with_metadata_options(
        &self,
        key: &str,
        options: &GetOptions,
    ) -> Result<ValueWithMetadata<D::Output, M>> {
        let start = Instant::now();
        let physical = self.keys.to_physical(key);
        let options = self.default_get_options.merge(options);

        let raw = self
            .backend
            .get_with_metadata::<M>(&physical, &options, self.raw_type)
            .await
            .map_err(|e| self.report(key, e))?;
        let value = decode_optional(&self.codec, raw.value)
            .await
            .map_err(|e| self.report(key, e))?;

        self.record_read(key, value.is_some(), start);

        Ok(ValueWithMetadata {
            value: self.default.resolve(value),
            metadata: raw.metadata,
            cache_status: raw.cache_status,
        })
    }

    /// Write a value with the instance default put options.
    ///
    /// # Errors
    /// Returns `Err` if encoding or the store write fails.
    pub async fn put(&self, key: &str, value: T) -> Result<()> {
        self.put_with_options(key, value, PutOptions::default())
            .await
    }

    /// Write a value; `options` fields that are set override the instance defaults.
    ///
    /// The value is encoded first, so an encoding failure leaves the memory cache
    /// untouched. The cache is updated before the store write and is not rolled
    /// back if that write fails.
    ///
    /// # Errors
    /// Returns `Err` if encoding or the store write fails.
    pub async fn put_with_options(
        &self,
        key: &str,
        value: T,
        options: PutOptions<M>,
    ) -> Result<()> {
        let start = Instant::now();
        let physical = self.keys.to_physical(key);
        let options = self.default_put_options.merge(options);

        let raw = self
            .codec
            .encode(&value, self.raw_type)
            .map_err(|e| self.report(key, e))?;

        if let Some(cache) = &self.cache {
            cache.mark_present(key, value);
        }

        self.backend
            .put(&physical, raw, &options)
            .await
            .map_err(|e| self.report(key, e))?;

        self.metrics.record_put(key, start.elapsed());
        Ok(())
    }

    /// Delete a key. Deleting a missing key is not an error.
    ///
    /// The memory cache records the key as absent before the store delete and
    /// is not rolled back if the delete fails.
    ///
    /// # Errors
    /// Returns `Err` if the store delete fails.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let start = Instant::now();
        let physical = self.keys.to_physical(key);

        if let Some(cache) = &self.cache {
            cache.mark_absent(key);
        }

        self.backend
            .delete(&physical)
            .await
            .map_err(|e| self.report(key, e))?;

        self.metrics.record_delete(key, start.elapsed());
        Ok(())
    }

    /// List keys in this namespace starting with `filter`.
    ///
    /// # Errors
    /// Returns `Err` if the store list fails or listed metadata does not decode.
    pub async fn list(&self, filter: &str) -> Result<ListResult<M>> {
        self.list_with_options(filter, &ListOptions::default())
            .await
    }

    /// List one page of keys in this namespace starting with `filter`.
    ///
    /// Returned names are logical keys. Expiration, metadata, completion flag and
    /// cursor are the store's. The memory cache is neither read nor populated.
    ///
    /// # Errors
    /// Returns `Err` if the store list fails or listed metadata does not decode.
    pub async fn list_with_options(
        &self,
        filter: &str,
        options: &ListOptions,
    ) -> Result<ListResult<M>> {
        let prefix = self.keys.list_prefix(filter);
        let options = self.default_list_options.merge(options);

        let mut result = self
            .backend
            .list::<M>(&prefix, &options)
            .await
            .map_err(|e| self.report(filter, e))?;

        for key in &mut result.keys {
            key.name = self.keys.to_logical(&key.name);
        }

        debug!(
            "✓ TypedKv LIST {:?} -> {} keys (complete: {})",
            filter,
            result.keys.len(),
            result.list_complete
        );

        Ok(result)
    }

    /// Check the backing store is reachable.
    ///
    /// # Errors
    /// Returns `Err` if the backend health check fails.
    pub async fn health_check(&self) -> Result<bool> {
        self.backend.health_check().await
    }

    /// The wrapped backing store.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Namespace mapping logical keys to store keys.
    pub fn key_namespace(&self) -> &KeyNamespace {
        &self.keys
    }

    /// Raw representation used for every store call.
    pub fn raw_type(&self) -> RawType {
        self.raw_type
    }

    /// Number of keys with a cached state; 0 when the memory cache is disabled.
    pub fn memcache_len(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.len())
    }

    fn record_read(&self, key: &str, found: bool, start: Instant) {
        if found {
            self.metrics.record_hit(key, start.elapsed());
        } else {
            self.metrics.record_miss(key, start.elapsed());
        }
    }

    fn report(&self, key: &str, error: Error) -> Error {
        warn!("✗ TypedKv operation failed for {}: {}", key, error);
        self.metrics.record_error(key, &error.to_string());
        error
    }
}

/// Builder for [`TypedKv`], created by [`TypedKv::builder`].
///
/// Settings without type parameters can also come from a [`KvConfig`].
pub struct TypedKvBuilder<B, T, M = (), C = JsonCodec, D = NoDefault> {
    backend: B,
    config: KvConfig,
    codec: C,
    default: D,
    default_put_options: PutOptions<M>,
    metrics: Box<dyn KvMetrics>,
    _value: PhantomData<fn() -> T>,
}

impl<B, T, M, C, D> TypedKvBuilder<B, T, M, C, D>
where
    B: KvBackend,
{
    /// Prefix prepended to every key.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = Some(prefix.into());
        self
    }

    /// Separator placed between a non-empty prefix and the key.
    pub fn key_separator(mut self, separator: impl Into<String>) -> Self {
        self.config.key_separator = Some(separator.into());
        self
    }

    pub fn memcache(mut self, enabled: bool) -> Self {
        self.config.memcache = enabled;
        self
    }

    /// Raw representation; must be supported by the codec.
    pub fn raw_type(mut self, raw_type: RawType) -> Self {
        self.config.raw_type = Some(raw_type);
        self
    }

    pub fn default_get_options(mut self, options: GetOptions) -> Self {
        self.config.default_get_options = options;
        self
    }

    pub fn default_put_options(mut self, options: PutOptions<M>) -> Self {
        self.default_put_options = options;
        self
    }

    pub fn default_list_options(mut self, options: ListOptions) -> Self {
        self.config.default_list_options = options;
        self
    }

    /// Replace every untyped setting with `config`.
    pub fn config(mut self, config: KvConfig) -> Self {
        self.config = config;
        self
    }

    pub fn metrics(mut self, metrics: Box<dyn KvMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Use `codec` instead of JSON.
    pub fn codec<C2>(self, codec: C2) -> TypedKvBuilder<B, T, M, C2, D> {
        TypedKvBuilder {
            backend: self.backend,
            config: self.config,
            codec,
            default: self.default,
            default_put_options: self.default_put_options,
            metrics: self.metrics,
            _value: PhantomData,
        }
    }

    /// Return `value` for absent keys; reads then yield `T` instead of `Option<T>`.
    pub fn default_value(self, value: T) -> TypedKvBuilder<B, T, M, C, WithDefault<T>> {
        self.with_default(WithDefault::value(value))
    }

    /// Call `factory` for every absent key read; results are not reused.
    pub fn default_with<F>(self, factory: F) -> TypedKvBuilder<B, T, M, C, WithDefault<T>>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.with_default(WithDefault::factory(factory))
    }

    fn with_default(self, default: WithDefault<T>) -> TypedKvBuilder<B, T, M, C, WithDefault<T>> {
        TypedKvBuilder {
            backend: self.backend,
            config: self.config,
            codec: self.codec,
            default,
            default_put_options: self.default_put_options,
            metrics: self.metrics,
            _value: PhantomData,
        }
    }

    /// Validate the configuration and build the store.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if the key separator is empty or the codec
    /// does not support the configured raw type.
    pub fn build(self) -> Result<TypedKv<B, T, M, C, D>>
    where
        T: Clone,
        C: Codec<T>,
        D: DefaultPolicy<T>,
    {
        let keys = self.config.key_namespace()?;

        let raw_type = match self.config.raw_type {
            Some(raw_type) if !self.codec.supports(raw_type) => {
                return Err(Error::ConfigError(format!(
                    "codec does not support raw type {}",
                    raw_type
                )));
            }
            Some(raw_type) => raw_type,
            None => self.codec.preferred_raw_type(),
        };

        let cache = self.config.memcache.then(MemCache::new);

        info!(
            "✓ TypedKv initialized (prefix: {:?}, raw type: {}, memcache: {})",
            keys.prefix(),
            raw_type,
            cache.is_some()
        );

        Ok(TypedKv {
            backend: self.backend,
            keys,
            codec: self.codec,
            default: self.default,
            raw_type,
            cache,
            default_get_options: self.config.default_get_options,
            default_put_options: self.default_put_options,
            default_list_options: self.config.default_list_options,
            metrics: self.metrics,
        })
    }
}
