//! Metrics hooks for store operations.
//!
//! Implement [`KvMetrics`] to feed operation counts and timings into your
//! monitoring system:
//!
//! ```ignore
//! use typed_kv::observability::KvMetrics;
//! use std::time::Duration;
//!
//! struct PrometheusMetrics;
//!
//! impl KvMetrics for PrometheusMetrics {
//!     fn record_hit(&self, _key: &str, _duration: Duration) {
//!         // counter!("kv_hits").inc();
//!     }
//!     // ... implement other methods
//! }
//!
//! // let kv = TypedKv::builder(backend)
//! //     .metrics(Box::new(PrometheusMetrics))
//! //     .build()?;
//! ```
//!
//! Methods not overridden log through the `log` crate. The store installs
//! [`NoOpMetrics`] unless told otherwise.
//!
//! All hooks receive the logical key.

use std::time::Duration;

/// Trait for store metrics collection.
pub trait KvMetrics: Send + Sync {
    /// A store read found a value. Memory cache hits go to `record_memcache_hit`.
    fn record_hit(&self, key: &str, duration: Duration) {
        debug!("KV HIT: {} took {:?}", key, duration);
    }

    /// A read found no stored value.
    fn record_miss(&self, key: &str, duration: Duration) {
        debug!("KV MISS: {} took {:?}", key, duration);
    }

    /// A `get` was answered from the memory cache without a store call.
    fn record_memcache_hit(&self, key: &str) {
        debug!("KV MEMCACHE HIT: {}", key);
    }

    /// Record a put operation.
    fn record_put(&self, key: &str, duration: Duration) {
        debug!("KV PUT: {} took {:?}", key, duration);
    }

    /// Record a delete operation.
    fn record_delete(&self, key: &str, duration: Duration) {
        debug!("KV DELETE: {} took {:?}", key, duration);
    }

    /// Record an error.
    fn record_error(&self, key: &str, error: &str) {
        warn!("KV ERROR for {}: {}", key, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl KvMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {}
    fn record_miss(&self, _key: &str, _duration: Duration) {}
    fn record_memcache_hit(&self, _key: &str) {}
    fn record_put(&self, _key: &str, _duration: Duration) {}
    fn record_delete(&self, _key: &str, _duration: Duration) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Metrics sink that only logs, using the trait's default methods.
#[derive(Clone, Default)]
pub struct LogMetrics;

impl KvMetrics for LogMetrics {}
