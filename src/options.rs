//! Per-operation options passed through to the backing store.
//!
//! Each store instance carries a default set of options for every operation kind.
//! Per-call options are merged over those defaults: a field the caller sets wins,
//! a field the caller leaves `None` falls back to the instance default.
//!
//! ```
//! use typed_kv::options::PutOptions;
//! use std::time::{Duration, SystemTime, UNIX_EPOCH};
//!
//! let defaults: PutOptions<()> = PutOptions::default().with_expiration_ttl(Duration::from_secs(3600));
//! let call = PutOptions::default().with_expiration_ttl(Duration::from_secs(60));
//!
//! let merged = defaults.merge(call);
//! assert_eq!(merged.expiration_ttl, Some(Duration::from_secs(60)));
//! ```

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Options for `get` and `get_with_metadata`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetOptions {
    /// How long the store's edge cache may keep the value (store-defined semantics).
    pub cache_ttl: Option<Duration>,
}

impl GetOptions {
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Merge `overrides` over `self`.
    pub fn merge(&self, overrides: &GetOptions) -> GetOptions {
        GetOptions {
            cache_ttl: overrides.cache_ttl.or(self.cache_ttl),
        }
    }
}

/// Options for `put`.
///
/// Metadata is kept as its own field; it is handed to the store untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct PutOptions<M> {
    /// Absolute expiration, seconds since the Unix epoch.
    pub expiration: Option<u64>,

    /// Relative expiration from the time of the write.
    pub expiration_ttl: Option<Duration>,

    /// Metadata stored alongside the value.
    pub metadata: Option<M>,
}

impl<M> Default for PutOptions<M> {
    fn default() -> Self {
        PutOptions {
            expiration: None,
            expiration_ttl: None,
            metadata: None,
        }
    }
}

impl<M> PutOptions<M> {
    pub fn with_expiration(mut self, unix_seconds: u64) -> Self {
        self.expiration = Some(unix_seconds);
        self
    }

    pub fn with_expiration_ttl(mut self, ttl: Duration) -> Self {
        self.expiration_ttl = Some(ttl);
        self
    }

    pub fn with_metadata(mut self, metadata: M) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Deadline implied by `expiration` and `expiration_ttl`; the earlier wins.
    pub fn expires_at(&self) -> Option<SystemTime> {
        let absolute = self
            .expiration
            .map(|secs| UNIX_EPOCH + Duration::from_secs(secs));
        let relative = self.expiration_ttl.map(|ttl| SystemTime::now() + ttl);

        match (absolute, relative) {
            (Some(a), Some(r)) => Some(a.min(r)),
            (a, r) => a.or(r),
        }
    }
}

impl<M: Clone> PutOptions<M> {
    /// Merge `overrides` over `self`.
    pub fn merge(&self, overrides: PutOptions<M>) -> PutOptions<M> {
        PutOptions {
            expiration: overrides.expiration.or(self.expiration),
            expiration_ttl: overrides.expiration_ttl.or(self.expiration_ttl),
            metadata: overrides.metadata.or_else(|| self.metadata.clone()),
        }
    }
}

/// Options for `list`.
///
/// The key prefix is not an option: it is always derived from the instance
/// prefix and the filter passed to `list`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListOptions {
    /// Maximum number of keys per page.
    pub limit: Option<usize>,

    /// Cursor returned by a previous, incomplete page.
    pub cursor: Option<String>,
}

impl ListOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    /// Merge `overrides` over `self`.
    pub fn merge(&self, overrides: &ListOptions) -> ListOptions {
        ListOptions {
            limit: overrides.limit.or(self.limit),
            cursor: overrides.cursor.clone().or_else(|| self.cursor.clone()),
        }
    }
}
