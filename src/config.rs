//! Declarative store configuration.
//!
//! [`KvConfig`] carries the settings of a store that don't depend on its value,
//! metadata, or codec types, so it can be loaded from a config file:
//!
//! ```
//! use typed_kv::config::KvConfig;
//! use typed_kv::raw::RawType;
//!
//! let config: KvConfig = serde_json::from_str(
//!     r#"{ "prefix": "sessions", "key_separator": "/", "memcache": true }"#,
//! ).unwrap();
//!
//! assert_eq!(config.prefix.as_deref(), Some("sessions"));
//! assert_eq!(config.raw_type, None);
//! # let _ = RawType::Text;
//! ```
//!
//! Apply it with [`TypedKvBuilder::config`](crate::store::TypedKvBuilder::config).
//! Typed settings (codec, default value, default put metadata) are set on the
//! builder directly.

use crate::error::Result;
use crate::key::KeyNamespace;
use crate::options::{GetOptions, ListOptions};
use crate::raw::RawType;
use serde::{Deserialize, Serialize};

/// Settings shared by every store regardless of its type parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KvConfig {
    /// Namespace prepended to every key. `None` stores keys unchanged.
    pub prefix: Option<String>,

    /// Separator inserted between prefix and key. `None` concatenates directly.
    pub key_separator: Option<String>,

    /// Enable the in-process memory cache.
    pub memcache: bool,

    /// Raw representation. `None` uses the codec's preferred type.
    pub raw_type: Option<RawType>,

    pub default_get_options: GetOptions,

    pub default_list_options: ListOptions,
}

impl KvConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_key_separator(mut self, separator: impl Into<String>) -> Self {
        self.key_separator = Some(separator.into());
        self
    }

    pub fn with_memcache(mut self, enabled: bool) -> Self {
        self.memcache = enabled;
        self
    }

    pub fn with_raw_type(mut self, raw_type: RawType) -> Self {
        self.raw_type = Some(raw_type);
        self
    }

    /// Build the key namespace described by `prefix` and `key_separator`.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` for an empty separator.
    pub fn key_namespace(&self) -> Result<KeyNamespace> {
        let keys = KeyNamespace::new(self.prefix.clone().unwrap_or_default());
        match &self.key_separator {
            Some(separator) => keys.with_separator(separator.clone()),
            None => Ok(keys),
        }
    }
}
