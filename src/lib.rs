//! # typed-kv
//!
//! A typed façade over namespaced key-value stores.
//!
//! ## Features
//!
//! - **Typed:** values go through a [`Codec`](codec::Codec) (JSON by default) on every read and write
//! - **Namespaced:** an instance prefix isolates one store's keys from another's
//! - **Backend Agnostic:** in-memory, Redis, or any type implementing [`KvBackend`]
//! - **Defaults in the type:** with a default value, reads return `T` instead of `Option<T>`
//! - **Memory cache:** optional per-instance cache of decoded values
//! - **Production Ready:** built-in logging, metrics hooks, and error handling
//!
//! ## Quick Start
//!
//! ```
//! use typed_kv::{backend::InMemoryBackend, TypedKv};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
//! struct Settings {
//!     theme: Option<String>,
//!     font_size: Option<u32>,
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> typed_kv::Result<()> {
//! let settings: TypedKv<InMemoryBackend, Settings> = TypedKv::builder(InMemoryBackend::new())
//!     .prefix("settings:")
//!     .memcache(true)
//!     .build()?;
//!
//! settings
//!     .put("alice", Settings { theme: Some("dark".to_string()), font_size: None })
//!     .await?;
//!
//! let loaded = settings.get("alice").await?;
//! assert_eq!(loaded.and_then(|s| s.theme).as_deref(), Some("dark"));
//!
//! let listed = settings.list("").await?;
//! assert_eq!(listed.names(), vec!["alice"]);
//! # Ok(())
//! # }
//! ```
//!
//! ### Defaults
//!
//! ```
//! use typed_kv::{backend::InMemoryBackend, codec::JsonCodec, default_value::WithDefault, TypedKv};
//!
//! # #[tokio::main]
//! # async fn main() -> typed_kv::Result<()> {
//! let counters: TypedKv<InMemoryBackend, u64, (), JsonCodec, WithDefault<u64>> =
//!     TypedKv::builder(InMemoryBackend::new())
//!         .default_value(0)
//!         .build()?;
//!
//! let hits: u64 = counters.get("page").await?;
//! assert_eq!(hits, 0);
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod codec;
pub mod config;
pub mod default_value;
pub mod error;
pub mod key;
pub mod memcache;
pub mod observability;
pub mod options;
pub mod raw;
pub mod store;

// Re-exports for convenience
pub use backend::KvBackend;
pub use config::KvConfig;
pub use error::{Error, Result};
pub use options::{GetOptions, ListOptions, PutOptions};
pub use raw::{RawType, RawValue};
pub use store::{TypedKv, TypedKvBuilder, ValueWithMetadata};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
