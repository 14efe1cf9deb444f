//! Postcard binary codec with versioned envelopes.
//!
//! For values that JSON cannot express faithfully (non-string map keys, exact
//! binary payloads), entries are stored as compact postcard bytes wrapped in an
//! envelope:
//!
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────┐
//! │  MAGIC (4 bytes)│VERSION (varint) │POSTCARD PAYLOAD (N bytes)│
//! └─────────────────┴─────────────────┴──────────────────────────┘
//!   "TYKV"              u32                postcard::to_allocvec(T)
//! ```
//!
//! - **Validated:** Magic and version checked on every decode
//! - **Versioned:** Schema changes surface as `Error::VersionMismatch`, not silent misreads
//! - **Deterministic:** Same value always produces identical bytes

use super::Codec;
use crate::error::{Error, Result};
use crate::raw::{RawType, RawValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Magic header for typed-kv binary entries: b"TYKV"
pub const ENTRY_MAGIC: [u8; 4] = *b"TYKV";

/// Current schema version.
///
/// Increment when making breaking changes to stored types (fields added, removed,
/// reordered, or retyped). Older entries then fail to decode with
/// `Error::VersionMismatch` instead of decoding into the wrong shape.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Versioned envelope for binary entries.
///
/// ```rust
/// use typed_kv::codec::Envelope;
///
/// let envelope = Envelope::new("data");
/// assert_eq!(envelope.magic, *b"TYKV");
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    /// Magic header: must be b"TYKV"
    pub magic: [u8; 4],
    /// Schema version: must match the codec's version
    pub version: u32,
    /// The stored value
    pub payload: T,
}

impl<T> Envelope<T> {
    /// Create a new envelope with current magic and version.
    pub fn new(payload: T) -> Self {
        Self::with_version(payload, CURRENT_SCHEMA_VERSION)
    }

    pub fn with_version(payload: T, version: u32) -> Self {
        Self {
            magic: ENTRY_MAGIC,
            version,
            payload,
        }
    }
}

/// Serialize a value inside an envelope.
///
/// # Errors
///
/// Returns `Error::SerializationError` if postcard serialization fails.
pub fn serialize_envelope<T: Serialize>(value: &T, version: u32) -> Result<Vec<u8>> {
    let envelope = Envelope::with_version(value, version);
    postcard::to_allocvec(&envelope).map_err(|e| {
        log::error!("Envelope serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Deserialize a value from an envelope, checking magic then version.
///
/// # Errors
///
/// - `Error::DeserializationError`: Corrupted postcard bytes
/// - `Error::InvalidEntry`: Invalid magic header
/// - `Error::VersionMismatch`: Schema version mismatch
pub fn deserialize_envelope<T: DeserializeOwned>(bytes: &[u8], version: u32) -> Result<T> {
    let envelope: Envelope<T> = postcard::from_bytes(bytes).map_err(|e| {
        log::error!("Envelope deserialization failed: {}", e);
        Error::DeserializationError(e.to_string())
    })?;

    if envelope.magic != ENTRY_MAGIC {
        log::warn!(
            "Invalid entry: expected magic {:?}, got {:?}",
            ENTRY_MAGIC,
            envelope.magic
        );
        return Err(Error::InvalidEntry(format!(
            "Invalid magic: expected {:?}, got {:?}",
            ENTRY_MAGIC, envelope.magic
        )));
    }

    if envelope.version != version {
        log::warn!(
            "Entry version mismatch: expected {}, got {}",
            version,
            envelope.version
        );
        return Err(Error::VersionMismatch {
            expected: version,
            found: envelope.version,
        });
    }

    Ok(envelope.payload)
}

/// Binary codec storing postcard-encoded values in versioned envelopes.
#[derive(Clone, Copy, Debug)]
pub struct PostcardCodec {
    version: u32,
}

impl PostcardCodec {
    pub fn new() -> Self {
        PostcardCodec {
            version: CURRENT_SCHEMA_VERSION,
        }
    }

    /// Codec writing and accepting a specific schema version.
    pub fn with_version(version: u32) -> Self {
        PostcardCodec { version }
    }

    pub fn version(&self) -> u32 {
        self.version
    }
}

impl Default for PostcardCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Codec<T> for PostcardCodec
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn supports(&self, raw_type: RawType) -> bool {
        matches!(raw_type, RawType::Binary | RawType::Stream)
    }

    fn preferred_raw_type(&self) -> RawType {
        RawType::Binary
    }

    fn encode(&self, value: &T, raw_type: RawType) -> Result<RawValue> {
        let bytes = serialize_envelope(value, self.version)?;
        match raw_type {
            RawType::Binary => Ok(RawValue::Binary(bytes)),
            RawType::Stream => Ok(RawValue::stream_from_bytes(bytes)),
            RawType::Text => Err(Error::SerializationError(
                "PostcardCodec cannot produce text values".to_string(),
            )),
        }
    }

    async fn decode(&self, raw: RawValue) -> Result<T> {
        let bytes = raw.into_bytes().await?;
        deserialize_envelope(&bytes, self.version)
    }
}
