//! Codecs converting typed values to and from raw store values.
//!
//! A [`Codec`] owns both directions of the conversion. The façade never hands an
//! absent value to a codec: a missing key short-circuits to `None` in
//! [`decode_optional`] before any decoder runs.
//!
//! # Provided codecs
//!
//! | Codec | Raw types | Format |
//! |-------|-----------|--------|
//! | [`JsonCodec`] (default) | text, binary, stream | `serde_json` |
//! | [`FnCodec`] | text | caller-supplied functions |
//! | [`PostcardCodec`] | binary, stream | postcard in a versioned envelope |
//!
//! # Example
//!
//! ```
//! use typed_kv::codec::{Codec, JsonCodec};
//! use typed_kv::raw::RawType;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User { name: String }
//!
//! # #[tokio::main]
//! # async fn main() -> typed_kv::Result<()> {
//! let codec = JsonCodec;
//! let user = User { name: "Alice".to_string() };
//!
//! let raw = Codec::<User>::encode(&codec, &user, RawType::Text)?;
//! let decoded: User = codec.decode(raw).await?;
//! assert_eq!(user, decoded);
//! # Ok(())
//! # }
//! ```

mod envelope;

pub use self::envelope::{
    deserialize_envelope, serialize_envelope, Envelope, PostcardCodec, CURRENT_SCHEMA_VERSION,
    ENTRY_MAGIC,
};

use crate::error::{Error, Result};
use crate::raw::{RawType, RawValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Conversion between a typed value and its raw representation.
///
/// **ASYNC:** `decode` is async so stream-backed values can be drained without blocking.
#[allow(async_fn_in_trait)]
pub trait Codec<T>: Send + Sync {
    /// Whether this codec can produce and read the given raw representation.
    ///
    /// Checked once when the store is built; a mismatch is a configuration error.
    fn supports(&self, raw_type: RawType) -> bool;

    /// Raw representation used when the store configuration does not name one.
    fn preferred_raw_type(&self) -> RawType {
        RawType::Text
    }

    /// Encode a value into the given raw representation.
    ///
    /// # Errors
    /// Returns `Error::SerializationError` if the value cannot be encoded.
    fn encode(&self, value: &T, raw_type: RawType) -> Result<RawValue>;

    /// Decode a present raw value.
    ///
    /// # Errors
    /// Returns `Error::DeserializationError` (or an envelope error) if the raw
    /// content does not match this codec's format.
    async fn decode(&self, raw: RawValue) -> Result<T>;
}

/// Decode a possibly absent raw value; absence never reaches the codec.
///
/// # Errors
/// Propagates the codec's decode error.
pub async fn decode_optional<T, C: Codec<T>>(codec: &C, raw: Option<RawValue>) -> Result<Option<T>> {
    match raw {
        Some(raw) => codec.decode(raw).await.map(Some),
        None => Ok(None),
    }
}

// ============================================================================
// JSON codec
// ============================================================================

/// Structural JSON codec built on `serde_json`.
///
/// Text values hold the JSON document; binary and stream values hold its UTF-8 bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl<T> Codec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn supports(&self, _raw_type: RawType) -> bool {
        true
    }

    fn encode(&self, value: &T, raw_type: RawType) -> Result<RawValue> {
        let encoded = match raw_type {
            RawType::Text => serde_json::to_string(value).map(RawValue::Text),
            RawType::Binary => serde_json::to_vec(value).map(RawValue::Binary),
            RawType::Stream => serde_json::to_vec(value).map(RawValue::stream_from_bytes),
        };
        encoded.map_err(|e| {
            log::error!("JSON encoding failed: {}", e);
            Error::SerializationError(e.to_string())
        })
    }

    async fn decode(&self, raw: RawValue) -> Result<T> {
        let decoded = match raw {
            RawValue::Text(text) => serde_json::from_str(&text),
            RawValue::Binary(bytes) => serde_json::from_slice(&bytes),
            stream @ RawValue::Stream(_) => serde_json::from_slice(&stream.into_bytes().await?),
        };
        decoded.map_err(|e| {
            log::warn!("JSON decoding failed: {}", e);
            Error::DeserializationError(e.to_string())
        })
    }
}

// ============================================================================
// Function codec
// ============================================================================

type SerializeFn<T> = dyn Fn(&T) -> Result<String> + Send + Sync;
type DeserializeFn<T> = dyn Fn(&str) -> Result<T> + Send + Sync;

/// Text codec backed by caller-supplied functions.
///
/// Use it when the stored text is not what `serde_json` would produce for `T`,
/// for example a legacy format or a JSON dialect with tagged dates.
///
/// ```
/// use typed_kv::codec::FnCodec;
///
/// // Store integers as hexadecimal text
/// let codec = FnCodec::new(
///     |v: &u32| Ok(format!("{:x}", v)),
///     |s: &str| u32::from_str_radix(s, 16).map_err(|e| typed_kv::Error::DeserializationError(e.to_string())),
/// );
/// # let _ = codec;
/// ```
pub struct FnCodec<T> {
    serialize: Arc<SerializeFn<T>>,
    deserialize: Arc<DeserializeFn<T>>,
}

impl<T> FnCodec<T> {
    pub fn new<S, D>(serialize: S, deserialize: D) -> Self
    where
        S: Fn(&T) -> Result<String> + Send + Sync + 'static,
        D: Fn(&str) -> Result<T> + Send + Sync + 'static,
    {
        FnCodec {
            serialize: Arc::new(serialize),
            deserialize: Arc::new(deserialize),
        }
    }
}

impl<T> Clone for FnCodec<T> {
    fn clone(&self) -> Self {
        FnCodec {
            serialize: Arc::clone(&self.serialize),
            deserialize: Arc::clone(&self.deserialize),
        }
    }
}

impl<T> fmt::Debug for FnCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnCodec")
    }
}

impl<T: Send + Sync> Codec<T> for FnCodec<T> {
    fn supports(&self, raw_type: RawType) -> bool {
        raw_type == RawType::Text
    }

    fn encode(&self, value: &T, raw_type: RawType) -> Result<RawValue> {
        if raw_type != RawType::Text {
            return Err(Error::SerializationError(format!(
                "FnCodec only produces text, {} requested",
                raw_type
            )));
        }
        (self.serialize)(value).map(RawValue::Text)
    }

    async fn decode(&self, raw: RawValue) -> Result<T> {
        let text = raw.into_text().await?;
        (self.deserialize)(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
    struct TestValue {
        name: Option<String>,
        age: Option<u32>,
    }

    fn sample() -> TestValue {
        TestValue {
            name: Some("x".to_string()),
            age: Some(1),
        }
    }

    #[tokio::test]
    async fn test_json_text_roundtrip() {
        let raw = Codec::<TestValue>::encode(&JsonCodec, &sample(), RawType::Text)
            .expect("Failed to encode");
        match &raw {
            RawValue::Text(text) => assert_eq!(text, r#"{"name":"x","age":1}"#),
            other => panic!("Expected text, got {:?}", other),
        }
        let decoded: TestValue = JsonCodec.decode(raw).await.expect("Failed to decode");
        assert_eq!(decoded, sample());
    }

    #[tokio::test]
    async fn test_json_binary_and_stream_roundtrip() {
        for raw_type in [RawType::Binary, RawType::Stream] {
            let raw = Codec::<TestValue>::encode(&JsonCodec, &sample(), raw_type)
                .expect("Failed to encode");
            assert_eq!(raw.raw_type(), raw_type);
            let decoded: TestValue = JsonCodec.decode(raw).await.expect("Failed to decode");
            assert_eq!(decoded, sample());
        }
    }

    #[tokio::test]
    async fn test_json_malformed_is_deserialization_error() {
        let result: Result<TestValue> = JsonCodec
            .decode(RawValue::Text("{\"name\":".to_string()))
            .await;
        assert!(matches!(result, Err(Error::DeserializationError(_))));
    }

    #[tokio::test]
    async fn test_json_wrong_shape_is_deserialization_error() {
        let result: Result<TestValue> = JsonCodec
            .decode(RawValue::Text("[1,2,3]".to_string()))
            .await;
        assert!(matches!(result, Err(Error::DeserializationError(_))));
    }

    #[tokio::test]
    async fn test_decode_optional_short_circuits() {
        let codec = FnCodec::new(
            |_: &TestValue| Ok(String::new()),
            |_: &str| -> Result<TestValue> { panic!("decoder must not run for absent values") },
        );
        let decoded = decode_optional(&codec, None).await.expect("Absent is not an error");
        assert!(decoded.is_none());
    }

    #[tokio::test]
    async fn test_fn_codec_roundtrip() {
        let codec = FnCodec::new(
            |v: &u32| Ok(format!("{:x}", v)),
            |s: &str| {
                u32::from_str_radix(s, 16).map_err(|e| Error::DeserializationError(e.to_string()))
            },
        );
        let raw = codec.encode(&255, RawType::Text).expect("Failed to encode");
        assert!(matches!(&raw, RawValue::Text(t) if t == "ff"));
        assert_eq!(codec.decode(raw).await.expect("Failed to decode"), 255);
    }

    #[test]
    fn test_fn_codec_supports_text_only() {
        let codec = FnCodec::new(|v: &u32| Ok(v.to_string()), |s: &str| Ok(s.len() as u32));
        assert!(codec.supports(RawType::Text));
        assert!(!codec.supports(RawType::Binary));
        assert!(!codec.supports(RawType::Stream));
        assert!(matches!(
            codec.encode(&1, RawType::Binary),
            Err(Error::SerializationError(_))
        ));
    }
}
