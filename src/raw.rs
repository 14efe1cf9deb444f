//! Raw value representations persisted by the backing store.

use crate::error::{Error, Result};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stream of byte chunks, the `Stream` raw representation.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>>>;

/// Which raw representation a store instance reads and writes.
///
/// Fixed once at construction; every backend call of a [`TypedKv`](crate::TypedKv)
/// uses the same type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawType {
    /// UTF-8 text
    #[default]
    Text,
    /// Binary buffer
    Binary,
    /// Stream of byte chunks
    Stream,
}

impl fmt::Display for RawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawType::Text => write!(f, "text"),
            RawType::Binary => write!(f, "binary"),
            RawType::Stream => write!(f, "stream"),
        }
    }
}

/// A value as the backing store sees it.
pub enum RawValue {
    Text(String),
    Binary(Vec<u8>),
    Stream(ByteStream),
}

impl RawValue {
    /// Build the raw value of the requested type from stored bytes.
    ///
    /// # Errors
    /// Returns `Error::DeserializationError` if `Text` is requested and the bytes
    /// are not valid UTF-8.
    pub fn from_bytes(bytes: Vec<u8>, raw_type: RawType) -> Result<Self> {
        match raw_type {
            RawType::Text => String::from_utf8(bytes).map(RawValue::Text).map_err(|e| {
                Error::DeserializationError(format!("Stored value is not valid UTF-8: {}", e))
            }),
            RawType::Binary => Ok(RawValue::Binary(bytes)),
            RawType::Stream => Ok(RawValue::stream_from_bytes(bytes)),
        }
    }

    /// Wrap a buffer as a single-chunk stream.
    pub fn stream_from_bytes(bytes: Vec<u8>) -> Self {
        RawValue::Stream(stream::iter(std::iter::once(Ok(bytes))).boxed())
    }

    /// The representation this value carries.
    pub fn raw_type(&self) -> RawType {
        match self {
            RawValue::Text(_) => RawType::Text,
            RawValue::Binary(_) => RawType::Binary,
            RawValue::Stream(_) => RawType::Stream,
        }
    }

    /// Collect the value into a byte buffer, draining a stream if necessary.
    ///
    /// # Errors
    /// Returns the first error yielded by the stream.
    pub async fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            RawValue::Text(text) => Ok(text.into_bytes()),
            RawValue::Binary(bytes) => Ok(bytes),
            RawValue::Stream(chunks) => chunks.try_concat().await,
        }
    }

    /// Collect the value into text.
    ///
    /// # Errors
    /// Returns `Error::DeserializationError` if the bytes are not valid UTF-8.
    pub async fn into_text(self) -> Result<String> {
        match self {
            RawValue::Text(text) => Ok(text),
            other => {
                let bytes = other.into_bytes().await?;
                String::from_utf8(bytes).map_err(|e| {
                    Error::DeserializationError(format!("Raw value is not valid UTF-8: {}", e))
                })
            }
        }
    }
}

impl fmt::Debug for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            RawValue::Binary(bytes) => f.debug_tuple("Binary").field(&bytes.len()).finish(),
            RawValue::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}
