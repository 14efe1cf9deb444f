//! Error types for the typed KV façade.

use std::fmt;

/// Result type for KV operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the typed KV façade.
///
/// All operations return `Result<T>` where `Result` is defined as `std::result::Result<T, Error>`.
/// Different error variants represent different failure modes:
#[derive(Debug, Clone)]
pub enum Error {
    /// Encoding a typed value into its raw representation failed.
    ///
    /// Common causes:
    /// - Value contains types the codec cannot express (e.g. non-string map keys in JSON)
    /// - A custom serialize function returned an error
    ///
    /// Raised before anything is written, so neither the store nor the memory cache changes.
    SerializationError(String),

    /// Decoding a raw value into the typed value failed.
    ///
    /// This indicates the stored content does not match the active codec.
    /// Common causes:
    /// - Invalid JSON text
    /// - Value written by another codec or another schema
    /// - Text requested but the stored bytes are not valid UTF-8
    ///
    /// **Recovery:** Not cached. A later read retries against the store.
    DeserializationError(String),

    /// Backing store error (network, storage, protocol).
    ///
    /// Propagated verbatim; the façade performs no retry. Memory cache updates
    /// already applied by `put` / `delete` are not rolled back.
    BackendError(String),

    /// Invalid construction-time configuration.
    ///
    /// Common causes:
    /// - Codec does not support the configured raw representation
    /// - Empty key separator
    ///
    /// **Recovery:** Fix configuration and rebuild the store.
    ConfigError(String),

    /// Feature not implemented or not enabled.
    NotImplemented(String),

    /// Invalid binary entry: corrupted envelope or bad magic.
    ///
    /// Returned by the postcard codec when the magic header is not `b"TYKV"`.
    InvalidEntry(String),

    /// Schema version mismatch between code and stored data.
    VersionMismatch {
        /// Expected schema version (from compiled code)
        expected: u32,
        /// Found schema version (from stored entry)
        found: u32,
    },

    /// Generic error with custom message.
    Other(String),
}

impl Error {
    /// True for failures caused by stored content that the codec cannot read.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Error::DeserializationError(_) | Error::InvalidEntry(_) | Error::VersionMismatch { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::NotImplemented(msg) => write!(f, "Not implemented: {}", msg),
            Error::InvalidEntry(msg) => write!(f, "Invalid entry: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Entry version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::BackendError(e.to_string())
        } else if e.is_syntax() || e.is_eof() || e.is_data() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<postcard::Error> for Error {
    fn from(e: postcard::Error) -> Self {
        Error::DeserializationError(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::BackendError(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::BackendError(format!("Redis error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ConfigError("empty separator".to_string());
        assert_eq!(err.to_string(), "Config error: empty separator");
    }

    #[test]
    fn test_error_from_string() {
        let err: Error = "test error".into();
        assert!(matches!(err, Error::Other(_)));
    }

    #[test]
    fn test_json_syntax_error_is_decode() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json")
            .expect_err("Invalid JSON must fail");
        let err: Error = json_err.into();
        assert!(matches!(err, Error::DeserializationError(_)));
        assert!(err.is_decode());
    }

    #[test]
    fn test_backend_error_is_not_decode() {
        assert!(!Error::BackendError("down".to_string()).is_decode());
        assert!(Error::VersionMismatch {
            expected: 1,
            found: 2
        }
        .is_decode());
    }
}
