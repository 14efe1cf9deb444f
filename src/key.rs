//! Key namespacing: logical (caller) keys to physical (store) keys and back.

use crate::error::{Error, Result};

/// Maps caller-visible keys into a store namespace.
///
/// The physical key is `prefix + separator + key` when a separator is configured
/// and the prefix is non-empty, otherwise `prefix + key`. No escaping is done:
/// keys and prefixes share one flat namespace, so keeping prefixes unambiguous
/// is the caller's job.
///
/// ```
/// use typed_kv::key::KeyNamespace;
///
/// let keys = KeyNamespace::new("users").with_separator("/").unwrap();
/// assert_eq!(keys.to_physical("42"), "users/42");
/// assert_eq!(keys.to_logical("users/42"), "42");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyNamespace {
    prefix: String,
    separator: Option<String>,
    // prefix + separator, computed once
    effective: String,
}

impl KeyNamespace {
    /// Namespace with plain prefix concatenation.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        KeyNamespace {
            effective: prefix.clone(),
            prefix,
            separator: None,
        }
    }

    /// Namespace without a prefix; keys pass through unchanged.
    pub fn none() -> Self {
        Self::default()
    }

    /// Insert `separator` between prefix and key.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if the separator is empty.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Result<Self> {
        let separator = separator.into();
        if separator.is_empty() {
            return Err(Error::ConfigError(
                "key separator must not be empty".to_string(),
            ));
        }
        self.effective = if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}{}", self.prefix, separator)
        };
        self.separator = Some(separator);
        Ok(self)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn separator(&self) -> Option<&str> {
        self.separator.as_deref()
    }

    /// True if keys are stored unchanged.
    pub fn is_identity(&self) -> bool {
        self.effective.is_empty()
    }

    /// Physical key used for every backend call.
    pub fn to_physical(&self, logical: &str) -> String {
        if self.is_identity() {
            return logical.to_string();
        }
        let mut physical = String::with_capacity(self.effective.len() + logical.len());
        physical.push_str(&self.effective);
        physical.push_str(logical);
        physical
    }

    /// Reverse of [`to_physical`](Self::to_physical), applied to listed keys.
    ///
    /// Keys that do not start with the namespace prefix are returned unchanged.
    pub fn to_logical(&self, physical: &str) -> String {
        physical
            .strip_prefix(self.effective.as_str())
            .unwrap_or(physical)
            .to_string()
    }

    /// Physical prefix filter for a `list` call.
    pub fn list_prefix(&self, filter: &str) -> String {
        self.to_physical(filter)
    }
}
