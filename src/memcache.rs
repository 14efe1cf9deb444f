//! Per-instance memory cache of decoded values.
//!
//! Each logical key is in one of three states:
//!
//! ```text
//!              get (store miss)
//!   Unknown ────────────────────────► Absent
//!      │                               ▲  │
//!      │ get (store hit) / put  delete │  │ put
//!      ▼                               │  ▼
//!   Present(value) ◄────────────────────┘
//! ```
//!
//! The map is unbounded: there is no eviction, no TTL and no size limit. It
//! suits short-lived processes or bounded key spaces. Entries live until the
//! store instance is dropped.

use dashmap::DashMap;

/// Cached state of a key that has been read or written in this process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheSlot<T> {
    Present(T),
    Absent,
}

impl<T> CacheSlot<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            CacheSlot::Present(value) => Some(value),
            CacheSlot::Absent => None,
        }
    }
}

impl<T> From<Option<T>> for CacheSlot<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => CacheSlot::Present(value),
            None => CacheSlot::Absent,
        }
    }
}

/// Memory cache keyed by logical key.
///
/// Uses DashMap so the store stays `Send + Sync`; no lock is held across an await.
pub struct MemCache<T> {
    entries: DashMap<String, CacheSlot<T>>,
}

impl<T: Clone> MemCache<T> {
    /// Empty cache; every key starts unknown.
    pub fn new() -> Self {
        MemCache {
            entries: DashMap::new(),
        }
    }

    /// Cached state, or `None` if the key is still unknown.
    pub fn lookup(&self, key: &str) -> Option<CacheSlot<T>> {
        let slot = self.entries.get(key).map(|entry| entry.value().clone());
        match &slot {
            Some(_) => debug!("✓ Memcache GET {} -> HIT", key),
            None => debug!("✓ Memcache GET {} -> MISS", key),
        }
        slot
    }

    /// Record the decoded state of a key.
    pub fn store(&self, key: &str, value: Option<T>) {
        self.entries.insert(key.to_string(), CacheSlot::from(value));
    }

    /// Record a value written through this instance.
    pub fn mark_present(&self, key: &str, value: T) {
        self.entries
            .insert(key.to_string(), CacheSlot::Present(value));
    }

    /// Record a key deleted through this instance.
    pub fn mark_absent(&self, key: &str) {
        self.entries.insert(key.to_string(), CacheSlot::Absent);
    }

    /// Number of keys with a cached state (present or absent).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no key has a cached state.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> Default for MemCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_key() {
        let cache: MemCache<String> = MemCache::new();
        assert!(cache.lookup("a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_present_then_absent() {
        let cache = MemCache::new();
        cache.mark_present("a", 1);
        assert_eq!(cache.lookup("a"), Some(CacheSlot::Present(1)));

        cache.mark_absent("a");
        assert_eq!(cache.lookup("a"), Some(CacheSlot::Absent));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_store_absent_is_cached() {
        let cache: MemCache<i32> = MemCache::new();
        cache.store("missing", None);
        assert_eq!(cache.lookup("missing"), Some(CacheSlot::Absent));
    }

    #[test]
    fn test_slot_into_option() {
        assert_eq!(CacheSlot::Present(5).into_option(), Some(5));
        assert_eq!(CacheSlot::<i32>::Absent.into_option(), None);
    }

    #[test]
    fn test_unbounded_growth() {
        // No eviction: every distinct key keeps its slot.
        let cache = MemCache::new();
        for i in 0..10_000 {
            cache.mark_present(&format!("key_{}", i), i);
        }
        assert_eq!(cache.len(), 10_000);
        assert_eq!(cache.lookup("key_0"), Some(CacheSlot::Present(0)));
    }
}
