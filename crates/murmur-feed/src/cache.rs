//! Key-value cache used for per-channel counts and the channel directory.

use dashmap::DashMap;

use crate::error::CacheError;

/// Minimal key-value contract: get, set, atomic increment, delete, flush.
///
/// Values are strings so a networked backend can store them verbatim.
/// `incr` must be atomic with respect to concurrent callers on the same key
/// and must create a missing key as if it held `0`.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    fn set(&self, key: &str, value: String) -> Result<(), CacheError>;

    /// Increment the integer at `key` by one and return the new value.
    fn incr(&self, key: &str) -> Result<i64, CacheError>;

    /// Returns whether the key existed.
    fn delete(&self, key: &str) -> Result<bool, CacheError>;

    fn flush_all(&self) -> Result<(), CacheError>;
}

/// In-process cache backend.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, String>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn incr(&self, key: &str) -> Result<i64, CacheError> {
        // The entry guard holds the shard write lock for the whole read-modify-write.
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| "0".to_string());

        let current: i64 = entry.parse().map_err(|_| CacheError::NotAnInteger {
            key: key.to_string(),
        })?;
        let next = current + 1;
        *entry = next.to_string();
        Ok(next)
    }

    fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries.remove(key).is_some())
    }

    fn flush_all(&self) -> Result<(), CacheError> {
        self.entries.clear();
        Ok(())
    }
}
