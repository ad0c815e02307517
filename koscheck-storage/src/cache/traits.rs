//! Persistent tier trait and cache statistics.

use koscheck_core::CacheError;

use super::key::CacheKey;

/// Durable key/value store behind the in-process table.
///
/// Implementations store opaque bytes; encoding, compression and expiry
/// checks belong to [`super::ExpiringCache`]. A record that was only
/// partially written must come back either intact or not at all, or as
/// bytes the cache will fail to decode (and then treat as a miss).
pub trait PersistentTier: Send + Sync {
    /// Load the raw record for `key`, if any.
    fn load(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError>;

    /// Insert or replace the raw record for `key`.
    fn save(&self, key: &CacheKey, bytes: &[u8]) -> Result<(), CacheError>;

    /// Remove the record for `key`. Returns whether a record existed.
    fn remove(&self, key: &CacheKey) -> Result<bool, CacheError>;

    /// Remove every record. Returns how many were removed.
    fn clear(&self) -> Result<u64, CacheError>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads answered from either tier.
    pub hits: u64,
    /// Reads that found nothing fresh.
    pub misses: u64,
    /// Successful stores with a positive TTL.
    pub stores: u64,
    /// Entries purged because they were stale or undecodable.
    pub evictions: u64,
    /// Entries currently held in memory.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
