//! Two-tier expiring cache.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use koscheck_core::CacheError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::key::{CacheKey, CacheParams};
use super::lmdb_backend::LmdbCacheBackend;
use super::traits::{CacheStats, PersistentTier};

const ZSTD_LEVEL: i32 = 3;

/// One cached document and the instant it stops being servable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CacheEntry {
    expires_at: DateTime<Utc>,
    payload: Value,
}

impl CacheEntry {
    fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    fn encode(&self) -> Result<Vec<u8>, CacheError> {
        let json = serde_json::to_vec(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        zstd::encode_all(json.as_slice(), ZSTD_LEVEL).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })
    }

    fn decode(key: &CacheKey, bytes: &[u8]) -> Result<Self, CacheError> {
        let corrupt = |reason: String| CacheError::Corrupt {
            key: key.to_string(),
            reason,
        };
        let json = zstd::decode_all(bytes).map_err(|e| corrupt(e.to_string()))?;
        serde_json::from_slice(&json).map_err(|e| corrupt(e.to_string()))
    }
}

struct Inner {
    entries: HashMap<CacheKey, CacheEntry>,
    stats: CacheStats,
}

/// Memory table in front of a [`PersistentTier`].
///
/// Reads never serve an entry at or past its expiry; such entries are
/// purged from both tiers when first observed. Cache faults on the read
/// path are logged and reported as misses.
pub struct ExpiringCache<P: PersistentTier = LmdbCacheBackend> {
    inner: Mutex<Inner>,
    persistent: P,
}

impl ExpiringCache<LmdbCacheBackend> {
    /// Open a cache persisted in an LMDB environment under `path`.
    pub fn open<Q: AsRef<Path>>(path: Q, max_size_mb: usize) -> Result<Self, CacheError> {
        Ok(Self::new(LmdbCacheBackend::new(path, max_size_mb)?))
    }
}

impl<P: PersistentTier> ExpiringCache<P> {
    pub fn new(persistent: P) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                stats: CacheStats::default(),
            }),
            persistent,
        }
    }

    pub fn persistent(&self) -> &P {
        &self.persistent
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Poison is ignored: entries are plain data.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch a fresh payload, or `None`.
    pub fn retrieve(&self, endpoint_id: &str, params: &CacheParams) -> Option<Value> {
        self.retrieve_at(endpoint_id, params, Utc::now())
    }

    /// [`Self::retrieve`] against an explicit clock.
    pub fn retrieve_at(
        &self,
        endpoint_id: &str,
        params: &CacheParams,
        now: DateTime<Utc>,
    ) -> Option<Value> {
        let key = CacheKey::derive(endpoint_id, params);
        let mut inner = self.lock();

        let cached = inner.entries.get(&key).cloned();
        let (entry, from_disk) = match cached {
            Some(entry) => (entry, false),
            None => match self.load_persisted(&key, &mut inner.stats) {
                Some(entry) => (entry, true),
                None => {
                    inner.stats.misses += 1;
                    tracing::debug!(endpoint_id, %key, "Cache miss");
                    return None;
                }
            },
        };

        if entry.is_fresh_at(now) {
            inner.stats.hits += 1;
            if from_disk {
                tracing::debug!(endpoint_id, %key, "Promoting persisted entry to memory");
                inner.entries.insert(key, entry.clone());
                inner.stats.entry_count = inner.entries.len() as u64;
            } else {
                tracing::debug!(endpoint_id, %key, "Cache hit");
            }
            return Some(entry.payload);
        }

        tracing::debug!(
            endpoint_id,
            %key,
            expired_at = %entry.expires_at,
            "Cache entry expired, purging"
        );
        inner.entries.remove(&key);
        inner.stats.entry_count = inner.entries.len() as u64;
        inner.stats.evictions += 1;
        inner.stats.misses += 1;
        if let Err(e) = self.persistent.remove(&key) {
            tracing::warn!(%key, error = %e, "Failed to purge expired entry from persistent tier");
        }
        None
    }

    fn load_persisted(&self, key: &CacheKey, stats: &mut CacheStats) -> Option<CacheEntry> {
        let bytes = match self.persistent.load(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(%key, error = %e, "Persistent tier read failed, treating as miss");
                return None;
            }
        };

        match CacheEntry::decode(key, &bytes) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable cache record");
                stats.evictions += 1;
                if let Err(e) = self.persistent.remove(key) {
                    tracing::warn!(%key, error = %e, "Failed to remove unreadable cache record");
                }
                None
            }
        }
    }

    /// Cache `payload` for `ttl_seconds`. A non-positive TTL stores nothing.
    ///
    /// The memory tier is updated before the persistent tier; a persistent
    /// failure is returned but the entry stays servable from memory.
    pub fn store(
        &self,
        endpoint_id: &str,
        params: &CacheParams,
        payload: Value,
        ttl_seconds: i64,
    ) -> Result<(), CacheError> {
        self.store_at(endpoint_id, params, payload, ttl_seconds, Utc::now())
    }

    /// [`Self::store`] against an explicit clock.
    pub fn store_at(
        &self,
        endpoint_id: &str,
        params: &CacheParams,
        payload: Value,
        ttl_seconds: i64,
        now: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        if ttl_seconds <= 0 {
            tracing::debug!(endpoint_id, ttl_seconds, "Not caching: non-positive TTL");
            return Ok(());
        }

        let expires_at = TimeDelta::try_seconds(ttl_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let entry = CacheEntry {
            expires_at,
            payload,
        };
        let bytes = entry.encode()?;
        let key = CacheKey::derive(endpoint_id, params);

        let mut inner = self.lock();
        inner.entries.insert(key.clone(), entry);
        inner.stats.entry_count = inner.entries.len() as u64;
        inner.stats.stores += 1;
        tracing::debug!(endpoint_id, %key, ttl_seconds, "Cached document");
        self.persistent.save(&key, &bytes)
    }

    /// Drop one entry from both tiers.
    pub fn invalidate(&self, endpoint_id: &str, params: &CacheParams) -> Result<bool, CacheError> {
        let key = CacheKey::derive(endpoint_id, params);
        let mut inner = self.lock();
        let in_memory = inner.entries.remove(&key).is_some();
        inner.stats.entry_count = inner.entries.len() as u64;
        let on_disk = self.persistent.remove(&key)?;
        Ok(in_memory || on_disk)
    }

    /// Empty both tiers. Returns the number of persisted records removed.
    pub fn clear(&self) -> Result<u64, CacheError> {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.stats.entry_count = 0;
        self.persistent.clear()
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats.clone()
    }
}

impl<P: PersistentTier> std::fmt::Debug for ExpiringCache<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
