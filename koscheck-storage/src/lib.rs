//! koscheck Storage
//!
//! Persistence for documents fetched from remote services. The only
//! storage concern of the engine is the [`cache::ExpiringCache`]: an
//! in-process table in front of an LMDB environment, with absolute
//! per-entry expiry.

pub mod cache;

pub use cache::{
    params, CacheKey, CacheParams, CacheStats, ExpiringCache, LmdbCacheBackend, PersistentTier,
};
