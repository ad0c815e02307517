//! Expiring cache with explicit staleness rules.
//!
//! Every entry carries an absolute expiry instant. A read at or after that
//! instant never returns the payload: the entry is purged from both tiers
//! and the caller sees a miss. Entries are not expired proactively.
//!
//! # Tiers
//!
//! - Memory: a `HashMap` guarded by a mutex. The mutex is held for the
//!   whole read-check-evict-write sequence of one call.
//! - Persistent: any [`PersistentTier`]; [`LmdbCacheBackend`] in production.
//!   A persistent hit is promoted into memory.
//!
//! # Example
//!
//! ```ignore
//! let cache = ExpiringCache::open("/tmp/koscheck-cache", 64)?;
//! let query = params(&[("entity", "Alice")]);
//! if cache.retrieve("cva-kos", &query).is_none() {
//!     let doc = fetch().await?;
//!     cache.store("cva-kos", &query, doc, 3600)?;
//! }
//! ```

pub mod expiring;
pub mod key;
pub mod lmdb_backend;
pub mod traits;

pub use expiring::ExpiringCache;
pub use key::{params, CacheKey, CacheParams};
pub use lmdb_backend::LmdbCacheBackend;
pub use traits::{CacheStats, PersistentTier};
