//! LMDB-backed persistent tier.
//!
//! Uses the heed crate (Rust bindings for LMDB). Each cache key is one
//! record in a single unnamed database. LMDB commits are atomic, so a
//! process killed mid-write leaves either the previous record or the new
//! one, never a torn record.

use std::path::{Path, PathBuf};

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use koscheck_core::CacheError;

use super::key::CacheKey;
use super::traits::PersistentTier;

fn txn_error(e: heed::Error) -> CacheError {
    CacheError::Transaction {
        reason: e.to_string(),
    }
}

/// LMDB persistent tier.
pub struct LmdbCacheBackend {
    env: Env,
    db: Database<Bytes, Bytes>,
    path: PathBuf,
}

impl LmdbCacheBackend {
    /// Open (or create) an LMDB environment under `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the database in megabytes
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Open`] if the directory cannot be created or
    /// the environment cannot be opened, and [`CacheError::Transaction`] if
    /// the database cannot be created.
    pub fn new<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, CacheError> {
        let path = path.as_ref().to_path_buf();
        let open_error = |reason: String| CacheError::Open {
            path: path.display().to_string(),
            reason,
        };

        std::fs::create_dir_all(&path).map_err(|e| open_error(e.to_string()))?;

        // SAFETY: the environment is opened once per path by this process
        // and the files are not modified by anything else while mapped.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(&path)
        }
        .map_err(|e| open_error(e.to_string()))?;

        let mut wtxn = env.write_txn().map_err(txn_error)?;
        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(txn_error)?;
        wtxn.commit().map_err(txn_error)?;

        tracing::debug!(path = %path.display(), max_size_mb, "Opened LMDB cache tier");

        Ok(Self { env, db, path })
    }

    /// Number of records currently stored.
    pub fn len(&self) -> Result<u64, CacheError> {
        let rtxn = self.env.read_txn().map_err(txn_error)?;
        self.db.len(&rtxn).map_err(txn_error)
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }
}

impl PersistentTier for LmdbCacheBackend {
    fn load(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        let rtxn = self.env.read_txn().map_err(txn_error)?;
        let bytes = self.db.get(&rtxn, key.as_bytes()).map_err(txn_error)?;
        Ok(bytes.map(<[u8]>::to_vec))
    }

    fn save(&self, key: &CacheKey, bytes: &[u8]) -> Result<(), CacheError> {
        let mut wtxn = self.env.write_txn().map_err(txn_error)?;
        self.db
            .put(&mut wtxn, key.as_bytes(), bytes)
            .map_err(txn_error)?;
        wtxn.commit().map_err(txn_error)
    }

    fn remove(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let mut wtxn = self.env.write_txn().map_err(txn_error)?;
        let deleted = self.db.delete(&mut wtxn, key.as_bytes()).map_err(txn_error)?;
        wtxn.commit().map_err(txn_error)?;
        Ok(deleted)
    }

    fn clear(&self) -> Result<u64, CacheError> {
        let mut wtxn = self.env.write_txn().map_err(txn_error)?;
        let count = self.db.len(&wtxn).map_err(txn_error)?;
        self.db.clear(&mut wtxn).map_err(txn_error)?;
        wtxn.commit().map_err(txn_error)?;
        Ok(count)
    }
}

impl std::fmt::Debug for LmdbCacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LmdbCacheBackend")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::key::params;
    use tempfile::TempDir;

    fn create_test_backend() -> (LmdbCacheBackend, TempDir) {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        let backend =
            LmdbCacheBackend::new(temp_dir.path(), 10).expect("backend creation should succeed");
        (backend, temp_dir)
    }

    fn key(name: &str) -> CacheKey {
        CacheKey::derive("test", &params(&[("entity", name)]))
    }

    #[test]
    fn test_save_and_load() {
        let (backend, _temp_dir) = create_test_backend();

        backend.save(&key("a"), b"payload").expect("save should succeed");
        let loaded = backend.load(&key("a")).expect("load should succeed");
        assert_eq!(loaded.as_deref(), Some(&b"payload"[..]));
    }

    #[test]
    fn test_load_nonexistent() {
        let (backend, _temp_dir) = create_test_backend();
        assert!(backend.load(&key("missing")).expect("load should succeed").is_none());
    }

    #[test]
    fn test_overwrite() {
        let (backend, _temp_dir) = create_test_backend();

        backend.save(&key("a"), b"one").expect("save should succeed");
        backend.save(&key("a"), b"two").expect("save should succeed");
        let loaded = backend.load(&key("a")).expect("load should succeed");
        assert_eq!(loaded.as_deref(), Some(&b"two"[..]));
        assert_eq!(backend.len().expect("len should succeed"), 1);
    }

    #[test]
    fn test_remove() {
        let (backend, _temp_dir) = create_test_backend();

        backend.save(&key("a"), b"x").expect("save should succeed");
        assert!(backend.remove(&key("a")).expect("remove should succeed"));
        assert!(!backend.remove(&key("a")).expect("second remove should succeed"));
        assert!(backend.load(&key("a")).expect("load should succeed").is_none());
    }

    #[test]
    fn test_clear() {
        let (backend, _temp_dir) = create_test_backend();

        for name in ["a", "b", "c"] {
            backend.save(&key(name), name.as_bytes()).expect("save should succeed");
        }
        assert_eq!(backend.clear().expect("clear should succeed"), 3);
        assert!(backend.is_empty().expect("is_empty should succeed"));
    }

    #[test]
    fn test_survives_reopen() {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        {
            let backend = LmdbCacheBackend::new(temp_dir.path(), 10).expect("open should succeed");
            backend.save(&key("a"), b"durable").expect("save should succeed");
        }
        let backend = LmdbCacheBackend::new(temp_dir.path(), 10).expect("reopen should succeed");
        let loaded = backend.load(&key("a")).expect("load should succeed");
        assert_eq!(loaded.as_deref(), Some(&b"durable"[..]));
    }
}
