//! Request-derived cache keys.
//!
//! A key is the SHA-256 digest of an endpoint identifier and its request
//! parameters. Parameters live in a `BTreeMap`, so two requests with the
//! same parameters in a different insertion order derive the same key.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Canonical request parameters.
pub type CacheParams = BTreeMap<String, String>;

/// Build [`CacheParams`] from borrowed pairs.
pub fn params(pairs: &[(&str, &str)]) -> CacheParams {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Hex-encoded SHA-256 digest identifying one logical request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for `(endpoint_id, params)`.
    ///
    /// Every component is length-prefixed before hashing, so
    /// `("ab", "c")` and `("a", "bc")` never share an encoding.
    pub fn derive(endpoint_id: &str, params: &CacheParams) -> Self {
        let mut hasher = Sha256::new();
        update_component(&mut hasher, endpoint_id.as_bytes());
        hasher.update((params.len() as u64).to_le_bytes());
        for (name, value) in params {
            update_component(&mut hasher, name.as_bytes());
            update_component(&mut hasher, value.as_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn update_component(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}
