//! Error types for koscheck operations

use thiserror::Error;

/// Expiring cache errors.
///
/// Only `store`, `invalidate` and `clear` surface these. Reads recover
/// from every cache fault locally and report a miss instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Failed to open cache at {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("Cache transaction failed: {reason}")]
    Transaction { reason: String },

    #[error("Cache serialization failed: {reason}")]
    Serialization { reason: String },

    #[error("Corrupt cache record {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Remote lookup errors (KOS list and identity service).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("{service} unavailable: {reason}")]
    Unavailable { service: String, reason: String },

    #[error("Malformed response from {service}: {reason}")]
    Malformed { service: String, reason: String },

    #[error("No character identity found for '{name}'")]
    IdentityNotFound { name: String },
}

/// Log tailing errors. These are fatal to the watch loop.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TailError {
    #[error("I/O error on {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Master error type for all koscheck errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KosError {
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Tail error: {0}")]
    Tail(#[from] TailError),
}

impl KosError {
    /// True when the failure came from a remote service rather than local state.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

/// Result type alias for koscheck operations.
pub type KosResult<T> = Result<T, KosError>;

// =============================================================================
// TESTS
// =============================================================================
