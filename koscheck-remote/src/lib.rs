//! koscheck Remote - lookup services behind the resolver
//!
//! The resolver only sees [`RemoteLookup`]. Concrete HTTP clients for the
//! KOS list and the game's identity service live in [`providers`].

use async_trait::async_trait;
use koscheck_core::{EmploymentHistory, KosRecordSet, KosResult};

pub mod providers;

pub use providers::{
    CvaKosClient, EsiIdentityClient, HttpLookupClient, RemoteConfig, DEFAULT_ESI_URL,
    DEFAULT_KOS_URL,
};

/// The two remote operations the resolver depends on.
///
/// Implementations should fail with
/// [`koscheck_core::RemoteError::IdentityNotFound`] when a character name
/// cannot be resolved, and with `Unavailable`/`Malformed` for transport or
/// decoding failures. They must not retry.
#[async_trait]
pub trait RemoteLookup: Send + Sync {
    /// Stable identifier of the KOS list endpoint, used to key cached
    /// lookups.
    fn endpoint_id(&self) -> &str;

    /// Query the KOS list for `entity`.
    async fn lookup_kos(&self, entity: &str) -> KosResult<KosRecordSet>;

    /// Corporations `character` has belonged to, most recent first.
    async fn employment_history(&self, character: &str) -> KosResult<EmploymentHistory>;
}
