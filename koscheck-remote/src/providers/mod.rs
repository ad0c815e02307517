//! HTTP implementations of [`crate::RemoteLookup`].

pub mod cva;
pub mod esi;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use koscheck_core::{EmploymentHistory, KosRecordSet, KosResult, RemoteError};
use koscheck_storage::ExpiringCache;
use reqwest::Client;

use crate::RemoteLookup;

pub use cva::CvaKosClient;
pub use esi::EsiIdentityClient;

pub const DEFAULT_KOS_URL: &str = "http://kos.cva-eve.org/api/";
pub const DEFAULT_ESI_URL: &str = "https://esi.evetech.net/latest";

pub(crate) fn unavailable(service: &str, reason: impl Into<String>) -> RemoteError {
    RemoteError::Unavailable {
        service: service.to_string(),
        reason: reason.into(),
    }
}

pub(crate) fn malformed(service: &str, reason: impl Into<String>) -> RemoteError {
    RemoteError::Malformed {
        service: service.to_string(),
        reason: reason.into(),
    }
}

/// Endpoints and transport settings for the HTTP clients.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub kos_url: String,
    pub esi_url: String,
    /// Upper bound on every request, so one hung lookup cannot stall the
    /// whole entry forever.
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            kos_url: DEFAULT_KOS_URL.to_string(),
            esi_url: DEFAULT_ESI_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            user_agent: concat!("koscheck/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl RemoteConfig {
    pub fn build_client(&self) -> Result<Client, RemoteError> {
        Client::builder()
            .timeout(self.request_timeout)
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(|e| unavailable("http-client", e.to_string()))
    }
}

/// KOS list and identity service behind one [`RemoteLookup`].
#[derive(Debug, Clone)]
pub struct HttpLookupClient {
    kos: CvaKosClient,
    identity: EsiIdentityClient,
}

impl HttpLookupClient {
    /// Build both clients over one shared connection pool. When `cache` is
    /// given, identity-service responses are cached per their HTTP expiry.
    pub fn new(config: &RemoteConfig, cache: Option<Arc<ExpiringCache>>) -> Result<Self, RemoteError> {
        let client = config.build_client()?;
        let kos = CvaKosClient::new(client.clone(), config.kos_url.clone());
        let mut identity = EsiIdentityClient::new(client, config.esi_url.clone());
        if let Some(cache) = cache {
            identity = identity.with_cache(cache);
        }
        Ok(Self { kos, identity })
    }
}

#[async_trait]
impl RemoteLookup for HttpLookupClient {
    fn endpoint_id(&self) -> &str {
        self.kos.base_url()
    }

    async fn lookup_kos(&self, entity: &str) -> KosResult<KosRecordSet> {
        Ok(self.kos.lookup(entity).await?)
    }

    async fn employment_history(&self, character: &str) -> KosResult<EmploymentHistory> {
        self.identity.employment_history(character).await
    }
}
