//! EVE Swagger Interface (ESI) identity client.
//!
//! Resolving an employment history takes three calls: character name to
//! id, id to corporation history, corporation ids to names. Responses can
//! be cached in the shared [`ExpiringCache`] for as long as the service's
//! `Expires` header allows.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use koscheck_core::{EmploymentHistory, KosResult, RemoteError};
use koscheck_storage::{CacheParams, ExpiringCache};
use reqwest::header::{HeaderName, DATE, EXPIRES};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::{malformed, unavailable};

const SERVICE: &str = "esi";

#[derive(Debug, Clone, Deserialize)]
pub struct NamedId {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdsResponse {
    #[serde(default)]
    pub characters: Vec<NamedId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorporationHistoryEntry {
    pub corporation_id: i64,
    pub record_id: i64,
    #[serde(default)]
    pub is_deleted: bool,
}

/// Identity service client.
#[derive(Clone)]
pub struct EsiIdentityClient {
    client: Client,
    base_url: String,
    cache: Option<Arc<ExpiringCache>>,
}

impl EsiIdentityClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<ExpiringCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Corporations `character` has belonged to, most recent first, with
    /// repeated stints collapsed.
    pub async fn employment_history(&self, character: &str) -> KosResult<EmploymentHistory> {
        let character_id = self.character_id(character).await?;
        let entries = self.corporation_history(character_id).await?;
        let ids = ordered_corporation_ids(entries);

        let mut unique = ids.clone();
        unique.sort_unstable();
        unique.dedup();
        let names = if unique.is_empty() {
            HashMap::new()
        } else {
            self.names(&unique).await?
        };

        let history = EmploymentHistory::from_ids(&ids, |id| names.get(&id).cloned());
        tracing::debug!(character, character_id, corporations = history.len(), "Resolved employment history");
        Ok(history)
    }

    /// Resolve a character name to its id.
    pub async fn character_id(&self, name: &str) -> KosResult<i64> {
        let url = format!("{}/universe/ids/", self.base_url);
        let body = vec![name.to_string()];
        let params = cache_params(&[("names", name)]);
        let response: IdsResponse = self
            .fetch_json("universe/ids", params, self.client.post(&url).json(&body))
            .await?;
        Ok(pick_character(name, &response)?)
    }

    pub async fn corporation_history(&self, character_id: i64) -> KosResult<Vec<CorporationHistoryEntry>> {
        let url = format!("{}/characters/{}/corporationhistory/", self.base_url, character_id);
        let id = character_id.to_string();
        let params = cache_params(&[("character_id", id.as_str())]);
        self.fetch_json("characters/corporationhistory", params, self.client.get(&url))
            .await
    }

    pub async fn names(&self, ids: &[i64]) -> KosResult<HashMap<i64, String>> {
        let url = format!("{}/universe/names/", self.base_url);
        let joined = ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
        let params = cache_params(&[("ids", joined.as_str())]);
        let named: Vec<NamedId> = self
            .fetch_json("universe/names", params, self.client.post(&url).json(ids))
            .await?;
        Ok(named.into_iter().map(|n| (n.id, n.name)).collect())
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: CacheParams,
        request: RequestBuilder,
    ) -> KosResult<T> {
        let endpoint_id = format!("{}/{}", self.base_url, endpoint);

        if let Some(cache) = &self.cache {
            if let Some(doc) = cache.retrieve(&endpoint_id, &params) {
                match serde_json::from_value(doc) {
                    Ok(value) => return Ok(value),
                    Err(e) => {
                        tracing::warn!(endpoint, error = %e, "Cached identity document no longer decodes, refetching");
                    }
                }
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| unavailable(SERVICE, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(unavailable(
                SERVICE,
                format!("{} returned status {}: {}", endpoint, status.as_u16(), error_text),
            )
            .into());
        }

        let header = |name: HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let ttl = ttl_from_headers(header(EXPIRES).as_deref(), header(DATE).as_deref(), Utc::now());

        let doc: Value = response
            .json()
            .await
            .map_err(|e| malformed(SERVICE, format!("{}: {}", endpoint, e)))?;
        let value = serde_json::from_value(doc.clone())
            .map_err(|e| malformed(SERVICE, format!("{}: {}", endpoint, e)))?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(&endpoint_id, &params, doc, ttl) {
                tracing::warn!(endpoint, error = %e, "Failed to cache identity document");
            }
        }
        Ok(value)
    }
}

fn cache_params(pairs: &[(&str, &str)]) -> CacheParams {
    koscheck_storage::params(pairs)
}

/// Seconds until `expires`, measured from the response `date` when present
/// and from `now` otherwise. Missing or unparseable expiry yields 0, which
/// the cache treats as "do not store".
pub fn ttl_from_headers(expires: Option<&str>, date: Option<&str>, now: DateTime<Utc>) -> i64 {
    let parse = |value: &str| {
        DateTime::parse_from_rfc2822(value)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    };
    let Some(expires) = expires.and_then(parse) else {
        return 0;
    };
    let reference = date.and_then(parse).unwrap_or(now);
    (expires - reference).num_seconds()
}

/// Corporation ids ordered most recent first.
pub fn ordered_corporation_ids(mut entries: Vec<CorporationHistoryEntry>) -> Vec<i64> {
    entries.sort_by(|a, b| b.record_id.cmp(&a.record_id));
    entries.into_iter().map(|e| e.corporation_id).collect()
}

/// The character in `response` whose name matches `name`.
pub fn pick_character(name: &str, response: &IdsResponse) -> Result<i64, RemoteError> {
    let wanted = name.to_lowercase();
    response
        .characters
        .iter()
        .find(|c| c.name.to_lowercase() == wanted)
        .map(|c| c.id)
        .ok_or_else(|| RemoteError::IdentityNotFound {
            name: name.to_string(),
        })
}

impl std::fmt::Debug for EsiIdentityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EsiIdentityClient")
            .field("base_url", &self.base_url)
            .field("cached", &self.cache.is_some())
            .finish()
    }
}
