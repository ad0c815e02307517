//! Cascading KOS resolution.
//!
//! A name is first looked up directly. When the list has nothing
//! conclusive (no exact match, or a pilot parked in an NPC corporation),
//! the pilot's employment history is walked from the most recent
//! corporation backwards until a corporation gives a definitive answer.

use std::sync::Arc;

use koscheck_core::{EntityKind, KosRecord, KosRecordSet, KosResult, ResolutionOutcome};
use koscheck_remote::RemoteLookup;
use koscheck_storage::{params, ExpiringCache};

/// How long a KOS list response stays cached.
pub const DEFAULT_KOS_TTL_SECS: i64 = 60 * 60;

/// Resolves names against the KOS list through the shared cache.
pub struct Resolver<R: RemoteLookup> {
    remote: R,
    cache: Arc<ExpiringCache>,
    kos_ttl_secs: i64,
}

impl<R: RemoteLookup> Resolver<R> {
    pub fn new(remote: R, cache: Arc<ExpiringCache>) -> Self {
        Self {
            remote,
            cache,
            kos_ttl_secs: DEFAULT_KOS_TTL_SECS,
        }
    }

    /// Override the KOS list cache lifetime. Non-positive disables caching.
    pub fn with_kos_ttl(mut self, seconds: i64) -> Self {
        self.kos_ttl_secs = seconds;
        self
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn cache(&self) -> &ExpiringCache {
        &self.cache
    }

    /// Resolve `entity` to `Kos` or `Clear`.
    ///
    /// Remote failures, including an unknown character identity during the
    /// history fallback, are returned as errors rather than folded into
    /// `Clear`.
    pub async fn resolve(&self, entity: &str) -> KosResult<ResolutionOutcome> {
        let direct = self.resolve_direct(entity).await?;
        if direct.is_definitive() {
            return Ok(direct);
        }

        let npc_pilot = direct == ResolutionOutcome::NpcUnresolved;
        let history = self.remote.employment_history(entity).await?;
        let mut corporations = history.iter().map(String::as_str);
        if npc_pilot {
            // The most recent entry is the NPC corporation just evaluated.
            corporations.next();
        }

        let mut outcome = direct;

        if outcome == ResolutionOutcome::NotFound {
            if let Some(corp) = corporations.next() {
                outcome = self.resolve_direct(corp).await?;
            }
        }

        while outcome == ResolutionOutcome::NpcUnresolved {
            let Some(corp) = corporations.next() else {
                break;
            };
            outcome = match self.resolve_direct(corp).await? {
                // An NPC pilot inherits the verdict of a former employer.
                ResolutionOutcome::Kos(_) if npc_pilot => {
                    ResolutionOutcome::Kos(format!("lastcorp: {}", corp))
                }
                other => other,
            };
        }

        tracing::debug!(entity, outcome = %outcome, history = history.len(), "Resolved via employment history");
        Ok(outcome.settle())
    }

    /// Single lookup of `entity` with no history fallback.
    pub async fn resolve_direct(&self, entity: &str) -> KosResult<ResolutionOutcome> {
        let records = self.kos_records(entity).await?;
        let outcome = match records.find_exact(entity) {
            Some(record) => walk_chain(record),
            None => ResolutionOutcome::NotFound,
        };
        tracing::debug!(entity, outcome = %outcome, "Direct KOS lookup");
        Ok(outcome)
    }

    async fn kos_records(&self, entity: &str) -> KosResult<KosRecordSet> {
        let endpoint_id = self.remote.endpoint_id();
        let query = params(&[("entity", entity)]);

        if let Some(doc) = self.cache.retrieve(endpoint_id, &query) {
            match serde_json::from_value(doc) {
                Ok(records) => return Ok(records),
                Err(e) => {
                    tracing::warn!(entity, error = %e, "Cached KOS document no longer decodes, refetching");
                }
            }
        }

        let records = self.remote.lookup_kos(entity).await?;
        match serde_json::to_value(&records) {
            Ok(doc) => {
                if let Err(e) = self.cache.store(endpoint_id, &query, doc, self.kos_ttl_secs) {
                    tracing::warn!(entity, error = %e, "Failed to persist KOS document");
                }
            }
            Err(e) => tracing::warn!(entity, error = %e, "Failed to encode KOS document"),
        }
        Ok(records)
    }
}

/// Walk from the matched record up through its corporation and alliance.
///
/// The last KOS-flagged node seen supplies the reason. An NPC node reached
/// before any KOS evidence stops the walk with `NpcUnresolved`. A node of
/// unknown kind ends the chain without contributing.
fn walk_chain(record: &KosRecord) -> ResolutionOutcome {
    let mut reason: Option<String> = None;
    let mut node = Some(record);

    while let Some(current) = node {
        if current.kind == EntityKind::Unknown {
            break;
        }
        if current.kos {
            reason = Some(current.provenance());
        }
        if current.is_npc() && reason.is_none() {
            return ResolutionOutcome::NpcUnresolved;
        }
        if current.kind == EntityKind::Alliance {
            break;
        }
        node = current.parent();
    }

    match reason {
        Some(reason) => ResolutionOutcome::Kos(reason),
        None => ResolutionOutcome::Clear,
    }
}
