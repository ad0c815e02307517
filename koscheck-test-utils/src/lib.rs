//! koscheck Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - A scripted [`MockLookup`] remote with call counters
//! - Record fixtures for common KOS list shapes
//! - Proptest generators for entity names and log lines

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
pub use koscheck_core::{
    EmploymentHistory, EntityKind, KosError, KosRecord, KosRecordSet, KosResult, RemoteError,
    ResolutionOutcome,
};
pub use koscheck_remote::RemoteLookup;

// ============================================================================
// MOCK REMOTE
// ============================================================================

/// In-memory [`RemoteLookup`] driven by scripted responses.
///
/// - `lookup_kos` returns the records registered for the query (matched
///   case-insensitively), or an empty set.
/// - `employment_history` returns the registered history, or
///   `IdentityNotFound`.
/// - Names registered with [`MockLookup::failing`] make both operations
///   fail with `Unavailable`.
#[derive(Debug, Default)]
pub struct MockLookup {
    records: HashMap<String, KosRecordSet>,
    histories: HashMap<String, EmploymentHistory>,
    failing: HashSet<String>,
    kos_calls: Mutex<Vec<String>>,
    history_calls: Mutex<Vec<String>>,
}

impl MockLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the record set returned for `query`.
    pub fn with_records(mut self, query: &str, records: Vec<KosRecord>) -> Self {
        self.records
            .insert(query.to_lowercase(), KosRecordSet::new(records));
        self
    }

    /// Register the employment history for `character`.
    pub fn with_history(mut self, character: &str, corporations: &[&str]) -> Self {
        self.histories.insert(
            character.to_lowercase(),
            EmploymentHistory::from_names(corporations.iter().copied()),
        );
        self
    }

    /// Make every lookup involving `name` fail as if the service were down.
    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_lowercase());
        self
    }

    /// Every `lookup_kos` query, in call order.
    pub fn kos_calls(&self) -> Vec<String> {
        self.kos_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every `employment_history` query, in call order.
    pub fn history_calls(&self) -> Vec<String> {
        self.history_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn kos_call_count(&self, query: &str) -> usize {
        self.kos_calls().iter().filter(|q| q.as_str() == query).count()
    }

    fn check_failing(&self, name: &str) -> KosResult<()> {
        if self.failing.contains(&name.to_lowercase()) {
            return Err(RemoteError::Unavailable {
                service: "mock".to_string(),
                reason: format!("scripted failure for '{}'", name),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteLookup for MockLookup {
    fn endpoint_id(&self) -> &str {
        "mock-kos"
    }

    async fn lookup_kos(&self, entity: &str) -> KosResult<KosRecordSet> {
        self.kos_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entity.to_string());
        self.check_failing(entity)?;
        Ok(self
            .records
            .get(&entity.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    async fn employment_history(&self, character: &str) -> KosResult<EmploymentHistory> {
        self.history_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(character.to_string());
        self.check_failing(character)?;
        self.histories
            .get(&character.to_lowercase())
            .cloned()
            .ok_or_else(|| {
                RemoteError::IdentityNotFound {
                    name: character.to_string(),
                }
                .into()
            })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    use super::*;

    pub fn character(label: &str) -> KosRecord {
        KosRecord::new(label, EntityKind::Character)
    }

    pub fn corp(label: &str) -> KosRecord {
        KosRecord::new(label, EntityKind::Corporation).with_npc(false)
    }

    pub fn npc_corp(label: &str) -> KosRecord {
        KosRecord::new(label, EntityKind::Corporation).with_npc(true)
    }

    pub fn alliance(label: &str, ticker: &str) -> KosRecord {
        KosRecord::new(label, EntityKind::Alliance).with_ticker(ticker)
    }

    /// The ticker-less alliance the list wraps around NPC corporations.
    pub fn placeholder_alliance(label: &str) -> KosRecord {
        KosRecord::new(label, EntityKind::Alliance)
    }

    /// A character sitting in an NPC starter corporation.
    pub fn npc_pilot(label: &str, npc_corp_label: &str) -> KosRecord {
        character(label).in_corp(npc_corp(npc_corp_label))
    }
}

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    use proptest::prelude::*;

    /// Character-like names: words separated by single spaces.
    pub fn arb_entity_name() -> impl Strategy<Value = String> {
        prop::collection::vec("[A-Za-z0-9][A-Za-z0-9'-]{0,11}", 1..4).prop_map(|w| w.join(" "))
    }

    pub fn arb_entity_names() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(arb_entity_name(), 1..8)
    }

    /// Free text that never contains the comment delimiter or a newline.
    pub fn arb_comment() -> impl Strategy<Value = String> {
        "[A-Za-z0-9 ,!?]{1,24}".prop_map(|s| s.trim().to_string())
            .prop_filter("comment must not be blank", |s| !s.is_empty())
    }

    pub fn arb_timestamp() -> impl Strategy<Value = String> {
        (0u32..24, 0u32..60, 0u32..60)
            .prop_map(|(h, m, s)| format!("[ 2026.10.19 {:02}:{:02}:{:02} ]", h, m, s))
    }
}
