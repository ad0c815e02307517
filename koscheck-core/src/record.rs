//! KOS list records.
//!
//! A query against the KOS list returns a set of record trees. Each record
//! describes one entity and may point at the corporation or alliance it
//! belongs to, forming a chain that ends at an alliance or at a record with
//! no parent.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of entity a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    #[serde(alias = "pilot")]
    Character,
    #[serde(alias = "corp")]
    Corporation,
    Alliance,
    /// A type the list reports that none of the above covers.
    #[serde(other)]
    Unknown,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Corporation => "corporation",
            Self::Alliance => "alliance",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node of a KOS record tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KosRecord {
    pub label: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    #[serde(default)]
    pub kos: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npc: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    /// "Belongs to corp" edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corp: Option<Box<KosRecord>>,
    /// "Belongs to alliance" edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alliance: Option<Box<KosRecord>>,
}

impl KosRecord {
    pub fn new(label: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            label: label.into(),
            kind,
            kos: false,
            npc: None,
            ticker: None,
            corp: None,
            alliance: None,
        }
    }

    pub fn with_kos(mut self, kos: bool) -> Self {
        self.kos = kos;
        self
    }

    pub fn with_npc(mut self, npc: bool) -> Self {
        self.npc = Some(npc);
        self
    }

    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self
    }

    pub fn in_corp(mut self, corp: KosRecord) -> Self {
        self.corp = Some(Box::new(corp));
        self
    }

    pub fn in_alliance(mut self, alliance: KosRecord) -> Self {
        self.alliance = Some(Box::new(alliance));
        self
    }

    pub fn is_npc(&self) -> bool {
        self.npc.unwrap_or(false)
    }

    /// The next node up the chain. The corp edge is preferred over the
    /// alliance edge.
    pub fn parent(&self) -> Option<&KosRecord> {
        self.corp.as_deref().or(self.alliance.as_deref())
    }

    /// The list wraps NPC corporations in synthetic alliances that carry no
    /// ticker. Those never describe a real entity.
    pub fn is_placeholder_alliance(&self) -> bool {
        self.kind == EntityKind::Alliance
            && self.ticker.as_deref().map_or(true, |t| t.trim().is_empty())
    }

    /// Case-insensitive label comparison.
    pub fn label_matches(&self, name: &str) -> bool {
        self.label.to_lowercase() == name.to_lowercase()
    }

    /// Provenance string for this node, e.g. `"corporation: Evil Corp"`.
    pub fn provenance(&self) -> String {
        format!("{}: {}", self.kind, self.label)
    }
}

/// The full response to one KOS list query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KosRecordSet {
    #[serde(default)]
    pub results: Vec<KosRecord>,
}

impl KosRecordSet {
    pub fn new(results: Vec<KosRecord>) -> Self {
        Self { results }
    }

    /// First record whose label matches `name`, skipping placeholder
    /// alliances and records of an unknown kind.
    pub fn find_exact(&self, name: &str) -> Option<&KosRecord> {
        self.results
            .iter()
            .filter(|record| record.kind != EntityKind::Unknown)
            .filter(|record| !record.is_placeholder_alliance())
            .find(|record| record.label_matches(name))
    }
}
