//! Resolution outcomes.

use std::fmt;

/// Result of resolving one entity against the KOS list.
///
/// `NotFound` and `NpcUnresolved` are intermediate states used while the
/// resolver cascades; a top-level resolution always ends in `Kos` or
/// `Clear`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolutionOutcome {
    /// No record label matched the queried name.
    NotFound,
    /// Matched a record inside an NPC corporation with no KOS evidence;
    /// the employment history has to decide.
    NpcUnresolved,
    /// On the list. Carries the provenance that justified it.
    Kos(String),
    /// Confirmed not on the list.
    Clear,
}

impl ResolutionOutcome {
    /// `Kos` or `Clear`.
    pub fn is_definitive(&self) -> bool {
        matches!(self, Self::Kos(_) | Self::Clear)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Kos(reason) => Some(reason),
            _ => None,
        }
    }

    /// Fail open: anything that is not proven KOS is clear.
    pub fn settle(self) -> Self {
        match self {
            Self::NotFound | Self::NpcUnresolved => Self::Clear,
            other => other,
        }
    }
}

impl fmt::Display for ResolutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("not found"),
            Self::NpcUnresolved => f.write_str("npc (unresolved)"),
            Self::Kos(reason) => write!(f, "KOS ({})", reason),
            Self::Clear => f.write_str("clear"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle_fails_open() {
        assert_eq!(ResolutionOutcome::NotFound.settle(), ResolutionOutcome::Clear);
        assert_eq!(ResolutionOutcome::NpcUnresolved.settle(), ResolutionOutcome::Clear);
        assert_eq!(
            ResolutionOutcome::Kos("corporation: X".into()).settle(),
            ResolutionOutcome::Kos("corporation: X".into())
        );
    }

    #[test]
    fn test_reason_only_for_kos() {
        assert_eq!(ResolutionOutcome::Kos("alliance: Y".into()).reason(), Some("alliance: Y"));
        assert_eq!(ResolutionOutcome::Clear.reason(), None);
        assert!(!ResolutionOutcome::NpcUnresolved.is_definitive());
    }
}
