//! Batch resolution of the names in one request.

use koscheck_core::{KosError, ResolutionOutcome};
use koscheck_remote::RemoteLookup;

use crate::resolver::Resolver;

/// A name that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupFailure {
    pub name: String,
    pub error: KosError,
}

/// Per-request results, each bucket in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryReport {
    /// `(name, reason)` for every name on the list.
    pub kos: Vec<(String, String)>,
    pub clear: Vec<String>,
    pub errored: Vec<LookupFailure>,
}

impl EntryReport {
    pub fn errored_names(&self) -> Vec<&str> {
        self.errored.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn total(&self) -> usize {
        self.kos.len() + self.clear.len() + self.errored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Trim surrounding whitespace and trailing periods. `None` when nothing
/// is left.
pub fn normalize_name(raw: &str) -> Option<String> {
    let name = raw.trim().trim_end_matches('.').trim_end();
    (!name.is_empty()).then(|| name.to_string())
}

/// Runs every name of a request through the resolver.
pub struct EntryProcessor<R: RemoteLookup> {
    resolver: Resolver<R>,
}

impl<R: RemoteLookup> EntryProcessor<R> {
    pub fn new(resolver: Resolver<R>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &Resolver<R> {
        &self.resolver
    }

    /// Resolve `names` one at a time. A failing name lands in `errored` and
    /// the rest are still processed.
    pub async fn process<S: AsRef<str>>(&self, names: &[S]) -> EntryReport {
        let mut report = EntryReport::default();

        for name in names.iter().filter_map(|n| normalize_name(n.as_ref())) {
            match self.resolver.resolve(&name).await {
                Ok(ResolutionOutcome::Kos(reason)) => report.kos.push((name, reason)),
                Ok(_) => report.clear.push(name),
                Err(error) => {
                    tracing::warn!(name = %name, error = %error, "KOS lookup failed");
                    report.errored.push(LookupFailure { name, error });
                }
            }
        }

        tracing::info!(
            kos = report.kos.len(),
            clear = report.clear.len(),
            errored = report.errored.len(),
            "Processed KOS request"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use koscheck_core::RemoteError;
    use koscheck_storage::ExpiringCache;
    use koscheck_test_utils::fixtures::*;
    use koscheck_test_utils::MockLookup;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn processor(mock: MockLookup) -> (EntryProcessor<MockLookup>, TempDir) {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        let cache = ExpiringCache::open(temp_dir.path(), 10).expect("cache open should succeed");
        (EntryProcessor::new(Resolver::new(mock, Arc::new(cache))), temp_dir)
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Alice. "), Some("Alice".to_string()));
        assert_eq!(normalize_name("Bob Bobsen..."), Some("Bob Bobsen".to_string()));
        assert_eq!(normalize_name("Dr. Who"), Some("Dr. Who".to_string()));
        assert_eq!(normalize_name("   "), None);
        assert_eq!(normalize_name(" . "), None);
    }

    #[tokio::test]
    async fn test_blank_names_skipped_and_failures_isolated() {
        let mock = MockLookup::new()
            .with_records("Alice", vec![character("Alice")])
            .failing("BadName");
        let (processor, _dir) = processor(mock);

        let report = processor.process(&["", "  ", "Alice.", "BadName"]).await;
        assert!(report.kos.is_empty());
        assert_eq!(report.clear, vec!["Alice".to_string()]);
        assert_eq!(report.errored_names(), vec!["BadName"]);
        assert!(matches!(
            report.errored[0].error,
            KosError::Remote(RemoteError::Unavailable { .. })
        ));
        // Blank names never reach the remote.
        assert_eq!(processor.resolver().remote().kos_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_buckets_preserve_input_order() {
        let mock = MockLookup::new()
            .with_records("Zed", vec![character("Zed").with_kos(true)])
            .with_records("Amy", vec![character("Amy").with_kos(true)])
            .with_records("Carl", vec![character("Carl")])
            .with_records("Bea", vec![character("Bea")]);
        let (processor, _dir) = processor(mock);

        let names = vec!["Zed".to_string(), "Carl".to_string(), "Amy".to_string(), "Bea".to_string()];
        let report = processor.process(&names).await;

        assert_eq!(
            report.kos,
            vec![
                ("Zed".to_string(), "character: Zed".to_string()),
                ("Amy".to_string(), "character: Amy".to_string()),
            ]
        );
        assert_eq!(report.clear, vec!["Carl".to_string(), "Bea".to_string()]);
        assert_eq!(report.total(), 4);
    }

    #[tokio::test]
    async fn test_unknown_identity_is_errored_not_clear() {
        let (processor, _dir) = processor(MockLookup::new());

        let report = processor.process(&["Ghost"]).await;
        assert!(report.clear.is_empty());
        assert_eq!(report.errored_names(), vec!["Ghost"]);
    }

    #[tokio::test]
    async fn test_empty_request_yields_empty_report() {
        let (processor, _dir) = processor(MockLookup::new());
        let names: [&str; 0] = [];
        assert!(processor.process(&names).await.is_empty());
    }
}
