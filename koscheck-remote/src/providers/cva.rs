//! CVA KOS list client.

use koscheck_core::{KosRecordSet, RemoteError};
use reqwest::Client;

use super::{malformed, unavailable};

const SERVICE: &str = "cva-kos";

/// Client for the CVA KOS list JSON API.
#[derive(Clone)]
pub struct CvaKosClient {
    client: Client,
    base_url: String,
}

impl CvaKosClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query the list for units (characters, corporations, alliances)
    /// whose label contains `entity`.
    pub async fn lookup(&self, entity: &str) -> Result<KosRecordSet, RemoteError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("c", "json"),
                ("type", "unit"),
                ("details", ""),
                ("max", "10"),
                ("offset", "0"),
                ("q", entity),
            ])
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
                format!("status {}: {}", status.as_u16(), error_text),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| unavailable(SERVICE, format!("Failed to read body: {}", e)))?;
        tracing::debug!(entity, bytes = body.len(), "KOS list responded");
        parse_record_set(&body)
    }
}

/// Decode a KOS list response body.
pub fn parse_record_set(body: &str) -> Result<KosRecordSet, RemoteError> {
    serde_json::from_str(body).map_err(|e| malformed(SERVICE, format!("Failed to parse response: {}", e)))
}

impl std::fmt::Debug for CvaKosClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CvaKosClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use koscheck_core::EntityKind;

    #[test]
    fn test_parse_record_set() {
        let body = r#"{"total": 1, "code": 100, "results": [
            {"id": 42, "label": "Evil Corp", "type": "corp", "kos": true, "npc": false,
             "alliance": {"id": 7, "label": "Bad Alliance", "type": "alliance", "kos": false, "ticker": "BAD"}}
        ]}"#;
        let set = parse_record_set(body).expect("body should parse");
        let corp = &set.results[0];
        assert_eq!(corp.kind, EntityKind::Corporation);
        assert!(corp.kos);
        assert_eq!(corp.parent().map(|a| a.label.as_str()), Some("Bad Alliance"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_record_set("<html>502 Bad Gateway</html>").expect_err("should fail");
        assert!(matches!(err, RemoteError::Malformed { ref service, .. } if service == SERVICE));
    }

    #[test]
    fn test_parse_tolerates_unknown_type() {
        let body = r#"{"results": [
            {"label": "Bob", "type": "corp", "kos": true},
            {"label": "Bobby", "type": "pilot", "kos": false},
            {"label": "X", "type": "faction", "kos": false}
        ]}"#;
        let set = parse_record_set(body).expect("stray types should not fail the set");
        assert_eq!(set.results.len(), 3);
        assert_eq!(set.results[1].kind, EntityKind::Character);
        assert_eq!(set.results[2].kind, EntityKind::Unknown);
        let found = set.find_exact("Bob").expect("corp should match");
        assert!(found.kos);
    }
}
