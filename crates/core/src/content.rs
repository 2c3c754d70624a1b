//! Content store trait — the abstraction over document backing stores.
//!
//! A `ContentStore` resolves opaque refs to raw document text. Guidepost
//! never defines how documents are authored or persisted; it only depends
//! on fetch-by-ref. Implementations: filesystem, in-memory (for testing).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ContentError;

/// One loaded document, immutable for the rest of the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentUnit {
    /// The opaque locator this unit was loaded from.
    #[serde(rename = "ref")]
    pub ref_: String,

    /// The document text.
    pub body: String,

    /// Size in characters, used for budget decisions.
    pub chars: usize,

    /// When this unit was fetched from the backing store.
    pub loaded_at: DateTime<Utc>,

    /// SHA-256 hex digest of the body. Cache validity is decided by digest
    /// comparison, never by age.
    pub digest: String,
}

/// The core ContentStore trait.
///
/// `fetch` must be idempotent and side-effect-free: the loader relies on
/// this to make cache eviction and retry safe at any time.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// The store name (e.g., "fs", "in_memory").
    fn name(&self) -> &str;

    /// Fetch the raw text for a ref.
    ///
    /// A missing document is `ContentError::NotFound` — never an empty
    /// string substituted silently.
    async fn fetch(&self, ref_: &str) -> std::result::Result<String, ContentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_unit_serialization() {
        let unit = ContentUnit {
            ref_: "sql/optimizer.md".into(),
            body: "# Query Optimization\n".into(),
            chars: 21,
            loaded_at: Utc::now(),
            digest: "abc123".into(),
        };
        let json = serde_json::to_string(&unit).unwrap();
        assert!(json.contains("\"ref\""));
        assert!(json.contains("Query Optimization"));
    }
}
