//! In-memory content store — useful for testing and fixtures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use guidepost_core::content::ContentStore;
use guidepost_core::error::ContentError;

/// A store backed by a fixed map of documents.
///
/// Counts fetches so tests can assert how often the backing store was
/// actually consulted.
pub struct InMemoryStore {
    docs: HashMap<String, String>,
    fetches: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            docs: HashMap::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Add a document under a ref.
    pub fn with_doc(mut self, ref_: impl Into<String>, body: impl Into<String>) -> Self {
        self.docs.insert(ref_.into(), body.into());
        self
    }

    /// How many fetches reached this store.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn fetch(&self, ref_: &str) -> Result<String, ContentError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.docs
            .get(ref_)
            .cloned()
            .ok_or_else(|| ContentError::NotFound {
                ref_: ref_.to_string(),
            })
    }
}
