//! Content loader — resolves refs to materialized content units.
//!
//! Sits between the router and the backing `ContentStore`. Responsibilities:
//!
//! 1. **Caching** — a bounded concurrent cache keyed by ref. Eviction is
//!    safe at any time because fetches are idempotent and side-effect-free.
//! 2. **Single-flight** — concurrent loads of one uncached ref share a
//!    single fetch. The fetch future lives only as long as its waiters: one
//!    caller abandoning the load never tears it down for the others, and
//!    when the last waiter departs the fetch is dropped with it.
//! 3. **Validity** — every unit carries a SHA-256 digest; a cached unit is
//!    replaced on explicit `invalidate`, never aged out by time alone.

mod fs_store;
mod in_memory;

pub use fs_store::FsContentStore;
pub use in_memory::InMemoryStore;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use guidepost_core::content::{ContentStore, ContentUnit};
use guidepost_core::error::ContentError;
use mini_moka::sync::Cache;
use sha2::{Digest, Sha256};
use tracing::debug;

type FetchResult = std::result::Result<Arc<ContentUnit>, ContentError>;
type FetchFuture = Shared<BoxFuture<'static, FetchResult>>;
type WeakFetch = WeakShared<BoxFuture<'static, FetchResult>>;

/// Loader tuning.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Maximum number of cached content units.
    pub cache_capacity: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 256,
        }
    }
}

/// Resolves refs through a bounded cache with single-flight fetches.
///
/// Cheap to share: `Arc<ContentLoader>` across however many concurrent
/// requests the process serves.
pub struct ContentLoader {
    store: Arc<dyn ContentStore>,
    cache: Cache<String, Arc<ContentUnit>>,
    in_flight: Arc<Mutex<HashMap<String, WeakFetch>>>,
}

impl ContentLoader {
    pub fn new(store: Arc<dyn ContentStore>, config: LoaderConfig) -> Self {
        Self {
            store,
            cache: Cache::builder().max_capacity(config.cache_capacity).build(),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Load a unit, from cache when possible.
    ///
    /// Idempotent: two loads without an intervening `invalidate` return
    /// units with the same digest.
    pub async fn load(&self, ref_: &str) -> FetchResult {
        if let Some(unit) = self.cache.get(&ref_.to_string()) {
            debug!(content_ref = ref_, "Cache hit");
            return Ok(unit);
        }
        self.obtain_fetch(ref_).await
    }

    /// Load with an upper bound on how long the backing fetch may take.
    ///
    /// On expiry the caller's wait ends with `ContentError::Timeout`;
    /// other waiters sharing the fetch are unaffected.
    pub async fn load_with_timeout(&self, ref_: &str, timeout: Duration) -> FetchResult {
        match tokio::time::timeout(timeout, self.load(ref_)).await {
            Ok(result) => result,
            Err(_) => Err(ContentError::Timeout {
                ref_: ref_.to_string(),
                secs: timeout.as_secs(),
            }),
        }
    }

    /// Drop any cached unit for this ref; the next load refetches.
    pub fn invalidate(&self, ref_: &str) {
        self.cache.invalidate(&ref_.to_string());
        self.lock_in_flight().remove(ref_);
        debug!(content_ref = ref_, "Invalidated");
    }

    /// Number of cached units (approximate under concurrency).
    pub fn cached_units(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Join an in-flight fetch for this ref, or start one.
    fn obtain_fetch(&self, ref_: &str) -> FetchFuture {
        let mut in_flight = self.lock_in_flight();

        if let Some(weak) = in_flight.get(ref_) {
            if let Some(shared) = weak.upgrade() {
                debug!(content_ref = ref_, "Joining in-flight fetch");
                return shared;
            }
        }

        let key = ref_.to_string();
        let store = Arc::clone(&self.store);
        let cache = self.cache.clone();
        let registry = Arc::clone(&self.in_flight);

        let fetch = async move {
            let result = fetch_unit(store.as_ref(), &key).await;
            if let Ok(unit) = &result {
                cache.insert(key.clone(), Arc::clone(unit));
            }
            registry
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .remove(&key);
            result
        }
        .boxed()
        .shared();

        let weak = fetch
            .downgrade()
            .expect("a freshly created shared future has not completed");
        in_flight.insert(ref_.to_string(), weak);

        fetch
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashMap<String, WeakFetch>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Fetch from the store and wrap into a digested unit.
async fn fetch_unit(store: &dyn ContentStore, ref_: &str) -> FetchResult {
    let body = store.fetch(ref_).await?;

    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    let digest = hex::encode(hasher.finalize());

    debug!(content_ref = ref_, chars = body.len(), "Fetched content");

    Ok(Arc::new(ContentUnit {
        ref_: ref_.to_string(),
        chars: body.chars().count(),
        body,
        loaded_at: Utc::now(),
        digest,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A store that counts fetches and can be slowed down to hold a fetch
    /// open while other callers pile in.
    struct CountingStore {
        docs: HashMap<String, String>,
        delay: Duration,
        fetches: AtomicUsize,
    }

    impl CountingStore {
        fn new(docs: &[(&str, &str)]) -> Self {
            Self {
                docs: docs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                delay: Duration::ZERO,
                fetches: AtomicUsize::new(0),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentStore for CountingStore {
        fn name(&self) -> &str {
            "counting"
        }

        async fn fetch(&self, ref_: &str) -> Result<String, ContentError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.docs
                .get(ref_)
                .cloned()
                .ok_or_else(|| ContentError::NotFound {
                    ref_: ref_.to_string(),
                })
        }
    }

    /// A store that hangs forever (for timeout testing).
    struct HangingStore;

    #[async_trait]
    impl ContentStore for HangingStore {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn fetch(&self, _ref: &str) -> Result<String, ContentError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!()
        }
    }

    fn loader_over(store: CountingStore) -> (Arc<CountingStore>, ContentLoader) {
        let store = Arc::new(store);
        let loader = ContentLoader::new(store.clone(), LoaderConfig::default());
        (store, loader)
    }

    #[tokio::test]
    async fn load_returns_digested_unit() {
        let (_, loader) = loader_over(CountingStore::new(&[("sql/optimizer.md", "# Slow queries")]));

        let unit = loader.load("sql/optimizer.md").await.unwrap();
        assert_eq!(unit.ref_, "sql/optimizer.md");
        assert_eq!(unit.body, "# Slow queries");
        assert_eq!(unit.chars, 14);
        assert_eq!(unit.digest.len(), 64);
    }

    #[tokio::test]
    async fn second_load_hits_cache() {
        let (store, loader) = loader_over(CountingStore::new(&[("doc.md", "body")]));

        let first = loader.load("doc.md").await.unwrap();
        let second = loader.load("doc.md").await.unwrap();
        assert_eq!(first.digest, second.digest);
        assert_eq!(store.fetches(), 1);
    }

    #[tokio::test]
    async fn missing_ref_surfaces_not_found() {
        let (_, loader) = loader_over(CountingStore::new(&[]));

        let err = loader.load("ghost.md").await.unwrap_err();
        assert_eq!(
            err,
            ContentError::NotFound {
                ref_: "ghost.md".into()
            }
        );
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let (store, loader) = loader_over(CountingStore::new(&[("doc.md", "body")]));

        loader.load("doc.md").await.unwrap();
        loader.invalidate("doc.md");
        loader.load("doc.md").await.unwrap();
        assert_eq!(store.fetches(), 2);
    }

    #[tokio::test]
    async fn concurrent_loads_share_one_fetch() {
        let (store, loader) = loader_over(
            CountingStore::new(&[("doc.md", "body")]).with_delay(Duration::from_millis(50)),
        );
        let loader = Arc::new(loader);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let loader = loader.clone();
            handles.push(tokio::spawn(async move { loader.load("doc.md").await }));
        }

        for handle in handles {
            let unit = handle.await.unwrap().unwrap();
            assert_eq!(unit.body, "body");
        }
        assert_eq!(store.fetches(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_is_not_cached() {
        let (store, loader) = loader_over(CountingStore::new(&[]));

        assert!(loader.load("ghost.md").await.is_err());
        assert!(loader.load("ghost.md").await.is_err());
        // Each load after a failure goes back to the store.
        assert_eq!(store.fetches(), 2);
        assert_eq!(loader.cached_units(), 0);
    }

    #[tokio::test]
    async fn timeout_surfaces_with_ref_name() {
        let loader = ContentLoader::new(Arc::new(HangingStore), LoaderConfig::default());

        let err = loader
            .load_with_timeout("slow.md", Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Timeout { .. }));
        assert_eq!(err.ref_(), "slow.md");
    }

    #[tokio::test]
    async fn abandoned_waiter_does_not_cancel_shared_fetch() {
        let (store, loader) = loader_over(
            CountingStore::new(&[("doc.md", "body")]).with_delay(Duration::from_millis(50)),
        );
        let loader = Arc::new(loader);

        // One caller gives up almost immediately; the other waits it out.
        let impatient = {
            let loader = loader.clone();
            tokio::spawn(async move {
                loader
                    .load_with_timeout("doc.md", Duration::from_millis(5))
                    .await
            })
        };
        let patient = {
            let loader = loader.clone();
            tokio::spawn(async move { loader.load("doc.md").await })
        };

        assert!(matches!(
            impatient.await.unwrap(),
            Err(ContentError::Timeout { .. })
        ));
        let unit = patient.await.unwrap().unwrap();
        assert_eq!(unit.body, "body");
        assert_eq!(store.fetches(), 1);
    }
}
