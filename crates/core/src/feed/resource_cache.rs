use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::ResolutionError;
use crate::feed::ResourceSource;
use crate::types::{Resource, ResourceKey};

pub type ResolvedResource = Arc<Resource>;

type InFlight = Shared<BoxFuture<'static, Result<ResolvedResource, ResolutionError>>>;

/// Session-scoped memo of auxiliary resources.
///
/// A key is requested from the source at most once while it resolves
/// successfully; concurrent lookups of the same key share one request.
/// Failures are not memoized.
pub struct AuxiliaryCache<R> {
    source: Arc<R>,
    inner: Mutex<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
    resolved: HashMap<ResourceKey, ResolvedResource>,
    in_flight: HashMap<ResourceKey, InFlight>,
    generation: u64,
    requests_issued: u64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub requested: usize,
    pub resolved: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl<R: ResourceSource> AuxiliaryCache<R> {
    pub fn new(source: Arc<R>) -> Self {
        Self {
            source,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn get(&self, key: &ResourceKey) -> Option<ResolvedResource> {
        self.inner.lock().resolved.get(key).cloned()
    }

    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.inner.lock().resolved.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn in_flight_count(&self) -> usize {
        self.inner.lock().in_flight.len()
    }

    pub fn requests_issued(&self) -> u64 {
        self.inner.lock().requests_issued
    }

    pub async fn resolve(&self, key: &ResourceKey) -> Result<ResolvedResource, ResolutionError> {
        let (request, generation) = {
            let mut inner = self.inner.lock();
            if let Some(value) = inner.resolved.get(key) {
                return Ok(value.clone());
            }
            let generation = inner.generation;
            let request = match inner.in_flight.get(key) {
                Some(pending) => pending.clone(),
                None => {
                    let pending = self.request(key.clone());
                    inner.in_flight.insert(key.clone(), pending.clone());
                    inner.requests_issued += 1;
                    pending
                }
            };
            (request, generation)
        };

        let result = request.clone().await;

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            debug!(%key, "discarding resolution from a cleared session");
            return result;
        }
        if inner
            .in_flight
            .get(key)
            .is_some_and(|pending| pending.ptr_eq(&request))
        {
            inner.in_flight.remove(key);
        }
        if let Ok(value) = &result {
            inner
                .resolved
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        result
    }

    pub async fn resolve_batch<I>(&self, keys: I) -> BatchStats
    where
        I: IntoIterator<Item = ResourceKey>,
    {
        let mut stats = BatchStats::default();
        let mut seen = HashSet::new();
        let mut pending = Vec::new();
        for key in keys {
            if !seen.insert(key.clone()) {
                continue;
            }
            if self.contains(&key) {
                stats.skipped += 1;
                continue;
            }
            pending.push(key);
        }
        stats.requested = pending.len();
        if pending.is_empty() {
            return stats;
        }

        let results = join_all(pending.iter().map(|key| self.resolve(key))).await;
        for (key, result) in pending.iter().zip(results) {
            match result {
                Ok(_) => stats.resolved += 1,
                Err(err) => {
                    stats.failed += 1;
                    warn!(error = %err, %key, "resource resolution failed");
                }
            }
        }
        debug!(?stats, "resource batch resolved");
        stats
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.resolved.clear();
        inner.in_flight.clear();
    }

    fn request(&self, key: ResourceKey) -> InFlight {
        let source = Arc::clone(&self.source);
        async move {
            match source.fetch_resource(&key).await {
                Ok(Some(resource)) => Ok(Arc::new(resource)),
                Ok(None) => Ok(Arc::new(Resource::Missing)),
                Err(err) => Err(ResolutionError {
                    key: key.to_string(),
                    message: err.to_string(),
                }),
            }
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use parking_lot::Mutex;

    use crate::error::FeedError;
    use crate::feed::ResourceSource;
    use crate::types::{ImageBlob, Resource, ResourceKey};

    #[derive(Default)]
    pub struct TableSource {
        pub table: Mutex<HashMap<ResourceKey, Result<Option<Resource>, FeedError>>>,
        pub calls: AtomicUsize,
        pub per_key: Mutex<HashMap<ResourceKey, usize>>,
    }

    impl TableSource {
        pub fn with_image(self, name: &str) -> Self {
            self.table.lock().insert(
                ResourceKey::ProfileImage(name.to_string()),
                Ok(Some(image(name))),
            );
            self
        }

        pub fn with_failure(self, key: ResourceKey) -> Self {
            self.table
                .lock()
                .insert(key, Err(FeedError::Network("unreachable".to_string())));
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn calls_for(&self, key: &ResourceKey) -> usize {
            self.per_key.lock().get(key).copied().unwrap_or(0)
        }
    }

    pub fn image(name: &str) -> Resource {
        Resource::Image(ImageBlob {
            mime: "image/png".to_string(),
            bytes: name.as_bytes().to_vec(),
        })
    }

    impl ResourceSource for TableSource {
        async fn fetch_resource(&self, key: &ResourceKey) -> Result<Option<Resource>, FeedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.per_key.lock().entry(key.clone()).or_default() += 1;
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.table.lock().get(key).cloned().unwrap_or(Ok(None))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::future::join_all;

    use super::testing::{TableSource, image};
    use super::*;

    fn avatar(name: &str) -> ResourceKey {
        ResourceKey::ProfileImage(name.to_string())
    }

    #[tokio::test]
    async fn concurrent_resolves_share_one_request() {
        let source = Arc::new(TableSource::default().with_image("a.png"));
        let cache = AuxiliaryCache::new(Arc::clone(&source));
        let key = avatar("a.png");
        let results = join_all((0..8).map(|_| cache.resolve(&key))).await;
        assert_eq!(source.call_count(), 1);
        for result in results {
            assert_eq!(*result.unwrap(), image("a.png"));
        }
        assert_eq!(cache.requests_issued(), 1);
        assert_eq!(cache.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn resolved_keys_are_not_fetched_again() {
        let source = Arc::new(TableSource::default().with_image("a.png"));
        let cache = AuxiliaryCache::new(Arc::clone(&source));
        cache.resolve(&avatar("a.png")).await.unwrap();
        cache.resolve(&avatar("a.png")).await.unwrap();
        let stats = cache.resolve_batch(vec![avatar("a.png")]).await;
        assert_eq!(stats.skipped, 1);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn not_found_is_memoized_as_missing() {
        let source = Arc::new(TableSource::default());
        let cache = AuxiliaryCache::new(Arc::clone(&source));
        let first = cache.resolve(&avatar("ghost.png")).await.unwrap();
        assert!(first.is_missing());
        cache.resolve(&avatar("ghost.png")).await.unwrap();
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn failures_are_retried_later() {
        let key = ResourceKey::Album("x1".to_string());
        let source = Arc::new(TableSource::default().with_failure(key.clone()));
        let cache = AuxiliaryCache::new(Arc::clone(&source));
        let err = cache.resolve(&key).await.unwrap_err();
        assert_eq!(err.key, "album:x1");
        assert!(!cache.contains(&key));
        assert!(cache.resolve(&key).await.is_err());
        assert_eq!(source.calls_for(&key), 2);
    }

    #[tokio::test]
    async fn overlapping_batches_dedupe_in_flight_keys() {
        let source = Arc::new(
            TableSource::default()
                .with_image("a.png")
                .with_image("b.png")
                .with_image("c.png"),
        );
        let cache = AuxiliaryCache::new(Arc::clone(&source));
        let first = cache.resolve_batch(vec![avatar("a.png"), avatar("b.png"), avatar("a.png")]);
        let second = cache.resolve_batch(vec![avatar("b.png"), avatar("c.png")]);
        let (first, second) = futures::join!(first, second);
        assert_eq!(first.requested, 2);
        assert_eq!(second.requested, 2);
        assert_eq!(source.calls_for(&avatar("b.png")), 1);
        assert_eq!(source.call_count(), 3);
        assert_eq!(cache.len(), 3);
    }

    #[tokio::test]
    async fn batch_counts_failures_without_aborting() {
        let bad = ResourceKey::Album("broken".to_string());
        let source = Arc::new(
            TableSource::default()
                .with_image("a.png")
                .with_failure(bad.clone()),
        );
        let cache = AuxiliaryCache::new(Arc::clone(&source));
        let stats = cache.resolve_batch(vec![avatar("a.png"), bad]).await;
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.failed, 1);
        assert!(cache.contains(&avatar("a.png")));
    }

    #[tokio::test]
    async fn clear_discards_in_flight_results() {
        let source = Arc::new(TableSource::default().with_image("a.png"));
        let cache = AuxiliaryCache::new(Arc::clone(&source));
        let key = avatar("a.png");
        let pending = cache.resolve(&key);
        let clear = async {
            tokio::task::yield_now().await;
            cache.clear();
        };
        let (result, ()) = futures::join!(pending, clear);
        assert!(result.is_ok());
        assert!(cache.is_empty());
    }
}
