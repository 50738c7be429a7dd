//! Short-lived caching of position snapshots.
//!
//! Conversational "where is my tram" commands can arrive in bursts. Caching
//! the snapshot for a few seconds lets them share one upstream fetch while
//! staying fresh enough to be useful. The poller does not use this cache.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use moka::future::Cache as MokaCache;

use crate::domain::PositionReport;
use crate::tram::{PositionSource, TramError};

type SnapshotEntry = Arc<Vec<PositionReport>>;

/// Configuration for the snapshot cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for a cached snapshot.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(15),
        }
    }
}

/// Position source with a single-entry TTL cache in front.
pub struct CachedPositionSource {
    inner: Arc<dyn PositionSource>,
    snapshot: MokaCache<(), SnapshotEntry>,
}

impl CachedPositionSource {
    pub fn new(inner: Arc<dyn PositionSource>, config: &CacheConfig) -> Self {
        let snapshot = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(1)
            .build();
        Self { inner, snapshot }
    }

    /// Current snapshot, fetching upstream on a miss.
    ///
    /// Concurrent misses are coalesced into one fetch. Failures are not cached.
    pub async fn get(&self) -> Result<SnapshotEntry, TramError> {
        self.snapshot
            .try_get_with((), async {
                self.inner.fetch_positions().await.map(Arc::new)
            })
            .await
            .map_err(|e: Arc<TramError>| {
                Arc::try_unwrap(e).unwrap_or_else(|shared| shared.duplicate())
            })
    }

    /// Drop the cached snapshot.
    pub fn invalidate(&self) {
        self.snapshot.invalidate_all();
    }
}

impl PositionSource for CachedPositionSource {
    fn fetch_positions(&self) -> BoxFuture<'_, Result<Vec<PositionReport>, TramError>> {
        Box::pin(async move { self.get().await.map(|s| s.as_ref().clone()) })
    }
}
