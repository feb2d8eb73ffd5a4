use crate::aggregator::FeedSource;
use crate::clock::{ttl_from_secs, Clock, SystemClock};
use crate::types::{NewsItem, TopicCacheEntry};
use chrono::Duration;
use futures::future::join_all;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Per-key item cache with a time-to-live.
///
/// A read within the TTL never touches the source. When a refetch fails the
/// previous entry is served as-is, and a key that never loaded reads as empty.
/// The lock is never held while the source is running, so concurrent misses
/// on one key may each fetch; the last one to finish wins.
pub struct TopicCache<S, C = SystemClock> {
    source: S,
    clock: C,
    ttl: Duration,
    entries: RwLock<HashMap<String, TopicCacheEntry>>,
}

impl<S: FeedSource> TopicCache<S, SystemClock> {
    pub fn new(source: S, ttl_seconds: u64) -> Self {
        Self::with_clock(source, ttl_seconds, SystemClock)
    }
}

impl<S: FeedSource, C: Clock> TopicCache<S, C> {
    pub fn with_clock(source: S, ttl_seconds: u64, clock: C) -> Self {
        Self {
            source,
            clock,
            ttl: ttl_from_secs(ttl_seconds),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cached items while fresh, otherwise whatever a refetch yields.
    pub async fn get(&self, key: &str) -> Vec<NewsItem> {
        if let Some(items) = self.fresh_items(key).await {
            debug!("Cache hit for {}", key);
            return items;
        }
        self.load(key).await
    }

    /// Refetch regardless of age. Failure semantics match [`TopicCache::get`].
    pub async fn refresh(&self, key: &str) -> Vec<NewsItem> {
        self.load(key).await
    }

    /// `get` (or `refresh` when forced) for each key, concurrently.
    /// Results come back in the order the keys were given.
    pub async fn ensure_fresh<K: AsRef<str>>(&self, keys: &[K], force: bool) -> Vec<(String, Vec<NewsItem>)> {
        let loads = keys.iter().map(|key| async move {
            let key = key.as_ref();
            let items = if force { self.refresh(key).await } else { self.get(key).await };
            (key.to_string(), items)
        });
        join_all(loads).await
    }

    pub async fn entry(&self, key: &str) -> Option<TopicCacheEntry> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn fresh_items(&self, key: &str) -> Option<Vec<NewsItem>> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        let age = self.clock.now().signed_duration_since(entry.fetched_at);
        (age < self.ttl).then(|| entry.items.clone())
    }

    async fn load(&self, key: &str) -> Vec<NewsItem> {
        match self.source.fetch(key).await {
            Ok(items) => {
                let entry = TopicCacheEntry {
                    topic: key.to_string(),
                    items: items.clone(),
                    fetched_at: self.clock.now(),
                };
                self.entries.write().await.insert(key.to_string(), entry);
                info!("Cached {} items for {}", items.len(), key);
                items
            }
            Err(e) => match self.entry(key).await {
                Some(stale) => {
                    warn!("Refetch of {} failed, serving entry from {}: {}", key, stale.fetched_at, e);
                    stale.items
                }
                None => {
                    warn!("Fetch of {} failed with nothing cached: {}", key, e);
                    Vec::new()
                }
            },
        }
    }
}
