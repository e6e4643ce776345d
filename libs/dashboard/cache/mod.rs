//! Query cache and its invalidation bridge
//!
//! The view layer keeps fetched query results under hierarchical keys
//! (`["orders"]`, `["order", "64f..."]`). Real-time events mark buckets stale
//! so the view layer refetches them.

pub mod bridge;

pub use bridge::CacheInvalidationBridge;

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::broadcast;
use tracing::debug;

/// Buffer of the invalidation feed
const INVALIDATION_BUFFER: usize = 128;

/// Hierarchical query key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    /// Single-segment key for a bucket
    pub fn bucket(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// Append a segment
    pub fn with(mut self, part: impl Into<String>) -> Self {
        self.0.push(part.into());
        self
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Whether `self` falls under `prefix`
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Cache the bridge invalidates
pub trait QueryCache: Send + Sync {
    /// Mark every entry under `key` stale
    fn invalidate(&self, key: &QueryKey);
}

#[derive(Debug, Clone)]
struct Slot {
    data: Value,
    stale: bool,
}

/// In-process query cache
///
/// Invalidation is by prefix: invalidating `["orders"]` also marks
/// `["orders", "page", "2"]` stale. Each invalidation is counted per key
/// and announced on a broadcast feed for refetchers.
pub struct InMemoryQueryCache {
    entries: RwLock<HashMap<QueryKey, Slot>>,
    generations: RwLock<HashMap<QueryKey, u64>>,
    invalidated_tx: broadcast::Sender<QueryKey>,
}

impl InMemoryQueryCache {
    pub fn new() -> Self {
        let (invalidated_tx, _) = broadcast::channel(INVALIDATION_BUFFER);
        Self {
            entries: RwLock::new(HashMap::new()),
            generations: RwLock::new(HashMap::new()),
            invalidated_tx,
        }
    }

    /// Store a freshly fetched result
    pub fn set(&self, key: QueryKey, data: Value) {
        self.entries.write().insert(key, Slot { data, stale: false });
    }

    pub fn get(&self, key: &QueryKey) -> Option<Value> {
        self.entries.read().get(key).map(|slot| slot.data.clone())
    }

    /// True for stored entries awaiting a refetch
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.entries
            .read()
            .get(key)
            .map(|slot| slot.stale)
            .unwrap_or(false)
    }

    /// Number of times `key` itself was invalidated
    pub fn generation(&self, key: &QueryKey) -> u64 {
        self.generations.read().get(key).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Feed of invalidated keys
    pub fn invalidations(&self) -> broadcast::Receiver<QueryKey> {
        self.invalidated_tx.subscribe()
    }
}

impl Default for InMemoryQueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache for InMemoryQueryCache {
    fn invalidate(&self, key: &QueryKey) {
        let mut marked = 0;
        for (stored, slot) in self.entries.write().iter_mut() {
            if stored.starts_with(key) {
                slot.stale = true;
                marked += 1;
            }
        }
        *self.generations.write().entry(key.clone()).or_insert(0) += 1;

        debug!("Invalidated {} ({} cached entries)", key, marked);
        let _ = self.invalidated_tx.send(key.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prefix_invalidation() {
        let cache = InMemoryQueryCache::new();
        let orders = QueryKey::bucket("orders");
        let page = QueryKey::bucket("orders").with("page").with("2");
        let stats = QueryKey::bucket("orderStats");

        cache.set(orders.clone(), json!([]));
        cache.set(page.clone(), json!([]));
        cache.set(stats.clone(), json!({}));

        cache.invalidate(&orders);

        assert!(cache.is_stale(&orders));
        assert!(cache.is_stale(&page));
        assert!(!cache.is_stale(&stats));
        assert_eq!(cache.generation(&orders), 1);
        assert_eq!(cache.generation(&page), 0);
    }

    #[test]
    fn test_set_clears_stale_flag() {
        let cache = InMemoryQueryCache::new();
        let key = QueryKey::bucket("reviews");
        cache.set(key.clone(), json!([1]));
        cache.invalidate(&key);
        assert!(cache.is_stale(&key));

        cache.set(key.clone(), json!([1, 2]));
        assert!(!cache.is_stale(&key));
        assert_eq!(cache.get(&key), Some(json!([1, 2])));
    }

    #[test]
    fn test_invalidating_unknown_key_is_announced() {
        let cache = InMemoryQueryCache::new();
        let mut feed = cache.invalidations();
        let key = QueryKey::bucket("order").with("o1");

        cache.invalidate(&key);

        assert!(cache.is_empty());
        assert_eq!(feed.try_recv().unwrap(), key);
        assert_eq!(key.to_string(), "[order, o1]");
    }
}
