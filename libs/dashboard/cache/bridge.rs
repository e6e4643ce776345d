//! Cache-Invalidation Bridge
//!
//! Subscribes to routed events and invalidates the configured buckets.

use super::{QueryCache, QueryKey};
use crate::config::BucketSpec;
use dashsocket::events::field_text;
use dashsocket::{Subscription, SubscriptionRegistry};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub struct CacheInvalidationBridge {
    cache: Arc<dyn QueryCache>,
    buckets: Arc<BTreeMap<String, Vec<BucketSpec>>>,
}

impl CacheInvalidationBridge {
    pub fn new(cache: Arc<dyn QueryCache>, buckets: BTreeMap<String, Vec<BucketSpec>>) -> Self {
        Self {
            cache,
            buckets: Arc::new(buckets),
        }
    }

    /// Subscribe one listener per configured event type
    ///
    /// The bridge stays attached for as long as the returned guards live.
    pub fn attach(&self, registry: &SubscriptionRegistry) -> Vec<Subscription> {
        self.buckets
            .keys()
            .map(|event| {
                let cache = Arc::clone(&self.cache);
                let buckets = Arc::clone(&self.buckets);
                let event_key = event.clone();
                registry.subscribe_fn(event.clone(), move |payload| {
                    invalidate_buckets(cache.as_ref(), &buckets, &event_key, payload);
                })
            })
            .collect()
    }

    /// Invalidate the buckets of `event` directly
    pub fn invalidate_for(&self, event: &str, payload: &Value) -> Vec<QueryKey> {
        invalidate_buckets(self.cache.as_ref(), &self.buckets, event, payload)
    }

    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }
}

/// Key for one bucket under `payload`
///
/// A keyed bucket whose field is absent falls back to the whole bucket.
pub fn bucket_key(bucket: &BucketSpec, payload: &Value) -> QueryKey {
    let key = QueryKey::bucket(bucket.name.clone());
    match bucket
        .key_field
        .as_deref()
        .and_then(|field| field_text(payload.get(field)))
    {
        Some(id) => key.with(id),
        None => key,
    }
}

fn invalidate_buckets(
    cache: &dyn QueryCache,
    buckets: &BTreeMap<String, Vec<BucketSpec>>,
    event: &str,
    payload: &Value,
) -> Vec<QueryKey> {
    let Some(specs) = buckets.get(event) else {
        return Vec::new();
    };

    let keys: Vec<QueryKey> = specs.iter().map(|spec| bucket_key(spec, payload)).collect();
    for key in &keys {
        cache.invalidate(key);
    }
    debug!("{} invalidated {} bucket(s)", event, keys.len());
    keys
}
