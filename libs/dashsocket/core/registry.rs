//! Subscription Registry
//!
//! Maps event-type keys to ordered sets of listener callbacks.
//!
//! - Registering the same `Arc` twice under one key stores it once; each
//!   registration is reference-counted and released by its own guard.
//! - A key disappears from the map as soon as its last listener leaves.
//! - Fan-out runs outside the lock, so listeners may subscribe or
//!   unsubscribe from inside a callback.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error};

/// Listener callback
pub type Callback = Arc<dyn Fn(&Value) + Send + Sync>;

struct Entry {
    id: u64,
    callback: Callback,
    registrations: usize,
}

#[derive(Default)]
struct RegistryInner {
    listeners: Mutex<HashMap<String, Vec<Entry>>>,
    next_id: AtomicU64,
}

/// Event-type key to listener map
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct SubscriptionRegistry {
    inner: Arc<RegistryInner>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` under `key`
    ///
    /// The returned guard releases this registration when dropped or when
    /// [`Subscription::unsubscribe`] is called.
    pub fn subscribe(&self, key: impl Into<String>, callback: Callback) -> Subscription {
        let key = key.into();
        let mut listeners = self.inner.listeners.lock();
        let entries = listeners.entry(key.clone()).or_default();

        let id = match entries.iter_mut().find(|e| Arc::ptr_eq(&e.callback, &callback)) {
            Some(existing) => {
                existing.registrations += 1;
                existing.id
            }
            None => {
                let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                entries.push(Entry {
                    id,
                    callback,
                    registrations: 1,
                });
                id
            }
        };
        debug!("Subscribed listener {} to '{}'", id, key);

        Subscription {
            registry: Arc::downgrade(&self.inner),
            key,
            id,
            active: true,
        }
    }

    /// Convenience wrapper taking a plain closure
    pub fn subscribe_fn<F>(&self, key: impl Into<String>, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.subscribe(key, Arc::new(callback))
    }

    /// Invoke every listener under `key` with `value`, in insertion order
    ///
    /// A panicking listener is logged and skipped; the rest still run.
    /// Returns the number of listeners invoked.
    pub fn notify(&self, key: &str, value: &Value) -> usize {
        let callbacks: Vec<Callback> = match self.inner.listeners.lock().get(key) {
            Some(entries) => entries.iter().map(|e| Arc::clone(&e.callback)).collect(),
            None => return 0,
        };

        for callback in &callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(value))).is_err() {
                error!("Error in subscriber callback for '{}'", key);
            }
        }
        callbacks.len()
    }

    /// Number of distinct listeners under `key`
    pub fn subscriber_count(&self, key: &str) -> usize {
        self.inner.listeners.lock().get(key).map_or(0, Vec::len)
    }

    /// Whether `key` currently has an entry in the map
    pub fn has_key(&self, key: &str) -> bool {
        self.inner.listeners.lock().contains_key(key)
    }

    /// Number of keys in the map
    pub fn key_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }
}

impl RegistryInner {
    fn release(&self, key: &str, id: u64) {
        let mut listeners = self.listeners.lock();
        let Some(entries) = listeners.get_mut(key) else {
            return;
        };
        if let Some(pos) = entries.iter().position(|e| e.id == id) {
            entries[pos].registrations -= 1;
            if entries[pos].registrations == 0 {
                entries.remove(pos);
                debug!("Unsubscribed listener {} from '{}'", id, key);
            }
        }
        if entries.is_empty() {
            listeners.remove(key);
        }
    }
}

/// Disposer for one registration
///
/// Releases on drop; explicit `unsubscribe` is idempotent.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    registry: Weak<RegistryInner>,
    key: String,
    id: u64,
    active: bool,
}

impl Subscription {
    /// Release this registration; later calls are no-ops
    pub fn unsubscribe(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(registry) = self.registry.upgrade() {
            registry.release(&self.key, self.id);
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, Callback) {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_cb = Arc::clone(&hits);
        let cb: Callback = Arc::new(move |_| {
            hits_cb.fetch_add(1, Ordering::SeqCst);
        });
        (hits, cb)
    }

    #[test]
    fn test_same_callback_is_stored_once() {
        let registry = SubscriptionRegistry::new();
        let (hits, cb) = counter();

        let mut first = registry.subscribe("new_order", Arc::clone(&cb));
        let _second = registry.subscribe("new_order", Arc::clone(&cb));
        assert_eq!(registry.subscriber_count("new_order"), 1);

        registry.notify("new_order", &json!({}));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        first.unsubscribe();
        assert_eq!(registry.subscriber_count("new_order"), 1);
        registry.notify("new_order", &json!({}));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_distinct_closures_are_not_deduplicated() {
        let registry = SubscriptionRegistry::new();
        let (_, a) = counter();
        let (_, b) = counter();
        let _a = registry.subscribe("k", a);
        let _b = registry.subscribe("k", b);
        assert_eq!(registry.subscriber_count("k"), 2);
    }

    #[test]
    fn test_last_unsubscribe_removes_key() {
        let registry = SubscriptionRegistry::new();
        let (hits, cb) = counter();

        let mut sub = registry.subscribe("new_review", Arc::clone(&cb));
        sub.unsubscribe();
        assert!(!registry.has_key("new_review"));
        assert_eq!(registry.key_count(), 0);

        let _again = registry.subscribe("new_review", cb);
        assert_eq!(registry.subscriber_count("new_review"), 1);
        registry.notify("new_review", &json!(null));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_twice_is_noop() {
        let registry = SubscriptionRegistry::new();
        let (_, a) = counter();
        let (_, b) = counter();
        let mut sub_a = registry.subscribe("k", a);
        let _sub_b = registry.subscribe("k", b);

        sub_a.unsubscribe();
        sub_a.unsubscribe();
        assert!(!sub_a.is_active());
        assert_eq!(registry.subscriber_count("k"), 1);
    }

    #[test]
    fn test_drop_releases_registration() {
        let registry = SubscriptionRegistry::new();
        {
            let _sub = registry.subscribe_fn("connected", |_| {});
            assert!(registry.has_key("connected"));
        }
        assert!(!registry.has_key("connected"));
    }

    #[test]
    fn test_panicking_listener_does_not_stop_fan_out() {
        let registry = SubscriptionRegistry::new();
        let (hits, b) = counter();
        let _a = registry.subscribe_fn("new_order", |_| panic!("listener failure"));
        let _b = registry.subscribe("new_order", b);

        let invoked = registry.notify("new_order", &json!({"orderNumber": "1"}));
        assert_eq!(invoked, 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fan_out_in_insertion_order() {
        let registry = SubscriptionRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let subs: Vec<Subscription> = (0..4)
            .map(|i| {
                let order = Arc::clone(&order);
                registry.subscribe_fn("k", move |_| order.lock().push(i))
            })
            .collect();

        registry.notify("k", &json!(1));
        assert_eq!(*order.lock(), vec![0, 1, 2, 3]);
        drop(subs);
    }

    #[test]
    fn test_listener_may_unsubscribe_during_fan_out() {
        let registry = SubscriptionRegistry::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let slot_cb = Arc::clone(&slot);
        let sub = registry.subscribe_fn("k", move |_| {
            if let Some(mut own) = slot_cb.lock().take() {
                own.unsubscribe();
            }
        });
        *slot.lock() = Some(sub);

        registry.notify("k", &json!(null));
        assert!(!registry.has_key("k"));
    }
}
