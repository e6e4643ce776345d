//! Notification Surfacer
//!
//! Keeps the bounded, newest-first log of user-facing notifications built
//! from routed events, with an unread counter. Every inserted record is also
//! published on a broadcast feed for transient toasts.
//!
//! The log and counter are only mutated through `mark_read`,
//! `mark_all_read`, `clear` and the event subscriptions made by `attach`.

pub mod record;

pub use record::{badge_label, format_age, NotificationKind, NotificationRecord};

use crate::core::events::EventKind;
use crate::core::registry::{Subscription, SubscriptionRegistry};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Default number of records kept
pub const DEFAULT_CAPACITY: usize = 50;

/// Buffer of the toast feed
const TOAST_BUFFER: usize = 64;

/// Event kinds the surfacer listens to
pub const SURFACED_EVENTS: [EventKind; 4] = [
    EventKind::NewOrder,
    EventKind::OrderUpdated,
    EventKind::NewBooking,
    EventKind::NewReview,
];

#[derive(Default)]
struct Log {
    records: VecDeque<NotificationRecord>,
    /// Always the number of unread records held
    unread: usize,
    last_id: u64,
}

/// Bounded notification log with read/unread state
pub struct NotificationCenter {
    log: Mutex<Log>,
    capacity: usize,
    toast_tx: broadcast::Sender<NotificationRecord>,
}

impl NotificationCenter {
    pub fn new(capacity: usize) -> Self {
        let (toast_tx, _) = broadcast::channel(TOAST_BUFFER);
        Self {
            log: Mutex::new(Log::default()),
            capacity: capacity.max(1),
            toast_tx,
        }
    }

    /// Subscribe to every surfaced event kind on `registry`
    ///
    /// Drop (or unsubscribe) the returned guards to detach.
    pub fn attach(self: &Arc<Self>, registry: &SubscriptionRegistry) -> Vec<Subscription> {
        SURFACED_EVENTS
            .iter()
            .map(|kind| {
                let center = Arc::clone(self);
                let event = kind.clone();
                registry.subscribe_fn(kind.as_str(), move |payload| {
                    center.record_event(&event, payload);
                })
            })
            .collect()
    }

    /// Turn a routed event into a record and insert it
    ///
    /// Returns `None` for kinds that are not surfaced.
    pub fn record_event(&self, kind: &EventKind, payload: &Value) -> Option<NotificationRecord> {
        self.record_event_at(kind, payload, Utc::now())
    }

    /// Same as `record_event` with an explicit timestamp
    pub fn record_event_at(
        &self,
        kind: &EventKind,
        payload: &Value,
        timestamp: DateTime<Utc>,
    ) -> Option<NotificationRecord> {
        let record = {
            let mut log = self.log.lock();
            // Time-derived, bumped to stay strictly increasing
            let millis = u64::try_from(timestamp.timestamp_millis()).unwrap_or(0);
            let id = millis.max(log.last_id + 1);

            let record = NotificationRecord::from_event(kind, payload, id, timestamp)?;
            log.last_id = id;
            log.records.push_front(record.clone());
            log.unread += 1;
            while log.records.len() > self.capacity {
                if let Some(evicted) = log.records.pop_back() {
                    if !evicted.read {
                        log.unread = log.unread.saturating_sub(1);
                    }
                }
            }
            record
        };

        debug!("Notification {}: {}", record.id, record.message);
        // No receivers is fine: toasts are best-effort
        let _ = self.toast_tx.send(record.clone());
        Some(record)
    }

    /// Mark one record read
    ///
    /// Returns false when the id is unknown or the record was already read.
    pub fn mark_read(&self, id: u64) -> bool {
        let mut log = self.log.lock();
        let Some(record) = log.records.iter_mut().find(|r| r.id == id) else {
            return false;
        };
        if record.read {
            return false;
        }
        record.read = true;
        log.unread = log.unread.saturating_sub(1);
        true
    }

    pub fn mark_all_read(&self) {
        let mut log = self.log.lock();
        for record in log.records.iter_mut() {
            record.read = true;
        }
        log.unread = 0;
    }

    /// Empty the log and zero the counter
    pub fn clear(&self) {
        let mut log = self.log.lock();
        log.records.clear();
        log.unread = 0;
    }

    /// Snapshot of the log, newest first
    pub fn records(&self) -> Vec<NotificationRecord> {
        self.log.lock().records.iter().cloned().collect()
    }

    pub fn get(&self, id: u64) -> Option<NotificationRecord> {
        self.log.lock().records.iter().find(|r| r.id == id).cloned()
    }

    pub fn unread_count(&self) -> usize {
        self.log.lock().unread
    }

    pub fn badge(&self) -> String {
        badge_label(self.unread_count())
    }

    pub fn len(&self) -> usize {
        self.log.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.lock().records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Feed of inserted records, for transient toasts
    pub fn toasts(&self) -> broadcast::Receiver<NotificationRecord> {
        self.toast_tx.subscribe()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
