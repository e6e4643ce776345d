//! Message Router
//!
//! Decodes inbound frames, runs the type-specific side effect and fans the
//! payload out to the registry exactly once per recognized frame.
//!
//! ```text
//! raw text → InboundFrame → EventKind ─┬─ NewOrder / NewBooking → desktop notification
//!                                      ├─ known kinds           → registry.notify(type, payload)
//!                                      └─ Other(type)           → logged, dropped
//! ```

use crate::core::events::{BookingPayload, EventKind, OrderPayload};
use crate::core::registry::SubscriptionRegistry;
use crate::traits::{DesktopNotifier, InboundFrame, Permission};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of routing one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Recognized frame; payload delivered to this many listeners
    Dispatched { kind: EventKind, listeners: usize },
    /// Well-formed frame with an unrecognized type
    Ignored(String),
    /// Frame could not be decoded
    Malformed,
}

/// Desktop notification text for a recognized event
///
/// Only new orders and new bookings produce one.
pub fn desktop_notification(kind: &EventKind, payload: &Value) -> Option<(String, String)> {
    match kind {
        EventKind::NewOrder => {
            let order = OrderPayload::from_value(payload);
            Some((
                "New Order Received".to_string(),
                format!("Order #{} from {}", order.order_number(), order.customer_name()),
            ))
        }
        EventKind::NewBooking => {
            let booking = BookingPayload::from_value(payload);
            Some((
                "New Booking Received".to_string(),
                format!("{} booked for {} guests", booking.customer_name(), booking.guests()),
            ))
        }
        _ => None,
    }
}

/// Routes decoded frames to the registry
pub struct MessageRouter {
    registry: SubscriptionRegistry,
    notifier: Arc<dyn DesktopNotifier>,
}

impl MessageRouter {
    pub fn new(registry: SubscriptionRegistry, notifier: Arc<dyn DesktopNotifier>) -> Self {
        Self { registry, notifier }
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    pub fn notifier(&self) -> &Arc<dyn DesktopNotifier> {
        &self.notifier
    }

    /// Handle one raw text frame
    ///
    /// Never fails: malformed frames and unknown types are logged and dropped.
    pub fn handle_message(&self, raw: &str) -> RouteOutcome {
        let frame = match InboundFrame::parse(raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to parse WebSocket message: {}", e);
                return RouteOutcome::Malformed;
            }
        };

        match EventKind::parse(&frame.kind) {
            EventKind::Other(kind) => {
                info!("Unknown WebSocket message type: {}", kind);
                RouteOutcome::Ignored(kind)
            }
            kind => {
                let listeners = self.dispatch(&kind, &frame.payload);
                RouteOutcome::Dispatched { kind, listeners }
            }
        }
    }

    /// Run the side effect for `kind`, then fan out once
    fn dispatch(&self, kind: &EventKind, payload: &Value) -> usize {
        match kind {
            EventKind::NewOrder => {
                debug!("New order received: {}", payload);
                self.show_desktop_notification(kind, payload);
            }
            EventKind::OrderUpdated => debug!("Order updated: {}", payload),
            EventKind::NewBooking => {
                debug!("New booking received: {}", payload);
                self.show_desktop_notification(kind, payload);
            }
            EventKind::BookingUpdated => debug!("Booking updated: {}", payload),
            EventKind::NewReview => debug!("New review received: {}", payload),
            EventKind::Notification => debug!("Notification: {}", payload),
            EventKind::Other(_) => {}
        }

        self.registry.notify(kind.as_str(), payload)
    }

    fn show_desktop_notification(&self, kind: &EventKind, payload: &Value) {
        if self.notifier.permission() != Permission::Granted {
            return;
        }
        let Some((title, body)) = desktop_notification(kind, payload) else {
            return;
        };
        if let Err(e) = self.notifier.show(&title, &body) {
            warn!("Desktop notification failed: {}", e);
        }
    }
}
