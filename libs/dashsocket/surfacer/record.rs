use crate::core::events::{BookingPayload, EventKind, OrderPayload, ReviewPayload};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Category of a surfaced notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Order,
    OrderUpdate,
    Booking,
    Review,
}

impl NotificationKind {
    /// Event kinds that produce a notification record
    ///
    /// `booking_updated` and `notification` are deliberately absent.
    pub fn for_event(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::NewOrder => Some(NotificationKind::Order),
            EventKind::OrderUpdated => Some(NotificationKind::OrderUpdate),
            EventKind::NewBooking => Some(NotificationKind::Booking),
            EventKind::NewReview => Some(NotificationKind::Review),
            _ => None,
        }
    }
}

/// One entry of the notification log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationRecord {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Originating payload, kept for click-through
    pub data: Value,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

impl NotificationRecord {
    /// Build the record for a routed event, if that event is surfaced
    pub fn from_event(
        kind: &EventKind,
        payload: &Value,
        id: u64,
        timestamp: DateTime<Utc>,
    ) -> Option<Self> {
        let notification_kind = NotificationKind::for_event(kind)?;
        let (title, message) = match notification_kind {
            NotificationKind::Order => {
                let order = OrderPayload::from_value(payload);
                (
                    "New Order",
                    format!("Order #{} from {}", order.order_number(), order.customer_name()),
                )
            }
            NotificationKind::OrderUpdate => {
                let order = OrderPayload::from_value(payload);
                (
                    "Order Updated",
                    format!(
                        "Order #{} status changed to {}",
                        order.order_number(),
                        order.status()
                    ),
                )
            }
            NotificationKind::Booking => {
                let booking = BookingPayload::from_value(payload);
                (
                    "New Booking",
                    format!("{} booked for {} guests", booking.customer_name(), booking.guests()),
                )
            }
            NotificationKind::Review => {
                let review = ReviewPayload::from_value(payload);
                (
                    "New Review",
                    format!("New {}★ review from {}", review.rating(), review.customer_name()),
                )
            }
        };

        Some(Self {
            id,
            kind: notification_kind,
            title: title.to_string(),
            message,
            data: payload.clone(),
            timestamp,
            read: false,
        })
    }
}

/// Relative age of a notification as shown in the dropdown
pub fn format_age(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(timestamp);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else if days < 7 {
        format!("{}d ago", days)
    } else {
        timestamp.format("%Y-%m-%d").to_string()
    }
}

/// Unread badge text: empty for zero, "9+" past nine
pub fn badge_label(unread: usize) -> String {
    match unread {
        0 => String::new(),
        1..=9 => unread.to_string(),
        _ => "9+".to_string(),
    }
}
