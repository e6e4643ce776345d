//! Event kinds and payload views
//!
//! The server's `type` strings form a closed set. Anything else is carried
//! as [`EventKind::Other`] so new server types never break decoding.

use serde_json::Value;
use std::fmt;

/// Registry key for connection status changes (value: `true` / `false`)
pub const CONNECTED_KEY: &str = "connected";

/// Classified inbound event type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    NewOrder,
    OrderUpdated,
    NewBooking,
    BookingUpdated,
    NewReview,
    Notification,
    /// Unrecognized type, kept verbatim
    Other(String),
}

impl EventKind {
    /// All recognized kinds, in dispatch-table order
    pub const KNOWN: [EventKind; 6] = [
        EventKind::NewOrder,
        EventKind::OrderUpdated,
        EventKind::NewBooking,
        EventKind::BookingUpdated,
        EventKind::NewReview,
        EventKind::Notification,
    ];

    /// Classify a wire `type` string
    pub fn parse(kind: &str) -> Self {
        match kind {
            "new_order" => EventKind::NewOrder,
            "order_updated" => EventKind::OrderUpdated,
            "new_booking" => EventKind::NewBooking,
            "booking_updated" => EventKind::BookingUpdated,
            "new_review" => EventKind::NewReview,
            "notification" => EventKind::Notification,
            other => EventKind::Other(other.to_string()),
        }
    }

    /// Wire string, also used as the registry key
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::NewOrder => "new_order",
            EventKind::OrderUpdated => "order_updated",
            EventKind::NewBooking => "new_booking",
            EventKind::BookingUpdated => "booking_updated",
            EventKind::NewReview => "new_review",
            EventKind::Notification => "notification",
            EventKind::Other(kind) => kind,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, EventKind::Other(_))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payload views
// =============================================================================

/// Render a scalar payload field for human-readable text
///
/// Strings lose their quotes, numbers and booleans print as-is, missing or
/// null fields yield `None`.
pub fn field_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Field value unless it is null, `false`, zero or an empty string
///
/// Fallback chains such as "`guests`, else `guestCount`" skip such values.
pub fn truthy(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

fn name_or_guest(value: Option<&Value>) -> String {
    field_text(truthy(value)).unwrap_or_else(|| "Guest".to_string())
}

/// Order payload (`new_order`, `order_updated`)
///
/// Each accessor reads its own field, so one malformed field never hides
/// the others.
#[derive(Debug, Clone, Copy)]
pub struct OrderPayload<'a> {
    payload: &'a Value,
}

impl<'a> OrderPayload<'a> {
    pub fn from_value(payload: &'a Value) -> Self {
        Self { payload }
    }

    pub fn id(&self) -> Option<String> {
        field_text(self.payload.get("_id"))
    }

    pub fn order_number(&self) -> String {
        field_text(self.payload.get("orderNumber")).unwrap_or_else(|| "unknown".to_string())
    }

    /// `customer.name`, else "Guest"
    pub fn customer_name(&self) -> String {
        name_or_guest(self.payload.pointer("/customer/name"))
    }

    pub fn status(&self) -> String {
        field_text(self.payload.get("status")).unwrap_or_else(|| "unknown".to_string())
    }
}

/// Booking payload (`new_booking`, `booking_updated`)
#[derive(Debug, Clone, Copy)]
pub struct BookingPayload<'a> {
    payload: &'a Value,
}

impl<'a> BookingPayload<'a> {
    pub fn from_value(payload: &'a Value) -> Self {
        Self { payload }
    }

    pub fn customer_name(&self) -> String {
        name_or_guest(self.payload.get("customerName"))
    }

    /// `guests`, falling back to `guestCount`
    pub fn guests(&self) -> String {
        field_text(truthy(self.payload.get("guests")))
            .or_else(|| field_text(truthy(self.payload.get("guestCount"))))
            .unwrap_or_else(|| "?".to_string())
    }
}

/// Review payload (`new_review`)
#[derive(Debug, Clone, Copy)]
pub struct ReviewPayload<'a> {
    payload: &'a Value,
}

impl<'a> ReviewPayload<'a> {
    pub fn from_value(payload: &'a Value) -> Self {
        Self { payload }
    }

    pub fn rating(&self) -> String {
        field_text(self.payload.get("rating")).unwrap_or_else(|| "?".to_string())
    }

    pub fn customer_name(&self) -> String {
        name_or_guest(self.payload.get("customerName"))
    }
}
