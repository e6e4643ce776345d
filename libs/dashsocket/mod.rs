//! # Dashsocket
//!
//! Real-time notification client for the hotel admin dashboard.
//!
//! ## Components
//!
//! - **Connection Manager**: one persistent socket, backoff reconnection,
//!   cancellable reconnect timer
//! - **Subscription Registry**: event-type keys to listener sets, with
//!   disposer guards
//! - **Message Router**: closed dispatch table over the server's event types
//! - **Notification Surfacer**: bounded newest-first log with unread state
//!
//! ```text
//! server frame → ConnectionManager → MessageRouter → SubscriptionRegistry ─┬→ view listeners
//!                                          │                                 ├→ cache invalidation
//!                                          └→ desktop notification           └→ NotificationCenter
//! ```

pub mod core;
pub mod surfacer;
pub mod traits;

// Re-export all traits
pub use traits::*;

// Re-export core functionality
pub use crate::core::{
    builder, client, config, connection_state, connector, events, registry, router,
    socket_url, states, Callback, ClientConfig, ClientEvent, ConnectionManager,
    ConnectionManagerBuilder, ConnectionState, EventKind, Metrics, MessageRouter,
    RouteOutcome, Subscription, SubscriptionRegistry, TungsteniteConnector, CONNECTED_KEY,
};

// Re-export surfacer
pub use surfacer::{NotificationCenter, NotificationKind, NotificationRecord};
