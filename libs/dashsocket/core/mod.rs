//! # Dashsocket core
//!
//! Connection Manager, Subscription Registry and Message Router.
//!
//! ## Example
//!
//! ```rust,ignore
//! use dashsocket::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let registry = SubscriptionRegistry::new();
//!     let notifier = Arc::new(LogNotifier::new(Permission::Granted));
//!
//!     let manager = dashsocket::builder()
//!         .url(socket_url("localhost:5000", "/ws", "token", false))
//!         .router(MessageRouter::new(registry.clone(), notifier))
//!         .build()?;
//!
//!     let _orders = registry.subscribe_fn("new_order", |order| {
//!         println!("order: {}", order);
//!     });
//!
//!     manager.connect();
//!     // ...
//!     manager.disconnect();
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod client;
pub mod config;
pub mod connection_state;
pub mod connector;
pub mod events;
pub mod registry;
pub mod router;

// Re-export main types
pub use builder::{states, ConnectionManagerBuilder};
pub use client::{ClientEvent, ConnectionManager, Metrics};
pub use config::{socket_url, ClientConfig};
pub use connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};
pub use connector::TungsteniteConnector;
pub use events::{BookingPayload, EventKind, OrderPayload, ReviewPayload, CONNECTED_KEY};
pub use registry::{Callback, Subscription, SubscriptionRegistry};
pub use router::{desktop_notification, MessageRouter, RouteOutcome};

/// Create a new connection manager builder
pub fn builder() -> ConnectionManagerBuilder<states::NoUrl, states::NoRouter> {
    ConnectionManagerBuilder::new()
}
