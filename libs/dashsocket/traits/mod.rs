//! # Dashsocket Traits
//!
//! Core traits and types shared by the dashboard real-time client:
//!
//! - **Connector**: Open a transport (sink + stream) to the server
//! - **ReconnectionStrategy**: Map an attempt number to a delay
//! - **DesktopNotifier**: Permission-gated desktop notifications
//! - **WsMessage / InboundFrame / OutboundFrame**: Wire envelope

pub mod error;
pub mod notifier;
pub mod parser;
pub mod reconnect;
pub mod transport;

// Re-export commonly used types
pub use error::{Result, SocketError};
pub use notifier::{DesktopNotifier, LogNotifier, NoopNotifier, Permission};
pub use parser::{InboundFrame, OutboundFrame, WsMessage};
pub use reconnect::{ExponentialBackoff, FixedDelay, LinearBackoff, ReconnectionStrategy};
pub use transport::{Connector, FrameSink, FrameStream};
