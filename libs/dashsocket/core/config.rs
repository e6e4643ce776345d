use crate::core::router::MessageRouter;
use crate::traits::*;
use std::sync::Arc;

/// Configuration for [`ConnectionManager`](crate::core::client::ConnectionManager)
///
/// Built with the type-state builder; holds everything a session needs to
/// open a transport and route what arrives on it.
pub struct ClientConfig {
    /// WebSocket URL (ws:// or wss://), token included
    pub(crate) url: String,

    /// Opens transports
    pub(crate) connector: Arc<dyn Connector>,

    /// Decodes frames and fans them out
    pub(crate) router: Arc<MessageRouter>,

    /// Delay schedule between reconnect attempts
    pub(crate) reconnect_strategy: Box<dyn ReconnectionStrategy>,

    /// Capacity of the lifecycle event feed
    pub(crate) event_buffer: usize,
}

impl ClientConfig {
    /// Get a reference to the URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Maximum reconnect attempts, if bounded
    pub fn max_attempts(&self) -> Option<usize> {
        self.reconnect_strategy.max_attempts()
    }
}

/// Build the dashboard socket URL: `{scheme}://{host}{path}?token={token}`
pub fn socket_url(host: &str, path: &str, token: &str, secure: bool) -> String {
    let scheme = if secure { "wss" } else { "ws" };
    format!("{}://{}{}?token={}", scheme, host, path, token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_url() {
        assert_eq!(
            socket_url("localhost:5000", "/ws", "abc123", false),
            "ws://localhost:5000/ws?token=abc123"
        );
        assert_eq!(
            socket_url("admin.hotel.example", "/ws", "t", true),
            "wss://admin.hotel.example/ws?token=t"
        );
    }
}
