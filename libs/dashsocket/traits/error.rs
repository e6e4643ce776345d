use thiserror::Error;

/// Main error type for dashsocket
///
/// These errors travel along internal seams (transport, notifier,
/// serialization). The public client surface reports failures through
/// return values and the lifecycle event feed instead.
#[derive(Error, Debug)]
pub enum SocketError {
    /// WebSocket transport error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Connection closed unexpectedly
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// Inbound frame could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Outbound frame could not be encoded
    #[error("Serialize error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Desktop notification could not be shown
    #[error("Notification error: {0}")]
    Notification(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid state transition
    #[error("Invalid state transition: {0}")]
    InvalidState(String),
}

/// Result type for dashsocket operations
pub type Result<T> = std::result::Result<T, SocketError>;
