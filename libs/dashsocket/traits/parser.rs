use crate::error::{Result, SocketError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type alias for WebSocket messages
/// Can be Text or Binary data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsMessage {
    Text(String),
    Binary(Vec<u8>),
}

impl WsMessage {
    /// Get the message as text, if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            WsMessage::Text(s) => Some(s),
            WsMessage::Binary(_) => None,
        }
    }

    /// Decode the frame as UTF-8 text
    ///
    /// Binary frames are accepted when they hold valid UTF-8.
    pub fn into_text(self) -> Result<String> {
        match self {
            WsMessage::Text(s) => Ok(s),
            WsMessage::Binary(b) => String::from_utf8(b)
                .map_err(|e| SocketError::Parse(format!("binary frame is not UTF-8: {}", e))),
        }
    }
}

/// Inbound frame as sent by the dashboard server
///
/// `{"type": "...", "payload": ...}`. A missing payload decodes as `null`.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl InboundFrame {
    /// Parse a raw text frame
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| SocketError::Parse(e.to_string()))
    }
}

/// Outbound frame, same envelope as inbound
#[derive(Debug, Clone, Serialize)]
pub struct OutboundFrame<'a> {
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub payload: &'a Value,
}

impl<'a> OutboundFrame<'a> {
    pub fn new(kind: &'a str, payload: &'a Value) -> Self {
        Self { kind, payload }
    }

    /// Encode as a text WebSocket message
    pub fn encode(&self) -> Result<WsMessage> {
        Ok(WsMessage::Text(serde_json::to_string(self)?))
    }
}
