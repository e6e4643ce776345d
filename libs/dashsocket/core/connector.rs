//! tokio-tungstenite transport

use crate::traits::*;
use async_trait::async_trait;
use futures::{future, SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::debug;

/// Production connector backed by tokio-tungstenite
#[derive(Debug, Clone, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<(FrameSink, FrameStream)> {
        let (ws_stream, response) = connect_async(url)
            .await
            .map_err(|e| SocketError::WebSocket(e.to_string()))?;
        debug!("WebSocket handshake completed with status {}", response.status());

        let (write, read) = ws_stream.split();

        let sink = write
            .sink_map_err(|e| SocketError::WebSocket(e.to_string()))
            .with(|msg: WsMessage| future::ready(Ok::<_, SocketError>(ws_message_to_tungstenite(msg))));

        let stream = read.filter_map(|frame| {
            future::ready(match frame {
                Ok(msg) => tungstenite_to_ws_message(msg).map(Ok),
                Err(e) => Some(Err(SocketError::WebSocket(e.to_string()))),
            })
        });

        let sink: FrameSink = Box::pin(sink);
        let stream: FrameStream = Box::pin(stream);
        Ok((sink, stream))
    }
}

/// Convert WsMessage to tungstenite Message
fn ws_message_to_tungstenite(msg: WsMessage) -> Message {
    match msg {
        WsMessage::Text(text) => Message::Text(text),
        WsMessage::Binary(data) => Message::Binary(data),
    }
}

/// Convert tungstenite Message to WsMessage
///
/// Control frames are handled by tungstenite itself.
fn tungstenite_to_ws_message(msg: Message) -> Option<WsMessage> {
    match msg {
        Message::Text(text) => Some(WsMessage::Text(text)),
        Message::Binary(data) => Some(WsMessage::Binary(data)),
        Message::Ping(_) | Message::Pong(_) | Message::Close(_) | Message::Frame(_) => None,
    }
}
