use crate::error::{Result, SocketError};
use crate::parser::WsMessage;
use async_trait::async_trait;
use futures::{Sink, Stream};
use std::pin::Pin;

/// Write half of an open transport
pub type FrameSink = Pin<Box<dyn Sink<WsMessage, Error = SocketError> + Send>>;

/// Read half of an open transport
///
/// An `Err` item is a transport error event; the end of the stream is the
/// close event.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<WsMessage>> + Send>>;

/// Opens transports for the connection manager
///
/// Production code uses the tokio-tungstenite connector; tests plug in an
/// in-process implementation so lifecycle events can be driven by hand.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open a new transport to `url`
    ///
    /// # Returns
    /// * `Ok((sink, stream))` - The transport is open
    /// * `Err(SocketError)` - The attempt failed (refused, handshake error)
    async fn connect(&self, url: &str) -> Result<(FrameSink, FrameStream)>;
}
