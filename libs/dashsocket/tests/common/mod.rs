//! Common test utilities for dashsocket integration tests
//!
//! - `MockConnector`: in-process transport whose open/refuse/hang outcome is
//!   scripted, recording the (virtual) instant of every connect attempt
//! - `RecordingNotifier`: desktop notifier capturing what was shown
//! - `MockWsServer`: loopback WebSocket server for end-to-end checks

#![allow(dead_code)]

use dashsocket::*;
use futures::channel::mpsc as fmpsc;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;

// =============================================================================
// Mock transport
// =============================================================================

/// Scripted outcome of one connect attempt
#[derive(Debug, Clone, Copy)]
pub enum Plan {
    Refuse,
    Accept,
    /// Never completes the handshake
    Hang,
}

/// Server side of an accepted mock transport
pub struct MockSession {
    inbound: fmpsc::UnboundedSender<Result<WsMessage>>,
    pub outbound: fmpsc::UnboundedReceiver<WsMessage>,
}

impl MockSession {
    /// Deliver a text frame to the client
    pub fn push_text(&self, text: impl Into<String>) {
        let _ = self.inbound.unbounded_send(Ok(WsMessage::Text(text.into())));
    }

    /// Deliver a transport error
    pub fn push_error(&self, reason: &str) {
        let _ = self
            .inbound
            .unbounded_send(Err(SocketError::WebSocket(reason.to_string())));
    }

    /// End the stream (server-side close)
    pub fn close(self) {
        self.inbound.close_channel();
    }
}

struct MockInner {
    plans: Mutex<VecDeque<Plan>>,
    fallback: Plan,
    attempts: Mutex<Vec<Instant>>,
    /// Connect attempts currently stuck in `Plan::Hang`
    hanging: AtomicUsize,
    sessions_tx: mpsc::UnboundedSender<MockSession>,
}

#[derive(Clone)]
pub struct MockConnector {
    inner: Arc<MockInner>,
}

impl MockConnector {
    /// Connector that follows `plans`, then `fallback` once they run out
    pub fn new(plans: Vec<Plan>, fallback: Plan) -> (Self, mpsc::UnboundedReceiver<MockSession>) {
        let (sessions_tx, sessions_rx) = mpsc::unbounded_channel();
        let connector = Self {
            inner: Arc::new(MockInner {
                plans: Mutex::new(plans.into()),
                fallback,
                attempts: Mutex::new(Vec::new()),
                hanging: AtomicUsize::new(0),
                sessions_tx,
            }),
        };
        (connector, sessions_rx)
    }

    pub fn always_refuse() -> Self {
        Self::new(Vec::new(), Plan::Refuse).0
    }

    pub fn push_plan(&self, plan: Plan) {
        self.inner.plans.lock().push_back(plan);
    }

    pub fn attempt_count(&self) -> usize {
        self.inner.attempts.lock().len()
    }

    pub fn attempt_times(&self) -> Vec<Instant> {
        self.inner.attempts.lock().clone()
    }

    pub fn hanging_attempts(&self) -> usize {
        self.inner.hanging.load(Ordering::SeqCst)
    }

    /// Gaps between consecutive connect attempts
    pub fn gaps(&self) -> Vec<Duration> {
        self.attempt_times()
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect()
    }
}

/// Counts a hanging attempt until its future is dropped
struct Stuck<'a>(&'a AtomicUsize);

impl<'a> Stuck<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Stuck(counter)
    }
}

impl Drop for Stuck<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Connector for MockConnector {
    async fn connect(&self, _url: &str) -> Result<(FrameSink, FrameStream)> {
        self.inner.attempts.lock().push(Instant::now());
        let plan = self
            .inner
            .plans
            .lock()
            .pop_front()
            .unwrap_or(self.inner.fallback);

        match plan {
            Plan::Refuse => Err(SocketError::WebSocket("connection refused".to_string())),
            Plan::Hang => {
                let _stuck = Stuck::enter(&self.inner.hanging);
                futures::future::pending::<()>().await;
                Err(SocketError::WebSocket("handshake never completed".to_string()))
            }
            Plan::Accept => {
                let (inbound_tx, inbound_rx) = fmpsc::unbounded();
                let (outbound_tx, outbound_rx) = fmpsc::unbounded();
                let _ = self.inner.sessions_tx.send(MockSession {
                    inbound: inbound_tx,
                    outbound: outbound_rx,
                });

                let sink: FrameSink = Box::pin(
                    outbound_tx.sink_map_err(|e| SocketError::ConnectionClosed(e.to_string())),
                );
                let stream: FrameStream = Box::pin(inbound_rx);
                Ok((sink, stream))
            }
        }
    }
}

// =============================================================================
// Notifier
// =============================================================================

/// Desktop notifier that records every shown notification
pub struct RecordingNotifier {
    permission: Permission,
    shown: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new(permission: Permission) -> Arc<Self> {
        Arc::new(Self {
            permission,
            shown: Mutex::new(Vec::new()),
        })
    }

    pub fn shown(&self) -> Vec<(String, String)> {
        self.shown.lock().clone()
    }
}

impl DesktopNotifier for RecordingNotifier {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&self) -> Permission {
        self.permission
    }

    fn show(&self, title: &str, body: &str) -> Result<()> {
        self.shown.lock().push((title.to_string(), body.to_string()));
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub const TEST_URL: &str = "ws://dashboard.test/ws?token=test";

/// Manager wired to `connector` with the default linear strategy
pub fn manager_with(
    connector: MockConnector,
    notifier: Arc<dyn DesktopNotifier>,
) -> (ConnectionManager, SubscriptionRegistry) {
    let registry = SubscriptionRegistry::new();
    let manager = dashsocket::builder()
        .url(TEST_URL)
        .router(MessageRouter::new(registry.clone(), notifier))
        .connector(connector)
        .build()
        .expect("builder has url and router");
    (manager, registry)
}

/// Let spawned session tasks run (advances the paused clock by 10ms)
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

/// Collect every payload delivered under `key`
pub fn capture(registry: &SubscriptionRegistry, key: &str) -> (Arc<Mutex<Vec<Value>>>, Subscription) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let sub = registry.subscribe_fn(key, move |value| sink.lock().push(value.clone()));
    (seen, sub)
}

/// Drain the lifecycle feed
pub fn drain_events(manager: &ConnectionManager) -> Vec<ClientEvent> {
    std::iter::from_fn(|| manager.try_recv_event()).collect()
}

// =============================================================================
// Loopback server
// =============================================================================

/// A simple WebSocket server for end-to-end tests
///
/// Greets every connection with `greeting` and echoes what it receives.
pub struct MockWsServer {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
}

impl MockWsServer {
    /// Create and start a new server
    pub async fn start(greeting: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let shutdown_clone = shutdown.clone();
        let greeting = greeting.to_string();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let shutdown = shutdown_clone.clone();
                                let greeting = greeting.clone();
                                tokio::spawn(async move {
                                    Self::handle_connection(stream, shutdown, greeting).await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_clone.notified() => {
                        break;
                    }
                }
            }
        });

        Self { addr, shutdown }
    }

    async fn handle_connection(stream: tokio::net::TcpStream, shutdown: Arc<Notify>, greeting: String) {
        use tokio_tungstenite::accept_async;
        use tokio_tungstenite::tungstenite::Message;

        let ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let (mut write, mut read) = ws_stream.split();
        if write.send(Message::Text(greeting)).await.is_err() {
            return;
        }

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(msg)) => {
                            if msg.is_text() {
                                if write.send(msg).await.is_err() {
                                    break;
                                }
                            } else if msg.is_close() {
                                break;
                            }
                        }
                        Some(Err(_)) | None => break,
                    }
                }
                _ = shutdown.notified() => {
                    break;
                }
            }
        }
    }

    /// Socket URL for this server
    pub fn ws_url(&self) -> String {
        socket_url(&self.addr.to_string(), "/ws", "test-token", false)
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockWsServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
