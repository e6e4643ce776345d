use crate::config::ClientConfig;
use crate::connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};
use crate::core::events::CONNECTED_KEY;
use crate::core::registry::SubscriptionRegistry;
use crate::traits::*;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Commands from the manager to the live session task
#[derive(Debug)]
enum SessionCommand {
    /// Write a frame to the transport
    Send(WsMessage),
    /// Close the transport (explicit disconnect)
    Close,
}

/// Lifecycle events published for monitoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A transport is being opened
    Connecting,
    /// The transport opened
    Connected,
    /// The transport closed
    Disconnected,
    /// Reconnect scheduled (1-indexed attempt)
    Reconnecting { attempt: usize, delay: Duration },
    /// Reconnect attempts ran out
    Exhausted { attempts: usize },
    /// Transport error (the close that follows drives the state)
    Error(String),
}

/// Client metrics snapshot
#[derive(Debug, Clone)]
pub struct Metrics {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub reconnect_count: u64,
    pub reconnect_attempts: usize,
    pub connection_state: ConnectionState,
}

/// The live transport, owned by its session task
struct Session {
    generation: u64,
    commands: mpsc::UnboundedSender<SessionCommand>,
    handle: JoinHandle<()>,
}

/// A scheduled reconnect
struct PendingReconnect {
    token: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Lifecycle {
    session: Option<Session>,
    pending: Option<PendingReconnect>,
    next_token: u64,
}

struct Shared {
    config: ClientConfig,
    state: AtomicConnectionState,
    metrics: AtomicMetrics,
    /// Reconnects scheduled since the last successful open
    attempts: AtomicUsize,
    /// Bumped on every connect/disconnect; stale sessions compare against it
    generation: AtomicU64,
    lifecycle: Mutex<Lifecycle>,
    event_tx: Sender<ClientEvent>,
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    fn registry(&self) -> &SubscriptionRegistry {
        self.config.router.registry()
    }

    fn publish(&self, event: ClientEvent) {
        if let Err(TrySendError::Full(event)) = self.event_tx.try_send(event) {
            debug!("Event feed full, dropping {:?}", event);
        }
    }
}

/// Connection Manager
///
/// Owns at most one live transport to the dashboard server and recovers
/// from drops on its own:
/// - the attempt counter resets on every successful open
/// - each close schedules one reconnect through the strategy, until it
///   returns `None` (state `Exhausted`)
/// - `disconnect()` cancels the pending reconnect and closes the transport
///
/// Cloning yields another handle to the same connection. All operations
/// must be called from within a tokio runtime.
#[derive(Clone)]
pub struct ConnectionManager {
    shared: Arc<Shared>,
    event_rx: Receiver<ClientEvent>,
}

impl ConnectionManager {
    /// Create a manager from configuration
    ///
    /// This is called by the builder's `build()` method.
    pub(crate) fn new(config: ClientConfig) -> Self {
        let (event_tx, event_rx) = bounded(config.event_buffer.max(1));
        let shared = Arc::new(Shared {
            config,
            state: AtomicConnectionState::new(ConnectionState::Idle),
            metrics: AtomicMetrics::new(),
            attempts: AtomicUsize::new(0),
            generation: AtomicU64::new(0),
            lifecycle: Mutex::new(Lifecycle::default()),
            event_tx,
        });
        Self { shared, event_rx }
    }

    /// Open the transport
    ///
    /// No-op while `Open` or `Connecting`. Cancels a pending reconnect.
    /// Does not reset the attempt counter; only a successful open does.
    pub fn connect(&self) {
        open(&self.shared);
    }

    /// Close the transport for good
    ///
    /// Idempotent and callable from any state. Nothing is scheduled
    /// afterwards; call `connect()` to start again.
    pub fn disconnect(&self) {
        let shared = &self.shared;
        let was_open = {
            let mut lifecycle = shared.lifecycle.lock();

            if let Some(pending) = lifecycle.pending.take() {
                pending.handle.abort();
                debug!("Cancelled pending reconnect");
            }

            shared.generation.fetch_add(1, Ordering::AcqRel);
            let was_open = shared.state.is_open();

            if let Some(session) = lifecycle.session.take() {
                if shared.state.is_connecting() {
                    // Still inside the connector, the close command would go unread
                    session.handle.abort();
                    debug!("Aborted session {} while connecting", session.generation);
                } else {
                    debug!("Closing session {}", session.generation);
                    let _ = session.commands.send(SessionCommand::Close);
                }
            }
            if shared.state.get() != ConnectionState::Idle {
                shared.state.set(ConnectionState::Closed);
            }
            was_open
        };

        if was_open {
            info!("WebSocket disconnected by client");
            shared.publish(ClientEvent::Disconnected);
            shared.registry().notify(CONNECTED_KEY, &Value::Bool(false));
        }
    }

    /// Send `{type, payload}` to the server
    ///
    /// Only while `Open`; nothing is queued otherwise. Returns whether the
    /// frame was handed to the transport.
    pub fn send_message(&self, kind: &str, payload: &Value) -> bool {
        match self.try_send(kind, payload) {
            Ok(()) => true,
            Err(SocketError::InvalidState(reason)) => {
                debug!("Dropped outbound '{}' frame: {}", kind, reason);
                false
            }
            Err(e) => {
                warn!("Failed to send outbound '{}' frame: {}", kind, e);
                false
            }
        }
    }

    fn try_send(&self, kind: &str, payload: &Value) -> Result<()> {
        let lifecycle = self.shared.lifecycle.lock();
        let session = match lifecycle.session.as_ref() {
            Some(session) if self.shared.state.is_open() => session,
            _ => {
                return Err(SocketError::InvalidState(format!(
                    "socket is {:?}",
                    self.shared.state.get()
                )))
            }
        };
        let msg = OutboundFrame::new(kind, payload).encode()?;
        session
            .commands
            .send(SessionCommand::Send(msg))
            .map_err(|_| SocketError::ConnectionClosed("session task ended".to_string()))
    }

    /// Get current connection state
    #[inline]
    pub fn connection_state(&self) -> ConnectionState {
        self.shared.state.get()
    }

    /// Check if connected
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.shared.state.is_open()
    }

    /// Reconnects scheduled since the last successful open
    pub fn reconnect_attempts(&self) -> usize {
        self.shared.attempts.load(Ordering::Acquire)
    }

    /// Whether a reconnect timer is pending
    pub fn has_pending_reconnect(&self) -> bool {
        self.shared.lifecycle.lock().pending.is_some()
    }

    /// Registry the router fans out to
    pub fn registry(&self) -> &SubscriptionRegistry {
        self.shared.registry()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// Get current metrics
    pub fn metrics(&self) -> Metrics {
        let metrics = &self.shared.metrics;
        Metrics {
            messages_sent: metrics.messages_sent(),
            messages_received: metrics.messages_received(),
            reconnect_count: metrics.reconnect_count(),
            reconnect_attempts: self.reconnect_attempts(),
            connection_state: self.shared.state.get(),
        }
    }

    /// Try to receive a lifecycle event (non-blocking)
    pub fn try_recv_event(&self) -> Option<ClientEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Clone of the lifecycle event receiver
    pub fn events(&self) -> Receiver<ClientEvent> {
        self.event_rx.clone()
    }
}

/// Start a new session unless one is live or starting
fn open(shared: &Arc<Shared>) {
    let mut lifecycle = shared.lifecycle.lock();

    let state = shared.state.get();
    if matches!(state, ConnectionState::Open | ConnectionState::Connecting) {
        debug!("connect() ignored, state is {:?}", state);
        return;
    }

    if let Some(pending) = lifecycle.pending.take() {
        pending.handle.abort();
        debug!("Cancelled pending reconnect in favour of explicit connect");
    }

    let generation = shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
    shared.state.set(ConnectionState::Connecting);
    shared.publish(ClientEvent::Connecting);

    let (commands, command_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(run_session(Arc::clone(shared), generation, command_rx));

    lifecycle.session = Some(Session {
        generation,
        commands,
        handle,
    });
}

/// One transport lifetime: open, pump frames, report the close
async fn run_session(
    shared: Arc<Shared>,
    generation: u64,
    mut command_rx: mpsc::UnboundedReceiver<SessionCommand>,
) {
    debug!("Connecting to {}", shared.config.url);

    let (mut sink, mut stream) = match shared.config.connector.connect(&shared.config.url).await {
        Ok(transport) => transport,
        Err(e) => {
            // A failed open behaves like an error event followed by a close
            error!("WebSocket error: {}", e);
            shared.publish(ClientEvent::Error(e.to_string()));
            handle_close(&shared, generation);
            return;
        }
    };

    if !handle_open(&shared, generation) {
        let _ = sink.close().await;
        return;
    }

    let closed_by_client = loop {
        if !shared.is_current(generation) {
            let _ = sink.close().await;
            break true;
        }

        tokio::select! {
            biased;

            cmd = command_rx.recv() => match cmd {
                Some(SessionCommand::Send(msg)) => {
                    if let Err(e) = sink.send(msg).await {
                        error!("WebSocket error: {}", e);
                        shared.publish(ClientEvent::Error(e.to_string()));
                        break false;
                    }
                    shared.metrics.increment_sent();
                }
                Some(SessionCommand::Close) | None => {
                    let _ = sink.close().await;
                    break true;
                }
            },

            frame = stream.next() => match frame {
                Some(Ok(msg)) => {
                    shared.metrics.increment_received();
                    match msg.into_text() {
                        Ok(text) => {
                            shared.config.router.handle_message(&text);
                        }
                        Err(e) => warn!("Discarding frame: {}", e),
                    }
                }
                Some(Err(e)) => {
                    error!("WebSocket error: {}", e);
                    shared.publish(ClientEvent::Error(e.to_string()));
                    break false;
                }
                None => break false,
            },
        }
    };

    if closed_by_client {
        debug!("Session {} closed by client", generation);
    } else {
        handle_close(&shared, generation);
    }
}

/// Transport-open event. Returns false when the session is stale.
fn handle_open(shared: &Arc<Shared>, generation: u64) -> bool {
    {
        let _lifecycle = shared.lifecycle.lock();
        if !shared.is_current(generation) {
            return false;
        }
        shared.attempts.store(0, Ordering::Release);
        shared.state.set(ConnectionState::Open);
    }

    info!("WebSocket connected");
    shared.publish(ClientEvent::Connected);
    shared.registry().notify(CONNECTED_KEY, &Value::Bool(true));
    true
}

/// Transport-close event: report, then apply the reconnection policy
fn handle_close(shared: &Arc<Shared>, generation: u64) {
    {
        let mut lifecycle = shared.lifecycle.lock();
        if !shared.is_current(generation) {
            return;
        }
        lifecycle.session = None;
        shared.state.set(ConnectionState::Closed);
    }

    info!("WebSocket disconnected");
    shared.publish(ClientEvent::Disconnected);
    shared.registry().notify(CONNECTED_KEY, &Value::Bool(false));

    schedule_reconnect(shared, generation);
}

fn schedule_reconnect(shared: &Arc<Shared>, generation: u64) {
    let mut lifecycle = shared.lifecycle.lock();

    // A listener may have called connect()/disconnect() during the fan-out
    if !shared.is_current(generation) || shared.state.get() != ConnectionState::Closed {
        return;
    }

    let attempt = shared.attempts.load(Ordering::Acquire);
    let Some(delay) = shared.config.reconnect_strategy.next_delay(attempt) else {
        shared.state.set(ConnectionState::Exhausted);
        drop(lifecycle);
        error!("Max reconnection attempts reached ({}), giving up", attempt);
        shared.publish(ClientEvent::Exhausted { attempts: attempt });
        return;
    };

    let attempt = attempt + 1;
    shared.attempts.store(attempt, Ordering::Release);
    shared.metrics.increment_reconnects();
    info!("Reconnecting in {:?} (attempt {})", delay, attempt);

    lifecycle.next_token += 1;
    let token = lifecycle.next_token;
    let timer_shared = Arc::clone(shared);
    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        fire_reconnect(&timer_shared, token);
    });
    lifecycle.pending = Some(PendingReconnect { token, handle });
    drop(lifecycle);

    shared.publish(ClientEvent::Reconnecting { attempt, delay });
}

/// Timer expiry: reconnect unless the timer was cancelled or replaced
fn fire_reconnect(shared: &Arc<Shared>, token: u64) {
    {
        let mut lifecycle = shared.lifecycle.lock();
        match lifecycle.pending.as_ref() {
            Some(pending) if pending.token == token => lifecycle.pending = None,
            _ => return,
        }
    }
    open(shared);
}
