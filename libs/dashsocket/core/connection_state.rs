//! Lock-free connection state and counters
//!
//! ```text
//! Idle ──connect()──> Connecting ──open──> Open
//!                        │                  │
//!                      close              close
//!                        ▼                  ▼
//!                     Closed ──timer──> Connecting (attempt n)
//!                        │
//!               attempts exhausted
//!                        ▼
//!                    Exhausted ──connect()──> Connecting
//! ```
//!
//! `disconnect()` moves any state to `Closed` with no timer pending.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// No transport has been requested yet
    Idle = 0,
    /// A transport is being opened
    Connecting = 1,
    /// The transport is open
    Open = 2,
    /// The transport closed (dropped or explicit disconnect)
    Closed = 3,
    /// Reconnect attempts ran out; only an explicit `connect()` resumes
    Exhausted = 4,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConnectionState::Idle,
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Open,
            3 => ConnectionState::Closed,
            _ => ConnectionState::Exhausted,
        }
    }
}

/// Atomic wrapper over [`ConnectionState`]
#[derive(Debug)]
pub struct AtomicConnectionState(AtomicU8);

impl AtomicConnectionState {
    pub fn new(state: ConnectionState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    #[inline]
    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, state: ConnectionState) {
        self.0.store(state as u8, Ordering::Release);
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.get() == ConnectionState::Open
    }

    #[inline]
    pub fn is_connecting(&self) -> bool {
        self.get() == ConnectionState::Connecting
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.get() == ConnectionState::Exhausted
    }
}

/// Frame and reconnect counters
#[derive(Debug, Default)]
pub struct AtomicMetrics {
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    reconnect_count: AtomicU64,
}

impl AtomicMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn increment_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_reconnects(&self) {
        self.reconnect_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    pub fn reconnect_count(&self) -> u64 {
        self.reconnect_count.load(Ordering::Relaxed)
    }
}
