//! Ctrl+C driven stop signal for the monitor loop

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::Notify;
use tokio::time::sleep;
use tracing::info;

/// Running flag plus a wakeup for tasks parked in `wait`
pub struct ShutdownManager {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownManager {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(true)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Stop on the first Ctrl+C
    pub fn spawn_signal_handler(&self) {
        let stopper = self.stopper();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                info!("Ctrl+C received, disconnecting");
                stopper.stop();
            }
        });
    }

    pub fn trigger(&self) {
        self.stopper().stop();
    }

    fn stopper(&self) -> Stopper {
        Stopper {
            flag: Arc::clone(&self.flag),
            notify: Arc::clone(&self.notify),
        }
    }

    pub fn is_running(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Shared running flag, `false` once stopped
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Resolve once shutdown has been triggered
    pub async fn wait(&self) {
        while self.is_running() {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            // Re-check after registering so a trigger in between is not lost
            if !self.is_running() {
                break;
            }
            notified.await;
        }
    }

    /// `sleep` that returns early on shutdown
    pub async fn interruptible_sleep(&self, duration: Duration) {
        tokio::select! {
            _ = sleep(duration) => {}
            _ = self.wait() => {}
        }
    }
}

struct Stopper {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl Stopper {
    fn stop(&self) {
        self.flag.store(false, Ordering::Release);
        self.notify.notify_waiters();
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}
