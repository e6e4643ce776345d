//! Realtime Monitor Binary
//!
//! Connects to the dashboard's notification feed, logs every surfaced
//! notification as a toast and periodically reports connection status.
//!
//! Usage:
//!   ADMIN_TOKEN=... ./realtime_monitor
//!   REALTIME_CONFIG_PATH=config/staging.yaml ./realtime_monitor
//!   ./realtime_monitor config/staging.yaml

use anyhow::Result;
use chrono::Utc;
use dashboard::{init_tracing_with_level, RealtimeApp, RealtimeConfig, ShutdownManager};
use dashsocket::surfacer::format_age;
use dashsocket::{ClientEvent, NotificationRecord};
use hotel_dashboard_realtime::bin_common::{
    load_config_from_env, parse_args, BinaryRunner, ConfigType, RunConfig,
};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

struct Monitor {
    app: RealtimeApp,
    shutdown: ShutdownManager,
    run_config: RunConfig,
}

impl BinaryRunner for Monitor {
    async fn run(&mut self) -> Result<()> {
        let mut toasts = self.app.notifications().toasts();
        let mut status = tokio::time::interval(Duration::from_secs(self.run_config.status_interval_secs));
        status.tick().await;

        self.app.start();

        while self.shutdown.is_running() {
            tokio::select! {
                toast = toasts.recv() => match toast {
                    Ok(record) => log_toast(&record),
                    Err(RecvError::Lagged(skipped)) => warn!("Skipped {} toasts", skipped),
                    Err(RecvError::Closed) => break,
                },
                _ = status.tick() => {
                    self.drain_lifecycle();
                    self.log_status();
                }
                _ = self.shutdown.wait() => {}
            }
            self.drain_lifecycle();
        }

        self.app.stop();
        Ok(())
    }

    fn config(&self) -> &RunConfig {
        &self.run_config
    }

    fn stats(&self) -> Option<String> {
        let metrics = self.app.manager().metrics();
        Some(format!(
            "Frames received: {}, sent: {}, reconnects: {}, notifications: {}",
            metrics.messages_received,
            metrics.messages_sent,
            metrics.reconnect_count,
            self.app.notifications().len()
        ))
    }
}

impl Monitor {
    fn drain_lifecycle(&self) {
        while let Some(event) = self.app.manager().try_recv_event() {
            if let ClientEvent::Exhausted { attempts } = event {
                error!(
                    "Real-time feed gave up after {} reconnect attempts; restart the monitor to retry",
                    attempts
                );
            }
        }
    }

    fn log_status(&self) {
        let notifications = self.app.notifications();
        info!(
            "Status: {:?}, {} notifications, unread badge '{}'",
            self.app.manager().connection_state(),
            notifications.len(),
            notifications.badge()
        );
        if let Some(latest) = notifications.records().first() {
            info!(
                "  Latest: {} ({})",
                latest.message,
                format_age(latest.timestamp, Utc::now())
            );
        }
    }
}

fn log_toast(record: &NotificationRecord) {
    info!("[{}] {}", record.title, record.message);
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenv::dotenv().ok();

    // Load config first (before logging is initialized)
    let config_path = load_config_from_env(ConfigType::from_args(&parse_args()));
    let config = RealtimeConfig::load(&config_path)?;

    // Initialize logging with configured level
    init_tracing_with_level(&config.log_level);
    config.log();

    let shutdown = ShutdownManager::new();
    shutdown.spawn_signal_handler();

    let app = RealtimeApp::from_config(config)?;

    let mut monitor = Monitor {
        app,
        shutdown,
        run_config: RunConfig::new("Realtime Monitor"),
    };

    monitor.execute().await
}
