//! Application Layer
//!
//! Composition root for the real-time client: one registry, router,
//! connection manager, notification center and cache bridge per app.

use crate::cache::{CacheInvalidationBridge, InMemoryQueryCache};
use crate::config::RealtimeConfig;
use dashsocket::{
    Connector, ConnectionManager, DesktopNotifier, LogNotifier, MessageRouter, NotificationCenter,
    Permission, Subscription, SubscriptionRegistry, TungsteniteConnector, CONNECTED_KEY,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Real-time client wired from configuration
///
/// `start()` mirrors the dashboard mounting: permission request, view-layer
/// subscriptions, then `connect()`. `stop()` releases every subscription and
/// disconnects.
pub struct RealtimeApp {
    config: RealtimeConfig,
    registry: SubscriptionRegistry,
    manager: ConnectionManager,
    notifier: Arc<dyn DesktopNotifier>,
    notifications: Arc<NotificationCenter>,
    cache: Arc<InMemoryQueryCache>,
    bridge: CacheInvalidationBridge,
    guards: Mutex<Vec<Subscription>>,
    permission_requested: AtomicBool,
}

impl RealtimeApp {
    /// Build the app over an explicit transport and notifier
    pub fn new(
        config: RealtimeConfig,
        connector: impl Connector,
        notifier: Arc<dyn DesktopNotifier>,
    ) -> anyhow::Result<Self> {
        let registry = SubscriptionRegistry::new();
        let router = MessageRouter::new(registry.clone(), Arc::clone(&notifier));

        let manager = dashsocket::builder()
            .url(config.socket_url())
            .router(router)
            .connector(connector)
            .boxed_reconnect_strategy(config.reconnect.build_strategy())
            .build()?;

        let cache = Arc::new(InMemoryQueryCache::new());
        let bridge = CacheInvalidationBridge::new(cache.clone(), config.cache.clone());
        let notifications = Arc::new(NotificationCenter::new(config.notifications.capacity));

        Ok(Self {
            config,
            registry,
            manager,
            notifier,
            notifications,
            cache,
            bridge,
            guards: Mutex::new(Vec::new()),
            permission_requested: AtomicBool::new(false),
        })
    }

    /// Build the app with the WebSocket transport and the log notifier
    pub fn from_config(config: RealtimeConfig) -> anyhow::Result<Self> {
        let notifier = notifier_for(config.notifications.desktop);
        Self::new(config, TungsteniteConnector, notifier)
    }

    /// Subscribe the view-layer listeners and connect
    ///
    /// Calling it again while started only re-issues `connect()`.
    pub fn start(&self) {
        if self.config.notifications.request_permission
            && !self.permission_requested.swap(true, Ordering::AcqRel)
            && self.notifier.permission() == Permission::Default
        {
            let permission = self.notifier.request_permission();
            if permission != Permission::Granted {
                warn!("Desktop notifications disabled ({:?})", permission);
            }
        }

        {
            let mut guards = self.guards.lock();
            if guards.is_empty() {
                guards.push(self.registry.subscribe_fn(CONNECTED_KEY, |status| {
                    if status.as_bool().unwrap_or(false) {
                        info!("Real-time connection established");
                    } else {
                        info!("Real-time connection lost");
                    }
                }));
                guards.extend(self.notifications.attach(&self.registry));
                guards.extend(self.bridge.attach(&self.registry));
            }
        }

        self.manager.connect();
    }

    /// Release every subscription, then disconnect
    pub fn stop(&self) {
        let guards: Vec<Subscription> = std::mem::take(&mut *self.guards.lock());
        drop(guards);
        self.manager.disconnect();
    }

    pub fn is_started(&self) -> bool {
        !self.guards.lock().is_empty()
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    pub fn cache(&self) -> &Arc<InMemoryQueryCache> {
        &self.cache
    }
}

/// Log notifier starting from the configured permission
///
/// An undecided permission is granted on request, since the log backend
/// has nobody to ask.
pub fn notifier_for(desktop: Permission) -> Arc<dyn DesktopNotifier> {
    match desktop {
        Permission::Default => Arc::new(LogNotifier::new(Permission::Granted)),
        settled => Arc::new(LogNotifier::with_permission(settled)),
    }
}
