pub mod states;

use crate::client::ConnectionManager;
use crate::config::ClientConfig;
use crate::core::router::MessageRouter;
use crate::core::connector::TungsteniteConnector;
use crate::traits::*;
use states::*;
use std::sync::Arc;

/// Default capacity of the lifecycle event feed
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Type-state builder for [`ConnectionManager`]
///
/// The URL and the router must be set before `build()` becomes available.
///
/// ```ignore
/// let manager = dashsocket::builder()
///     .url(socket_url("localhost:5000", "/ws", &token, false))
///     .router(MessageRouter::new(registry.clone(), notifier))
///     .reconnect_strategy(LinearBackoff::default())
///     .build()?;
/// manager.connect();
/// ```
pub struct ConnectionManagerBuilder<U, Ro>
where
    U: UrlState,
    Ro: RouterState,
{
    _progress: Progress<U, Ro>,
    url: Option<String>,
    router: Option<Arc<MessageRouter>>,
    connector: Option<Arc<dyn Connector>>,
    reconnect_strategy: Option<Box<dyn ReconnectionStrategy>>,
    event_buffer: usize,
}

impl ConnectionManagerBuilder<NoUrl, NoRouter> {
    /// Create a new builder instance
    pub fn new() -> Self {
        Self {
            _progress: Progress::new(),
            url: None,
            router: None,
            connector: None,
            reconnect_strategy: None,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl Default for ConnectionManagerBuilder<NoUrl, NoRouter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U, Ro> ConnectionManagerBuilder<U, Ro>
where
    U: UrlState,
    Ro: RouterState,
{
    fn transition<U2, Ro2>(self) -> ConnectionManagerBuilder<U2, Ro2>
    where
        U2: UrlState,
        Ro2: RouterState,
    {
        ConnectionManagerBuilder {
            _progress: Progress::new(),
            url: self.url,
            router: self.router,
            connector: self.connector,
            reconnect_strategy: self.reconnect_strategy,
            event_buffer: self.event_buffer,
        }
    }

    /// Replace the transport (defaults to tokio-tungstenite)
    pub fn connector(mut self, connector: impl Connector) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Defaults to [`LinearBackoff::default`] (1s base, 5 attempts)
    pub fn reconnect_strategy(mut self, strategy: impl ReconnectionStrategy + 'static) -> Self {
        self.reconnect_strategy = Some(Box::new(strategy));
        self
    }

    /// Same as `reconnect_strategy`, for strategies chosen at runtime
    pub fn boxed_reconnect_strategy(mut self, strategy: Box<dyn ReconnectionStrategy>) -> Self {
        self.reconnect_strategy = Some(strategy);
        self
    }

    /// Capacity of the lifecycle event feed; events beyond it are dropped
    /// until the feed is drained
    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }
}

// URL setting
impl<Ro> ConnectionManagerBuilder<NoUrl, Ro>
where
    Ro: RouterState,
{
    pub fn url(mut self, url: impl Into<String>) -> ConnectionManagerBuilder<HasUrl, Ro> {
        self.url = Some(url.into());
        self.transition()
    }
}

// Router setting
impl<U> ConnectionManagerBuilder<U, NoRouter>
where
    U: UrlState,
{
    pub fn router(mut self, router: MessageRouter) -> ConnectionManagerBuilder<U, HasRouter> {
        self.router = Some(Arc::new(router));
        self.transition()
    }
}

// Build method - only available when all required fields are set
impl ConnectionManagerBuilder<HasUrl, HasRouter> {
    pub fn build(self) -> Result<ConnectionManager> {
        let url = self
            .url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| SocketError::Configuration("URL must be set".to_string()))?;
        let router = self
            .router
            .ok_or_else(|| SocketError::Configuration("Router must be set".to_string()))?;

        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(TungsteniteConnector));
        let reconnect_strategy = self
            .reconnect_strategy
            .unwrap_or_else(|| Box::new(LinearBackoff::default()));

        let config = ClientConfig {
            url,
            connector,
            router,
            reconnect_strategy,
            event_buffer: self.event_buffer,
        };

        Ok(ConnectionManager::new(config))
    }
}
