//! Real-time client configuration
//!
//! Loaded from YAML, with the admin token pulled from the environment (or a
//! token file) rather than the file itself.

pub mod buckets;

pub use buckets::{default_buckets, BucketSpec};

use dashsocket::{
    socket_url, ExponentialBackoff, FixedDelay, LinearBackoff, Permission, ReconnectionStrategy,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarMissing(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Overrides `server.host` when set
pub const HOST_ENV_VAR: &str = "REALTIME_HOST";

/// Real-time client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    /// Event type -> cache buckets invalidated when it arrives
    #[serde(default = "default_buckets")]
    pub cache: BTreeMap<String, Vec<BucketSpec>>,
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Admin token from the environment or token file (not in YAML)
    #[serde(skip)]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// `host[:port]` of the dashboard API
    pub host: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// `wss` instead of `ws`
    #[serde(default)]
    pub secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Fallback when the variable is unset
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
            token_file: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Linear,
    Exponential,
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default)]
    pub strategy: StrategyKind,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Cap for the exponential strategy
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl ReconnectConfig {
    /// Build the configured strategy
    pub fn build_strategy(&self) -> Box<dyn ReconnectionStrategy> {
        let base = Duration::from_millis(self.base_delay_ms);
        match self.strategy {
            StrategyKind::Linear => Box::new(LinearBackoff::new(base, self.max_attempts)),
            StrategyKind::Exponential => Box::new(ExponentialBackoff::new(
                base,
                Duration::from_millis(self.max_delay_ms),
                Some(self.max_attempts),
            )),
            StrategyKind::Fixed => Box::new(FixedDelay::new(base, Some(self.max_attempts))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Records kept in the notification log
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Initial desktop permission
    #[serde(default)]
    pub desktop: Permission,
    /// Ask once at startup while the permission is undecided
    #[serde(default = "default_true")]
    pub request_permission: bool,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            desktop: Permission::Default,
            request_permission: true,
        }
    }
}

fn default_path() -> String {
    "/ws".to_string()
}

fn default_token_env() -> String {
    "ADMIN_TOKEN".to_string()
}

fn default_max_attempts() -> usize {
    LinearBackoff::DEFAULT_MAX_ATTEMPTS
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_capacity() -> usize {
    dashsocket::surfacer::DEFAULT_CAPACITY
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl RealtimeConfig {
    /// Load configuration from YAML file and resolve the admin token
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let yaml_content = std::fs::read_to_string(config_path)?;
        let mut config = Self::from_yaml(&yaml_content)?;

        if let Ok(host) = std::env::var(HOST_ENV_VAR) {
            info!("Overriding server host from environment variable");
            config.server.host = host;
        }

        config.token = config.auth.resolve_token()?;
        config.validate()?;

        Ok(config)
    }

    /// Parse YAML without touching the environment
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "server.host cannot be empty".to_string(),
            ));
        }

        if !self.server.path.starts_with('/') {
            return Err(ConfigError::ValidationError(
                "server.path must start with '/'".to_string(),
            ));
        }

        // The token goes into the query string verbatim
        if self
            .token
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '&' | '#' | '?'))
        {
            return Err(ConfigError::ValidationError(
                "admin token contains characters not allowed in a query string".to_string(),
            ));
        }

        if self.reconnect.base_delay_ms == 0 {
            return Err(ConfigError::ValidationError(
                "reconnect.base_delay_ms must be greater than 0".to_string(),
            ));
        }

        if self.notifications.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "notifications.capacity must be greater than 0".to_string(),
            ));
        }

        for (event, buckets) in &self.cache {
            if buckets.iter().any(|bucket| bucket.name.is_empty()) {
                return Err(ConfigError::ValidationError(format!(
                    "cache.{} has a bucket without a name",
                    event
                )));
            }
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// Socket URL including the admin token
    pub fn socket_url(&self) -> String {
        socket_url(
            &self.server.host,
            &self.server.path,
            &self.token,
            self.server.secure,
        )
    }

    /// Log configuration summary
    pub fn log(&self) {
        let scheme = if self.server.secure { "wss" } else { "ws" };
        info!("Configuration loaded:");
        info!(
            "  Server: {}://{}{}",
            scheme, self.server.host, self.server.path
        );
        info!("  Token: <redacted> (from {})", self.auth.token_env);
        info!(
            "  Reconnect: {:?}, {} attempts, base {}ms",
            self.reconnect.strategy, self.reconnect.max_attempts, self.reconnect.base_delay_ms
        );
        info!(
            "  Notifications: capacity {}, desktop {:?}",
            self.notifications.capacity, self.notifications.desktop
        );
        for (event, buckets) in &self.cache {
            let names: Vec<String> = buckets.iter().map(ToString::to_string).collect();
            info!("  Cache: {} -> {}", event, names.join(", "));
        }
        info!("  Log level: {}", self.log_level);
    }
}

impl AuthConfig {
    /// Token from `token_env`, falling back to `token_file`
    pub fn resolve_token(&self) -> Result<String> {
        if let Ok(token) = std::env::var(&self.token_env) {
            let token = token.trim().to_string();
            if !token.is_empty() {
                return Ok(token);
            }
        }

        if let Some(path) = &self.token_file {
            match std::fs::read_to_string(path) {
                Ok(content) if !content.trim().is_empty() => {
                    info!("Admin token read from {}", path.display());
                    return Ok(content.trim().to_string());
                }
                Ok(_) => warn!("Token file {} is empty", path.display()),
                Err(e) => warn!("Failed to read token file {}: {}", path.display(), e),
            }
        }

        Err(ConfigError::EnvVarMissing(self.token_env.clone()))
    }
}
