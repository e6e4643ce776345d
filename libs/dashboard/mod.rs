//! # Dashboard
//!
//! Application layer of the hotel admin dashboard's real-time client.
//!
//! - **config**: YAML configuration and admin token resolution
//! - **cache**: query cache and the event-driven invalidation bridge
//! - **application**: `RealtimeApp` composition root
//! - **infrastructure**: logging and graceful shutdown

pub mod application;
pub mod cache;
pub mod config;
pub mod infrastructure;

pub use application::{notifier_for, RealtimeApp};
pub use cache::{CacheInvalidationBridge, InMemoryQueryCache, QueryCache, QueryKey};
pub use config::{BucketSpec, ConfigError, RealtimeConfig};
pub use infrastructure::{init_tracing, init_tracing_with_level, ShutdownManager};
