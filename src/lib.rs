//! Hotel Dashboard Real-Time Client - Main Library
//!
//! Real-time notification and cache-invalidation client for the hotel admin
//! dashboard.
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (CLI, runners)
//! - **dashboard**: Configuration, cache bridge, composition root (re-exported from workspace)
//! - **dashsocket**: Connection, registry, router and notifications (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust
//! use hotel_dashboard_realtime::bin_common::{load_config_from_env, ConfigType};
//! use hotel_dashboard_realtime::dashboard::RealtimeApp;
//! ```

// Re-export workspace libraries for convenience
pub use dashboard;
pub use dashsocket;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod runner;

    pub use cli::{load_config_from_env, parse_args, ConfigType};
    pub use runner::{BinaryRunner, RunConfig};
}
