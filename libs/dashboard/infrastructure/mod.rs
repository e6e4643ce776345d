//! Infrastructure Layer
//!
//! Process-level services used by the binaries.

pub mod logging;
pub mod shutdown;

pub use logging::{init_tracing, init_tracing_with_level};
pub use shutdown::ShutdownManager;
