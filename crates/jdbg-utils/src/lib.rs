//! # jdbg Utilities
//!
//! Shared utilities and logging for jdbg.
//!
//! This crate holds the process-wide pieces the command-line tool needs but
//! the decoding library must not decide on, chiefly the `tracing` subscriber
//! setup.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{init_logging, init_logging_with_level, LogFormat, LogLevel, LoggingError, LoggingGuard};
pub use tracing::{debug, error, info, trace, warn};
