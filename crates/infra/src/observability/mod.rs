//! Logging initialisation for binaries and test harnesses.

pub mod logging;

pub use logging::{init_default_logging, init_logging, LogLevel, LoggingConfig};
