//! Logging utilities.
//!
//! Centralizes logger initialization on top of the `log` facade; the engine
//! itself only ever emits through `log` macros.

mod init;

pub use init::{init_logging, LoggingConfig};
