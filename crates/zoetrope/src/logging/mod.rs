//! Logging utilities.
//!
//! The library itself only ever logs through the `log` facade; nothing in
//! this module runs unless a host opts in. `init_logging` wires up
//! `env_logger` for binaries that bring no logger of their own.

mod init;

pub use init::{init_logging, LoggingConfig};
