//! Logging utilities.
//!
//! The library only speaks the `log` facade. Binaries that want output call
//! [`init_logging`] once, early in `main`.

mod init;

pub use init::{init_logging, LoggingConfig};
