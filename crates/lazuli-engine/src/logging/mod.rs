//! Logger setup for binaries and tools built on the engine.
//!
//! The engine itself only emits through the `log` facade: resource lifecycle
//! and target switches at `debug`, clamped sample counts and device errors at
//! `warn`.

mod init;

pub use init::{LoggingConfig, init_logging};
