//! Logging setup for Hermes.
//!
//! Hermes crates emit `tracing` events (route mounting, dispatch failures,
//! generated clients). This crate turns a [`LogConfig`] into an installed
//! `tracing-subscriber` pipeline:
//!
//! - **JSON**: one object per event, for log collectors
//! - **Pretty**: multi-line output for local development
//!
//! The level is an `EnvFilter` directive, so per-crate levels such as
//! `hermes_server=debug,info` work.

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
