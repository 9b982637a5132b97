//! Layered configuration for Hermes.
//!
//! One [`HermesConfig`] carries the settings of every Hermes component:
//!
//! - `compiler` - [`CompilerConfig`](hermes_core::CompilerConfig): naming
//!   style, trailing-underscore trimming and URL prefix. Servers and clients
//!   must agree on it.
//! - `server` - [`ServerConfig`](hermes_server::ServerConfig): debug detail
//!   and body limit
//! - `client` - [`ClientConfig`](hermes_client::ClientConfig): timeout and
//!   default headers
//! - `log` - [`LogConfig`](hermes_telemetry::LogConfig)
//!
//! [`ConfigLoader`] builds it from defaults, then TOML or JSON files, then
//! `PREFIX__SECTION__KEY` environment variables, and validates the result.
//! Unknown keys are errors at every layer.
//!
//! # Example
//!
//! ```no_run
//! use hermes_config::ConfigLoader;
//!
//! # fn main() -> Result<(), hermes_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("hermes.toml")?
//!     .with_env_prefix("HERMES")
//!     .load()?;
//!
//! hermes_telemetry::init_logging(&config.log).ok();
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [compiler]
//! method_style = "snake_lower"
//! strip_trailing_underscore = true
//! url_prefix = "/api"
//!
//! [server]
//! debug_errors = false
//! max_body_bytes = 1048576
//!
//! [client]
//! timeout_ms = 5000
//! default_headers = { user-agent = "hermes" }
//!
//! [log]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `HERMES__COMPILER__METHOD_STYLE=camel_case`
//! - `HERMES__SERVER__MAX_BODY_BYTES=65536`
//! - `HERMES__CLIENT__TIMEOUT_MS=none`
//! - `HERMES__CLIENT__DEFAULT_HEADERS__USER_AGENT=hermes` (header
//!   `user-agent`)
//! - `HERMES__LOG__FORMAT=pretty`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;

pub use config::HermesConfig;
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
