//! Server configuration types.
//!
//! # Example
//!
//! ```rust
//! use hermes_server::ServerConfig;
//!
//! let config = ServerConfig::builder()
//!     .debug_errors(true)
//!     .max_body_bytes(64 * 1024)
//!     .build();
//!
//! assert!(config.debug_errors());
//! assert_eq!(config.max_body_bytes(), 65_536);
//! ```

use serde::{Deserialize, Serialize};

/// Default request body limit: 1 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Dispatch settings.
///
/// Use [`ServerConfig::builder()`] to construct instances, or deserialize
/// one from a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Fill the error envelope's `debug` field from internal error sources.
    debug_errors: bool,

    /// Largest accepted request body.
    max_body_bytes: usize,
}

impl ServerConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Returns whether error envelopes carry debug detail.
    #[must_use]
    pub fn debug_errors(&self) -> bool {
        self.debug_errors
    }

    /// Returns the request body limit.
    #[must_use]
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    debug_errors: bool,
    max_body_bytes: usize,
}

impl ServerConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            debug_errors: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Sets whether error envelopes carry debug detail.
    ///
    /// Keep this off in production.
    #[must_use]
    pub fn debug_errors(mut self, enabled: bool) -> Self {
        self.debug_errors = enabled;
        self
    }

    /// Sets the request body limit.
    #[must_use]
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            debug_errors: self.debug_errors,
            max_body_bytes: self.max_body_bytes,
        }
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
