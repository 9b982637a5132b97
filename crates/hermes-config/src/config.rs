//! The root configuration type.

use hermes_client::ClientConfig;
use hermes_core::CompilerConfig;
use hermes_router::PathPattern;
use hermes_server::ServerConfig;
use hermes_telemetry::LogConfig;
use http::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Everything a Hermes process reads from configuration.
///
/// A server and the clients talking to it must share the `compiler`
/// section; everything else is local.
///
/// # Example
///
/// ```
/// use hermes_config::HermesConfig;
/// use hermes_core::NamingStyle;
///
/// let config = HermesConfig::default();
/// assert_eq!(config.compiler.method_style, NamingStyle::SnakeLower);
/// assert_eq!(config.compiler.url_prefix, "/");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HermesConfig {
    /// Contract compilation settings.
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Dispatch settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Client settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

impl HermesConfig {
    /// Local development preset: pretty debug logs and debug detail in error
    /// envelopes.
    ///
    /// ```
    /// use hermes_config::HermesConfig;
    /// use hermes_telemetry::LogFormat;
    ///
    /// let config = HermesConfig::development();
    /// assert_eq!(config.log.format, LogFormat::Pretty);
    /// assert!(config.server.debug_errors());
    /// ```
    #[must_use]
    pub fn development() -> Self {
        Self {
            server: ServerConfig::builder().debug_errors(true).build(),
            log: LogConfig::development(),
            ..Self::default()
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field:
    /// - `compiler.url_prefix` is not an absolute, placeholder-free path
    /// - `server.max_body_bytes` is zero
    /// - `client.timeout_ms` is zero
    /// - a `client.default_headers` entry is not a valid header
    /// - `log.level` is not a filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix = &self.compiler.url_prefix;
        if !prefix.starts_with('/') {
            return Err(ConfigError::invalid_value(
                "compiler.url_prefix",
                format!("`{prefix}` must start with `/`"),
            ));
        }
        let pattern = PathPattern::parse(prefix)
            .map_err(|e| ConfigError::invalid_value("compiler.url_prefix", e.to_string()))?;
        if pattern.has_placeholders() {
            return Err(ConfigError::invalid_value(
                "compiler.url_prefix",
                format!("`{prefix}` must not contain placeholders"),
            ));
        }

        if self.server.max_body_bytes() == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        if self.client.timeout_ms == Some(0) {
            return Err(ConfigError::invalid_value(
                "client.timeout_ms",
                "must be greater than zero",
            ));
        }
        for (name, value) in &self.client.default_headers {
            let field = format!("client.default_headers.{name}");
            HeaderName::try_from(name.as_str())
                .map_err(|e| ConfigError::invalid_value(field.as_str(), e.to_string()))?;
            HeaderValue::try_from(value.as_str())
                .map_err(|e| ConfigError::invalid_value(field.as_str(), e.to_string()))?;
        }

        self.log
            .validate()
            .map_err(|e| ConfigError::invalid_value("log.level", e.to_string()))?;

        Ok(())
    }
}
