//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use hermes_core::NamingStyle;
use hermes_server::ServerConfig;
use hermes_telemetry::LogFormat;
use serde_json::Value;

use crate::{ConfigError, HermesConfig};

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "HERMES";

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values, or a preset
/// 2. Configuration files (TOML or JSON), merged key by key
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use hermes_config::ConfigLoader;
///
/// # fn main() -> Result<(), hermes_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("hermes.toml")?
///     .with_env_prefix("HERMES")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: HermesConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader holding the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HermesConfig::default(),
            env_prefix: None,
        }
    }

    /// Start over from the default configuration values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = HermesConfig::default();
        self
    }

    /// Start over from the development preset.
    ///
    /// ```
    /// use hermes_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.log.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = HermesConfig::development();
        self
    }

    /// Merge a configuration file on top of the current values.
    ///
    /// The format follows the extension: `.toml` or `.json`. Keys the file
    /// leaves out keep their current value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist or cannot be read
    /// - The extension is neither `toml` nor `json`
    /// - The content does not parse, or names unknown fields
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;
        self.with_string(&content, &format)
    }

    /// Merge a configuration file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Merge configuration text in `format` (`toml` or `json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or a field is unknown.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [compiler]
    ///     url_prefix = "/api"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.compiler.url_prefix, "/api");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let layer: Value = match format.to_lowercase().as_str() {
            "toml" => {
                let table: toml::Table = toml::from_str(content)?;
                serde_json::to_value(table)?
            }
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        let mut merged = serde_json::to_value(&self.config)?;
        merge(&mut merged, layer);
        self.config = serde_json::from_value(merged)?;
        Ok(self)
    }

    /// Set the environment variable prefix for overrides.
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`, for example
    /// `HERMES__COMPILER__METHOD_STYLE=camel_case` or
    /// `HERMES__CLIENT__DEFAULT_HEADERS__USER_AGENT=hermes`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file from the working directory into the process
    /// environment, if there is one.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if the file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply environment overrides from the process environment and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override does not parse or names no
    /// setting, or if validation fails.
    ///
    /// ```
    /// use hermes_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().load().unwrap();
    /// assert_eq!(config.server.max_body_bytes(), 1024 * 1024);
    /// ```
    pub fn load(self) -> Result<HermesConfig, ConfigError> {
        self.load_with_env(env::vars())
    }

    /// Apply overrides from `vars` instead of the process environment, then
    /// validate.
    ///
    /// Only variables starting with the configured prefix are considered;
    /// without a prefix nothing is applied.
    ///
    /// # Errors
    ///
    /// Same as [`ConfigLoader::load`].
    pub fn load_with_env<I, K, V>(mut self, vars: I) -> Result<HermesConfig, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if let Some(prefix) = self.env_prefix.take() {
            let marker = format!("{prefix}__");
            let mut overrides: Vec<(String, String)> = vars
                .into_iter()
                .filter(|(k, _)| k.as_ref().starts_with(&marker))
                .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
                .collect();
            overrides.sort();
            for (key, value) in overrides {
                self.apply_env_var(&key[marker.len()..], &key, &value)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Finalize without applying the environment or validating.
    #[must_use]
    pub fn load_unvalidated(self) -> HermesConfig {
        self.config
    }

    // `path` is the key with the prefix removed; `key` is kept for errors.
    fn apply_env_var(&mut self, path: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        let parts: Vec<&str> = path.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            // Compiler section
            ["COMPILER", "METHOD_STYLE"] => {
                config.compiler.method_style = NamingStyle::from_str(value)
                    .map_err(|e| ConfigError::env_parse_error(key, e.to_string()))?;
            }
            ["COMPILER", "STRIP_TRAILING_UNDERSCORE"] => {
                config.compiler.strip_trailing_underscore = parse_bool(key, value)?;
            }
            ["COMPILER", "URL_PREFIX"] => {
                config.compiler.url_prefix = value.to_string();
            }

            // Server section
            ["SERVER", "DEBUG_ERRORS"] => {
                config.server = ServerConfig::builder()
                    .debug_errors(parse_bool(key, value)?)
                    .max_body_bytes(config.server.max_body_bytes())
                    .build();
            }
            ["SERVER", "MAX_BODY_BYTES"] => {
                let limit = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
                config.server = ServerConfig::builder()
                    .debug_errors(config.server.debug_errors())
                    .max_body_bytes(limit)
                    .build();
            }

            // Client section
            ["CLIENT", "TIMEOUT_MS"] => {
                config.client.timeout_ms = if value.is_empty() || value.eq_ignore_ascii_case("none")
                {
                    None
                } else {
                    Some(value.parse().map_err(|_| {
                        ConfigError::env_parse_error(key, "expected integer or 'none'")
                    })?)
                };
            }
            ["CLIENT", "DEFAULT_HEADERS", name] if !name.is_empty() => {
                let header = name.to_ascii_lowercase().replace('_', "-");
                config.client.default_headers.insert(header, value.to_string());
            }

            // Log section
            ["LOG", "ENABLED"] => {
                config.log.enabled = parse_bool(key, value)?;
            }
            ["LOG", "LEVEL"] => {
                config.log.level = value.to_string();
            }
            ["LOG", "FORMAT"] => {
                config.log.format =
                    LogFormat::from_str(value).map_err(|e| ConfigError::env_parse_error(key, e))?;
            }
            ["LOG", "SPAN_EVENTS"] => {
                config.log.span_events = parse_bool(key, value)?;
            }
            ["LOG", "FILE_LINE_INFO"] => {
                config.log.file_line_info = parse_bool(key, value)?;
            }
            ["LOG", "INCLUDE_TARGET"] => {
                config.log.include_target = parse_bool(key, value)?;
            }

            _ => return Err(ConfigError::unknown_field(key, "environment")),
        }

        Ok(())
    }
}

/// Overlays `layer` onto `base`: objects merge recursively, anything else
/// replaces.
fn merge(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

fn parse_bool(key: &str, s: &str) -> Result<bool, ConfigError> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env_parse_error(key, "expected boolean")),
    }
}
