//! Client configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Client settings.
///
/// # Example
///
/// ```rust
/// use hermes_client::ClientConfig;
/// use std::time::Duration;
///
/// let config: ClientConfig = serde_json::from_str(
///     r#"{"timeout_ms": 2500, "default_headers": {"user-agent": "hermes"}}"#,
/// ).unwrap();
/// assert_eq!(config.timeout(), Some(Duration::from_millis(2500)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Per-request timeout handed to the transport. The client itself never
    /// enforces it.
    pub timeout_ms: Option<u64>,

    /// Headers added to every request. Parameter headers take precedence.
    pub default_headers: BTreeMap<String, String>,
}

impl ClientConfig {
    /// Returns the timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Adds a default header.
    #[must_use]
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }
}

/// Request extension carrying the configured timeout to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTimeout(pub Duration);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout(), None);
        assert!(config.default_headers.is_empty());
    }

    #[test]
    fn test_builders() {
        let config = ClientConfig::default()
            .with_timeout(Duration::from_secs(3))
            .with_default_header("user-agent", "hermes-test");
        assert_eq!(config.timeout_ms, Some(3000));
        assert_eq!(config.default_headers["user-agent"], "hermes-test");
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(serde_json::from_str::<ClientConfig>(r#"{"retries":3}"#).is_err());
    }
}
