//! Application error type and the JSON error envelope.
//!
//! [`HermesError`] is what service implementations return. Every variant
//! carries an HTTP status; the server renders it as an [`ErrorEnvelope`]:
//!
//! ```json
//! {"error":{"code":"NOT_FOUND","message":"no such issue","status":404},"request_id":"..."}
//! ```
//!
//! The client parses the same envelope back from non-2xx responses.

use std::collections::BTreeMap;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::RequestId;

/// Result type alias using [`HermesError`].
pub type HermesResult<T> = Result<T, HermesError>;

/// Status-carrying application error.
///
/// # Example
///
/// ```
/// use hermes_core::HermesError;
/// use http::StatusCode;
///
/// fn find(number: u64) -> Result<String, HermesError> {
///     if number == 0 {
///         return Err(HermesError::not_found("issue 0 does not exist"));
///     }
///     Ok(format!("issue {number}"))
/// }
///
/// assert_eq!(find(0).unwrap_err().status_code(), StatusCode::NOT_FOUND);
/// ```
#[derive(Error, Debug)]
pub enum HermesError {
    /// The request was well-formed but its content is unacceptable.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable error message.
        message: String,
        /// Field-specific validation errors.
        #[source]
        field_errors: Option<FieldErrors>,
    },

    /// Missing or invalid credentials.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Human-readable error message.
        message: String,
    },

    /// The caller may not do this.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Human-readable error message.
        message: String,
    },

    /// The addressed resource does not exist.
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// The request conflicts with current state.
    #[error("Conflict: {message}")]
    Conflict {
        /// Human-readable error message.
        message: String,
    },

    /// Any status the other variants do not cover.
    #[error("{message}")]
    Status {
        /// HTTP status to respond with.
        status: StatusCode,
        /// Human-readable error message.
        message: String,
    },

    /// Internal failure. The source is never sent to clients except as the
    /// optional debug string.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl HermesError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: None,
        }
    }

    /// Creates a validation error with field-specific errors.
    #[must_use]
    pub fn validation_with_fields(message: impl Into<String>, field_errors: FieldErrors) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }

    /// Creates an unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates an error with an arbitrary status.
    #[must_use]
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error wrapping `source`.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Status { status, .. } => *status,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::Status { status, .. } => code_for_status(*status),
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Returns the message without the category prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Validation { message, .. }
            | Self::Unauthorized { message }
            | Self::Forbidden { message }
            | Self::NotFound { message }
            | Self::Conflict { message }
            | Self::Status { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    /// Returns true for server-side failures (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Converts this error to the wire envelope.
    ///
    /// `include_debug` fills the `debug` field from the internal source
    /// chain; leave it off in production.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&RequestId>, include_debug: bool) -> ErrorEnvelope {
        let debug = match self {
            Self::Internal {
                source: Some(source),
                ..
            } if include_debug => Some(format!("{source:#}")),
            _ => None,
        };

        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.message().to_string(),
                status: self.status_code().as_u16(),
                details: self.error_details(),
                debug,
            },
            request_id: request_id.map(ToString::to_string),
        }
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation {
                field_errors: Some(errors),
                ..
            } if !errors.is_empty() => serde_json::to_value(errors).ok(),
            _ => None,
        }
    }
}

fn code_for_status(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "BAD_REQUEST",
        StatusCode::UNAUTHORIZED => "UNAUTHORIZED",
        StatusCode::FORBIDDEN => "FORBIDDEN",
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::METHOD_NOT_ALLOWED => "METHOD_NOT_ALLOWED",
        StatusCode::CONFLICT => "CONFLICT",
        StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        StatusCode::UNPROCESSABLE_ENTITY => "UNPROCESSABLE_ENTITY",
        StatusCode::TOO_MANY_REQUESTS => "RATE_LIMITED",
        StatusCode::SERVICE_UNAVAILABLE => "SERVICE_UNAVAILABLE",
        StatusCode::GATEWAY_TIMEOUT => "TIMEOUT",
        s if s.is_client_error() => "CLIENT_ERROR",
        _ => "SERVER_ERROR",
    }
}

/// Field-specific validation errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("field validation errors")]
pub struct FieldErrors {
    /// Field name to messages, sorted by field.
    pub fields: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a message for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Returns true if no field has errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of fields with errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// Error body written by the server and parsed by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// Request id for log correlation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorEnvelope {
    /// Builds an envelope for a bare status, without a [`HermesError`].
    #[must_use]
    pub fn for_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code_for_status(status).to_string(),
                message: message.into(),
                status: status.as_u16(),
                details: None,
                debug: None,
            },
            request_id: None,
        }
    }

    /// Serializes the envelope. Falls back to a fixed body if the details
    /// cannot be rendered.
    #[must_use]
    pub fn to_json_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_else(|_| {
            br#"{"error":{"code":"INTERNAL_ERROR","message":"error rendering failed","status":500}}"#
                .to_vec()
        })
    }
}

/// Error detail within an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// HTTP status code.
    pub status: u16,
    /// Structured details, such as field errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Sanitized debug description; only present when enabled on the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let error = HermesError::validation("name must not be empty");
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.error_code(), "VALIDATION_ERROR");
        assert_eq!(error.message(), "name must not be empty");
        assert!(error.to_string().contains("name must not be empty"));
    }

    #[test]
    fn test_validation_error_with_fields() {
        let mut field_errors = FieldErrors::new();
        field_errors.add("title", "too long");
        field_errors.add("title", "contains tabs");
        field_errors.add("body", "required");

        let error = HermesError::validation_with_fields("invalid issue", field_errors);
        let envelope = error.to_envelope(None, false);
        let details = envelope.error.details.unwrap();
        assert_eq!(details["fields"]["title"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_status_variant() {
        let error = HermesError::status(StatusCode::IM_A_TEAPOT, "short and stout");
        assert_eq!(error.status_code(), StatusCode::IM_A_TEAPOT);
        assert_eq!(error.error_code(), "CLIENT_ERROR");
        assert_eq!(error.to_string(), "short and stout");

        let error = HermesError::status(StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert_eq!(error.error_code(), "RATE_LIMITED");
    }

    #[test]
    fn test_internal_debug_only_when_enabled() {
        let source = std::io::Error::other("disk on fire");
        let error = HermesError::internal_with_source("storage failed", source);
        assert!(error.is_server_error());

        let hidden = error.to_envelope(None, false);
        assert!(hidden.error.debug.is_none());

        let shown = error.to_envelope(None, true);
        assert_eq!(shown.error.debug.as_deref(), Some("disk on fire"));
        assert_eq!(shown.error.message, "storage failed");
    }

    #[test]
    fn test_envelope_serialization() {
        let request_id = RequestId::new();
        let envelope = HermesError::not_found("no such issue").to_envelope(Some(&request_id), false);

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert_eq!(json["error"]["status"], 404);
        assert_eq!(json["error"]["message"], "no such issue");
        assert_eq!(json["request_id"], request_id.to_string());
        assert!(json["error"].get("debug").is_none());
    }

    #[test]
    fn test_envelope_parses_back() {
        let bytes = HermesError::conflict("already closed")
            .to_envelope(None, false)
            .to_json_bytes();
        let parsed: ErrorEnvelope = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed.error.status, 409);
        assert_eq!(parsed.error.code, "CONFLICT");
        assert!(parsed.request_id.is_none());
    }

    #[test]
    fn test_for_status() {
        let envelope = ErrorEnvelope::for_status(StatusCode::METHOD_NOT_ALLOWED, "use GET");
        assert_eq!(envelope.error.code, "METHOD_NOT_ALLOWED");
        assert_eq!(envelope.error.status, 405);
    }

    #[test]
    fn test_all_variants_map_to_error_statuses() {
        let errors = [
            HermesError::validation("x"),
            HermesError::unauthorized("x"),
            HermesError::forbidden("x"),
            HermesError::not_found("x"),
            HermesError::conflict("x"),
            HermesError::internal("x"),
        ];
        for error in errors {
            let status = error.status_code();
            assert!(status.is_client_error() || status.is_server_error(), "{error}");
        }
    }
}
