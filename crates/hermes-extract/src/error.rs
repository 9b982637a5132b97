//! Extraction error types.
//!
//! Every request-time decoding failure names where it happened and which
//! field was involved, and maps onto a 4xx status.

use std::fmt;

use hermes_core::{FieldErrors, HermesError, Origin};
use http::StatusCode;

/// Where data was being extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// Path placeholders.
    Path,
    /// Query string.
    Query,
    /// Request headers.
    Header,
    /// JSON request body.
    Body,
    /// A computed-parameter resolver.
    Computed,
    /// The `Content-Type` header.
    ContentType,
}

impl From<Origin> for ExtractionSource {
    fn from(origin: Origin) -> Self {
        match origin {
            Origin::Path => Self::Path,
            Origin::Query => Self::Query,
            Origin::Header => Self::Header,
            Origin::Body => Self::Body,
            Origin::Computed => Self::Computed,
        }
    }
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query => write!(f, "query"),
            Self::Header => write!(f, "header"),
            Self::Body => write!(f, "body"),
            Self::Computed => write!(f, "computed"),
            Self::ContentType => write!(f, "content-type"),
        }
    }
}

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionErrorKind {
    /// A required value is absent.
    Missing,
    /// A value does not fit its declared type.
    Invalid,
    /// The body is not a JSON object.
    NotAnObject,
    /// The body exceeds the configured limit.
    PayloadTooLarge,
    /// The body is not JSON.
    UnsupportedMediaType,
}

/// A request that could not be decoded into arguments.
///
/// # Example
///
/// ```rust
/// use hermes_extract::{ExtractionError, ExtractionSource};
/// use http::StatusCode;
///
/// let err = ExtractionError::missing(ExtractionSource::Path, "id");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// assert_eq!(err.extraction_source(), ExtractionSource::Path);
/// assert!(err.to_string().contains("id"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionError {
    extraction_source: ExtractionSource,
    kind: ExtractionErrorKind,
    field: Option<String>,
    message: String,
}

impl ExtractionError {
    /// Creates an error for a missing required value.
    #[must_use]
    pub fn missing(source: ExtractionSource, field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::Missing,
            message: format!("missing required {source} parameter: {field}"),
            field: Some(field),
        }
    }

    /// Creates an error for a value of the wrong type or format.
    #[must_use]
    pub fn invalid(
        source: ExtractionSource,
        field: impl Into<String>,
        details: impl fmt::Display,
    ) -> Self {
        let field = field.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::Invalid,
            message: format!("invalid {source} parameter '{field}': {details}"),
            field: Some(field),
        }
    }

    /// Creates an error for a body that is not a JSON object.
    #[must_use]
    pub fn not_an_object(details: impl fmt::Display) -> Self {
        Self {
            extraction_source: ExtractionSource::Body,
            kind: ExtractionErrorKind::NotAnObject,
            message: format!("request body must be a JSON object: {details}"),
            field: None,
        }
    }

    /// Creates an error for an oversized body.
    #[must_use]
    pub fn payload_too_large(max_size: usize, actual_size: usize) -> Self {
        Self {
            extraction_source: ExtractionSource::Body,
            kind: ExtractionErrorKind::PayloadTooLarge,
            message: format!("payload too large: max {max_size} bytes, got {actual_size} bytes"),
            field: None,
        }
    }

    /// Creates an error for a non-JSON body.
    #[must_use]
    pub fn unsupported_media_type(expected: &str, actual: Option<&str>) -> Self {
        let actual = actual.unwrap_or("none");
        Self {
            extraction_source: ExtractionSource::ContentType,
            kind: ExtractionErrorKind::UnsupportedMediaType,
            message: format!("unsupported content type: expected '{expected}', got '{actual}'"),
            field: None,
        }
    }

    /// Returns where the failure happened.
    #[must_use]
    pub fn extraction_source(&self) -> ExtractionSource {
        self.extraction_source
    }

    /// Returns what went wrong.
    #[must_use]
    pub fn kind(&self) -> ExtractionErrorKind {
        self.kind
    }

    /// Returns the wire field name if applicable.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns the HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            ExtractionErrorKind::Missing
            | ExtractionErrorKind::Invalid
            | ExtractionErrorKind::NotAnObject => StatusCode::BAD_REQUEST,
            ExtractionErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ExtractionErrorKind::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }

    /// Returns the error code used in envelopes.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            ExtractionErrorKind::Missing => "MISSING_PARAMETER",
            ExtractionErrorKind::Invalid => "INVALID_PARAMETER",
            ExtractionErrorKind::NotAnObject => "INVALID_BODY",
            ExtractionErrorKind::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ExtractionErrorKind::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
        }
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExtractionError {}

impl From<ExtractionError> for HermesError {
    fn from(err: ExtractionError) -> Self {
        match (err.kind, err.field) {
            (ExtractionErrorKind::Missing | ExtractionErrorKind::Invalid, Some(field)) => {
                let mut fields = FieldErrors::new();
                fields.add(field, err.message.clone());
                Self::validation_with_fields(err.message, fields)
            }
            (ExtractionErrorKind::Missing | ExtractionErrorKind::Invalid, None)
            | (ExtractionErrorKind::NotAnObject, _) => Self::validation(err.message),
            (ExtractionErrorKind::PayloadTooLarge, _) => {
                Self::status(StatusCode::PAYLOAD_TOO_LARGE, err.message)
            }
            (ExtractionErrorKind::UnsupportedMediaType, _) => {
                Self::status(StatusCode::UNSUPPORTED_MEDIA_TYPE, err.message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_error() {
        let err = ExtractionError::missing(ExtractionSource::Query, "limit");

        assert_eq!(err.extraction_source(), ExtractionSource::Query);
        assert_eq!(err.kind(), ExtractionErrorKind::Missing);
        assert_eq!(err.field(), Some("limit"));
        assert_eq!(err.error_code(), "MISSING_PARAMETER");
        assert!(err.to_string().contains("missing required query parameter: limit"));
    }

    #[test]
    fn test_invalid_error() {
        let err = ExtractionError::invalid(ExtractionSource::Header, "X-Page", "expected integer");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("X-Page"));
        assert!(err.to_string().contains("expected integer"));
    }

    #[test]
    fn test_statuses() {
        assert_eq!(
            ExtractionError::not_an_object("found array").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ExtractionError::payload_too_large(10, 20).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        let err = ExtractionError::unsupported_media_type("application/json", Some("text/plain"));
        assert_eq!(err.extraction_source(), ExtractionSource::ContentType);
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn test_into_hermes_error() {
        let err: HermesError = ExtractionError::missing(ExtractionSource::Path, "id").into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let envelope = err.to_envelope(None, false);
        assert_eq!(envelope.error.code, "VALIDATION_ERROR");
        assert!(envelope.error.details.unwrap()["fields"]["id"].is_array());

        let err: HermesError = ExtractionError::payload_too_large(1, 2).into();
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.error_code(), "PAYLOAD_TOO_LARGE");
    }

    #[test]
    fn test_source_from_origin() {
        assert_eq!(ExtractionSource::from(Origin::Body), ExtractionSource::Body);
        assert_eq!(ExtractionSource::from(Origin::Computed).to_string(), "computed");
    }
}
