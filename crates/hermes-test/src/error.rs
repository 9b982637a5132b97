//! Test error types.

use hermes_client::ClientError;
use hermes_server::RegistrationError;
use thiserror::Error;

/// Errors raised while setting up or driving a test.
#[derive(Debug, Error)]
pub enum TestError {
    /// A contract could not be mounted.
    #[error("registration failed: {0}")]
    Registration(#[from] RegistrationError),

    /// A client could not be built or a call failed.
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    /// A raw request could not be built.
    #[error("request build error: {0}")]
    RequestBuild(String),

    /// A response body could not be read.
    #[error("body read error: {0}")]
    BodyRead(String),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A header name or value is invalid.
    #[error("invalid header: {0}")]
    InvalidHeader(String),
}
