//! Client errors.

use hermes_core::{CompileError, ErrorEnvelope, MethodId};
use http::StatusCode;
use thiserror::Error;

/// Result type alias using [`ClientError`].
pub type ClientResult<T> = Result<T, ClientError>;

/// Why an invocation failed.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The contract failed validation; no client was built.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// The contract has no such method or nested contract.
    #[error("contract `{contract}` declares no method `{name}`")]
    UnknownMethod {
        /// Contract name.
        contract: String,
        /// Requested name.
        name: String,
    },

    /// The method has no parameter of that name, or it is not sent by the
    /// caller.
    #[error("{method} takes no argument `{name}`")]
    UnknownArgument {
        /// The method.
        method: MethodId,
        /// Argument name.
        name: String,
    },

    /// A required argument was not supplied.
    #[error("{method} requires argument `{name}`")]
    MissingArgument {
        /// The method.
        method: MethodId,
        /// Argument name.
        name: String,
    },

    /// An argument could not be put on the wire.
    #[error("cannot encode argument `{name}` of {method}: {reason}")]
    Encode {
        /// The method.
        method: MethodId,
        /// Argument name.
        name: String,
        /// What went wrong.
        reason: String,
    },

    /// The transport failed to deliver the request or a response.
    #[error("transport error: {0}")]
    Transport(#[source] anyhow::Error),

    /// The server answered with an error envelope.
    #[error("server responded {status}: {}", envelope.error.message)]
    Status {
        /// HTTP status.
        status: StatusCode,
        /// The parsed envelope, or one synthesized from the raw body.
        envelope: ErrorEnvelope,
    },

    /// The response disagrees with the compiled interface, for example a
    /// required output header is missing.
    #[error("interface mismatch on {method}: {detail}")]
    InterfaceMismatch {
        /// The method.
        method: MethodId,
        /// What disagreed.
        detail: String,
    },

    /// A response body could not be decoded.
    #[error("cannot decode response of {method}: {reason}")]
    Decode {
        /// The method.
        method: MethodId,
        /// What went wrong.
        reason: String,
    },
}

impl ClientError {
    /// Returns the HTTP status for [`ClientError::Status`].
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for [`ClientError::InterfaceMismatch`].
    #[must_use]
    pub fn is_interface_mismatch(&self) -> bool {
        matches!(self, Self::InterfaceMismatch { .. })
    }
}
