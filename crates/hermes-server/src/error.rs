//! Registration errors.

use hermes_core::{CompileError, MethodId};
use http::Method;
use thiserror::Error;

/// Result type alias using [`RegistrationError`].
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Why a service could not be registered.
///
/// Any of these prevents the service from starting.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The contract failed validation.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// A contract method has no implementation.
    #[error("no implementation registered for {method}")]
    MissingImplementation {
        /// The unimplemented method.
        method: MethodId,
    },

    /// A computed parameter has no resolver.
    #[error("no resolver registered for computed parameter `{param}` of {method}")]
    MissingResolver {
        /// The method declaring the parameter.
        method: MethodId,
        /// Parameter name.
        param: String,
    },

    /// An implementation names a method the contract does not declare.
    #[error("contract `{contract}` declares no method `{name}`")]
    UnknownMethod {
        /// Contract name.
        contract: String,
        /// Implemented name.
        name: String,
    },

    /// The route table already serves this method and path.
    #[error("{method} {pattern} is already registered")]
    DuplicateHandler {
        /// HTTP method.
        method: Method,
        /// Pattern text.
        pattern: String,
    },
}
