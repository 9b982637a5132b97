//! # Hermes Core
//!
//! Contract model and compiler for Hermes.
//!
//! A [`ServiceContract`] declares methods and their parameters. The
//! compiler maps every method onto an HTTP method, a path pattern and a
//! set of parameter origins, validates the result, and produces an
//! immutable [`CompiledInterface`] shared by the server and the client:
//!
//! - [`naming`] - identifier style conversion for derived path fragments
//! - [`classify`] - HTTP method and raw path from a method name
//! - [`params`] - where each parameter travels
//! - [`describe`] / [`validate`] - static description and its checks
//! - [`compile`] - the compiled route table
//! - [`wire`] - text encoding of values shared by both sides
//! - [`HermesError`] - status-carrying application errors and the JSON envelope

#![doc(html_root_url = "https://docs.rs/hermes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod classify;
pub mod compile;
mod context;
pub mod contract;
pub mod describe;
mod error;
pub mod fixtures;
pub mod naming;
pub mod params;
pub mod validate;
pub mod wire;

pub use compile::{
    CompiledInterface, CompiledParameter, CompiledRoute, CompilerConfig, ContractCompiler,
    SubContractBinding, DEFAULT_CONTENT_TYPE,
};
pub use context::{RequestId, REQUEST_ID_HEADER};
pub use contract::{
    Direction, MethodDecl, MethodId, OriginAnnotation, ParamDecl, ReturnKind, ServiceContract,
    TypeDesc,
};
pub use error::{ErrorDetail, ErrorEnvelope, FieldErrors, HermesError, HermesResult};
pub use naming::NamingStyle;
pub use params::Origin;
pub use validate::{CompileError, IssueKind, ValidationIssue, ValidationReport};
