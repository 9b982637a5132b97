//! # Hermes Server
//!
//! Server-side dispatch for Hermes contracts.
//!
//! A contract is compiled once at registration; every compiled route gets a
//! handler that decodes its parameters, invokes the implementation and
//! writes the response:
//!
//! - [`ServiceImpl`] - method implementations and computed-parameter resolvers
//! - [`Call`] - decoded arguments and output header slots for one invocation
//! - [`RouteRegistrar`] - the seam generated handlers are registered through
//! - [`RouteTable`] - an in-process host answering `Request<Bytes>` values
//!
//! Registration fails, and nothing is served, when the contract does not
//! validate or the implementation does not cover it.
//!
//! ## Example
//!
//! ```rust
//! use hermes_core::fixtures::issue_tracker_contract;
//! use hermes_core::CompilerConfig;
//! use hermes_server::{Call, RegistrationError, RouteTable, ServerConfig, ServiceImpl};
//! use serde_json::Value;
//!
//! let incomplete = ServiceImpl::new()
//!     .method("getIssue", |_call: Call| async { Ok(Value::Null) });
//!
//! let mut table = RouteTable::new(ServerConfig::default());
//! let err = table
//!     .mount(&issue_tracker_contract(), incomplete, &CompilerConfig::default())
//!     .unwrap_err();
//! assert!(matches!(err, RegistrationError::MissingImplementation { .. }));
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod dispatch;
mod error;
mod service;
mod table;

pub use config::{ServerConfig, ServerConfigBuilder, DEFAULT_MAX_BODY_BYTES};
pub use dispatch::{
    check_implementation, envelope_response, register_routes, Handler, HandlerFuture,
    RouteRegistrar, ERROR_CONTENT_TYPE,
};
pub use error::{RegistrationError, RegistrationResult};
pub use service::{reply, Call, MethodFn, MethodFuture, OutputSlots, Resolver, ServiceImpl};
pub use table::RouteTable;
