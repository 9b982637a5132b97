//! # Hermes Client
//!
//! Calls contract methods over HTTP using the same compiled description the
//! server dispatches from.
//!
//! There is no generated code per method. [`RestClient`] looks up the
//! [`CompiledRoute`](hermes_core::CompiledRoute) for a method name and a
//! single interpreter lays the arguments out on the wire:
//!
//! | Origin | Sent as |
//! |--------|---------|
//! | Path   | substituted into the pattern, percent-encoded |
//! | Query  | query string field |
//! | Header | request header |
//! | Body   | field of a JSON object body; on GET and HEAD, a query field |
//!
//! Output header parameters are read back from the response. A missing
//! *required* one raises [`ClientError::InterfaceMismatch`], which signals
//! that client and server disagree about the contract.
//!
//! ## Transports
//!
//! Anything implementing [`Transport`] can carry requests. With the
//! `reqwest` feature, `ReqwestTransport` sends them over real connections.

#![doc(html_root_url = "https://docs.rs/hermes-client/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod config;
mod error;
mod invoke;
mod transport;

pub use client::{Invocation, RestClient};
pub use config::{ClientConfig, RequestTimeout};
pub use error::{ClientError, ClientResult};
pub use invoke::{build_request, read_reply, ArgumentMap, Reply};
pub use transport::Transport;

#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
