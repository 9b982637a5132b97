//! # Hermes Extract
//!
//! Request decoding for the Hermes server dispatcher.
//!
//! A compiled route says where each parameter travels. This crate reads
//! them back out of a request:
//!
//! | Origin | Source | Decoding |
//! |--------|--------|----------|
//! | Path | matched placeholder | percent-decoded, then parsed by type |
//! | Query | query string | form-decoded, then parsed by type |
//! | Header | request header | parsed by type |
//! | Body | JSON object field | type-checked JSON value |
//!
//! ## Example
//!
//! ```rust
//! use bytes::Bytes;
//! use hermes_core::{fixtures, ContractCompiler};
//! use hermes_extract::{decode_arguments, ExtractionContext};
//! use hermes_router::Params;
//! use http::{HeaderMap, Method, Uri};
//!
//! let compiled = ContractCompiler::default()
//!     .compile(&fixtures::profile_contract())
//!     .unwrap();
//! let route = compiled.route("getName").unwrap();
//!
//! let mut params = Params::new();
//! params.push("id", "7");
//! let ctx = ExtractionContext::new(
//!     Method::GET,
//!     Uri::from_static("/7/name"),
//!     HeaderMap::new(),
//!     Bytes::new(),
//!     params,
//! );
//!
//! let args = decode_arguments(route, &ctx, 1024).unwrap();
//! assert_eq!(args.get("id"), Some(&serde_json::json!(7)));
//! ```
//!
//! ## Error Handling
//!
//! Decoding failures are [`ExtractionError`]s naming the source and field.
//! They convert into [`hermes_core::HermesError`] with a 4xx status.

#![doc(html_root_url = "https://docs.rs/hermes-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod decode;
mod error;

pub use context::ExtractionContext;
pub use decode::{decode_arguments, read_body_object, Arguments, JSON_CONTENT_TYPE};
pub use error::{ExtractionError, ExtractionErrorKind, ExtractionSource};

// Re-export useful types from dependencies
pub use hermes_router::Params;
