//! JavaScript client generation for Hermes contracts.
//!
//! The generated module is a second view of a [`CompiledInterface`], not a
//! second compilation: every route becomes a [`RouteDescriptor`] built from
//! the compiled route's path segments and parameter buckets, and a small
//! runtime interprets those descriptors with `fetch`. URLs, query strings,
//! bodies and headers therefore come out exactly as `hermes-client` lays
//! them out.
//!
//! # Example
//!
//! ```rust
//! use hermes_core::{fixtures, ContractCompiler};
//!
//! let interface = ContractCompiler::default()
//!     .compile(&fixtures::repository_contract())
//!     .unwrap();
//! let source = hermes_script::generate(&interface);
//!
//! assert!(source.contains("class ReposClient {"));
//! assert!(source.contains("class ReposTrackerClient {"));
//! assert!(source.contains("throw new InterfaceMismatchError"));
//! ```
//!
//! The module exports one class per contract plus two error classes:
//!
//! | Class | Thrown when |
//! |-------|-------------|
//! | `HermesHttpError` | the server answers with a non-2xx status |
//! | `InterfaceMismatchError` | a required response header is missing or unreadable |

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod descriptor;
mod generator;
mod runtime;
mod writer;

pub use descriptor::{FieldDescriptor, PathPiece, RouteDescriptor};
pub use generator::{ModuleFormat, ScriptGenerator, ScriptOptions};

use hermes_core::CompiledInterface;

/// Generates an ES module client for `interface` with default options.
#[must_use]
pub fn generate(interface: &CompiledInterface) -> String {
    ScriptGenerator::default().generate(interface)
}
