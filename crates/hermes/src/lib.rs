//! # Hermes
//!
//! **One service contract, three consistent views of it.**
//!
//! A [`ServiceContract`](hermes_core::ServiceContract) lists methods, their
//! parameters and return types. Hermes compiles it into a REST interface
//! (HTTP method, path pattern, and where every parameter travels) and then
//! serves and calls that interface from the same compiled description:
//!
//! - [`server`]: a route table that decodes requests into arguments, calls
//!   the implementation, and encodes the result or an error envelope
//! - [`client`]: a Rust client that builds requests from arguments and
//!   reads replies, output headers included
//! - [`script`]: a generated JavaScript `fetch` client
//!
//! Because all three read the same compiled routes, a client and a server
//! compiled with the same [`CompilerConfig`](hermes_core::CompilerConfig)
//! always agree on the wire format.
//!
//! ## Quick Start
//!
//! ```rust
//! use hermes::prelude::*;
//! use http::Method;
//!
//! let contract = ServiceContract::builder("Profile")
//!     .method(
//!         MethodDecl::builder("getName")
//!             .param(ParamDecl::new("id", TypeDesc::Integer))
//!             .returns(TypeDesc::String)
//!             .build(),
//!     )
//!     .build();
//!
//! let interface = ContractCompiler::default().compile(&contract).unwrap();
//! let route = interface.route("getName").unwrap();
//! assert_eq!(route.http_method(), Method::GET);
//! assert_eq!(route.full_pattern().as_str(), "/:id/name");
//!
//! let script = hermes::script::generate(&interface);
//! assert!(script.contains("class ProfileClient {"));
//! ```
//!
//! ## Crates
//!
//! | Module | Crate | Contents |
//! |--------|-------|----------|
//! | [`core`] | `hermes-core` | contracts, compiler, validator, errors |
//! | [`router`] | `hermes-router` | path patterns and the route trie |
//! | [`extract`] | `hermes-extract` | request decoding |
//! | [`server`] | `hermes-server` | route table and service implementations |
//! | [`client`] | `hermes-client` | the Rust client |
//! | [`script`] | `hermes-script` | JavaScript client generation |
//! | [`config`] | `hermes-config` | layered configuration |
//! | [`telemetry`] | `hermes-telemetry` | logging setup |
//! | `test` | `hermes-test` | in-memory harness (feature `testing`) |

#![doc(html_root_url = "https://docs.rs/hermes/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use hermes_client as client;
pub use hermes_config as config;
pub use hermes_core as core;
pub use hermes_extract as extract;
pub use hermes_router as router;
pub use hermes_script as script;
pub use hermes_server as server;
pub use hermes_telemetry as telemetry;

#[cfg(feature = "testing")]
pub use hermes_test as test;

/// Prelude module for convenient imports.
///
/// ```rust
/// use hermes::prelude::*;
///
/// let config = HermesConfig::default();
/// let table = RouteTable::new(config.server.clone());
/// assert!(table.is_empty());
/// ```
pub mod prelude {
    pub use hermes_core::{
        CompiledInterface, CompiledRoute, CompilerConfig, ContractCompiler, Direction,
        ErrorEnvelope, HermesError, HermesResult, MethodDecl, MethodId, NamingStyle, Origin,
        ParamDecl, RequestId, ServiceContract, TypeDesc,
    };

    pub use hermes_server::{reply, Call, RouteTable, ServerConfig, ServiceImpl};

    pub use hermes_client::{ClientConfig, ClientError, Reply, RestClient, Transport};

    pub use hermes_extract::ExtractionContext;

    pub use hermes_script::{ModuleFormat, ScriptGenerator, ScriptOptions};

    pub use hermes_config::{ConfigLoader, HermesConfig};

    pub use hermes_telemetry::{init_logging, LogConfig, LogFormat};

    #[cfg(feature = "testing")]
    pub use hermes_test::{TestServer, TestServerBuilder};
}
