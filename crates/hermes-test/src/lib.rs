//! # Hermes Test
//!
//! In-memory harness for exercising Hermes contracts end to end.
//!
//! A [`TestServer`] mounts service implementations in a route table and
//! hands out [`RestClient`](hermes_client::RestClient)s whose transport
//! calls that table directly. Nothing binds a port; every request and
//! response is recorded as an [`Exchange`] for assertions.
//!
//! - **Contract clients**: [`TestServer::client`] compiles the contract with
//!   the server's compiler settings
//! - **Raw requests**: [`TestServer::get`] and friends build requests no
//!   client would send
//! - **Disagreeing servers**: [`TestServerBuilder::response_hook`] rewrites
//!   responses before the client reads them
//!
//! ## Example
//!
//! ```rust
//! use hermes_core::fixtures::repository_contract;
//! use hermes_server::{Call, ServiceImpl};
//! use hermes_test::TestServer;
//! use serde_json::{json, Value};
//!
//! # tokio_test::block_on(async {
//! let issues = ServiceImpl::new()
//!     .method("getIssue", |call: Call| async move {
//!         Ok(json!({"number": call.arg::<u32>("_number")?}))
//!     })
//!     .method("getOpen", |_call: Call| async { Ok(json!([])) })
//!     .method("createIssue", |_call: Call| async { Ok(json!(1)) })
//!     .method("deleteIssue", |_call: Call| async { Ok(Value::Null) });
//! let repos = ServiceImpl::new()
//!     .method("getPullRequests", |_call: Call| async { Ok(json!([])) })
//!     .resolver("caller", |_ctx| Ok(json!("anonymous")))
//!     .method("updateTopics", |call: Call| async move {
//!         call.set_output("revision", 2)?;
//!         Ok(Value::Null)
//!     })
//!     .method("getReadme", |_call: Call| async { Ok(json!("# readme")) })
//!     .nested("tracker", issues);
//!
//! let server = TestServer::builder()
//!     .mount(&repository_contract(), repos)
//!     .unwrap()
//!     .build();
//! let tracker = server.client(&repository_contract()).unwrap().nested("tracker").unwrap();
//!
//! let reply = tracker.invoke("getIssue", json!({"_number": 3})).await.unwrap();
//! assert_eq!(reply.value(), &json!({"number": 3}));
//! assert_eq!(server.last_exchange().unwrap().path(), "/repos/tracker/issues/3");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod request;
mod response;
mod server;
mod transport;

pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
pub use server::{TestServer, TestServerBuilder};
pub use transport::{Exchange, InMemoryTransport, ResponseHook};
