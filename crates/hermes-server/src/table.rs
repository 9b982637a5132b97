//! In-process route table.
//!
//! [`RouteTable`] hosts the handlers generated for mounted contracts and
//! answers requests directly, without a socket. Any HTTP server can forward
//! `Request<Bytes>` values to [`RouteTable::handle`].
//!
//! # Example
//!
//! ```rust
//! use bytes::Bytes;
//! use hermes_core::fixtures::profile_contract;
//! use hermes_core::CompilerConfig;
//! use hermes_server::{Call, RouteTable, ServerConfig, ServiceImpl};
//! use http::{Request, StatusCode};
//! use serde_json::{json, Value};
//!
//! # tokio_test::block_on(async {
//! let service = ServiceImpl::new()
//!     .method("getName", |call: Call| async move {
//!         let id: i64 = call.arg("id")?;
//!         Ok(json!(format!("user {id}")))
//!     })
//!     .method("setName", |_call: Call| async { Ok(Value::Null) })
//!     .method("getInfo", |_call: Call| async { Ok(json!({})) })
//!     .method("index", |_call: Call| async { Ok(json!("home")) });
//!
//! let mut table = RouteTable::new(ServerConfig::default());
//! table.mount(&profile_contract(), service, &CompilerConfig::default()).unwrap();
//!
//! let request = Request::get("/7/name").body(Bytes::new()).unwrap();
//! let response = table.handle(request).await;
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(response.body().as_ref(), br#""user 7""#);
//! # });
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use hermes_core::{
    CompiledInterface, CompilerConfig, ContractCompiler, ErrorEnvelope, ServiceContract,
};
use hermes_router::{PathPattern, Router};
use http::header::{HeaderValue, ALLOW};
use http::{Method, Request, Response, StatusCode};
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::dispatch::{
    check_implementation, envelope_response, register_routes, Handler, RouteRegistrar,
};
use crate::error::{RegistrationError, RegistrationResult};
use crate::service::ServiceImpl;

/// Handlers for every mounted contract, matched by method and path.
pub struct RouteTable {
    router: Router<Handler>,
    registered: HashSet<(Method, String)>,
    interfaces: Vec<Arc<CompiledInterface>>,
    config: Arc<ServerConfig>,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            router: Router::new(),
            registered: HashSet::new(),
            interfaces: Vec::new(),
            config: Arc::new(config),
        }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Compiles `contract`, checks `implementation` against it and registers
    /// a handler for every route.
    ///
    /// Nothing is registered when any check fails.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] when the contract is invalid, the
    /// implementation is incomplete, or a route is already served.
    pub fn mount(
        &mut self,
        contract: &ServiceContract,
        implementation: ServiceImpl,
        compiler: &CompilerConfig,
    ) -> RegistrationResult<Arc<CompiledInterface>> {
        let interface = Arc::new(ContractCompiler::new(compiler.clone()).compile(contract)?);
        check_implementation(&interface, &implementation)?;

        for route in interface.all_routes() {
            let key = (route.http_method().clone(), route.full_pattern().shape());
            if self.registered.contains(&key) {
                return Err(RegistrationError::DuplicateHandler {
                    method: key.0,
                    pattern: route.full_pattern().to_string(),
                });
            }
        }

        let config = Arc::clone(&self.config);
        register_routes(self, &interface, &implementation, &config)?;

        info!(
            contract = %interface.contract_name(),
            base_path = %interface.base_path(),
            routes = interface.all_routes().len(),
            "contract mounted"
        );
        debug!(fingerprint = %interface.fingerprint(), "route table");

        self.interfaces.push(Arc::clone(&interface));
        Ok(interface)
    }

    /// Returns the mounted interfaces in mount order.
    #[must_use]
    pub fn interfaces(&self) -> &[Arc<CompiledInterface>] {
        &self.interfaces
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Serves one request.
    ///
    /// Unknown paths answer 404; known paths with another method answer 405
    /// with an `Allow` header. HEAD falls back to the GET handler.
    pub async fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let matched = self.router.match_route(&method, &path).or_else(|| {
            if method == Method::HEAD {
                self.router.match_route(&Method::GET, &path)
            } else {
                None
            }
        });

        if let Some(matched) = matched {
            let handler = Arc::clone(matched.value);
            return handler(request, matched.params).await;
        }

        let allowed = self.router.allowed_methods(&path);
        if allowed.is_empty() {
            debug!(%method, %path, "no route");
            return envelope_response(
                StatusCode::NOT_FOUND,
                &ErrorEnvelope::for_status(StatusCode::NOT_FOUND, format!("no route for {path}")),
            );
        }

        debug!(%method, %path, ?allowed, "method not allowed");
        let mut response = envelope_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &ErrorEnvelope::for_status(
                StatusCode::METHOD_NOT_ALLOWED,
                format!("{method} is not allowed for {path}"),
            ),
        );
        let allow = allowed
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        if let Ok(value) = HeaderValue::from_str(&allow) {
            response.headers_mut().insert(ALLOW, value);
        }
        response
    }
}

impl RouteRegistrar for RouteTable {
    fn register_handler(
        &mut self,
        method: Method,
        pattern: &PathPattern,
        handler: Handler,
    ) -> RegistrationResult<()> {
        let key = (method, pattern.shape());
        if self.registered.contains(&key) {
            return Err(RegistrationError::DuplicateHandler {
                method: key.0,
                pattern: pattern.to_string(),
            });
        }
        self.router.route(key.0.clone(), pattern, handler);
        self.registered.insert(key);
        Ok(())
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let contracts: Vec<&str> = self.interfaces.iter().map(|i| i.contract_name()).collect();
        f.debug_struct("RouteTable")
            .field("contracts", &contracts)
            .field("handlers", &self.registered.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{reply, Call};
    use hermes_core::fixtures::{issue_tracker_contract, profile_contract, repository_contract};
    use hermes_core::{HermesError, RequestId, REQUEST_ID_HEADER};
    use hermes_extract::ExtractionContext;
    use http::header::CONTENT_TYPE;
    use serde_json::{json, Value};

    fn profile_impl() -> ServiceImpl {
        ServiceImpl::new()
            .method("getName", |call: Call| async move {
                let id: i64 = call.arg("id")?;
                if id == 0 {
                    return Err(HermesError::not_found("no user 0"));
                }
                reply(format!("user {id}"))
            })
            .method("setName", |call: Call| async move {
                let name: String = call.arg("name")?;
                if name == "panic" {
                    panic!("refusing to store {name}");
                }
                Ok(Value::Null)
            })
            .method("getInfo", |_call: Call| async { Ok(json!({"version": 1})) })
            .method("index", |_call: Call| async { reply("home") })
    }

    fn issues_impl() -> ServiceImpl {
        ServiceImpl::new()
            .method("getIssue", |call: Call| async move {
                let number: i64 = call.arg("_number")?;
                Ok(json!({"number": number}))
            })
            .method("getOpen", |call: Call| async move {
                let limit: i64 = call.arg("limit")?;
                Ok(json!({"limit": limit}))
            })
            .method("createIssue", |call: Call| async move {
                let title: String = call.arg("title")?;
                let body: Option<String> = call.arg("body_")?;
                reply(title.len() + body.map_or(0, |b| b.len()))
            })
            .method("deleteIssue", |_call: Call| async { Ok(Value::Null) })
    }

    fn repos_impl() -> ServiceImpl {
        ServiceImpl::new()
            .method("getPullRequests", |call: Call| async move {
                let owner: String = call.arg("_owner")?;
                let state: String = call.arg("state")?;
                let caller = call.value("caller").cloned().unwrap_or_default();
                Ok(json!({"owner": owner, "state": state, "caller": caller}))
            })
            .method("updateTopics", |call: Call| async move {
                let topics: Vec<String> = call.arg("topics")?;
                call.set_output("revision", topics.len())?;
                if topics.is_empty() {
                    return Err(HermesError::conflict("no topics"));
                }
                Ok(Value::Null)
            })
            .method("getReadme", |call: Call| async move {
                let repo: String = call.arg("_repo")?;
                reply(format!("# {repo}"))
            })
            .resolver("caller", |ctx: &ExtractionContext| {
                Ok(json!(ctx.header("x-user").unwrap_or("anonymous")))
            })
            .nested("tracker", issues_impl())
    }

    fn table() -> RouteTable {
        let mut table = RouteTable::new(ServerConfig::default());
        table
            .mount(&profile_contract(), profile_impl(), &CompilerConfig::default())
            .unwrap();
        table
    }

    fn request(method: Method, uri: &str, body: &'static str) -> Request<Bytes> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
    }

    fn json_body(response: &Response<Bytes>) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    fn envelope(response: &Response<Bytes>) -> ErrorEnvelope {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[tokio::test]
    async fn test_path_parameter() {
        let response = table().handle(request(Method::GET, "/7/name", "")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(&response), json!("user 7"));
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "application/json; charset=utf-8"
        );
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_bad_path_value() {
        let response = table().handle(request(Method::GET, "/seven/name", "")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(envelope(&response).error.code, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_application_error() {
        let response = table().handle(request(Method::GET, "/0/name", "")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let envelope = envelope(&response);
        assert_eq!(envelope.error.message, "no user 0");
        assert!(envelope.request_id.is_some());
    }

    #[tokio::test]
    async fn test_void_and_body() {
        let table = table();
        let response = table
            .handle(request(Method::PUT, "/7/name", r#"{"name":"Ada"}"#))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(&response), json!({}));

        let response = table.handle(request(Method::PUT, "/7/name", "{}")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = table.handle(request(Method::PUT, "/7/name", "[1]")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_body_limit() {
        let mut table = RouteTable::new(ServerConfig::builder().max_body_bytes(8).build());
        table
            .mount(&profile_contract(), profile_impl(), &CompilerConfig::default())
            .unwrap();
        let response = table
            .handle(request(Method::PUT, "/7/name", r#"{"name":"Ada Lovelace"}"#))
            .await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_panic_becomes_500() {
        let response = table()
            .handle(request(Method::PUT, "/7/name", r#"{"name":"panic"}"#))
            .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let envelope = envelope(&response);
        assert_eq!(envelope.error.message, "internal server error");
        assert_eq!(envelope.error.debug, None);
    }

    #[tokio::test]
    async fn test_panic_debug_detail() {
        let mut table = RouteTable::new(ServerConfig::builder().debug_errors(true).build());
        table
            .mount(&profile_contract(), profile_impl(), &CompilerConfig::default())
            .unwrap();
        let response = table
            .handle(request(Method::PUT, "/7/name", r#"{"name":"panic"}"#))
            .await;
        let debug = envelope(&response).error.debug.unwrap();
        assert!(debug.contains("refusing to store panic"));
    }

    #[tokio::test]
    async fn test_not_found_and_not_allowed() {
        let table = table();
        let response = table.handle(request(Method::GET, "/nowhere/else", "")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = table.handle(request(Method::DELETE, "/7/name", "")).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let allow = response.headers()[ALLOW].to_str().unwrap();
        assert!(allow.contains("GET"));
        assert!(allow.contains("PUT"));
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let response = table().handle(request(Method::HEAD, "/info", "")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.body().is_empty());
    }

    #[tokio::test]
    async fn test_request_id_echoed() {
        let id = RequestId::new();
        let request = Request::get("/info")
            .header(REQUEST_ID_HEADER, id.to_string())
            .body(Bytes::new())
            .unwrap();
        let response = table().handle(request).await;
        assert_eq!(response.headers()[REQUEST_ID_HEADER], id.to_string().as_str());
    }

    #[tokio::test]
    async fn test_query_default_and_nested() {
        let mut table = RouteTable::new(ServerConfig::default());
        table
            .mount(&repository_contract(), repos_impl(), &CompilerConfig::default())
            .unwrap();

        let response = table
            .handle(request(Method::GET, "/repos/tracker/issues/open", ""))
            .await;
        assert_eq!(json_body(&response), json!({"limit": 20}));

        let response = table
            .handle(request(Method::GET, "/repos/tracker/issues/open?limit=5", ""))
            .await;
        assert_eq!(json_body(&response), json!({"limit": 5}));

        let response = table
            .handle(request(Method::GET, "/repos/tracker/issues/42", ""))
            .await;
        assert_eq!(json_body(&response), json!({"number": 42}));

        let response = table
            .handle(request(
                Method::POST,
                "/repos/tracker/issues/issue",
                r#"{"title":"abc","body":"de"}"#,
            ))
            .await;
        assert_eq!(json_body(&response), json!(5));
    }

    #[tokio::test]
    async fn test_computed_and_in_out_header() {
        let mut table = RouteTable::new(ServerConfig::default());
        table
            .mount(&repository_contract(), repos_impl(), &CompilerConfig::default())
            .unwrap();

        let request = Request::get("/repos/rust-lang/rust/pulls?state=closed")
            .header("x-user", "ada")
            .header("ETag", "abc")
            .body(Bytes::new())
            .unwrap();
        let response = table.handle(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["etag"], "abc");
        assert_eq!(
            json_body(&response),
            json!({"owner": "rust-lang", "state": "closed", "caller": "ada"})
        );
    }

    #[tokio::test]
    async fn test_output_header_on_failure() {
        let mut table = RouteTable::new(ServerConfig::default());
        table
            .mount(&repository_contract(), repos_impl(), &CompilerConfig::default())
            .unwrap();

        let response = table
            .handle(request(
                Method::PATCH,
                "/repos/a/b/topics",
                r#"{"topics":["x","y"]}"#,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-revision"], "2");

        let response = table
            .handle(request(Method::PATCH, "/repos/a/b/topics", r#"{"topics":[]}"#))
            .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(response.headers()["x-revision"], "0");
    }

    #[tokio::test]
    async fn test_raw_text_content_type() {
        let mut table = RouteTable::new(ServerConfig::default());
        table
            .mount(&repository_contract(), repos_impl(), &CompilerConfig::default())
            .unwrap();
        let response = table
            .handle(request(Method::GET, "/repos/a/hermes/readme", ""))
            .await;
        assert_eq!(response.headers()[CONTENT_TYPE], "text/markdown");
        assert_eq!(response.body().as_ref(), b"# hermes");
    }

    #[tokio::test]
    async fn test_raw_text_route_needs_a_string() {
        let service = repos_impl().method("getReadme", |_call: Call| async { Ok(Value::Null) });
        let mut table = RouteTable::new(ServerConfig::default());
        table
            .mount(&repository_contract(), service, &CompilerConfig::default())
            .unwrap();
        let response = table
            .handle(request(Method::GET, "/repos/a/hermes/readme", ""))
            .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let message = envelope(&response).error.message;
        assert!(message.contains("Repos.getReadme must return a string"), "{message}");
    }

    #[test]
    fn test_missing_resolver_rejected() {
        let incomplete = ServiceImpl::new()
            .method("getPullRequests", |_call: Call| async { Ok(Value::Null) })
            .method("updateTopics", |_call: Call| async { Ok(Value::Null) })
            .method("getReadme", |_call: Call| async { Ok(Value::Null) })
            .nested("tracker", issues_impl());
        let mut table = RouteTable::new(ServerConfig::default());
        let err = table
            .mount(&repository_contract(), incomplete, &CompilerConfig::default())
            .unwrap_err();
        assert!(matches!(err, RegistrationError::MissingResolver { ref param, .. } if param == "caller"));
        assert!(table.is_empty());
    }

    #[test]
    fn test_duplicate_mount_rejected() {
        let mut table = table();
        let before = table.len();
        let err = table
            .mount(&profile_contract(), profile_impl(), &CompilerConfig::default())
            .unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateHandler { .. }));
        assert_eq!(table.len(), before);
        assert_eq!(table.interfaces().len(), 1);
    }

    #[test]
    fn test_separate_contracts_share_table() {
        let mut table = table();
        table
            .mount(&issue_tracker_contract(), issues_impl(), &CompilerConfig::default())
            .unwrap();
        assert_eq!(table.interfaces().len(), 2);
        assert_eq!(table.len(), 8);
        assert!(format!("{table:?}").contains("Issues"));
    }
}
