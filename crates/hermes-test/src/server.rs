//! The test server harness.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use hermes_client::{ClientConfig, RestClient};
use hermes_core::{CompilerConfig, ServiceContract};
use hermes_server::{RouteTable, ServerConfig, ServiceImpl};
use http::{Method, Response};

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::transport::{Exchange, InMemoryTransport, ResponseHook};

/// A route table plus an in-memory transport for clients to call it.
///
/// The server and every client it hands out compile contracts with the
/// same [`CompilerConfig`], unless a test asks otherwise.
///
/// # Example
///
/// ```rust
/// use hermes_core::fixtures::profile_contract;
/// use hermes_server::{Call, ServiceImpl};
/// use hermes_test::TestServer;
/// use serde_json::{json, Value};
///
/// # tokio_test::block_on(async {
/// let service = ServiceImpl::new()
///     .method("getName", |call: Call| async move {
///         let id: i64 = call.arg("id")?;
///         Ok(json!(format!("user {id}")))
///     })
///     .method("setName", |_call: Call| async { Ok(Value::Null) })
///     .method("getInfo", |_call: Call| async { Ok(json!({})) })
///     .method("index", |_call: Call| async { Ok(json!("home")) });
///
/// let server = TestServer::builder()
///     .mount(&profile_contract(), service)
///     .unwrap()
///     .build();
/// let client = server.client(&profile_contract()).unwrap();
///
/// let reply = client.invoke("getName", json!({"id": 7})).await.unwrap();
/// assert_eq!(reply.value(), &json!("user 7"));
/// assert_eq!(server.last_exchange().unwrap().path(), "/7/name");
/// # });
/// ```
pub struct TestServer {
    transport: InMemoryTransport,
    compiler: CompilerConfig,
}

impl TestServer {
    /// Starts building a server with default settings.
    pub fn builder() -> TestServerBuilder {
        TestServerBuilder::new(ServerConfig::default())
    }

    /// Wraps an already populated route table.
    #[must_use]
    pub fn new(table: RouteTable, compiler: CompilerConfig) -> Self {
        Self {
            transport: InMemoryTransport::new(Arc::new(table)),
            compiler,
        }
    }

    /// Returns the route table.
    #[must_use]
    pub fn table(&self) -> &RouteTable {
        self.transport.table()
    }

    /// Returns the compiler settings shared with clients.
    #[must_use]
    pub fn compiler(&self) -> &CompilerConfig {
        &self.compiler
    }

    /// Returns the transport clients use.
    #[must_use]
    pub fn transport(&self) -> &InMemoryTransport {
        &self.transport
    }

    /// Builds a client for `contract` compiled like the server compiled it.
    pub fn client(&self, contract: &ServiceContract) -> Result<RestClient, TestError> {
        self.client_with(contract, &self.compiler)
    }

    /// Builds a client for `contract` compiled with other settings.
    pub fn client_with(
        &self,
        contract: &ServiceContract,
        compiler: &CompilerConfig,
    ) -> Result<RestClient, TestError> {
        let transport = Arc::new(self.transport.clone());
        Ok(RestClient::new(contract, compiler, transport)?)
    }

    /// Builds a client with a client configuration.
    pub fn configured_client(
        &self,
        contract: &ServiceContract,
        config: ClientConfig,
    ) -> Result<RestClient, TestError> {
        Ok(self.client(contract)?.with_config(config))
    }

    /// Starts a raw request.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestRequestBuilder<'_> {
        TestRequestBuilder::new(&self.transport, method, uri)
    }

    /// Starts a raw GET request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestRequestBuilder<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a raw POST request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestRequestBuilder<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a raw PUT request.
    pub fn put(&self, uri: impl AsRef<str>) -> TestRequestBuilder<'_> {
        self.request(Method::PUT, uri)
    }

    /// Starts a raw PATCH request.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestRequestBuilder<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Starts a raw DELETE request.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestRequestBuilder<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Starts a raw HEAD request.
    pub fn head(&self, uri: impl AsRef<str>) -> TestRequestBuilder<'_> {
        self.request(Method::HEAD, uri)
    }

    /// Returns every exchange so far, oldest first.
    #[must_use]
    pub fn exchanges(&self) -> Vec<Exchange> {
        self.transport.exchanges()
    }

    /// Returns the most recent exchange.
    #[must_use]
    pub fn last_exchange(&self) -> Option<Exchange> {
        self.transport.last_exchange()
    }
}

impl fmt::Debug for TestServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestServer")
            .field("transport", &self.transport)
            .field("compiler", &self.compiler)
            .finish()
    }
}

/// Mounts services, then freezes them into a [`TestServer`].
#[must_use]
pub struct TestServerBuilder {
    table: RouteTable,
    compiler: CompilerConfig,
    hook: Option<ResponseHook>,
}

impl fmt::Debug for TestServerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestServerBuilder")
            .field("table", &self.table)
            .field("compiler", &self.compiler)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl TestServerBuilder {
    /// Creates a builder with the given server settings.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            table: RouteTable::new(config),
            compiler: CompilerConfig::default(),
            hook: None,
        }
    }

    /// Sets the compiler settings for later mounts and for clients.
    pub fn compiler(mut self, compiler: CompilerConfig) -> Self {
        self.compiler = compiler;
        self
    }

    /// Mounts `contract` served by `service`.
    pub fn mount(mut self, contract: &ServiceContract, service: ServiceImpl) -> Result<Self, TestError> {
        self.table.mount(contract, service, &self.compiler)?;
        Ok(self)
    }

    /// Rewrites every response before clients see it.
    pub fn response_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Response<Bytes>) + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Finishes the server.
    pub fn build(self) -> TestServer {
        TestServer {
            transport: InMemoryTransport::new(Arc::new(self.table)).with_hook(self.hook),
            compiler: self.compiler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::fixtures::profile_contract;
    use hermes_server::Call;
    use http::StatusCode;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn profile_service() -> ServiceImpl {
        ServiceImpl::new()
            .method("getName", |call: Call| async move {
                let id: i64 = call.arg("id")?;
                Ok(json!(format!("user {id}")))
            })
            .method("setName", |_call: Call| async { Ok(Value::Null) })
            .method("getInfo", |_call: Call| async { Ok(json!({"version": 1})) })
            .method("index", |_call: Call| async { Ok(json!("home")) })
    }

    #[tokio::test]
    async fn test_client_and_raw_requests_share_recording() {
        let server = TestServer::builder()
            .mount(&profile_contract(), profile_service())
            .unwrap()
            .build();

        let client = server.client(&profile_contract()).unwrap();
        client.invoke("getInfo", Value::Null).await.unwrap();
        server
            .get("/")
            .send()
            .await
            .unwrap()
            .assert_status(StatusCode::OK)
            .assert_body_eq(r#""home""#);

        let paths: Vec<String> = server
            .exchanges()
            .iter()
            .map(|e| e.path().to_string())
            .collect();
        assert_eq!(paths, ["/info", "/"]);
    }

    #[tokio::test]
    async fn test_configured_client_passes_timeout() {
        let server = TestServer::builder()
            .mount(&profile_contract(), profile_service())
            .unwrap()
            .build();
        let client = server
            .configured_client(
                &profile_contract(),
                ClientConfig::default().with_timeout(Duration::from_secs(2)),
            )
            .unwrap();
        client.invoke("index", Value::Null).await.unwrap();
        assert_eq!(
            server.last_exchange().unwrap().timeout,
            Some(Duration::from_secs(2))
        );
    }

    #[test]
    fn test_mount_failure_is_reported() {
        let err = TestServer::builder()
            .mount(&profile_contract(), ServiceImpl::new())
            .unwrap_err();
        assert!(matches!(err, TestError::Registration(_)));
    }

    #[test]
    fn test_new_wraps_table() {
        let mut table = RouteTable::new(ServerConfig::default());
        table
            .mount(&profile_contract(), profile_service(), &CompilerConfig::default())
            .unwrap();
        let server = TestServer::new(table, CompilerConfig::default());
        assert_eq!(server.table().len(), 4);
    }
}
