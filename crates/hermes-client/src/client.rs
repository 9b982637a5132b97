//! The contract client.

use std::fmt;
use std::sync::Arc;

use hermes_core::{
    CompiledInterface, CompiledRoute, CompilerConfig, ContractCompiler, ServiceContract,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::invoke::{build_request, read_reply, ArgumentMap, Reply};
use crate::transport::Transport;

/// Calls a contract's methods over a [`Transport`].
///
/// The contract is compiled when the client is built, with the same
/// [`CompilerConfig`] the server uses; an invalid contract yields no client.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use bytes::Bytes;
/// use hermes_client::{RestClient, Transport};
/// use hermes_core::fixtures::profile_contract;
/// use hermes_core::CompilerConfig;
/// use http::{Request, Response};
/// use std::sync::Arc;
///
/// struct Echo;
///
/// #[async_trait]
/// impl Transport for Echo {
///     async fn send(&self, request: Request<Bytes>) -> anyhow::Result<Response<Bytes>> {
///         let path = request.uri().path().to_string();
///         Ok(Response::new(Bytes::from(serde_json::to_vec(&path)?)))
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let client = RestClient::new(&profile_contract(), &CompilerConfig::default(), Arc::new(Echo))
///     .unwrap();
/// let reply = client.method("getName").unwrap().arg("id", 7).unwrap().send().await.unwrap();
/// assert_eq!(reply.json::<String>().unwrap(), "/7/name");
/// # });
/// ```
#[derive(Clone)]
pub struct RestClient {
    interface: Arc<CompiledInterface>,
    transport: Arc<dyn Transport>,
    base_url: String,
    config: Arc<ClientConfig>,
}

impl RestClient {
    /// Compiles `contract` and builds a client sending through `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Compile`] when the contract does not validate.
    pub fn new(
        contract: &ServiceContract,
        compiler: &CompilerConfig,
        transport: Arc<dyn Transport>,
    ) -> ClientResult<Self> {
        let interface = ContractCompiler::new(compiler.clone()).compile(contract)?;
        debug!(
            contract = %interface.contract_name(),
            routes = interface.all_routes().len(),
            "client compiled"
        );
        Ok(Self::from_interface(Arc::new(interface), transport))
    }

    /// Builds a client over an already compiled interface.
    #[must_use]
    pub fn from_interface(interface: Arc<CompiledInterface>, transport: Arc<dyn Transport>) -> Self {
        Self {
            interface,
            transport,
            base_url: String::new(),
            config: Arc::new(ClientConfig::default()),
        }
    }

    /// Sets the URL every path is appended to, e.g. `https://api.example.com`.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the client configuration.
    #[must_use]
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Returns the compiled interface.
    #[must_use]
    pub fn interface(&self) -> &CompiledInterface {
        &self.interface
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns a client for the contract mounted by the nesting method `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UnknownMethod`] if there is no such binding.
    pub fn nested(&self, name: &str) -> ClientResult<RestClient> {
        let binding = self
            .interface
            .binding(name)
            .ok_or_else(|| self.unknown(name))?;
        Ok(Self {
            interface: Arc::new(binding.interface().clone()),
            transport: Arc::clone(&self.transport),
            base_url: self.base_url.clone(),
            config: Arc::clone(&self.config),
        })
    }

    /// Starts an invocation of the method `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UnknownMethod`] if the contract has no such
    /// route.
    pub fn method(&self, name: &str) -> ClientResult<Invocation<'_>> {
        let route = self.interface.route(name).ok_or_else(|| self.unknown(name))?;
        Ok(Invocation {
            client: self,
            route,
            args: ArgumentMap::new(),
        })
    }

    /// Invokes `name` with arguments given as a JSON object.
    ///
    /// # Errors
    ///
    /// Fails like [`Invocation::send`]; a non-object `args` is an encoding
    /// error.
    pub async fn invoke(&self, name: &str, args: Value) -> ClientResult<Reply> {
        let mut invocation = self.method(name)?;
        match args {
            Value::Object(map) => {
                for (key, value) in map {
                    invocation = invocation.arg(&key, value)?;
                }
            }
            Value::Null => {}
            other => {
                return Err(ClientError::Encode {
                    method: invocation.route.id().clone(),
                    name: "arguments".to_string(),
                    reason: format!("expected an object, found {other}"),
                });
            }
        }
        invocation.send().await
    }

    fn unknown(&self, name: &str) -> ClientError {
        ClientError::UnknownMethod {
            contract: self.interface.contract_name().to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("contract", &self.interface.contract_name())
            .field("base_url", &self.base_url)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// One pending call, collecting arguments.
#[derive(Debug)]
pub struct Invocation<'a> {
    client: &'a RestClient,
    route: &'a CompiledRoute,
    args: ArgumentMap,
}

impl Invocation<'_> {
    /// Binds the argument `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UnknownArgument`] if the method has no such
    /// caller-supplied parameter, or [`ClientError::Encode`] if `value`
    /// cannot be serialized.
    pub fn arg(mut self, name: &str, value: impl Serialize) -> ClientResult<Self> {
        if !self.route.param(name).is_some_and(|p| p.is_sent()) {
            return Err(ClientError::UnknownArgument {
                method: self.route.id().clone(),
                name: name.to_string(),
            });
        }
        let value = serde_json::to_value(value).map_err(|e| ClientError::Encode {
            method: self.route.id().clone(),
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        self.args.insert(name.to_string(), value);
        Ok(self)
    }

    /// Returns the route being invoked.
    #[must_use]
    pub fn route(&self) -> &CompiledRoute {
        self.route
    }

    /// Sends the request and reads the reply.
    ///
    /// # Errors
    ///
    /// See [`build_request`] and [`read_reply`]; transport failures become
    /// [`ClientError::Transport`].
    pub async fn send(self) -> ClientResult<Reply> {
        let request = build_request(
            self.route,
            &self.args,
            &self.client.base_url,
            &self.client.config,
        )?;
        debug!(
            method = %self.route.id(),
            http_method = %request.method(),
            uri = %request.uri(),
            "sending request"
        );

        let response = self
            .client
            .transport
            .send(request)
            .await
            .map_err(ClientError::Transport)?;

        read_reply(self.route, response).map_err(|e| {
            if e.is_interface_mismatch() {
                warn!(error = %e, "response does not match the compiled interface");
            }
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use hermes_core::fixtures::{profile_contract, repository_contract};
    use hermes_core::{MethodDecl, ParamDecl, TypeDesc};
    use http::{Method, Request, Response};
    use parking_lot::Mutex;
    use serde_json::json;

    /// Records requests and answers with a fixed body.
    struct Canned {
        body: &'static str,
        seen: Mutex<Vec<(Method, String)>>,
    }

    impl Canned {
        fn new(body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                body,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for Canned {
        async fn send(&self, request: Request<Bytes>) -> anyhow::Result<Response<Bytes>> {
            self.seen
                .lock()
                .push((request.method().clone(), request.uri().to_string()));
            Ok(Response::new(Bytes::from_static(self.body.as_bytes())))
        }
    }

    struct Broken;

    #[async_trait]
    impl Transport for Broken {
        async fn send(&self, _request: Request<Bytes>) -> anyhow::Result<Response<Bytes>> {
            anyhow::bail!("connection refused")
        }
    }

    #[tokio::test]
    async fn test_get_name() {
        let transport = Canned::new(r#""user 7""#);
        let client =
            RestClient::new(&profile_contract(), &CompilerConfig::default(), transport.clone())
                .unwrap();
        let reply = client.invoke("getName", json!({"id": 7})).await.unwrap();
        assert_eq!(reply.value(), &json!("user 7"));
        assert_eq!(
            transport.seen.lock().as_slice(),
            &[(Method::GET, "/7/name".to_string())]
        );
    }

    #[tokio::test]
    async fn test_nested_client() {
        let transport = Canned::new(r#"{"number":3}"#);
        let client =
            RestClient::new(&repository_contract(), &CompilerConfig::default(), transport.clone())
                .unwrap()
                .with_base_url("http://git.test");
        let tracker = client.nested("tracker").unwrap();
        tracker
            .method("getIssue")
            .unwrap()
            .arg("_number", 3)
            .unwrap()
            .send()
            .await
            .unwrap();
        assert_eq!(
            transport.seen.lock()[0].1,
            "http://git.test/repos/tracker/issues/3"
        );
        assert!(matches!(
            client.nested("getReadme"),
            Err(ClientError::UnknownMethod { .. })
        ));
    }

    #[test]
    fn test_unknown_names() {
        let client = RestClient::new(
            &profile_contract(),
            &CompilerConfig::default(),
            Canned::new("{}"),
        )
        .unwrap();
        assert!(matches!(
            client.method("getAge"),
            Err(ClientError::UnknownMethod { .. })
        ));
        assert!(matches!(
            client.method("getName").unwrap().arg("name", "x"),
            Err(ClientError::UnknownArgument { .. })
        ));
    }

    #[test]
    fn test_invalid_contract_builds_no_client() {
        let contract = ServiceContract::builder("Bad")
            .method(
                MethodDecl::builder("getPullRequests")
                    .path(":owner/:repo/pulls")
                    .param(ParamDecl::new("owner", TypeDesc::String))
                    .param(ParamDecl::new("repo", TypeDesc::String))
                    .build(),
            )
            .build();
        let err = RestClient::new(&contract, &CompilerConfig::default(), Canned::new("{}"))
            .unwrap_err();
        assert!(matches!(err, ClientError::Compile(_)));
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let client =
            RestClient::new(&profile_contract(), &CompilerConfig::default(), Arc::new(Broken))
                .unwrap();
        let err = client.invoke("getInfo", Value::Null).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_non_object_arguments() {
        let client = RestClient::new(
            &profile_contract(),
            &CompilerConfig::default(),
            Canned::new("{}"),
        )
        .unwrap();
        let err = client.invoke("getName", json!([7])).await.unwrap_err();
        assert!(matches!(err, ClientError::Encode { .. }));
    }
}
