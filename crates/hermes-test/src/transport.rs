//! In-memory transport with request recording.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use hermes_client::{RequestTimeout, Transport};
use hermes_server::RouteTable;
use http::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::TestError;

/// Rewrites a response before the client sees it.
pub type ResponseHook = Arc<dyn Fn(&mut Response<Bytes>) + Send + Sync>;

/// One request and the response it produced.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// Request method.
    pub method: Method,
    /// Request URI, query included.
    pub uri: Uri,
    /// Request headers.
    pub request_headers: HeaderMap,
    /// Request body.
    pub request_body: Bytes,
    /// Timeout the client attached, if any.
    pub timeout: Option<Duration>,
    /// Response status.
    pub status: StatusCode,
    /// Response headers, after any hook ran.
    pub response_headers: HeaderMap,
    /// Response body.
    pub response_body: Bytes,
}

impl Exchange {
    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the raw query string.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the decoded query pairs in order.
    pub fn query_pairs(&self) -> Result<Vec<(String, String)>, TestError> {
        serde_urlencoded::from_str(self.query().unwrap_or_default())
            .map_err(|e| TestError::RequestBuild(format!("invalid query string: {e}")))
    }

    /// Returns a request header as text.
    #[must_use]
    pub fn request_header(&self, name: &str) -> Option<&str> {
        self.request_headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Parses the request body as JSON.
    pub fn request_json(&self) -> Result<Value, TestError> {
        Ok(serde_json::from_slice(&self.request_body)?)
    }

    /// Returns a response header as text.
    #[must_use]
    pub fn response_header(&self, name: &str) -> Option<&str> {
        self.response_headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A [`Transport`] that hands every request straight to a [`RouteTable`].
///
/// Clones share the table and the recorded exchanges.
#[derive(Clone)]
pub struct InMemoryTransport {
    table: Arc<RouteTable>,
    exchanges: Arc<Mutex<Vec<Exchange>>>,
    hook: Option<ResponseHook>,
}

impl InMemoryTransport {
    /// Creates a transport over `table`.
    #[must_use]
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self {
            table,
            exchanges: Arc::new(Mutex::new(Vec::new())),
            hook: None,
        }
    }

    /// Installs a hook that rewrites every response, e.g. to drop a header
    /// the way a disagreeing server would.
    #[must_use]
    pub fn with_response_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Response<Bytes>) + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub(crate) fn with_hook(mut self, hook: Option<ResponseHook>) -> Self {
        self.hook = hook;
        self
    }

    /// Returns the route table.
    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Returns every exchange so far, oldest first.
    #[must_use]
    pub fn exchanges(&self) -> Vec<Exchange> {
        self.exchanges.lock().clone()
    }

    /// Returns the most recent exchange.
    #[must_use]
    pub fn last_exchange(&self) -> Option<Exchange> {
        self.exchanges.lock().last().cloned()
    }

    /// Forgets recorded exchanges.
    pub fn clear(&self) {
        self.exchanges.lock().clear();
    }

    /// Dispatches `request` and records the exchange.
    pub async fn exchange(&self, request: Request<Bytes>) -> Response<Bytes> {
        let method = request.method().clone();
        let uri = request.uri().clone();
        let request_headers = request.headers().clone();
        let request_body = request.body().clone();
        let timeout = request
            .extensions()
            .get::<RequestTimeout>()
            .map(|t| t.0);

        let mut response = self.table.handle(request).await;
        if let Some(hook) = &self.hook {
            hook(&mut response);
        }

        self.exchanges.lock().push(Exchange {
            method,
            uri,
            request_headers,
            request_body,
            timeout,
            status: response.status(),
            response_headers: response.headers().clone(),
            response_body: response.body().clone(),
        });
        response
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn send(&self, request: Request<Bytes>) -> anyhow::Result<Response<Bytes>> {
        Ok(self.exchange(request).await)
    }
}

impl fmt::Debug for InMemoryTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryTransport")
            .field("table", &self.table)
            .field("exchanges", &self.exchanges.lock().len())
            .field("hook", &self.hook.is_some())
            .finish()
    }
}
