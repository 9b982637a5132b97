//! Extraction context providing access to request data.
//!
//! The [`ExtractionContext`] is what the dispatcher decodes arguments from,
//! and what computed-parameter resolvers receive.

use bytes::Bytes;
use hermes_core::RequestId;
use hermes_router::Params;
use http::{header, HeaderMap, Method, Uri};

/// Everything a handler may read from one request.
///
/// # Example
///
/// ```rust
/// use bytes::Bytes;
/// use hermes_extract::ExtractionContext;
/// use hermes_router::Params;
/// use http::{HeaderMap, Method, Uri};
///
/// let mut params = Params::new();
/// params.push("id", "7");
///
/// let ctx = ExtractionContext::new(
///     Method::GET,
///     Uri::from_static("/7/name?verbose=true"),
///     HeaderMap::new(),
///     Bytes::new(),
///     params,
/// );
///
/// assert_eq!(ctx.path_params().get("id"), Some("7"));
/// assert_eq!(ctx.query_value("verbose").as_deref(), Some("true"));
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_params: Params,
    query: Vec<(String, String)>,
    request_id: RequestId,
}

impl ExtractionContext {
    /// Creates a context with a fresh request id.
    ///
    /// A query string that does not decode as `application/x-www-form-urlencoded`
    /// is treated as empty.
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes, path_params: Params) -> Self {
        let query = uri
            .query()
            .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
            .unwrap_or_default();
        Self {
            method,
            uri,
            headers,
            body,
            path_params,
            query,
            request_id: RequestId::new(),
        }
    }

    /// Replaces the request id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the raw query string if present.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the first decoded query value for `name`.
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<String> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as text, if present and visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the `Content-Type` header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// Returns the request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// True when the body is empty or whitespace only.
    #[must_use]
    pub fn is_body_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// Returns the raw (still percent-encoded) path parameters.
    #[must_use]
    pub fn path_params(&self) -> &Params {
        &self.path_params
    }

    /// Returns the request id.
    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(uri: &'static str, body: &'static str) -> ExtractionContext {
        ExtractionContext::new(
            Method::POST,
            Uri::from_static(uri),
            HeaderMap::new(),
            Bytes::from_static(body.as_bytes()),
            Params::new(),
        )
    }

    #[test]
    fn test_query_decoding() {
        let ctx = ctx("/search?q=rust+lang&tag=a%2Fb&tag=c", "");
        assert_eq!(ctx.query_string(), Some("q=rust+lang&tag=a%2Fb&tag=c"));
        assert_eq!(ctx.query_value("q").as_deref(), Some("rust lang"));
        assert_eq!(ctx.query_value("tag").as_deref(), Some("a/b"));
        assert_eq!(ctx.query_value("missing"), None);
    }

    #[test]
    fn test_body_emptiness() {
        assert!(ctx("/", "").is_body_empty());
        assert!(ctx("/", " \n").is_body_empty());
        assert!(!ctx("/", "{}").is_body_empty());
    }

    #[test]
    fn test_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        let ctx = ExtractionContext::new(
            Method::GET,
            Uri::from_static("/"),
            headers,
            Bytes::new(),
            Params::new(),
        );
        assert_eq!(ctx.content_type(), Some("application/json"));
        assert_eq!(ctx.header("x-missing"), None);
    }

    #[test]
    fn test_request_id_override() {
        let id = RequestId::new();
        let ctx = ctx("/", "").with_request_id(id);
        assert_eq!(ctx.request_id(), &id);
    }
}
