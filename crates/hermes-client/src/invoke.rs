//! The invocation interpreter.
//!
//! One generic pair of functions serves every route: [`build_request`]
//! reads the route's compiled buckets to lay arguments out on the wire, and
//! [`read_reply`] reads output headers and the return value back. Nothing
//! is generated per method.

use std::collections::HashMap;

use bytes::Bytes;
use hermes_core::wire::{
    check_value, from_wire_string, is_json_media_type, to_wire_string, JSON_MEDIA_TYPE,
};
use hermes_core::{
    CompiledParameter, CompiledRoute, ErrorEnvelope, MethodId, Origin, RequestId, TypeDesc,
    REQUEST_ID_HEADER,
};
use hermes_router::{concat_url, PatternError};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::config::{ClientConfig, RequestTimeout};
use crate::error::{ClientError, ClientResult};

/// Arguments keyed by declared parameter name.
pub type ArgumentMap = IndexMap<String, Value>;

/// Builds the request for one invocation of `route`.
///
/// `null` arguments count as absent. Absent optional arguments are left
/// off the wire so the server applies its default.
///
/// # Errors
///
/// Fails on unknown or missing arguments and on values that do not fit
/// their declared type.
pub fn build_request(
    route: &CompiledRoute,
    args: &ArgumentMap,
    base_url: &str,
    config: &ClientConfig,
) -> ClientResult<Request<Bytes>> {
    for name in args.keys() {
        if !route.param(name).is_some_and(CompiledParameter::is_sent) {
            return Err(ClientError::UnknownArgument {
                method: route.id().clone(),
                name: name.clone(),
            });
        }
    }

    let present = |param: &CompiledParameter| args.get(&param.name).filter(|v| !v.is_null());
    for param in route.params().iter().filter(|p| p.is_sent()) {
        if param.required && present(param).is_none() {
            return Err(ClientError::MissingArgument {
                method: route.id().clone(),
                name: param.name.clone(),
            });
        }
    }

    let mut placeholders = HashMap::new();
    for param in route.inputs(Origin::Path) {
        if let Some(value) = present(param) {
            let text = encode_text(route.id(), param, value)?;
            if text.is_empty() {
                return Err(encode_error(
                    route.id(),
                    &param.name,
                    "path segments cannot be empty",
                ));
            }
            placeholders.insert(param.wire_name(), urlencoding::encode(&text).into_owned());
        }
    }
    let path = route
        .full_pattern()
        .render(|name| placeholders.get(name).cloned())
        .map_err(|e| match e {
            PatternError::UnboundPlaceholder { name, .. } => ClientError::MissingArgument {
                method: route.id().clone(),
                name,
            },
            other => encode_error(route.id(), "path", other),
        })?;

    let mut query = Vec::new();
    for param in route.inputs(Origin::Query) {
        if let Some(value) = present(param) {
            query.push((param.wire_name(), encode_text(route.id(), param, value)?));
        }
    }

    let mut headers = HeaderMap::new();
    for (name, value) in &config.default_headers {
        insert_header(&mut headers, route.id(), name, value)?;
    }
    for param in route.inputs(Origin::Header) {
        if let Some(value) = present(param) {
            let text = encode_text(route.id(), param, value)?;
            insert_header(&mut headers, route.id(), param.wire_name(), &text)?;
        }
    }
    if !headers.contains_key(REQUEST_ID_HEADER) {
        let request_id = RequestId::new().to_string();
        insert_header(&mut headers, route.id(), REQUEST_ID_HEADER, &request_id)?;
    }

    let body = if route.has_body() {
        let mut object = Map::new();
        for param in route.inputs(Origin::Body) {
            if let Some(value) = present(param) {
                check_value(param.ty, value)
                    .map_err(|e| encode_error(route.id(), &param.name, e))?;
                object.insert(param.wire_name().to_string(), value.clone());
            }
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_MEDIA_TYPE));
        serde_json::to_vec(&object)
            .map(Bytes::from)
            .map_err(|e| encode_error(route.id(), "body", e))?
    } else {
        Bytes::new()
    };

    let mut url = concat_url(base_url, &path);
    if !query.is_empty() {
        let encoded = serde_urlencoded::to_string(&query)
            .map_err(|e| encode_error(route.id(), "query", e))?;
        url.push('?');
        url.push_str(&encoded);
    }
    let uri = Uri::try_from(url.as_str()).map_err(|e| encode_error(route.id(), "url", e))?;

    let mut request = Request::new(body);
    *request.method_mut() = route.http_method().clone();
    *request.uri_mut() = uri;
    *request.headers_mut() = headers;
    if let Some(timeout) = config.timeout() {
        request.extensions_mut().insert(RequestTimeout(timeout));
    }
    Ok(request)
}

/// Reads the response to one invocation of `route`.
///
/// # Errors
///
/// Returns [`ClientError::Status`] for non-2xx responses,
/// [`ClientError::InterfaceMismatch`] when a required output header is
/// missing or a value does not fit its declared type, and
/// [`ClientError::Decode`] for unreadable bodies.
pub fn read_reply(route: &CompiledRoute, response: Response<Bytes>) -> ClientResult<Reply> {
    let (parts, body) = response.into_parts();

    if !parts.status.is_success() {
        let envelope = serde_json::from_slice::<ErrorEnvelope>(&body).unwrap_or_else(|_| {
            ErrorEnvelope::for_status(parts.status, String::from_utf8_lossy(&body).into_owned())
        });
        return Err(ClientError::Status {
            status: parts.status,
            envelope,
        });
    }

    let mut outputs = IndexMap::new();
    for param in route.output_headers() {
        let value = match parts.headers.get(param.wire_name()) {
            Some(raw) => {
                let text = raw.to_str().map_err(|e| {
                    mismatch(route.id(), format!("header `{}`: {e}", param.wire_name()))
                })?;
                from_wire_string(param.ty, text).map_err(|e| {
                    mismatch(route.id(), format!("header `{}`: {e}", param.wire_name()))
                })?
            }
            None => param.absent_value().ok_or_else(|| {
                mismatch(
                    route.id(),
                    format!("missing required response header `{}`", param.wire_name()),
                )
            })?,
        };
        outputs.insert(param.name.clone(), value);
    }

    let value = match route.returns() {
        None => Value::Null,
        Some(_) if route.http_method() == Method::HEAD => Value::Null,
        Some(TypeDesc::String) if !is_json_media_type(route.response_content_type()) => {
            String::from_utf8(body.to_vec())
                .map(Value::String)
                .map_err(|e| decode_error(route.id(), e))?
        }
        Some(ty) => {
            let value: Value =
                serde_json::from_slice(&body).map_err(|e| decode_error(route.id(), e))?;
            if !value.is_null() {
                check_value(ty, &value).map_err(|e| mismatch(route.id(), e.to_string()))?;
            }
            value
        }
    };

    Ok(Reply {
        method: route.id().clone(),
        status: parts.status,
        headers: parts.headers,
        value,
        outputs,
    })
}

/// A successful response.
#[derive(Debug, Clone)]
pub struct Reply {
    method: MethodId,
    status: StatusCode,
    headers: HeaderMap,
    value: Value,
    outputs: IndexMap<String, Value>,
}

impl Reply {
    /// Returns the method that was invoked.
    #[must_use]
    pub fn method(&self) -> &MethodId {
        &self.method
    }

    /// Returns the HTTP status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the raw response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the return value; `null` for void methods.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes the reply, returning the return value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Deserializes the return value.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] if it does not fit `T`.
    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        serde_json::from_value(self.value.clone()).map_err(|e| decode_error(&self.method, e))
    }

    /// Returns the output header parameter `name`, by declared name.
    #[must_use]
    pub fn output(&self, name: &str) -> Option<&Value> {
        self.outputs.get(name)
    }

    /// Deserializes the output header parameter `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] if it is absent or does not fit `T`.
    pub fn output_as<T: DeserializeOwned>(&self, name: &str) -> ClientResult<T> {
        let value = self
            .outputs
            .get(name)
            .ok_or_else(|| decode_error(&self.method, format!("no output `{name}`")))?;
        serde_json::from_value(value.clone()).map_err(|e| decode_error(&self.method, e))
    }

    /// Returns the server's request id, if echoed.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
    }
}

fn encode_text(method: &MethodId, param: &CompiledParameter, value: &Value) -> ClientResult<String> {
    to_wire_string(param.ty, value).map_err(|e| encode_error(method, &param.name, e))
}

fn insert_header(
    headers: &mut HeaderMap,
    method: &MethodId,
    name: &str,
    value: &str,
) -> ClientResult<()> {
    let header = HeaderName::from_bytes(name.as_bytes()).map_err(|e| encode_error(method, name, e))?;
    let value = HeaderValue::from_str(value).map_err(|e| encode_error(method, name, e))?;
    headers.insert(header, value);
    Ok(())
}

fn encode_error(method: &MethodId, name: &str, reason: impl std::fmt::Display) -> ClientError {
    ClientError::Encode {
        method: method.clone(),
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn decode_error(method: &MethodId, reason: impl std::fmt::Display) -> ClientError {
    ClientError::Decode {
        method: method.clone(),
        reason: reason.to_string(),
    }
}

fn mismatch(method: &MethodId, detail: String) -> ClientError {
    ClientError::InterfaceMismatch {
        method: method.clone(),
        detail,
    }
}
