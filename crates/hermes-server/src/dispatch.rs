//! Per-route request handlers.
//!
//! [`register_routes`] turns every [`CompiledRoute`] of an interface into a
//! [`Handler`] and hands it to a [`RouteRegistrar`]. A handler:
//!
//! 1. decodes each parameter from its bucket (path, query, header, body),
//! 2. runs the computed-parameter resolvers,
//! 3. invokes the implementation, catching panics,
//! 4. writes output headers, then the JSON return value or the error
//!    envelope.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::FutureExt;
use hermes_core::wire::{is_json_media_type, kind_of, to_wire_string};
use hermes_core::{
    CompiledInterface, CompiledRoute, ErrorEnvelope, HermesError, Origin, RequestId, TypeDesc,
    DEFAULT_CONTENT_TYPE, REQUEST_ID_HEADER,
};
use hermes_extract::{decode_arguments, ExtractionContext, Params};
use hermes_router::PathPattern;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, Request, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, error, info_span, warn, Instrument};

use crate::config::ServerConfig;
use crate::error::{RegistrationError, RegistrationResult};
use crate::service::{Call, MethodFn, OutputSlots, Resolver, ServiceImpl};

/// Content type of error envelopes.
pub const ERROR_CONTENT_TYPE: &str = "application/json";

/// Boxed future returned by a [`Handler`].
pub type HandlerFuture = Pin<Box<dyn Future<Output = Response<Bytes>> + Send>>;

/// A request handler for one route.
///
/// Receives the full request and the raw placeholder values captured by the
/// host's router.
pub type Handler = Arc<dyn Fn(Request<Bytes>, Params) -> HandlerFuture + Send + Sync>;

/// Where generated handlers are registered.
///
/// Any HTTP host can implement this; [`RouteTable`](crate::RouteTable) is
/// the in-process one.
pub trait RouteRegistrar {
    /// Registers `handler` for `method` requests matching `pattern`.
    fn register_handler(
        &mut self,
        method: Method,
        pattern: &PathPattern,
        handler: Handler,
    ) -> RegistrationResult<()>;
}

/// Checks that `implementation` covers `interface` exactly.
///
/// # Errors
///
/// Fails on the first method without an implementation, computed parameter
/// without a resolver, or implementation the contract does not declare.
pub fn check_implementation(
    interface: &CompiledInterface,
    implementation: &ServiceImpl,
) -> RegistrationResult<()> {
    for route in interface.routes() {
        if implementation.method_fn(route.name()).is_none() {
            return Err(RegistrationError::MissingImplementation {
                method: route.id().clone(),
            });
        }
        for param in route.inputs(Origin::Computed) {
            if implementation.resolver_fn(&param.name).is_none() {
                return Err(RegistrationError::MissingResolver {
                    method: route.id().clone(),
                    param: param.name.clone(),
                });
            }
        }
    }

    for binding in interface.bindings() {
        let nested = implementation.nested_impl(binding.name()).ok_or_else(|| {
            RegistrationError::MissingImplementation {
                method: binding.method_id().clone(),
            }
        })?;
        check_implementation(binding.interface(), nested)?;
    }

    let mut unknown: Vec<&str> = implementation
        .method_names()
        .filter(|name| interface.route(name).is_none())
        .chain(
            implementation
                .nested_names()
                .filter(|name| interface.binding(name).is_none()),
        )
        .collect();
    unknown.sort_unstable();
    if let Some(name) = unknown.first() {
        return Err(RegistrationError::UnknownMethod {
            contract: interface.contract_name().to_string(),
            name: (*name).to_string(),
        });
    }

    Ok(())
}

/// Builds a handler for every route of `interface`, nested ones included,
/// and registers it with `registrar`.
///
/// Call [`check_implementation`] first.
///
/// # Errors
///
/// Fails when the implementation is incomplete or the registrar rejects a
/// route.
pub fn register_routes<R: RouteRegistrar + ?Sized>(
    registrar: &mut R,
    interface: &CompiledInterface,
    implementation: &ServiceImpl,
    config: &Arc<ServerConfig>,
) -> RegistrationResult<()> {
    for route in interface.routes() {
        let dispatcher = RouteDispatcher::new(route, implementation, Arc::clone(config))?;
        debug!(
            route = %route.id(),
            method = %route.http_method(),
            pattern = %route.full_pattern(),
            "registering handler"
        );
        registrar.register_handler(
            route.http_method().clone(),
            route.full_pattern(),
            dispatcher.into_handler(),
        )?;
    }

    for binding in interface.bindings() {
        let nested = implementation.nested_impl(binding.name()).ok_or_else(|| {
            RegistrationError::MissingImplementation {
                method: binding.method_id().clone(),
            }
        })?;
        register_routes(registrar, binding.interface(), nested, config)?;
    }

    Ok(())
}

/// Serves one compiled route.
struct RouteDispatcher {
    route: CompiledRoute,
    method: MethodFn,
    resolvers: Vec<(String, Resolver)>,
    config: Arc<ServerConfig>,
}

impl RouteDispatcher {
    fn new(
        route: &CompiledRoute,
        implementation: &ServiceImpl,
        config: Arc<ServerConfig>,
    ) -> RegistrationResult<Self> {
        let method = implementation.method_fn(route.name()).cloned().ok_or_else(|| {
            RegistrationError::MissingImplementation {
                method: route.id().clone(),
            }
        })?;

        let resolvers = route
            .inputs(Origin::Computed)
            .map(|param| {
                implementation
                    .resolver_fn(&param.name)
                    .map(|r| (param.name.clone(), Arc::clone(r)))
                    .ok_or_else(|| RegistrationError::MissingResolver {
                        method: route.id().clone(),
                        param: param.name.clone(),
                    })
            })
            .collect::<RegistrationResult<Vec<_>>>()?;

        Ok(Self {
            route: route.clone(),
            method,
            resolvers,
            config,
        })
    }

    fn into_handler(self) -> Handler {
        let this = Arc::new(self);
        Arc::new(move |request: Request<Bytes>, params: Params| {
            let this = Arc::clone(&this);
            Box::pin(async move { this.dispatch(request, params).await }) as HandlerFuture
        })
    }

    async fn dispatch(&self, request: Request<Bytes>, params: Params) -> Response<Bytes> {
        let (parts, body) = request.into_parts();
        let request_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<RequestId>().ok())
            .unwrap_or_default();
        let is_head = parts.method == Method::HEAD;

        let span = info_span!(
            "dispatch",
            route = %self.route.id(),
            method = %parts.method,
            request_id = %request_id,
        );

        let ctx = ExtractionContext::new(parts.method, parts.uri, parts.headers, body, params)
            .with_request_id(request_id);

        let mut response = self.run(ctx).instrument(span).await;

        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }
        if is_head {
            *response.body_mut() = Bytes::new();
        }
        response
    }

    async fn run(&self, ctx: ExtractionContext) -> Response<Bytes> {
        let request_id = *ctx.request_id();

        let mut args = match decode_arguments(&self.route, &ctx, self.config.max_body_bytes()) {
            Ok(args) => args,
            Err(e) => {
                warn!(source = %e.extraction_source(), error = %e, "request rejected");
                return self.failure(&HermesError::from(e), &request_id, HeaderMap::new());
            }
        };

        for (name, resolver) in &self.resolvers {
            match resolver(&ctx) {
                Ok(value) => args.insert(name.clone(), value),
                Err(e) => {
                    warn!(param = %name, error = %e, "computed parameter failed");
                    return self.failure(&e, &request_id, HeaderMap::new());
                }
            }
        }

        let outputs = OutputSlots::default();
        for param in self.route.output_headers() {
            if let Some(value) = args.get(&param.name).filter(|v| !v.is_null()) {
                outputs.set(param.name.clone(), value.clone());
            }
        }

        let call = Call::new(self.route.id().clone(), Arc::new(ctx), args, outputs.clone());
        let result = AssertUnwindSafe((self.method)(call)).catch_unwind().await;

        let headers = match self.output_headers(&outputs) {
            Ok(headers) => headers,
            Err(e) => return self.failure(&e, &request_id, HeaderMap::new()),
        };

        match result {
            Ok(Ok(value)) => match self.success(value, headers) {
                Ok(response) => response,
                Err(e) => self.failure(&e, &request_id, HeaderMap::new()),
            },
            Ok(Err(e)) => self.failure(&e, &request_id, headers),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(panic = %message, "implementation panicked");
                let err = HermesError::internal_with_source(
                    "internal server error",
                    anyhow::anyhow!("panic: {message}"),
                );
                self.failure(&err, &request_id, HeaderMap::new())
            }
        }
    }

    fn output_headers(&self, outputs: &OutputSlots) -> Result<HeaderMap, HermesError> {
        let mut headers = HeaderMap::new();
        for param in self.route.output_headers() {
            let Some(value) = outputs.get(&param.name).filter(|v| !v.is_null()) else {
                continue;
            };
            let text = to_wire_string(param.ty, &value).map_err(|e| {
                HermesError::internal_with_source(
                    format!("cannot encode output header `{}`", param.name),
                    e,
                )
            })?;
            let name = HeaderName::from_bytes(param.wire_name().as_bytes())
                .map_err(|e| HermesError::internal_with_source("invalid header name", e))?;
            let value = HeaderValue::from_str(&text)
                .map_err(|e| HermesError::internal_with_source("invalid header value", e))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    fn success(&self, value: Value, headers: HeaderMap) -> Result<Response<Bytes>, HermesError> {
        let content_type = self.route.response_content_type();
        let raw_text =
            self.route.returns() == Some(TypeDesc::String) && !is_json_media_type(content_type);
        let body = match (self.route.returns(), value) {
            (None, _) => Bytes::from_static(b"{}"),
            (Some(_), Value::String(text)) if raw_text => Bytes::from(text),
            // A raw text body has no way to say `null` or carry a non-string.
            (Some(_), other) if raw_text => {
                return Err(HermesError::internal(format!(
                    "{} must return a string for `{content_type}`, got {}",
                    self.route.id(),
                    kind_of(&other)
                )));
            }
            (Some(_), value) => serde_json::to_vec(&value)
                .map(Bytes::from)
                .map_err(|e| HermesError::internal_with_source("cannot encode return value", e))?,
        };
        let content_type = if self.route.is_void() {
            DEFAULT_CONTENT_TYPE
        } else {
            content_type
        };

        let mut response = Response::new(body);
        *response.headers_mut() = headers;
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_str(content_type)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE)),
        );
        Ok(response)
    }

    fn failure(
        &self,
        err: &HermesError,
        request_id: &RequestId,
        headers: HeaderMap,
    ) -> Response<Bytes> {
        if err.is_server_error() {
            error!(error = %err, "request failed");
        } else {
            warn!(status = %err.status_code(), error = %err, "request failed");
        }
        let envelope = err.to_envelope(Some(request_id), self.config.debug_errors());
        let mut response = envelope_response(err.status_code(), &envelope);
        for (name, value) in &headers {
            response.headers_mut().insert(name.clone(), value.clone());
        }
        response
    }
}

/// Renders an error envelope as a response.
pub fn envelope_response(status: StatusCode, envelope: &ErrorEnvelope) -> Response<Bytes> {
    let mut response = Response::new(Bytes::from(envelope.to_json_bytes()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(ERROR_CONTENT_TYPE));
    response
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
