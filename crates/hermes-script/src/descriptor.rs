//! The per-route data embedded in generated scripts.
//!
//! A [`RouteDescriptor`] is a projection of one [`CompiledRoute`]: the path
//! pieces in order, and the parameters grouped by the same buckets the
//! Rust client reads. The generated runtime interprets it exactly as
//! `hermes-client` interprets the route itself.

use hermes_core::wire::is_json_media_type;
use hermes_core::{CompiledParameter, CompiledRoute, Origin, TypeDesc};
use hermes_router::PathSegment;
use serde::Serialize;
use serde_json::Value;

/// One piece of a request path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PathPiece {
    /// Literal text, copied as is.
    Literal(String),
    /// A placeholder filled from the named argument.
    Placeholder {
        /// Declared parameter name.
        name: String,
        /// Declared type, selecting the text form.
        #[serde(rename = "type")]
        ty: TypeDesc,
    },
}

/// A parameter as the script runtime sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    /// Declared parameter name; the key in the caller's argument object.
    pub name: String,
    /// Query key, header name or body field.
    pub field: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub ty: TypeDesc,
    /// Whether a value must be present.
    pub required: bool,
    /// Value used when an optional output header is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldDescriptor {
    fn from_param(param: &CompiledParameter) -> Self {
        Self {
            name: param.name.clone(),
            field: param.wire_name().to_string(),
            ty: param.ty,
            required: param.required,
            default: param.default.clone(),
        }
    }
}

/// Everything the script runtime needs to call one route.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDescriptor {
    /// `Contract.method`, used in error messages.
    pub id: String,
    /// HTTP method.
    pub method: String,
    /// Full path, base paths included.
    pub path: Vec<PathPiece>,
    /// Query fields; body-origin parameters of GET and HEAD routes land here.
    pub query: Vec<FieldDescriptor>,
    /// Request headers.
    pub headers: Vec<FieldDescriptor>,
    /// JSON body object fields.
    pub body: Vec<FieldDescriptor>,
    /// Response headers read back.
    pub outputs: Vec<FieldDescriptor>,
    /// Return type; `None` for void methods.
    pub returns: Option<TypeDesc>,
    /// True when the response body is raw text rather than JSON.
    pub text: bool,
}

impl RouteDescriptor {
    /// Projects `route`.
    #[must_use]
    pub fn from_route(route: &CompiledRoute) -> Self {
        let path = route
            .full_pattern()
            .segments()
            .iter()
            .map(|segment| match segment {
                PathSegment::Literal(text) => PathPiece::Literal(text.clone()),
                PathSegment::Placeholder(placeholder) => {
                    // Validated interfaces bind every placeholder to a path parameter.
                    match route
                        .inputs(Origin::Path)
                        .find(|p| p.wire_name() == placeholder.as_str())
                    {
                        Some(param) => PathPiece::Placeholder {
                            name: param.name.clone(),
                            ty: param.ty,
                        },
                        None => PathPiece::Placeholder {
                            name: placeholder.clone(),
                            ty: TypeDesc::String,
                        },
                    }
                }
            })
            .collect();

        let fields = |origin: Origin| -> Vec<FieldDescriptor> {
            route.inputs(origin).map(FieldDescriptor::from_param).collect()
        };

        Self {
            id: route.id().to_string(),
            method: route.http_method().to_string(),
            path,
            query: fields(Origin::Query),
            headers: fields(Origin::Header),
            body: fields(Origin::Body),
            outputs: route
                .output_headers()
                .map(FieldDescriptor::from_param)
                .collect(),
            returns: route.returns(),
            text: route.returns() == Some(TypeDesc::String)
                && !is_json_media_type(route.response_content_type()),
        }
    }

    /// Names of every argument the caller may pass.
    pub fn arguments(&self) -> impl Iterator<Item = &str> + '_ {
        let placeholders = self.path.iter().filter_map(|piece| match piece {
            PathPiece::Placeholder { name, .. } => Some(name.as_str()),
            PathPiece::Literal(_) => None,
        });
        placeholders.chain(
            self.query
                .iter()
                .chain(&self.headers)
                .chain(&self.body)
                .map(|f| f.name.as_str()),
        )
    }

    /// Renders the descriptor as a compact JSON object literal.
    #[must_use]
    pub fn to_literal(&self) -> String {
        // Keys are static strings and values plain JSON; rendering cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
