//! Service contract declarations.
//!
//! A [`ServiceContract`] is the static description of an API: an ordered
//! list of method declarations with their parameters and annotations. It is
//! declared once and never mutated; both the server and the client compile
//! the same declaration into a [`CompiledInterface`](crate::CompiledInterface).
//!
//! # Example
//!
//! ```
//! use hermes_core::contract::{MethodDecl, ParamDecl, ServiceContract, TypeDesc};
//!
//! let contract = ServiceContract::builder("Profile")
//!     .method(
//!         MethodDecl::builder("getName")
//!             .param(ParamDecl::new("id", TypeDesc::Integer))
//!             .returns(TypeDesc::String)
//!             .build(),
//!     )
//!     .method(
//!         MethodDecl::builder("setName")
//!             .param(ParamDecl::new("id", TypeDesc::Integer))
//!             .param(ParamDecl::new("name", TypeDesc::String))
//!             .build(),
//!     )
//!     .build();
//!
//! assert_eq!(contract.methods().len(), 2);
//! assert!(contract.method("getName").is_some());
//! ```

use std::fmt;
use std::sync::Arc;

use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire-level type of a parameter or return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeDesc {
    /// UTF-8 text.
    String,
    /// Signed or unsigned integer.
    Integer,
    /// Floating point number.
    Float,
    /// `true` / `false`.
    Boolean,
    /// Any JSON value (objects, arrays, ...).
    Json,
}

impl TypeDesc {
    /// Returns the lowercase type name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which way a parameter travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Read from the request only.
    #[default]
    In,
    /// Written to the response only.
    Out,
    /// Read from the request and written back to the response.
    InOut,
}

impl Direction {
    /// Returns true if the value is read from the request.
    #[must_use]
    pub const fn is_input(self) -> bool {
        matches!(self, Self::In | Self::InOut)
    }

    /// Returns true if the value is written to the response.
    #[must_use]
    pub const fn is_output(self) -> bool {
        matches!(self, Self::Out | Self::InOut)
    }
}

/// A formal parameter of a contract method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamDecl {
    name: String,
    ty: TypeDesc,
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    direction: Direction,
}

impl ParamDecl {
    /// Declares a required input parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeDesc) -> Self {
        Self {
            name: name.into(),
            ty,
            required: true,
            default: None,
            direction: Direction::In,
        }
    }

    /// Marks the parameter optional; an absent value decodes to `null`.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Gives the parameter a default used when the value is absent.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(value.into());
        self
    }

    /// Marks the parameter as written to the response only.
    #[must_use]
    pub fn output(mut self) -> Self {
        self.direction = Direction::Out;
        self
    }

    /// Marks the parameter as read from the request and written back.
    #[must_use]
    pub fn in_out(mut self) -> Self {
        self.direction = Direction::InOut;
        self
    }

    /// Returns the parameter name as declared.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type.
    #[must_use]
    pub const fn ty(&self) -> TypeDesc {
        self.ty
    }

    /// Returns true unless the parameter is optional or defaulted.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the default value, if any.
    #[must_use]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns the parameter direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }
}

/// Per-parameter origin annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum OriginAnnotation {
    /// Travel as the named request/response header.
    Header {
        /// Parameter the annotation applies to.
        param: String,
        /// Header name on the wire.
        field: String,
    },
    /// Travel as the named query-string field.
    Query {
        /// Parameter the annotation applies to.
        param: String,
        /// Query field name on the wire.
        field: String,
    },
    /// Travel as the named field of the JSON body object.
    Body {
        /// Parameter the annotation applies to.
        param: String,
        /// Body field name on the wire.
        field: String,
    },
    /// Computed by the server from the request; never on the wire.
    Computed {
        /// Parameter the annotation applies to.
        param: String,
    },
}

impl OriginAnnotation {
    /// Returns the annotated parameter name.
    #[must_use]
    pub fn param(&self) -> &str {
        match self {
            Self::Header { param, .. }
            | Self::Query { param, .. }
            | Self::Body { param, .. }
            | Self::Computed { param } => param,
        }
    }
}

/// Property-style accessor convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessor {
    /// Property getter, served as GET.
    Getter,
    /// Property setter, served as PUT.
    Setter,
}

/// What a method returns.
#[derive(Debug, Clone)]
pub enum ReturnKind {
    /// Nothing; the response body is `{}`.
    Void,
    /// A JSON value of the given type.
    Value(TypeDesc),
    /// Another service contract, mounted as a nested route group.
    Contract(Arc<ServiceContract>),
}

impl ReturnKind {
    /// Returns the nested contract, if this method is a nesting method.
    #[must_use]
    pub fn nested(&self) -> Option<&Arc<ServiceContract>> {
        match self {
            Self::Contract(contract) => Some(contract),
            _ => None,
        }
    }
}

/// A method declaration.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    name: String,
    params: Vec<ParamDecl>,
    returns: ReturnKind,
    http_method: Option<Method>,
    path: Option<String>,
    accessor: Option<Accessor>,
    annotations: Vec<OriginAnnotation>,
    content_type: Option<String>,
}

impl MethodDecl {
    /// Starts a method declaration.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> MethodDeclBuilder {
        MethodDeclBuilder::new(name)
    }

    /// Returns the method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the formal parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ParamDecl] {
        &self.params
    }

    /// Looks up a parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParamDecl> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Returns the return kind.
    #[must_use]
    pub fn returns(&self) -> &ReturnKind {
        &self.returns
    }

    /// Returns the explicit HTTP method annotation.
    #[must_use]
    pub fn http_method(&self) -> Option<&Method> {
        self.http_method.as_ref()
    }

    /// Returns the explicit path annotation.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Returns the accessor convention, if any.
    #[must_use]
    pub const fn accessor(&self) -> Option<Accessor> {
        self.accessor
    }

    /// Returns all origin annotations in declaration order.
    #[must_use]
    pub fn annotations(&self) -> &[OriginAnnotation] {
        &self.annotations
    }

    /// Returns the annotations that name `param`.
    pub fn annotations_for<'a>(
        &'a self,
        param: &'a str,
    ) -> impl Iterator<Item = &'a OriginAnnotation> + 'a {
        self.annotations.iter().filter(move |a| a.param() == param)
    }

    /// Returns the content-type hint.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns true if the method returns another contract.
    #[must_use]
    pub fn is_nesting(&self) -> bool {
        matches!(self.returns, ReturnKind::Contract(_))
    }
}

/// Builder for [`MethodDecl`].
#[derive(Debug)]
pub struct MethodDeclBuilder {
    decl: MethodDecl,
}

impl MethodDeclBuilder {
    /// Creates a builder for a method with no parameters returning nothing.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            decl: MethodDecl {
                name: name.into(),
                params: Vec::new(),
                returns: ReturnKind::Void,
                http_method: None,
                path: None,
                accessor: None,
                annotations: Vec::new(),
                content_type: None,
            },
        }
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, param: ParamDecl) -> Self {
        self.decl.params.push(param);
        self
    }

    /// Appends several parameters.
    #[must_use]
    pub fn params(mut self, params: impl IntoIterator<Item = ParamDecl>) -> Self {
        self.decl.params.extend(params);
        self
    }

    /// Sets a JSON return type.
    #[must_use]
    pub fn returns(mut self, ty: TypeDesc) -> Self {
        self.decl.returns = ReturnKind::Value(ty);
        self
    }

    /// Makes this a nesting method returning `contract`.
    #[must_use]
    pub fn returns_contract(mut self, contract: impl Into<Arc<ServiceContract>>) -> Self {
        self.decl.returns = ReturnKind::Contract(contract.into());
        self
    }

    /// Sets an explicit HTTP method.
    #[must_use]
    pub fn http_method(mut self, method: Method) -> Self {
        self.decl.http_method = Some(method);
        self
    }

    /// Sets an explicit path pattern, relative to the contract base path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.decl.path = Some(path.into());
        self
    }

    /// Declares the method a property getter.
    #[must_use]
    pub fn getter(mut self) -> Self {
        self.decl.accessor = Some(Accessor::Getter);
        self
    }

    /// Declares the method a property setter.
    #[must_use]
    pub fn setter(mut self) -> Self {
        self.decl.accessor = Some(Accessor::Setter);
        self
    }

    /// Sends `param` as the header `field`.
    #[must_use]
    pub fn header(mut self, param: impl Into<String>, field: impl Into<String>) -> Self {
        self.decl.annotations.push(OriginAnnotation::Header {
            param: param.into(),
            field: field.into(),
        });
        self
    }

    /// Sends `param` as the query field `field`.
    #[must_use]
    pub fn query(mut self, param: impl Into<String>, field: impl Into<String>) -> Self {
        self.decl.annotations.push(OriginAnnotation::Query {
            param: param.into(),
            field: field.into(),
        });
        self
    }

    /// Sends `param` as the body field `field`.
    #[must_use]
    pub fn body(mut self, param: impl Into<String>, field: impl Into<String>) -> Self {
        self.decl.annotations.push(OriginAnnotation::Body {
            param: param.into(),
            field: field.into(),
        });
        self
    }

    /// Marks `param` as computed on the server from the request.
    #[must_use]
    pub fn computed(mut self, param: impl Into<String>) -> Self {
        self.decl.annotations.push(OriginAnnotation::Computed {
            param: param.into(),
        });
        self
    }

    /// Sets the response content-type hint.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.decl.content_type = Some(content_type.into());
        self
    }

    /// Finishes the declaration.
    #[must_use]
    pub fn build(self) -> MethodDecl {
        self.decl
    }
}

/// A declared service contract.
#[derive(Debug, Clone)]
pub struct ServiceContract {
    name: String,
    base_path: Option<String>,
    methods: Vec<MethodDecl>,
}

impl ServiceContract {
    /// Starts a contract declaration.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ServiceContractBuilder {
        ServiceContractBuilder::new(name)
    }

    /// Returns the contract name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the base path annotation.
    #[must_use]
    pub fn base_path(&self) -> Option<&str> {
        self.base_path.as_deref()
    }

    /// Returns the methods in declaration order.
    #[must_use]
    pub fn methods(&self) -> &[MethodDecl] {
        &self.methods
    }

    /// Looks up a method by name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Builder for [`ServiceContract`].
#[derive(Debug)]
pub struct ServiceContractBuilder {
    name: String,
    base_path: Option<String>,
    methods: Vec<MethodDecl>,
}

impl ServiceContractBuilder {
    /// Creates a builder for an empty contract.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_path: None,
            methods: Vec::new(),
        }
    }

    /// Sets the base path every method is mounted under.
    #[must_use]
    pub fn base_path(mut self, path: impl Into<String>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Appends a method.
    #[must_use]
    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    /// Appends several methods.
    #[must_use]
    pub fn methods(mut self, methods: impl IntoIterator<Item = MethodDecl>) -> Self {
        self.methods.extend(methods);
        self
    }

    /// Finishes the contract.
    #[must_use]
    pub fn build(self) -> ServiceContract {
        ServiceContract {
            name: self.name,
            base_path: self.base_path,
            methods: self.methods,
        }
    }
}

/// Identifies a method for diagnostics: `Contract.method`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodId {
    /// Name of the declaring contract.
    pub contract: String,
    /// Method name.
    pub method: String,
}

impl MethodId {
    /// Creates a method id.
    #[must_use]
    pub fn new(contract: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.contract, self.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_param_defaults() {
        let p = ParamDecl::new("id", TypeDesc::Integer);
        assert!(p.is_required());
        assert_eq!(p.direction(), Direction::In);
        assert!(p.default().is_none());
    }

    #[test]
    fn test_param_default_value_makes_optional() {
        let p = ParamDecl::new("limit", TypeDesc::Integer).default_value(20);
        assert!(!p.is_required());
        assert_eq!(p.default(), Some(&json!(20)));
    }

    #[test]
    fn test_direction_flags() {
        assert!(Direction::In.is_input());
        assert!(!Direction::In.is_output());
        assert!(!Direction::Out.is_input());
        assert!(Direction::InOut.is_input() && Direction::InOut.is_output());
    }

    #[test]
    fn test_method_builder() {
        let m = MethodDecl::builder("getPullRequests")
            .path(":owner/:repo/pulls")
            .http_method(Method::GET)
            .param(ParamDecl::new("_owner", TypeDesc::String))
            .param(ParamDecl::new("_repo", TypeDesc::String))
            .header("etag", "ETag")
            .content_type("application/vnd.api+json")
            .returns(TypeDesc::Json)
            .build();

        assert_eq!(m.name(), "getPullRequests");
        assert_eq!(m.path(), Some(":owner/:repo/pulls"));
        assert_eq!(m.http_method(), Some(&Method::GET));
        assert_eq!(m.params().len(), 2);
        assert!(m.param("_repo").is_some());
        assert_eq!(m.annotations_for("etag").count(), 1);
        assert_eq!(m.content_type(), Some("application/vnd.api+json"));
        assert!(!m.is_nesting());
    }

    #[test]
    fn test_nesting_method() {
        let inner = ServiceContract::builder("Issues").build();
        let m = MethodDecl::builder("issues").returns_contract(inner).build();
        assert!(m.is_nesting());
        assert_eq!(m.returns().nested().map(|c| c.name()), Some("Issues"));
    }

    #[test]
    fn test_contract_lookup() {
        let contract = ServiceContract::builder("Profile")
            .base_path("/profile")
            .methods([
                MethodDecl::builder("getName").build(),
                MethodDecl::builder("setName").build(),
            ])
            .build();

        assert_eq!(contract.name(), "Profile");
        assert_eq!(contract.base_path(), Some("/profile"));
        assert!(contract.method("setName").is_some());
        assert!(contract.method("deleteName").is_none());
    }

    #[test]
    fn test_method_id_display() {
        assert_eq!(MethodId::new("Profile", "getName").to_string(), "Profile.getName");
    }
}
