//! Contract compilation.
//!
//! [`ContractCompiler`] turns a [`ServiceContract`] into a
//! [`CompiledInterface`]: the immutable route table that both the server
//! dispatcher and the client interpreter walk. Compiling is
//! describe, then validate, then build.
//!
//! ```rust
//! use hermes_core::compile::{CompilerConfig, ContractCompiler};
//! use hermes_core::contract::{MethodDecl, ParamDecl, ServiceContract, TypeDesc};
//! use http::Method;
//!
//! let contract = ServiceContract::builder("Profile")
//!     .method(
//!         MethodDecl::builder("getName")
//!             .param(ParamDecl::new("id", TypeDesc::Integer))
//!             .returns(TypeDesc::String)
//!             .build(),
//!     )
//!     .build();
//!
//! let compiled = ContractCompiler::new(CompilerConfig::default())
//!     .compile(&contract)
//!     .unwrap();
//! let route = compiled.route("getName").unwrap();
//! assert_eq!(route.http_method(), &Method::GET);
//! assert_eq!(route.full_pattern().as_str(), "/:id/name");
//! ```

use http::Method;
use hermes_router::PathPattern;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::contract::{Direction, MethodId, ReturnKind, ServiceContract, TypeDesc};
use crate::describe::{describe, ContractDescription, MethodDescription, MethodShape, RouteDescription};
use crate::naming::NamingStyle;
use crate::params::Origin;
use crate::validate::{validate, CompileError, IssueKind, ValidationIssue, ValidationReport};

/// Content type used when a method declares none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Compiler settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Style applied to derived path fragments.
    pub method_style: NamingStyle,
    /// Trim one trailing `_` from default-origin field names.
    pub strip_trailing_underscore: bool,
    /// Prefix mounted in front of every contract base path.
    pub url_prefix: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            method_style: NamingStyle::default(),
            strip_trailing_underscore: true,
            url_prefix: "/".to_string(),
        }
    }
}

/// One compiled parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledParameter {
    /// Declared name.
    pub name: String,
    /// Wire field name; `None` for computed parameters.
    pub field: Option<String>,
    /// Where it travels.
    pub origin: Origin,
    /// Declared type.
    pub ty: TypeDesc,
    /// Whether a value must be supplied.
    pub required: bool,
    /// Value used when an optional parameter is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Data direction.
    pub direction: Direction,
    /// Position in the declared parameter list.
    pub position: usize,
}

impl CompiledParameter {
    /// Returns the wire field name, falling back to the declared name.
    #[must_use]
    pub fn wire_name(&self) -> &str {
        self.field.as_deref().unwrap_or(&self.name)
    }

    /// True when the caller sends this parameter on the request.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.direction.is_input() && self.origin != Origin::Computed
    }

    /// True when the server sends this parameter back in a response header.
    #[must_use]
    pub fn is_returned(&self) -> bool {
        self.direction.is_output()
    }

    /// Value to use when nothing was received, or `None` if that is an error.
    #[must_use]
    pub fn absent_value(&self) -> Option<Value> {
        if self.required {
            None
        } else {
            Some(self.default.clone().unwrap_or(Value::Null))
        }
    }
}

/// Indices into [`CompiledRoute::params`], grouped by where they travel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParamBuckets {
    /// Path placeholders.
    pub path: Vec<usize>,
    /// Query fields, plus body-origin fields of GET and HEAD routes.
    pub query: Vec<usize>,
    /// Request headers.
    pub header: Vec<usize>,
    /// Body object fields.
    pub body: Vec<usize>,
    /// Server-computed values.
    pub computed: Vec<usize>,
    /// Response headers (`Out` and `InOut` parameters).
    pub output_headers: Vec<usize>,
}

/// One compiled method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledRoute {
    id: MethodId,
    #[serde(with = "method_serde")]
    http_method: Method,
    pattern: PathPattern,
    full_pattern: PathPattern,
    path_explicit: bool,
    params: Vec<CompiledParameter>,
    buckets: ParamBuckets,
    returns: Option<TypeDesc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
}

impl CompiledRoute {
    /// Returns the method identity.
    #[must_use]
    pub fn id(&self) -> &MethodId {
        &self.id
    }

    /// Returns the declared method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.id.method
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn http_method(&self) -> &Method {
        &self.http_method
    }

    /// Returns the pattern relative to the contract base path.
    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Returns the pattern mounted under the base path.
    #[must_use]
    pub fn full_pattern(&self) -> &PathPattern {
        &self.full_pattern
    }

    /// True when the path came from an explicit annotation.
    #[must_use]
    pub const fn is_path_explicit(&self) -> bool {
        self.path_explicit
    }

    /// Returns every parameter in declaration order.
    #[must_use]
    pub fn params(&self) -> &[CompiledParameter] {
        &self.params
    }

    /// Looks up a parameter by declared name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&CompiledParameter> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Returns the bucket indices.
    #[must_use]
    pub fn buckets(&self) -> &ParamBuckets {
        &self.buckets
    }

    /// Returns the request parameters that travel in `origin`.
    pub fn inputs(&self, origin: Origin) -> impl Iterator<Item = &CompiledParameter> + '_ {
        let indices = match origin {
            Origin::Path => &self.buckets.path,
            Origin::Query => &self.buckets.query,
            Origin::Header => &self.buckets.header,
            Origin::Body => &self.buckets.body,
            Origin::Computed => &self.buckets.computed,
        };
        indices.iter().map(|&i| &self.params[i])
    }

    /// Returns the parameters sent back in response headers.
    pub fn output_headers(&self) -> impl Iterator<Item = &CompiledParameter> + '_ {
        self.buckets.output_headers.iter().map(|&i| &self.params[i])
    }

    /// Returns the declared return type, `None` for void methods.
    #[must_use]
    pub const fn returns(&self) -> Option<TypeDesc> {
        self.returns
    }

    /// True for methods without a return value.
    #[must_use]
    pub const fn is_void(&self) -> bool {
        self.returns.is_none()
    }

    /// True when the request carries a JSON body.
    #[must_use]
    pub fn has_body(&self) -> bool {
        !self.buckets.body.is_empty()
    }

    /// Returns the declared response content type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns the response content type, falling back to JSON.
    #[must_use]
    pub fn response_content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

/// A nested contract mounted by a nesting method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubContractBinding {
    method: MethodId,
    mount_path: String,
    interface: CompiledInterface,
}

impl SubContractBinding {
    /// Returns the nesting method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.method.method
    }

    /// Returns the nesting method identity.
    #[must_use]
    pub fn method_id(&self) -> &MethodId {
        &self.method
    }

    /// Returns the full mount path.
    #[must_use]
    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    /// Returns the compiled nested contract.
    #[must_use]
    pub fn interface(&self) -> &CompiledInterface {
        &self.interface
    }
}

/// A compiled contract.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledInterface {
    contract: String,
    base_path: String,
    style: NamingStyle,
    routes: Vec<CompiledRoute>,
    bindings: Vec<SubContractBinding>,
}

impl CompiledInterface {
    /// Returns the contract name.
    #[must_use]
    pub fn contract_name(&self) -> &str {
        &self.contract
    }

    /// Returns the full base path.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Returns the naming style the interface was compiled with.
    #[must_use]
    pub const fn style(&self) -> NamingStyle {
        self.style
    }

    /// Returns this contract's own routes in declaration order.
    #[must_use]
    pub fn routes(&self) -> &[CompiledRoute] {
        &self.routes
    }

    /// Returns this contract's nested bindings in declaration order.
    #[must_use]
    pub fn bindings(&self) -> &[SubContractBinding] {
        &self.bindings
    }

    /// Looks up one of this contract's routes by method name.
    #[must_use]
    pub fn route(&self, name: &str) -> Option<&CompiledRoute> {
        self.routes.iter().find(|r| r.name() == name)
    }

    /// Looks up a nested binding by nesting method name.
    #[must_use]
    pub fn binding(&self, name: &str) -> Option<&SubContractBinding> {
        self.bindings.iter().find(|b| b.name() == name)
    }

    /// Returns every route in the tree, nested ones included.
    #[must_use]
    pub fn all_routes(&self) -> Vec<&CompiledRoute> {
        let mut out: Vec<&CompiledRoute> = self.routes.iter().collect();
        for binding in &self.bindings {
            out.extend(binding.interface.all_routes());
        }
        out
    }

    /// Canonical JSON rendering of the whole tree.
    ///
    /// Two interfaces compiled from the same contract under the same
    /// settings have equal fingerprints, so a server and a client can
    /// compare what they each compiled.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        // Every map key here is a string, so serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Compiles contracts under one configuration.
#[derive(Debug, Clone, Default)]
pub struct ContractCompiler {
    config: CompilerConfig,
}

impl ContractCompiler {
    /// Creates a compiler.
    #[must_use]
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Classifies every method without rejecting anything.
    #[must_use]
    pub fn describe(&self, contract: &ServiceContract) -> ContractDescription {
        describe(contract, &self.config)
    }

    /// Validates a contract.
    #[must_use]
    pub fn validate(&self, contract: &ServiceContract) -> ValidationReport {
        validate(&self.describe(contract))
    }

    /// Compiles a contract.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] carrying every validation issue found.
    pub fn compile(&self, contract: &ServiceContract) -> Result<CompiledInterface, CompileError> {
        let description = self.describe(contract);
        validate(&description).into_result(contract.name())?;
        let compiled = self.build(&description, contract.name())?;
        debug!(
            contract = contract.name(),
            routes = compiled.all_routes().len(),
            "contract compiled"
        );
        Ok(compiled)
    }

    fn build(
        &self,
        description: &ContractDescription,
        root: &str,
    ) -> Result<CompiledInterface, CompileError> {
        let mut routes = Vec::new();
        let mut bindings = Vec::new();

        for method in &description.methods {
            match &method.shape {
                MethodShape::Route(route) => {
                    let compiled = build_route(method, route).map_err(|kind| CompileError {
                        contract: root.to_string(),
                        report: single_issue(&method.id, kind),
                    })?;
                    debug!(
                        route = %compiled.id,
                        method = %compiled.http_method,
                        pattern = %compiled.full_pattern,
                        "compiled route"
                    );
                    routes.push(compiled);
                }
                MethodShape::Nested(nested) => bindings.push(SubContractBinding {
                    method: method.id.clone(),
                    mount_path: nested.mount_path.clone(),
                    interface: self.build(&nested.contract, root)?,
                }),
            }
        }

        Ok(CompiledInterface {
            contract: description.contract.clone(),
            base_path: description.base_path.clone(),
            style: self.config.method_style,
            routes,
            bindings,
        })
    }
}

/// Compiles `contract` under `config`.
///
/// # Errors
///
/// Returns [`CompileError`] carrying every validation issue found.
pub fn compile(
    contract: &ServiceContract,
    config: &CompilerConfig,
) -> Result<CompiledInterface, CompileError> {
    ContractCompiler::new(config.clone()).compile(contract)
}

fn build_route(method: &MethodDescription, route: &RouteDescription) -> Result<CompiledRoute, IssueKind> {
    let pattern = route
        .relative_pattern
        .clone()
        .map_err(|e| IssueKind::from_pattern_error(&e))?;
    let full_pattern = route
        .full_pattern
        .clone()
        .map_err(|e| IssueKind::from_pattern_error(&e))?;

    let mut buckets = ParamBuckets::default();
    let params: Vec<CompiledParameter> = method
        .decl
        .params()
        .iter()
        .zip(&route.params.params)
        .enumerate()
        .map(|(position, (decl, plan))| CompiledParameter {
            name: plan.name.clone(),
            field: plan.field.clone(),
            origin: plan.origin,
            ty: decl.ty(),
            required: decl.is_required(),
            default: decl.default().cloned(),
            direction: decl.direction(),
            position,
        })
        .collect();

    // GET and HEAD carry no body; body-annotated fields ride in the query.
    let bodiless = method.route.method == Method::GET || method.route.method == Method::HEAD;
    for (index, param) in params.iter().enumerate() {
        if param.direction.is_input() {
            let bucket = match param.origin {
                Origin::Path => &mut buckets.path,
                Origin::Body if bodiless => &mut buckets.query,
                Origin::Query => &mut buckets.query,
                Origin::Header => &mut buckets.header,
                Origin::Body => &mut buckets.body,
                Origin::Computed => &mut buckets.computed,
            };
            bucket.push(index);
        }
        if param.direction.is_output() {
            buckets.output_headers.push(index);
        }
    }

    let returns = match method.decl.returns() {
        ReturnKind::Value(ty) => Some(*ty),
        ReturnKind::Void | ReturnKind::Contract(_) => None,
    };

    Ok(CompiledRoute {
        id: method.id.clone(),
        http_method: method.route.method.clone(),
        pattern,
        full_pattern,
        path_explicit: method.route.path_explicit,
        params,
        buckets,
        returns,
        content_type: method.decl.content_type().map(str::to_string),
    })
}

fn single_issue(method: &MethodId, kind: IssueKind) -> ValidationReport {
    std::iter::once(ValidationIssue {
        method: method.clone(),
        kind,
    })
    .collect()
}

/// Serializes [`Method`] as its upper-case name.
mod method_serde {
    use http::Method;
    use serde::Serializer;

    pub fn serialize<S>(method: &Method, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(method.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{MethodDecl, ParamDecl};
    use serde_json::json;

    fn compiler() -> ContractCompiler {
        ContractCompiler::new(CompilerConfig::default())
    }

    fn profile() -> ServiceContract {
        ServiceContract::builder("Profile")
            .method(
                MethodDecl::builder("getName")
                    .param(ParamDecl::new("id", TypeDesc::Integer))
                    .returns(TypeDesc::String)
                    .build(),
            )
            .method(
                MethodDecl::builder("setName")
                    .param(ParamDecl::new("id", TypeDesc::Integer))
                    .param(ParamDecl::new("name", TypeDesc::String))
                    .build(),
            )
            .build()
    }

    #[test]
    fn test_compile_profile() {
        let compiled = compiler().compile(&profile()).unwrap();
        assert_eq!(compiled.contract_name(), "Profile");
        assert_eq!(compiled.base_path(), "/");

        let get = compiled.route("getName").unwrap();
        assert_eq!(get.http_method(), &Method::GET);
        assert_eq!(get.pattern().as_str(), ":id/name");
        assert_eq!(get.full_pattern().as_str(), "/:id/name");
        assert_eq!(get.returns(), Some(TypeDesc::String));
        assert_eq!(get.inputs(Origin::Path).count(), 1);

        let set = compiled.route("setName").unwrap();
        assert_eq!(set.http_method(), &Method::PUT);
        assert_eq!(set.full_pattern().as_str(), "/:id/name");
        assert!(set.is_void());
        assert!(set.has_body());
        let body: Vec<&str> = set.inputs(Origin::Body).map(|p| p.wire_name()).collect();
        assert_eq!(body, vec!["name"]);
    }

    #[test]
    fn test_buckets_and_outputs() {
        let contract = ServiceContract::builder("Docs")
            .method(
                MethodDecl::builder("updateDoc")
                    .path("docs/:key")
                    .param(ParamDecl::new("_key", TypeDesc::String))
                    .param(ParamDecl::new("text", TypeDesc::String))
                    .param(ParamDecl::new("etag", TypeDesc::String).in_out())
                    .param(ParamDecl::new("revision", TypeDesc::Integer).output())
                    .param(ParamDecl::new("user", TypeDesc::Json))
                    .header("etag", "ETag")
                    .header("revision", "X-Revision")
                    .computed("user")
                    .content_type("text/plain")
                    .build(),
            )
            .build();
        let compiled = compiler().compile(&contract).unwrap();
        let route = compiled.route("updateDoc").unwrap();
        let buckets = route.buckets();
        assert_eq!(buckets.path, vec![0]);
        assert_eq!(buckets.body, vec![1]);
        assert_eq!(buckets.header, vec![2]);
        assert_eq!(buckets.computed, vec![4]);
        assert_eq!(buckets.output_headers, vec![2, 3]);
        assert!(route.param("user").unwrap().field.is_none());
        assert!(!route.param("user").unwrap().is_sent());
        assert!(!route.param("revision").unwrap().is_sent());
        assert_eq!(route.response_content_type(), "text/plain");
    }

    #[test]
    fn test_body_fields_ride_in_query_without_body() {
        let contract = ServiceContract::builder("Search")
            .method(
                MethodDecl::builder("getHits")
                    .param(ParamDecl::new("filter", TypeDesc::Json))
                    .body("filter", "filter")
                    .build(),
            )
            .build();
        let compiled = compiler().compile(&contract).unwrap();
        let route = compiled.route("getHits").unwrap();
        assert_eq!(route.param("filter").unwrap().origin, Origin::Body);
        assert!(!route.has_body());
        assert_eq!(route.buckets().query, vec![0]);
    }

    #[test]
    fn test_default_content_type() {
        let compiled = compiler().compile(&profile()).unwrap();
        let route = compiled.route("getName").unwrap();
        assert_eq!(route.content_type(), None);
        assert_eq!(route.response_content_type(), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_absent_values() {
        let contract = ServiceContract::builder("Search")
            .method(
                MethodDecl::builder("getResults")
                    .param(ParamDecl::new("q", TypeDesc::String))
                    .param(ParamDecl::new("limit", TypeDesc::Integer).default_value(20))
                    .param(ParamDecl::new("cursor", TypeDesc::String).optional())
                    .build(),
            )
            .build();
        let compiled = compiler().compile(&contract).unwrap();
        let route = compiled.route("getResults").unwrap();
        assert_eq!(route.param("q").unwrap().absent_value(), None);
        assert_eq!(route.param("limit").unwrap().absent_value(), Some(json!(20)));
        assert_eq!(route.param("cursor").unwrap().absent_value(), Some(Value::Null));
    }

    #[test]
    fn test_nested_bindings_and_all_routes() {
        let issues = ServiceContract::builder("Issues")
            .base_path("tracker")
            .method(MethodDecl::builder("getCount").returns(TypeDesc::Integer).build())
            .build();
        let root = ServiceContract::builder("Repo")
            .base_path("repo")
            .method(MethodDecl::builder("getInfo").build())
            .method(MethodDecl::builder("issues").returns_contract(issues).build())
            .build();

        let compiled = compiler().compile(&root).unwrap();
        assert_eq!(compiled.routes().len(), 1);
        let binding = compiled.binding("issues").unwrap();
        assert_eq!(binding.mount_path(), "/repo/issues");
        assert_eq!(binding.interface().base_path(), "/repo/issues/tracker");
        assert_eq!(
            binding.interface().route("getCount").unwrap().full_pattern().as_str(),
            "/repo/issues/tracker/count"
        );

        let all: Vec<&str> = compiled.all_routes().iter().map(|r| r.name()).collect();
        assert_eq!(all, vec!["getInfo", "getCount"]);
    }

    #[test]
    fn test_compile_reports_every_issue() {
        let contract = ServiceContract::builder("Bad")
            .method(MethodDecl::builder("getA").path("a//b").build())
            .method(MethodDecl::builder("getB").path(":x").build())
            .build();
        let err = compiler().compile(&contract).unwrap_err();
        assert_eq!(err.contract, "Bad");
        assert_eq!(err.report.len(), 2);
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = compiler().compile(&profile()).unwrap();
        let b = compiler().compile(&profile()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());

        let camel = ContractCompiler::new(CompilerConfig {
            method_style: NamingStyle::CamelCase,
            ..CompilerConfig::default()
        })
        .compile(&profile())
        .unwrap();
        assert_eq!(camel.fingerprint(), a.fingerprint().replace("snake_lower", "camel_case"));

        let json: Value = serde_json::from_str(&a.fingerprint()).unwrap();
        assert_eq!(json["routes"][0]["http_method"], "GET");
        assert_eq!(json["routes"][0]["full_pattern"]["source"], "/:id/name");
    }

    #[test]
    fn test_config_from_json() {
        let config: CompilerConfig =
            serde_json::from_value(json!({"method_style": "camel_case", "url_prefix": "/api"}))
                .unwrap();
        assert_eq!(config.method_style, NamingStyle::CamelCase);
        assert!(config.strip_trailing_underscore);
        assert_eq!(config.url_prefix, "/api");

        assert!(serde_json::from_value::<CompilerConfig>(json!({"bogus": 1})).is_err());
    }
}
