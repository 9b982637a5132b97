//! Static contract descriptions.
//!
//! Describing a contract runs the classifiers over every method and records
//! what they decided, including pattern parse failures, without rejecting
//! anything. The validator then inspects the description, and only a clean
//! description is turned into a [`CompiledInterface`](crate::CompiledInterface).

use hermes_router::{concat_url, PathPattern, PatternError};

use crate::classify::{classify, RouteName};
use crate::compile::CompilerConfig;
use crate::contract::{MethodDecl, MethodId, ServiceContract};
use crate::params::{classify_params, ParamClassification, LEGACY_ID};

/// Description of a whole contract, nested contracts included.
#[derive(Debug, Clone)]
pub struct ContractDescription {
    /// Contract name.
    pub contract: String,
    /// Full base path every method of this contract is mounted under.
    pub base_path: String,
    /// One entry per declared method, in declaration order.
    pub methods: Vec<MethodDescription>,
}

impl ContractDescription {
    /// Iterates every route description in the tree, depth first in
    /// declaration order.
    pub fn routes(&self) -> Box<dyn Iterator<Item = (&MethodDescription, &RouteDescription)> + '_> {
        Box::new(self.methods.iter().flat_map(|m| -> Box<dyn Iterator<Item = _> + '_> {
            match &m.shape {
                MethodShape::Route(route) => Box::new(std::iter::once((m, route))),
                MethodShape::Nested(nested) => nested.contract.routes(),
            }
        }))
    }
}

/// Description of one method.
#[derive(Debug, Clone)]
pub struct MethodDescription {
    /// Method identity for diagnostics.
    pub id: MethodId,
    /// The declaration as written.
    pub decl: MethodDecl,
    /// HTTP method and raw path from the name classifier.
    pub route: RouteName,
    /// Route or nested mount.
    pub shape: MethodShape,
}

/// Whether a method is served directly or mounts another contract.
#[derive(Debug, Clone)]
pub enum MethodShape {
    /// An ordinary route.
    Route(RouteDescription),
    /// A nesting method.
    Nested(NestedDescription),
}

/// Description of an ordinary route.
#[derive(Debug, Clone)]
pub struct RouteDescription {
    /// Parameter origins.
    pub params: ParamClassification,
    /// Relative pattern text, style-adjusted unless explicit.
    pub relative: String,
    /// Relative pattern mounted under the contract base path.
    pub full: String,
    /// Parse result of `relative`.
    pub relative_pattern: Result<PathPattern, PatternError>,
    /// Parse result of `full`.
    pub full_pattern: Result<PathPattern, PatternError>,
}

/// Description of a nested contract mount.
#[derive(Debug, Clone)]
pub struct NestedDescription {
    /// Mount fragment relative to the parent base path.
    pub mount: String,
    /// Full mount path.
    pub mount_path: String,
    /// The nested contract, described under `mount_path`.
    pub contract: ContractDescription,
}

/// Describes `contract` under `config`.
#[must_use]
pub fn describe(contract: &ServiceContract, config: &CompilerConfig) -> ContractDescription {
    let base = concat_url(&config.url_prefix, contract.base_path().unwrap_or(""));
    describe_at(contract, base, config)
}

fn describe_at(contract: &ServiceContract, base: String, config: &CompilerConfig) -> ContractDescription {
    let methods = contract
        .methods()
        .iter()
        .map(|decl| describe_method(contract.name(), decl, &base, config))
        .collect();

    ContractDescription {
        contract: contract.name().to_string(),
        base_path: base,
        methods,
    }
}

fn describe_method(
    contract: &str,
    decl: &MethodDecl,
    base: &str,
    config: &CompilerConfig,
) -> MethodDescription {
    let id = MethodId::new(contract, decl.name());
    let route = classify(decl);
    let styled = styled_path(&route, config);

    let shape = if let Some(nested) = decl.returns().nested() {
        let mount_path = concat_url(base, &styled);
        let nested_base = concat_url(&mount_path, nested.base_path().unwrap_or(""));
        MethodShape::Nested(NestedDescription {
            mount: styled,
            mount_path,
            contract: describe_at(nested, nested_base, config),
        })
    } else {
        let params = classify_params(
            decl,
            &route.method,
            route.path_explicit,
            config.strip_trailing_underscore,
        );
        let relative = if params.legacy_id {
            concat_url(&format!(":{LEGACY_ID}"), &styled)
        } else {
            styled
        };
        let full = concat_url(base, &relative);
        MethodShape::Route(RouteDescription {
            params,
            relative_pattern: PathPattern::parse(&relative),
            full_pattern: PathPattern::parse(&full),
            relative,
            full,
        })
    };

    MethodDescription {
        id,
        decl: decl.clone(),
        route,
        shape,
    }
}

/// Style-adjusts a derived path once; explicit paths and `/` pass through.
fn styled_path(route: &RouteName, config: &CompilerConfig) -> String {
    if route.path_explicit || route.raw_path == "/" {
        route.raw_path.clone()
    } else {
        config.method_style.apply(&route.raw_path)
    }
}
