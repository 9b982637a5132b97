//! Contract validation.
//!
//! Validation inspects a [`ContractDescription`] and reports every problem
//! it finds, not just the first. Nothing is compiled unless the report is
//! empty.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use hermes_router::{PathPattern, PatternError};
use serde::Serialize;
use thiserror::Error;

use crate::contract::{MethodId, OriginAnnotation};
use crate::describe::{ContractDescription, MethodDescription, MethodShape, RouteDescription};
use crate::params::{Origin, LEGACY_ID};

/// What went wrong with a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    /// Two methods of one contract share a name.
    DuplicateMethod,
    /// An annotation names a parameter the method does not declare.
    OrphanAnnotation {
        /// Annotated name.
        param: String,
    },
    /// A parameter carries more than one origin annotation.
    MultipleOrigins {
        /// Parameter name.
        param: String,
        /// Annotated origins, in annotation order.
        origins: Vec<Origin>,
    },
    /// An output parameter travels somewhere other than a header.
    IllegalOutputOrigin {
        /// Parameter name.
        param: String,
        /// Its origin.
        origin: Origin,
    },
    /// An explicit path annotation is empty.
    EmptyPath,
    /// A pattern contains `//`.
    DoubledSeparator {
        /// Offending pattern.
        pattern: String,
    },
    /// A pattern contains `:` with no name after it.
    EmptyPlaceholder {
        /// Offending pattern.
        pattern: String,
    },
    /// The same placeholder appears twice in one pattern.
    DuplicatePlaceholder {
        /// Placeholder name.
        placeholder: String,
    },
    /// A placeholder has no path parameter feeding it.
    UnboundPathParameter {
        /// Placeholder name.
        placeholder: String,
    },
    /// Several path parameters feed the same placeholder.
    DuplicatePathParameter {
        /// Placeholder name.
        placeholder: String,
        /// Parameters bound to it, in declaration order.
        params: Vec<String>,
    },
    /// A path parameter has no placeholder to fill.
    UnusedPathParameter {
        /// Parameter name.
        param: String,
    },
    /// A leading `id` parameter on a method with an explicit path.
    LegacyIdWithExplicitPath,
    /// A nesting method declares parameters.
    NestingWithParameters,
    /// Another method already serves this method and path shape.
    DuplicateRoute {
        /// HTTP method.
        http_method: String,
        /// Full pattern text.
        pattern: String,
        /// Method registered first.
        first: MethodId,
    },
}

impl IssueKind {
    /// Maps a pattern parse failure to an issue.
    #[must_use]
    pub fn from_pattern_error(error: &PatternError) -> Self {
        match error {
            PatternError::DoubledSeparator { pattern, .. } => Self::DoubledSeparator {
                pattern: pattern.clone(),
            },
            PatternError::EmptyPlaceholder { pattern, .. } => Self::EmptyPlaceholder {
                pattern: pattern.clone(),
            },
            PatternError::UnboundPlaceholder { name, .. } => Self::UnboundPathParameter {
                placeholder: name.clone(),
            },
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateMethod => f.write_str("method name declared more than once"),
            Self::OrphanAnnotation { param } => {
                write!(f, "annotation refers to unknown parameter `{param}`")
            }
            Self::MultipleOrigins { param, origins } => {
                let list: Vec<&str> = origins.iter().map(|o| o.as_str()).collect();
                write!(f, "parameter `{param}` has several origins: {}", list.join(", "))
            }
            Self::IllegalOutputOrigin { param, origin } => write!(
                f,
                "output parameter `{param}` must travel in a header, not {origin}"
            ),
            Self::EmptyPath => f.write_str("explicit path is empty"),
            Self::DoubledSeparator { pattern } => {
                write!(f, "pattern `{pattern}` contains an empty segment")
            }
            Self::EmptyPlaceholder { pattern } => {
                write!(f, "pattern `{pattern}` contains an unnamed placeholder")
            }
            Self::DuplicatePlaceholder { placeholder } => {
                write!(f, "placeholder `:{placeholder}` appears more than once")
            }
            Self::UnboundPathParameter { placeholder } => {
                write!(f, "unbound path parameter: no parameter feeds `:{placeholder}`")
            }
            Self::DuplicatePathParameter {
                placeholder,
                params,
            } => write!(
                f,
                "placeholder `:{placeholder}` is fed by several parameters: {}",
                params.join(", ")
            ),
            Self::UnusedPathParameter { param } => {
                write!(f, "path parameter `{param}` has no placeholder in the pattern")
            }
            Self::LegacyIdWithExplicitPath => write!(
                f,
                "leading `{LEGACY_ID}` parameter needs a marker or annotation when the path is explicit"
            ),
            Self::NestingWithParameters => f.write_str("nesting methods cannot take parameters"),
            Self::DuplicateRoute {
                http_method,
                pattern,
                first,
            } => write!(f, "{http_method} {pattern} is already served by {first}"),
        }
    }
}

/// One problem found in one method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Offending method.
    pub method: MethodId,
    /// What is wrong with it.
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.method, self.kind)
    }
}

/// Every issue found in a contract tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns true when nothing was found.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns the issues in discovery order.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Returns the number of issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns true when nothing was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns the issues reported against `method` of any contract.
    pub fn for_method<'a>(&'a self, method: &'a str) -> impl Iterator<Item = &'a ValidationIssue> {
        self.issues.iter().filter(move |i| i.method.method == method)
    }

    /// Returns true if any issue matches `predicate`.
    pub fn any(&self, predicate: impl Fn(&IssueKind) -> bool) -> bool {
        self.issues.iter().any(|i| predicate(&i.kind))
    }

    /// Converts the report into a result for `contract`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] if any issue was found.
    pub fn into_result(self, contract: &str) -> Result<(), CompileError> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(CompileError {
                contract: contract.to_string(),
                report: self,
            })
        }
    }

    fn push(&mut self, method: &MethodId, kind: IssueKind) {
        self.issues.push(ValidationIssue {
            method: method.clone(),
            kind,
        });
    }
}

impl FromIterator<ValidationIssue> for ValidationReport {
    fn from_iter<I: IntoIterator<Item = ValidationIssue>>(iter: I) -> Self {
        Self {
            issues: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for issue in &self.issues {
            writeln!(f, "  - {issue}")?;
        }
        Ok(())
    }
}

/// A contract that cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("contract `{contract}` is invalid ({} issue(s)):\n{report}", report.len())]
pub struct CompileError {
    /// Root contract name.
    pub contract: String,
    /// Everything that was found.
    pub report: ValidationReport,
}

/// Validates a description, nested contracts and route collisions included.
#[must_use]
pub fn validate(description: &ContractDescription) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_contract(description, &mut report);
    check_collisions(description, &mut report);
    report
}

fn check_contract(description: &ContractDescription, report: &mut ValidationReport) {
    let mut seen = HashSet::new();
    for method in &description.methods {
        if !seen.insert(method.decl.name()) {
            report.push(&method.id, IssueKind::DuplicateMethod);
        }
        check_annotations(method, report);

        match &method.shape {
            MethodShape::Nested(nested) => {
                if !method.decl.params().is_empty() {
                    report.push(&method.id, IssueKind::NestingWithParameters);
                }
                if method.route.path_explicit && method.route.raw_path.trim().is_empty() {
                    report.push(&method.id, IssueKind::EmptyPath);
                }
                match PathPattern::parse(&nested.mount_path) {
                    Ok(mount) => {
                        for placeholder in mount.placeholders() {
                            report.push(
                                &method.id,
                                IssueKind::UnboundPathParameter {
                                    placeholder: placeholder.to_string(),
                                },
                            );
                        }
                    }
                    Err(e) => report.push(&method.id, IssueKind::from_pattern_error(&e)),
                }
                check_contract(&nested.contract, report);
            }
            MethodShape::Route(route) => check_route(method, route, report),
        }
    }
}

fn check_annotations(method: &MethodDescription, report: &mut ValidationReport) {
    let decl = &method.decl;

    let mut orphans = BTreeSet::new();
    for annotation in decl.annotations() {
        if decl.param(annotation.param()).is_none() {
            orphans.insert(annotation.param());
        }
    }
    for param in orphans {
        report.push(
            &method.id,
            IssueKind::OrphanAnnotation {
                param: param.to_string(),
            },
        );
    }

    for param in decl.params() {
        let origins: Vec<Origin> = decl
            .annotations_for(param.name())
            .map(|a| match a {
                OriginAnnotation::Header { .. } => Origin::Header,
                OriginAnnotation::Query { .. } => Origin::Query,
                OriginAnnotation::Body { .. } => Origin::Body,
                OriginAnnotation::Computed { .. } => Origin::Computed,
            })
            .collect();
        if origins.len() > 1 {
            report.push(
                &method.id,
                IssueKind::MultipleOrigins {
                    param: param.name().to_string(),
                    origins,
                },
            );
        }
    }
}

fn check_route(method: &MethodDescription, route: &RouteDescription, report: &mut ValidationReport) {
    let decl = &method.decl;

    if method.route.path_explicit && method.route.raw_path.trim().is_empty() {
        report.push(&method.id, IssueKind::EmptyPath);
    }

    if method.route.path_explicit {
        if let Some(first) = decl.params().first() {
            if first.name() == LEGACY_ID && decl.annotations_for(LEGACY_ID).next().is_none() {
                report.push(&method.id, IssueKind::LegacyIdWithExplicitPath);
            }
        }
    }

    for (param, plan) in decl.params().iter().zip(&route.params.params) {
        if param.direction().is_output() && plan.origin != Origin::Header {
            report.push(
                &method.id,
                IssueKind::IllegalOutputOrigin {
                    param: plan.name.clone(),
                    origin: plan.origin,
                },
            );
        }
    }

    let pattern = match (&route.relative_pattern, &route.full_pattern) {
        (Err(e), _) | (Ok(_), Err(e)) => {
            report.push(&method.id, IssueKind::from_pattern_error(e));
            return;
        }
        (Ok(_), Ok(full)) => full,
    };

    let mut placeholders = Vec::new();
    let mut reported = HashSet::new();
    for name in pattern.placeholders() {
        if placeholders.contains(&name) {
            if reported.insert(name) {
                report.push(
                    &method.id,
                    IssueKind::DuplicatePlaceholder {
                        placeholder: name.to_string(),
                    },
                );
            }
        } else {
            placeholders.push(name);
        }
    }

    let path_params: Vec<_> = route
        .params
        .params
        .iter()
        .filter(|p| p.origin == Origin::Path)
        .collect();

    for placeholder in &placeholders {
        let bound: Vec<String> = path_params
            .iter()
            .filter(|p| p.field.as_deref() == Some(*placeholder))
            .map(|p| p.name.clone())
            .collect();
        match bound.len() {
            0 => report.push(
                &method.id,
                IssueKind::UnboundPathParameter {
                    placeholder: (*placeholder).to_string(),
                },
            ),
            1 => {}
            _ => report.push(
                &method.id,
                IssueKind::DuplicatePathParameter {
                    placeholder: (*placeholder).to_string(),
                    params: bound,
                },
            ),
        }
    }

    for plan in &path_params {
        let used = plan
            .field
            .as_deref()
            .is_some_and(|field| placeholders.contains(&field));
        if !used {
            report.push(
                &method.id,
                IssueKind::UnusedPathParameter {
                    param: plan.name.clone(),
                },
            );
        }
    }
}

/// Two routes collide when they share an HTTP method and a path shape,
/// i.e. the same pattern once placeholder names are erased.
fn check_collisions(description: &ContractDescription, report: &mut ValidationReport) {
    let mut seen: HashMap<(String, String), &MethodId> = HashMap::new();
    for (method, route) in description.routes() {
        let Ok(full) = &route.full_pattern else {
            continue;
        };
        let key = (method.route.method.to_string(), full.shape());
        if let Some(first) = seen.get(&key) {
            report.push(
                &method.id,
                IssueKind::DuplicateRoute {
                    http_method: key.0.clone(),
                    pattern: full.as_str().to_string(),
                    first: (*first).clone(),
                },
            );
        } else {
            seen.insert(key, &method.id);
        }
    }
}
