//! Parameter origin classification.
//!
//! Every formal parameter travels in exactly one place. The rules, in order:
//!
//! 1. a computed annotation: [`Origin::Computed`], no wire field
//! 2. a header/query/body annotation: that origin, the annotation's field
//! 3. a leading [`PATH_MARKER`]: [`Origin::Path`], field = name without it
//! 4. a first parameter literally named `id` on a derived path:
//!    [`Origin::Path`], and the route gains a leading `:id/`
//! 5. otherwise GET/HEAD use [`Origin::Query`], everything else
//!    [`Origin::Body`]; one trailing `_` may be trimmed from the field
//!
//! Conflicting annotations are not resolved here beyond taking the first
//! one; the validator rejects them before anything is compiled.

use std::fmt;

use http::Method;
use serde::{Deserialize, Serialize};

use crate::contract::{MethodDecl, OriginAnnotation};

/// Leading character that binds a parameter to a path placeholder.
pub const PATH_MARKER: char = '_';

/// Name of the legacy implicit path parameter.
pub const LEGACY_ID: &str = "id";

/// Where a parameter travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// A placeholder in the URL path.
    Path,
    /// A query-string field.
    Query,
    /// A request (and possibly response) header.
    Header,
    /// A field of the JSON request body object.
    Body,
    /// Computed on the server; never on the wire.
    Computed,
}

impl Origin {
    /// Returns the lowercase origin name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Body => "body",
            Self::Computed => "computed",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The classification of one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamPlan {
    /// Declared parameter name.
    pub name: String,
    /// Chosen origin.
    pub origin: Origin,
    /// Wire field name; `None` for computed parameters.
    pub field: Option<String>,
}

/// The classification of a method's whole parameter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamClassification {
    /// One plan per parameter, in declaration order.
    pub params: Vec<ParamPlan>,
    /// True when the legacy `id` rule applied and `:id/` must lead the path.
    pub legacy_id: bool,
}

/// Classifies every parameter of `decl`.
///
/// `path_explicit` disables the legacy `id` rule, which only composes with
/// derived paths.
#[must_use]
pub fn classify_params(
    decl: &MethodDecl,
    method: &Method,
    path_explicit: bool,
    strip_trailing_underscore: bool,
) -> ParamClassification {
    let mut legacy_id = false;
    let params = decl
        .params()
        .iter()
        .enumerate()
        .map(|(position, param)| {
            let name = param.name();
            let (origin, field) = if let Some(annotation) = decl.annotations_for(name).next() {
                from_annotation(annotation)
            } else if let Some(stripped) = name.strip_prefix(PATH_MARKER) {
                (Origin::Path, Some(stripped.to_string()))
            } else if position == 0 && name == LEGACY_ID && !path_explicit {
                legacy_id = true;
                (Origin::Path, Some(LEGACY_ID.to_string()))
            } else {
                let field = if strip_trailing_underscore {
                    trim_trailing_underscore(name)
                } else {
                    name
                };
                (default_origin(method), Some(field.to_string()))
            };

            ParamPlan {
                name: name.to_string(),
                origin,
                field,
            }
        })
        .collect();

    ParamClassification { params, legacy_id }
}

fn from_annotation(annotation: &OriginAnnotation) -> (Origin, Option<String>) {
    match annotation {
        OriginAnnotation::Computed { .. } => (Origin::Computed, None),
        OriginAnnotation::Header { field, .. } => (Origin::Header, Some(field.clone())),
        OriginAnnotation::Query { field, .. } => (Origin::Query, Some(field.clone())),
        OriginAnnotation::Body { field, .. } => (Origin::Body, Some(field.clone())),
    }
}

/// Origin of an unannotated, unmarked parameter.
#[must_use]
pub fn default_origin(method: &Method) -> Origin {
    if *method == Method::GET || *method == Method::HEAD {
        Origin::Query
    } else {
        Origin::Body
    }
}

fn trim_trailing_underscore(name: &str) -> &str {
    match name.strip_suffix('_') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{ParamDecl, TypeDesc};

    fn plans(decl: &MethodDecl, method: &Method, explicit: bool) -> Vec<(Origin, Option<String>)> {
        classify_params(decl, method, explicit, true)
            .params
            .into_iter()
            .map(|p| (p.origin, p.field))
            .collect()
    }

    fn field(name: &str) -> Option<String> {
        Some(name.to_string())
    }

    #[test]
    fn test_default_by_method() {
        let decl = MethodDecl::builder("find")
            .param(ParamDecl::new("q", TypeDesc::String))
            .build();
        assert_eq!(plans(&decl, &Method::GET, false), vec![(Origin::Query, field("q"))]);
        assert_eq!(plans(&decl, &Method::HEAD, false), vec![(Origin::Query, field("q"))]);
        assert_eq!(plans(&decl, &Method::POST, false), vec![(Origin::Body, field("q"))]);
        assert_eq!(plans(&decl, &Method::DELETE, false), vec![(Origin::Body, field("q"))]);
    }

    #[test]
    fn test_annotations_win() {
        let decl = MethodDecl::builder("find")
            .param(ParamDecl::new("token", TypeDesc::String))
            .param(ParamDecl::new("page", TypeDesc::Integer))
            .param(ParamDecl::new("user", TypeDesc::Json))
            .param(ParamDecl::new("_marked", TypeDesc::String))
            .header("token", "Authorization")
            .body("page", "pageNumber")
            .computed("user")
            .query("_marked", "m")
            .build();

        assert_eq!(
            plans(&decl, &Method::GET, false),
            vec![
                (Origin::Header, field("Authorization")),
                (Origin::Body, field("pageNumber")),
                (Origin::Computed, None),
                (Origin::Query, field("m")),
            ]
        );
    }

    #[test]
    fn test_path_marker() {
        let decl = MethodDecl::builder("getPullRequests")
            .param(ParamDecl::new("_owner", TypeDesc::String))
            .param(ParamDecl::new("_repo", TypeDesc::String))
            .build();
        assert_eq!(
            plans(&decl, &Method::GET, true),
            vec![(Origin::Path, field("owner")), (Origin::Path, field("repo"))]
        );
    }

    #[test]
    fn test_legacy_id_first_only() {
        let decl = MethodDecl::builder("getName")
            .param(ParamDecl::new("id", TypeDesc::Integer))
            .build();
        let c = classify_params(&decl, &Method::GET, false, true);
        assert!(c.legacy_id);
        assert_eq!(c.params[0].origin, Origin::Path);
        assert_eq!(c.params[0].field.as_deref(), Some("id"));

        let decl = MethodDecl::builder("setName")
            .param(ParamDecl::new("name", TypeDesc::String))
            .param(ParamDecl::new("id", TypeDesc::Integer))
            .build();
        let c = classify_params(&decl, &Method::PUT, false, true);
        assert!(!c.legacy_id);
        assert_eq!(c.params[1].origin, Origin::Body);
    }

    #[test]
    fn test_legacy_id_off_for_explicit_path() {
        let decl = MethodDecl::builder("getName")
            .path("name")
            .param(ParamDecl::new("id", TypeDesc::Integer))
            .build();
        let c = classify_params(&decl, &Method::GET, true, true);
        assert!(!c.legacy_id);
        assert_eq!(c.params[0].origin, Origin::Query);
    }

    #[test]
    fn test_legacy_id_off_when_annotated() {
        let decl = MethodDecl::builder("getName")
            .param(ParamDecl::new("id", TypeDesc::Integer))
            .header("id", "X-Id")
            .build();
        let c = classify_params(&decl, &Method::GET, false, true);
        assert!(!c.legacy_id);
        assert_eq!(c.params[0].origin, Origin::Header);
    }

    #[test]
    fn test_trailing_underscore() {
        let decl = MethodDecl::builder("find")
            .param(ParamDecl::new("type_", TypeDesc::String))
            .param(ParamDecl::new("x_", TypeDesc::String))
            .build();
        let c = classify_params(&decl, &Method::GET, false, true);
        assert_eq!(c.params[0].field.as_deref(), Some("type"));
        assert_eq!(c.params[1].field.as_deref(), Some("x"));

        let c = classify_params(&decl, &Method::GET, false, false);
        assert_eq!(c.params[0].field.as_deref(), Some("type_"));
    }

    #[test]
    fn test_first_annotation_taken_on_conflict() {
        let decl = MethodDecl::builder("find")
            .param(ParamDecl::new("x", TypeDesc::Integer))
            .header("x", "X")
            .body("x", "x")
            .build();
        assert_eq!(plans(&decl, &Method::POST, false), vec![(Origin::Header, field("X"))]);
    }
}
