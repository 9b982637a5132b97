//! Path patterns and route matching for Hermes.
//!
//! This crate owns the path grammar shared by every other Hermes crate:
//!
//! - **Pattern parsing**: `:name` placeholders running to the next `/`
//!   ([`PathPattern`])
//! - **URL joining**: [`concat_url`] mounts a relative pattern under a base
//! - **Route matching**: a component tree ([`Router`]) with per-method
//!   dispatch ([`MethodRouter`]) used by the in-process route table
//!
//! # Example
//!
//! ```rust
//! use hermes_router::{MethodRouter, PathPattern, Router};
//! use http::Method;
//!
//! let full = PathPattern::parse_full("/", ":owner/:repo/pulls").unwrap();
//! assert_eq!(full.as_str(), "/:owner/:repo/pulls");
//!
//! let mut router = Router::new();
//! router.insert(&full, MethodRouter::new().get("getPulls"));
//!
//! let matched = router.match_route(&Method::GET, "/rust-lang/cargo/pulls").unwrap();
//! assert_eq!(*matched.value, "getPulls");
//! assert_eq!(matched.params.get("owner"), Some("rust-lang"));
//! ```
//!
//! # Architecture
//!
//! ```text
//!                    (root)
//!                      │
//!              ┌───────┴───────┐
//!              │               │
//!            "api"           ":id"
//!              │               │
//!          "issues"         "name"
//!              │               │
//!        ┌─────┴─────┐       (leaf)
//!        │           │     [GET,PUT]
//!      (leaf)    ":number"
//!      [POST]        │
//!                  (leaf)
//!                  [GET]
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod method_router;
mod node;
mod params;
mod pattern;
mod router;

pub use error::PatternError;
pub use method_router::MethodRouter;
pub use params::Params;
pub use pattern::{concat_url, PathPattern, PathSegment, PLACEHOLDER_MARKER};
pub use router::Router;

/// A matched route with its value and captured placeholder values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// The value registered for the matched method and pattern.
    pub value: &'a T,
    /// Captured placeholder values, still percent-encoded.
    pub params: Params,
}

impl<'a, T> RouteMatch<'a, T> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(value: &'a T, params: Params) -> Self {
        Self { value, params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_parse_then_route() {
        let mut router = Router::new();
        let info = PathPattern::parse_full("/api", "info").unwrap();
        let issue = PathPattern::parse_full("/api/issues/", ":number").unwrap();
        router.route(Method::GET, &info, "getInfo");
        router.route(Method::GET, &issue, "getIssue");

        let m = router.match_route(&Method::GET, "/api/info").unwrap();
        assert_eq!(*m.value, "getInfo");
        assert!(m.params.is_empty());

        let m = router.match_route(&Method::GET, "/api/issues/3").unwrap();
        assert_eq!(*m.value, "getIssue");
        assert_eq!(m.params.get("number"), Some("3"));
    }

    #[test]
    fn test_rendered_path_matches_its_own_pattern() {
        let pattern = PathPattern::parse("/:owner/:repo/pulls").unwrap();
        let mut router = Router::new();
        router.route(Method::GET, &pattern, ());

        let path = pattern
            .render(|name| Some(format!("{name}-value")))
            .unwrap();
        let m = router.match_route(&Method::GET, &path).unwrap();
        assert_eq!(m.params.get("owner"), Some("owner-value"));
        assert_eq!(m.params.get("repo"), Some("repo-value"));
    }
}
