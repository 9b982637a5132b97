//! HTTP method and raw path derivation from method names.
//!
//! Precedence, highest first:
//!
//! 1. explicit method and explicit path annotations
//! 2. one explicit annotation; the other half is derived as below
//! 3. property getter (GET) / setter (PUT), path = method name
//! 4. verb prefix table, path = remainder after the prefix (or `/`)
//! 5. `index` is GET `/`; anything else is POST with the full name
//!
//! The raw path returned here is not style-adjusted yet. The compiler does
//! that once, and only for derived paths.

use http::Method;

use crate::contract::{Accessor, MethodDecl};

/// Verb prefixes in match order. A prefix only matches when the method
/// name's leading lowercase run is exactly the prefix.
pub const VERB_PREFIXES: [(&str, Verb); 12] = [
    ("get", Verb::Get),
    ("query", Verb::Get),
    ("put", Verb::Put),
    ("set", Verb::Put),
    ("update", Verb::Patch),
    ("patch", Verb::Patch),
    ("add", Verb::Post),
    ("create", Verb::Post),
    ("post", Verb::Post),
    ("remove", Verb::Delete),
    ("erase", Verb::Delete),
    ("delete", Verb::Delete),
];

/// HTTP verbs reachable from the prefix table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// GET
    Get,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// POST
    Post,
    /// DELETE
    Delete,
}

impl Verb {
    /// Returns the corresponding [`Method`].
    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Put => Method::PUT,
            Self::Patch => Method::PATCH,
            Self::Post => Method::POST,
            Self::Delete => Method::DELETE,
        }
    }
}

/// HTTP method and raw path derived for one method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteName {
    /// HTTP method.
    pub method: Method,
    /// Path fragment, not yet style-adjusted unless explicit.
    pub raw_path: String,
    /// True when the path came from an explicit annotation.
    pub path_explicit: bool,
}

/// Derives the HTTP method and raw path for `decl`.
///
/// ```rust
/// use hermes_core::classify::classify;
/// use hermes_core::contract::MethodDecl;
/// use http::Method;
///
/// let route = classify(&MethodDecl::builder("getInfo").build());
/// assert_eq!(route.method, Method::GET);
/// assert_eq!(route.raw_path, "Info");
/// ```
#[must_use]
pub fn classify(decl: &MethodDecl) -> RouteName {
    match (decl.http_method(), decl.path()) {
        (Some(method), Some(path)) => RouteName {
            method: method.clone(),
            raw_path: path.to_string(),
            path_explicit: true,
        },
        (Some(method), None) => RouteName {
            method: method.clone(),
            raw_path: infer(decl.name(), decl.accessor()).1,
            path_explicit: false,
        },
        (None, Some(path)) => RouteName {
            method: infer(decl.name(), decl.accessor()).0,
            raw_path: path.to_string(),
            path_explicit: true,
        },
        (None, None) => {
            let (method, raw_path) = infer(decl.name(), decl.accessor());
            RouteName {
                method,
                raw_path,
                path_explicit: false,
            }
        }
    }
}

/// Applies the accessor, prefix and fallback rules to a bare name.
fn infer(name: &str, accessor: Option<Accessor>) -> (Method, String) {
    match accessor {
        Some(Accessor::Getter) => return (Method::GET, name.to_string()),
        Some(Accessor::Setter) => return (Method::PUT, name.to_string()),
        None => {}
    }

    if let Some((verb, rest)) = match_prefix(name) {
        let path = if rest.is_empty() { "/" } else { rest };
        return (verb.method(), path.to_string());
    }

    if name == "index" {
        return (Method::GET, "/".to_string());
    }
    (Method::POST, name.to_string())
}

/// Matches the leading lowercase run of `name` against the prefix table.
///
/// Returns the verb and the remainder after the prefix.
#[must_use]
pub fn match_prefix(name: &str) -> Option<(Verb, &str)> {
    let run = name
        .find(|c: char| !c.is_lowercase())
        .unwrap_or(name.len());
    let (head, rest) = name.split_at(run);
    VERB_PREFIXES
        .iter()
        .find(|(prefix, _)| *prefix == head)
        .map(|&(_, verb)| (verb, rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn route(decl: MethodDecl) -> (Method, String, bool) {
        let r = classify(&decl);
        (r.method, r.raw_path, r.path_explicit)
    }

    fn named(name: &str) -> (Method, String, bool) {
        route(MethodDecl::builder(name).build())
    }

    #[test]
    fn test_prefix_table() {
        let cases = [
            ("getInfo", Method::GET, "Info"),
            ("queryItems", Method::GET, "Items"),
            ("putItem", Method::PUT, "Item"),
            ("setName", Method::PUT, "Name"),
            ("updateUser", Method::PATCH, "User"),
            ("patchUser", Method::PATCH, "User"),
            ("addComment", Method::POST, "Comment"),
            ("createIssue", Method::POST, "Issue"),
            ("postMessage", Method::POST, "Message"),
            ("removeTag", Method::DELETE, "Tag"),
            ("eraseAll", Method::DELETE, "All"),
            ("deleteIssue", Method::DELETE, "Issue"),
        ];
        for (name, method, path) in cases {
            assert_eq!(named(name), (method, path.to_string(), false), "{name}");
        }
    }

    #[test]
    fn test_prefix_needs_boundary() {
        assert_eq!(named("getter"), (Method::POST, "getter".into(), false));
        assert_eq!(named("settle"), (Method::POST, "settle".into(), false));
        assert_eq!(named("address"), (Method::POST, "address".into(), false));
    }

    #[test]
    fn test_bare_prefix_maps_to_root() {
        assert_eq!(named("get"), (Method::GET, "/".into(), false));
        assert_eq!(named("delete"), (Method::DELETE, "/".into(), false));
    }

    #[test]
    fn test_digit_and_underscore_are_boundaries() {
        assert_eq!(named("get2fa"), (Method::GET, "2fa".into(), false));
        assert_eq!(named("get_info"), (Method::GET, "_info".into(), false));
    }

    #[test]
    fn test_index_and_fallback() {
        assert_eq!(named("index"), (Method::GET, "/".into(), false));
        assert_eq!(named("archive"), (Method::POST, "archive".into(), false));
        assert_eq!(named("Frobnicate"), (Method::POST, "Frobnicate".into(), false));
    }

    #[test]
    fn test_accessors() {
        let getter = MethodDecl::builder("name").getter().build();
        assert_eq!(route(getter), (Method::GET, "name".into(), false));

        let setter = MethodDecl::builder("name").setter().build();
        assert_eq!(route(setter), (Method::PUT, "name".into(), false));

        // Accessors win over the prefix table.
        let getter = MethodDecl::builder("deleted").getter().build();
        assert_eq!(route(getter), (Method::GET, "deleted".into(), false));
    }

    #[test]
    fn test_explicit_both() {
        let decl = MethodDecl::builder("getPullRequests")
            .http_method(Method::HEAD)
            .path(":owner/:repo/pulls")
            .build();
        assert_eq!(
            route(decl),
            (Method::HEAD, ":owner/:repo/pulls".into(), true)
        );
    }

    #[test]
    fn test_explicit_method_only() {
        let decl = MethodDecl::builder("getInfo").http_method(Method::POST).build();
        assert_eq!(route(decl), (Method::POST, "Info".into(), false));

        let decl = MethodDecl::builder("frobnicate").http_method(Method::GET).build();
        assert_eq!(route(decl), (Method::GET, "frobnicate".into(), false));
    }

    #[test]
    fn test_explicit_path_only() {
        let decl = MethodDecl::builder("deleteIssue").path("issues/:number").build();
        assert_eq!(route(decl), (Method::DELETE, "issues/:number".into(), true));

        let decl = MethodDecl::builder("frobnicate").path("frob").build();
        assert_eq!(route(decl), (Method::POST, "frob".into(), true));
    }

    proptest! {
        #[test]
        fn prefix_strips_exactly_the_prefix(
            idx in 0..VERB_PREFIXES.len(),
            rest in "([A-Z0-9_][a-zA-Z0-9]{0,10})?",
        ) {
            let (prefix, verb) = VERB_PREFIXES[idx];
            let name = format!("{prefix}{rest}");
            let (method, path, explicit) = named(&name);
            prop_assert_eq!(method, verb.method());
            prop_assert!(!explicit);
            if rest.is_empty() {
                prop_assert_eq!(path, "/");
            } else {
                prop_assert_eq!(path, rest);
            }
        }

        #[test]
        fn lowercase_continuation_never_matches(
            idx in 0..VERB_PREFIXES.len(),
            tail in "[a-z][a-zA-Z]{0,8}",
        ) {
            let (prefix, _) = VERB_PREFIXES[idx];
            let name = format!("{prefix}{tail}");
            prop_assume!(match_prefix(&name).is_none());
            let (method, path, _) = named(&name);
            prop_assert_eq!(method, Method::POST);
            prop_assert_eq!(path, name);
        }
    }
}
