//! High-level router API.

use http::Method;

use crate::method_router::MethodRouter;
use crate::node::{split_path, Node};
use crate::params::Params;
use crate::pattern::PathPattern;
use crate::RouteMatch;

/// A route tree keyed by parsed [`PathPattern`]s.
///
/// `T` is whatever the caller wants back from a match; the server keeps
/// indices into its handler list.
///
/// # Example
///
/// ```rust
/// use hermes_router::{MethodRouter, PathPattern, Router};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert(
///     &PathPattern::parse("/:id/name").unwrap(),
///     MethodRouter::new().get("getName").put("setName"),
/// );
///
/// let matched = router.match_route(&Method::GET, "/7/name").unwrap();
/// assert_eq!(*matched.value, "getName");
/// assert_eq!(matched.params.get("id"), Some("7"));
/// ```
///
/// # Route Priority
///
/// 1. **Static components** (`/users/me`)
/// 2. **Prefixed placeholders**, longest prefix first (`/files/v:version`)
/// 3. **Bare placeholders** (`/users/:id`)
///
/// Empty path components are ignored, so `/users/` matches `/users`.
#[derive(Debug, Clone)]
pub struct Router<T> {
    root: Node<T>,
    route_count: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Inserts the methods for one pattern. Methods already present at the
    /// same pattern are kept.
    pub fn insert(&mut self, pattern: &PathPattern, methods: MethodRouter<T>) {
        self.root.insert(&pattern.components(), methods);
        self.route_count += 1;
    }

    /// Inserts a single-method route.
    pub fn route(&mut self, method: Method, pattern: &PathPattern, value: T) {
        self.insert(pattern, MethodRouter::new().method(method, value));
    }

    /// Matches a method and a request path.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        let mut params = Params::new();
        let methods = self.root.find(
            &split_path(path),
            &mut params,
            &|m: &MethodRouter<T>| m.get_route(method).is_some(),
        )?;
        let value = methods.get_route(method)?;
        Some(RouteMatch::new(value, params))
    }

    /// Matches a request path regardless of method.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        let mut params = Params::new();
        let methods = self.root.find(
            &split_path(path),
            &mut params,
            &|m: &MethodRouter<T>| m.has_any_method(),
        )?;
        Some((methods, params))
    }

    /// Returns every method registered for any pattern matching `path`,
    /// without duplicates. Empty when the path is unknown.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut leaves = Vec::new();
        self.root.collect(&split_path(path), &mut leaves);

        let mut methods: Vec<Method> = Vec::new();
        for method in leaves.iter().flat_map(|m| m.allowed_methods()) {
            if !methods.contains(&method) {
                methods.push(method);
            }
        }
        methods
    }

    /// Returns the number of insertions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if nothing was inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}
