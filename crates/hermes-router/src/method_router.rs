//! Per-path method dispatch.

use http::Method;
use smallvec::SmallVec;

/// Maps HTTP methods to route values for a single path.
///
/// Methods keep their registration order, which is also the order reported
/// by [`MethodRouter::allowed_methods`] (and so the order of an `Allow`
/// header).
///
/// # Example
///
/// ```rust
/// use hermes_router::MethodRouter;
/// use http::Method;
///
/// let router = MethodRouter::new().get(0_usize).put(1);
///
/// assert_eq!(router.get_route(&Method::GET), Some(&0));
/// assert_eq!(router.get_route(&Method::PUT), Some(&1));
/// assert_eq!(router.get_route(&Method::DELETE), None);
/// ```
#[derive(Debug, Clone)]
pub struct MethodRouter<T> {
    entries: SmallVec<[(Method, T); 2]>,
}

impl<T> Default for MethodRouter<T> {
    fn default() -> Self {
        Self {
            entries: SmallVec::new(),
        }
    }
}

impl<T> MethodRouter<T> {
    /// Creates an empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value` for `method`, replacing any previous value.
    #[must_use]
    pub fn method(mut self, method: Method, value: T) -> Self {
        self.insert(method, value);
        self
    }

    /// Registers a GET route.
    #[must_use]
    pub fn get(self, value: T) -> Self {
        self.method(Method::GET, value)
    }

    /// Registers a HEAD route.
    #[must_use]
    pub fn head(self, value: T) -> Self {
        self.method(Method::HEAD, value)
    }

    /// Registers a POST route.
    #[must_use]
    pub fn post(self, value: T) -> Self {
        self.method(Method::POST, value)
    }

    /// Registers a PUT route.
    #[must_use]
    pub fn put(self, value: T) -> Self {
        self.method(Method::PUT, value)
    }

    /// Registers a PATCH route.
    #[must_use]
    pub fn patch(self, value: T) -> Self {
        self.method(Method::PATCH, value)
    }

    /// Registers a DELETE route.
    #[must_use]
    pub fn delete(self, value: T) -> Self {
        self.method(Method::DELETE, value)
    }

    /// Registers `value` for `method`, returning the value it replaced.
    pub fn insert(&mut self, method: Method, value: T) -> Option<T> {
        if let Some(slot) = self.entries.iter_mut().find(|(m, _)| *m == method) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((method, value));
        None
    }

    /// Returns the value registered for `method`.
    #[must_use]
    pub fn get_route(&self, method: &Method) -> Option<&T> {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, v)| v)
    }

    /// Merges `other` into this router. Existing methods are kept.
    pub fn merge(&mut self, other: Self) {
        for (method, value) in other.entries {
            if self.get_route(&method).is_none() {
                self.entries.push((method, value));
            }
        }
    }

    /// Returns true if any method is registered.
    #[must_use]
    pub fn has_any_method(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Returns registered methods in registration order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.entries.iter().map(|(m, _)| m.clone()).collect()
    }
}
