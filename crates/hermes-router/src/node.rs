//! Route tree.
//!
//! Each node stands for one `/`-separated path component. Static components
//! are looked up by binary search; placeholder components are tried after
//! them, longest literal prefix first.

use crate::method_router::MethodRouter;
use crate::params::Params;
use crate::pattern::Component;

/// What a node matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SegmentKind {
    /// Exact component text.
    Static,
    /// A component starting with `prefix`; the rest is captured as `name`.
    Param { prefix: String, name: String },
}

#[derive(Debug, Clone)]
pub(crate) struct Node<T> {
    segment: String,
    kind: SegmentKind,
    methods: Option<MethodRouter<T>>,
    /// Sorted by segment.
    static_children: Vec<Node<T>>,
    /// Sorted by descending prefix length, insertion order otherwise.
    param_children: Vec<Node<T>>,
}

impl<T> Node<T> {
    fn new(segment: String, kind: SegmentKind) -> Self {
        Self {
            segment,
            kind,
            methods: None,
            static_children: Vec::new(),
            param_children: Vec::new(),
        }
    }

    pub(crate) fn root() -> Self {
        Self::new(String::new(), SegmentKind::Static)
    }

    pub(crate) fn insert(&mut self, components: &[Component<'_>], methods: MethodRouter<T>) {
        let Some((first, remaining)) = components.split_first() else {
            match &mut self.methods {
                Some(existing) => existing.merge(methods),
                None => self.methods = Some(methods),
            }
            return;
        };

        match *first {
            Component::Static(text) => {
                match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(text))
                {
                    Ok(i) => self.static_children[i].insert(remaining, methods),
                    Err(i) => {
                        let mut child = Node::new(text.to_string(), SegmentKind::Static);
                        child.insert(remaining, methods);
                        self.static_children.insert(i, child);
                    }
                }
            }
            Component::Param { prefix, name } => {
                let existing = self.param_children.iter_mut().find(|c| {
                    matches!(&c.kind, SegmentKind::Param { prefix: p, name: n } if p == prefix && n == name)
                });
                if let Some(child) = existing {
                    child.insert(remaining, methods);
                    return;
                }

                let mut child = Node::new(
                    format!("{prefix}:{name}"),
                    SegmentKind::Param {
                        prefix: prefix.to_string(),
                        name: name.to_string(),
                    },
                );
                child.insert(remaining, methods);
                let at = self
                    .param_children
                    .iter()
                    .position(|c| c.prefix_len() < prefix.len())
                    .unwrap_or(self.param_children.len());
                self.param_children.insert(at, child);
            }
        }
    }

    fn prefix_len(&self) -> usize {
        match &self.kind {
            SegmentKind::Param { prefix, .. } => prefix.len(),
            SegmentKind::Static => 0,
        }
    }

    /// Finds the first leaf reachable by `segments` whose methods satisfy
    /// `accept`. On success `params` holds the captures along that branch.
    pub(crate) fn find<'a>(
        &'a self,
        segments: &[&str],
        params: &mut Params,
        accept: &dyn Fn(&MethodRouter<T>) -> bool,
    ) -> Option<&'a MethodRouter<T>> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.methods.as_ref().filter(|m| accept(*m));
        };

        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.find(remaining, params, accept) {
                return Some(found);
            }
        }

        for child in &self.param_children {
            let SegmentKind::Param { prefix, name } = &child.kind else {
                continue;
            };
            let Some(value) = segment.strip_prefix(prefix.as_str()) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            let mark = params.len();
            params.push(name.clone(), value);
            if let Some(found) = child.find(remaining, params, accept) {
                return Some(found);
            }
            params.truncate(mark);
        }

        None
    }

    /// Collects every leaf reachable by `segments`.
    pub(crate) fn collect<'a>(&'a self, segments: &[&str], out: &mut Vec<&'a MethodRouter<T>>) {
        let Some((segment, remaining)) = segments.split_first() else {
            if let Some(methods) = &self.methods {
                out.push(methods);
            }
            return;
        };

        if let Some(child) = self.find_static_child(segment) {
            child.collect(remaining, out);
        }
        for child in &self.param_children {
            if let SegmentKind::Param { prefix, .. } = &child.kind {
                if segment.len() > prefix.len() && segment.starts_with(prefix.as_str()) {
                    child.collect(remaining, out);
                }
            }
        }
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node<T>> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

/// Splits a request path into non-empty components.
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}
