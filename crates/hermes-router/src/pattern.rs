//! Path pattern parsing.
//!
//! A pattern is plain path text in which a placeholder starts at `:` and
//! extends to the next `/` (or the end of the pattern):
//!
//! ```text
//! :owner/:repo/pulls
//! └─┬──┘└┘└─┬─┘└─┬──┘
//!   │   │   │    └── literal "/pulls"
//!   │   │   └─────── placeholder "repo"
//!   │   └─────────── literal "/"
//!   └─────────────── placeholder "owner"
//! ```
//!
//! Patterns come in two flavours. The *relative* pattern is what a contract
//! method declares (or what is derived from its name); the *full* pattern is
//! the relative one mounted under a base path. Both are parsed by the same
//! rules, so their placeholder order always agrees.

use serde::Serialize;

use crate::error::PatternError;

/// Character that opens a placeholder inside a pattern.
pub const PLACEHOLDER_MARKER: char = ':';

/// One piece of a parsed path pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PathSegment {
    /// Literal path text, separators included.
    Literal(String),
    /// Named placeholder; the name excludes the leading marker.
    Placeholder(String),
}

impl PathSegment {
    /// Returns the placeholder name, if this is a placeholder.
    #[must_use]
    pub fn placeholder(&self) -> Option<&str> {
        match self {
            Self::Placeholder(name) => Some(name),
            Self::Literal(_) => None,
        }
    }
}

/// A parsed path pattern.
///
/// # Example
///
/// ```rust
/// use hermes_router::{PathPattern, PathSegment};
///
/// let pattern = PathPattern::parse(":owner/:repo/pulls").unwrap();
/// assert_eq!(
///     pattern.segments(),
///     &[
///         PathSegment::Placeholder("owner".into()),
///         PathSegment::Literal("/".into()),
///         PathSegment::Placeholder("repo".into()),
///         PathSegment::Literal("/pulls".into()),
///     ]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PathPattern {
    source: String,
    segments: Vec<PathSegment>,
}

impl PathPattern {
    /// Parses a relative pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::DoubledSeparator`] when the pattern contains
    /// `//` and [`PatternError::EmptyPlaceholder`] when a `:` is not followed
    /// by a name.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if let Some(offset) = pattern.find("//") {
            return Err(PatternError::DoubledSeparator {
                pattern: pattern.to_string(),
                offset,
            });
        }

        let mut segments = Vec::new();
        let mut rest = pattern;
        let mut offset = 0;

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix(PLACEHOLDER_MARKER) {
                let len = after.find('/').unwrap_or(after.len());
                let name = &after[..len];
                if name.is_empty() {
                    return Err(PatternError::EmptyPlaceholder {
                        pattern: pattern.to_string(),
                        offset,
                    });
                }
                segments.push(PathSegment::Placeholder(name.to_string()));
                rest = &after[len..];
                offset += PLACEHOLDER_MARKER.len_utf8() + len;
            } else {
                let len = rest.find(PLACEHOLDER_MARKER).unwrap_or(rest.len());
                segments.push(PathSegment::Literal(rest[..len].to_string()));
                rest = &rest[len..];
                offset += len;
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// Parses `pattern` mounted under `base`.
    ///
    /// # Errors
    ///
    /// Same as [`PathPattern::parse`], reported against the joined pattern.
    pub fn parse_full(base: &str, pattern: &str) -> Result<Self, PatternError> {
        Self::parse(&concat_url(base, pattern))
    }

    /// Returns the pattern text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns the parsed segments in order.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Iterates placeholder names in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> + '_ {
        self.segments.iter().filter_map(PathSegment::placeholder)
    }

    /// Returns true if the pattern has at least one placeholder.
    #[must_use]
    pub fn has_placeholders(&self) -> bool {
        self.placeholders().next().is_some()
    }

    /// Returns the pattern with every placeholder name erased.
    ///
    /// Two patterns with the same shape match exactly the same request paths.
    #[must_use]
    pub fn shape(&self) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                PathSegment::Literal(text) => out.push_str(text),
                PathSegment::Placeholder(_) => out.push(PLACEHOLDER_MARKER),
            }
        }
        out
    }

    /// Builds a concrete path by substituting every placeholder.
    ///
    /// `lookup` returns the already-encoded text for a placeholder name.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::UnboundPlaceholder`] for the first placeholder
    /// `lookup` has no value for.
    pub fn render<F>(&self, mut lookup: F) -> Result<String, PatternError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut out = String::with_capacity(self.source.len() + 16);
        for segment in &self.segments {
            match segment {
                PathSegment::Literal(text) => out.push_str(text),
                PathSegment::Placeholder(name) => {
                    let value = lookup(name).ok_or_else(|| PatternError::UnboundPlaceholder {
                        pattern: self.source.clone(),
                        name: name.clone(),
                    })?;
                    out.push_str(&value);
                }
            }
        }
        Ok(out)
    }

    /// Splits the pattern into `/`-separated components for the route tree.
    pub(crate) fn components(&self) -> Vec<Component<'_>> {
        self.source
            .split('/')
            .filter(|piece| !piece.is_empty())
            .map(|piece| match piece.find(PLACEHOLDER_MARKER) {
                Some(at) => Component::Param {
                    prefix: &piece[..at],
                    name: &piece[at + PLACEHOLDER_MARKER.len_utf8()..],
                },
                None => Component::Static(piece),
            })
            .collect()
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// A single `/`-separated piece of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Component<'a> {
    Static(&'a str),
    /// Optional literal prefix followed by a placeholder running to the end.
    Param { prefix: &'a str, name: &'a str },
}

/// Joins two URL fragments with exactly one `/` between them.
///
/// ```rust
/// use hermes_router::concat_url;
///
/// assert_eq!(concat_url("/", ":id/name"), "/:id/name");
/// assert_eq!(concat_url("/api/", "/users"), "/api/users");
/// assert_eq!(concat_url("/api", "users"), "/api/users");
/// assert_eq!(concat_url("/api", ""), "/api");
/// ```
#[must_use]
pub fn concat_url(base: &str, path: &str) -> String {
    if base.is_empty() {
        return path.to_string();
    }
    if path.is_empty() {
        return base.to_string();
    }
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base}{}", &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lit(text: &str) -> PathSegment {
        PathSegment::Literal(text.to_string())
    }

    fn ph(name: &str) -> PathSegment {
        PathSegment::Placeholder(name.to_string())
    }

    #[test]
    fn test_parse_owner_repo_pulls() {
        let pattern = PathPattern::parse(":owner/:repo/pulls").unwrap();
        assert_eq!(
            pattern.segments(),
            &[ph("owner"), lit("/"), ph("repo"), lit("/pulls")]
        );
    }

    #[test]
    fn test_parse_literal_only() {
        let pattern = PathPattern::parse("/users/list").unwrap();
        assert_eq!(pattern.segments(), &[lit("/users/list")]);
        assert!(!pattern.has_placeholders());
    }

    #[test]
    fn test_parse_trailing_placeholder() {
        let pattern = PathPattern::parse("/users/:id").unwrap();
        assert_eq!(pattern.segments(), &[lit("/users/"), ph("id")]);
    }

    #[test]
    fn test_parse_placeholder_with_literal_prefix() {
        let pattern = PathPattern::parse("/files/v:version/raw").unwrap();
        assert_eq!(
            pattern.segments(),
            &[lit("/files/v"), ph("version"), lit("/raw")]
        );
    }

    #[test]
    fn test_parse_empty_pattern() {
        let pattern = PathPattern::parse("").unwrap();
        assert!(pattern.segments().is_empty());
    }

    #[test]
    fn test_parse_doubled_separator() {
        assert_eq!(
            PathPattern::parse("//"),
            Err(PatternError::DoubledSeparator {
                pattern: "//".into(),
                offset: 0
            })
        );
        assert_eq!(
            PathPattern::parse("/a//b/"),
            Err(PatternError::DoubledSeparator {
                pattern: "/a//b/".into(),
                offset: 2
            })
        );
    }

    #[test]
    fn test_parse_empty_placeholder_name() {
        assert_eq!(
            PathPattern::parse("/users/:/posts"),
            Err(PatternError::EmptyPlaceholder {
                pattern: "/users/:/posts".into(),
                offset: 7
            })
        );
        assert!(PathPattern::parse(":").is_err());
    }

    #[test]
    fn test_parse_full_prefixes_base() {
        let full = PathPattern::parse_full("/api/", ":id/name").unwrap();
        assert_eq!(full.as_str(), "/api/:id/name");
        assert_eq!(full.segments(), &[lit("/api/"), ph("id"), lit("/name")]);
    }

    #[test]
    fn test_shape_erases_names() {
        let a = PathPattern::parse("/:id/name").unwrap();
        let b = PathPattern::parse("/:key/name").unwrap();
        assert_eq!(a.shape(), "/:/name");
        assert_eq!(a.shape(), b.shape());
    }

    #[test]
    fn test_render_substitutes_values() {
        let pattern = PathPattern::parse("/:owner/:repo/pulls").unwrap();
        let path = pattern
            .render(|name| match name {
                "owner" => Some("rust-lang".into()),
                "repo" => Some("cargo".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(path, "/rust-lang/cargo/pulls");
    }

    #[test]
    fn test_render_reports_unbound_placeholder() {
        let pattern = PathPattern::parse("/:id/name").unwrap();
        let err = pattern.render(|_| None).unwrap_err();
        assert_eq!(
            err,
            PatternError::UnboundPlaceholder {
                pattern: "/:id/name".into(),
                name: "id".into()
            }
        );
    }

    #[test]
    fn test_components() {
        let pattern = PathPattern::parse("/files/v:version/:name").unwrap();
        assert_eq!(
            pattern.components(),
            vec![
                Component::Static("files"),
                Component::Param {
                    prefix: "v",
                    name: "version"
                },
                Component::Param {
                    prefix: "",
                    name: "name"
                },
            ]
        );
    }

    #[test]
    fn test_concat_url() {
        assert_eq!(concat_url("/", "/"), "/");
        assert_eq!(concat_url("", "name"), "name");
        assert_eq!(concat_url("/api", "/users/"), "/api/users/");
    }

    proptest! {
        #[test]
        fn full_and_relative_agree_on_placeholder_order(
            base in "(/[a-z]{1,6}){0,3}/?",
            names in proptest::collection::vec("[a-z][a-z0-9_]{0,7}", 0..4),
            tail in "[a-z]{0,6}",
        ) {
            let mut relative = String::new();
            for name in &names {
                relative.push(':');
                relative.push_str(name);
                relative.push('/');
            }
            relative.push_str(&tail);

            let rel = PathPattern::parse(&relative).unwrap();
            let full = PathPattern::parse_full(&base, &relative).unwrap();

            let rel_names: Vec<_> = rel.placeholders().collect();
            let full_names: Vec<_> = full.placeholders().collect();
            prop_assert_eq!(&rel_names, &full_names);
            prop_assert_eq!(rel_names, names.iter().map(String::as_str).collect::<Vec<_>>());
        }

        #[test]
        fn parse_never_accepts_doubled_separator(prefix in "[a-z:/]{0,8}", suffix in "[a-z:/]{0,8}") {
            let pattern = format!("{prefix}//{suffix}");
            let is_doubled = matches!(
                PathPattern::parse(&pattern),
                Err(PatternError::DoubledSeparator { .. })
            );
            prop_assert!(is_doubled);
        }
    }
}
