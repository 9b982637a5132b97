//! Pattern errors.

use thiserror::Error;

/// A malformed path pattern, or a pattern that could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The pattern contains `//`.
    #[error("doubled separator at offset {offset} in path pattern `{pattern}`")]
    DoubledSeparator {
        /// The offending pattern.
        pattern: String,
        /// Byte offset of the first `/` of the pair.
        offset: usize,
    },

    /// A `:` marker with no name after it.
    #[error("empty placeholder name at offset {offset} in path pattern `{pattern}`")]
    EmptyPlaceholder {
        /// The offending pattern.
        pattern: String,
        /// Byte offset of the marker.
        offset: usize,
    },

    /// No value was supplied for a placeholder while rendering.
    #[error("no value bound for placeholder `{name}` in path pattern `{pattern}`")]
    UnboundPlaceholder {
        /// The pattern being rendered.
        pattern: String,
        /// The placeholder name.
        name: String,
    },
}

impl PatternError {
    /// Returns the pattern the error refers to.
    #[must_use]
    pub fn pattern(&self) -> &str {
        match self {
            Self::DoubledSeparator { pattern, .. }
            | Self::EmptyPlaceholder { pattern, .. }
            | Self::UnboundPlaceholder { pattern, .. } => pattern,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = PatternError::DoubledSeparator {
            pattern: "/a//b".into(),
            offset: 2,
        };
        assert_eq!(
            err.to_string(),
            "doubled separator at offset 2 in path pattern `/a//b`"
        );
        assert_eq!(err.pattern(), "/a//b");
    }
}
