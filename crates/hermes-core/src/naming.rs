//! Identifier naming styles.
//!
//! Route paths are derived from method names, so the word splitting here
//! decides what every derived URL looks like. Splitting is acronym aware:
//! a run of capitals followed by a lowercase letter ends one letter early,
//! so `getHTMLEntity` splits into `get`, `HTML`, `Entity`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Target naming convention for derived route paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStyle {
    /// Leave identifiers untouched.
    Unaltered,
    /// `getHtmlEntity`
    CamelCase,
    /// `GetHtmlEntity`
    PascalCase,
    /// `gethtmlentity`
    FlatLower,
    /// `GETHTMLENTITY`
    FlatUpper,
    /// `get_html_entity`
    #[default]
    SnakeLower,
    /// `GET_HTML_ENTITY`
    SnakeUpper,
}

impl NamingStyle {
    /// All styles, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Unaltered,
        Self::CamelCase,
        Self::PascalCase,
        Self::FlatLower,
        Self::FlatUpper,
        Self::SnakeLower,
        Self::SnakeUpper,
    ];

    /// Returns the configuration name of the style.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unaltered => "unaltered",
            Self::CamelCase => "camel_case",
            Self::PascalCase => "pascal_case",
            Self::FlatLower => "flat_lower",
            Self::FlatUpper => "flat_upper",
            Self::SnakeLower => "snake_lower",
            Self::SnakeUpper => "snake_upper",
        }
    }

    /// Converts `ident` to this style.
    ///
    /// ```rust
    /// use hermes_core::NamingStyle;
    ///
    /// assert_eq!(NamingStyle::SnakeLower.apply("getHTMLEntity"), "get_html_entity");
    /// assert_eq!(NamingStyle::PascalCase.apply("getHTMLEntity"), "GetHtmlEntity");
    /// assert_eq!(NamingStyle::Unaltered.apply("getHTMLEntity"), "getHTMLEntity");
    /// ```
    #[must_use]
    pub fn apply(self, ident: &str) -> String {
        if self == Self::Unaltered {
            return ident.to_string();
        }

        // One-letter words can merge when the output is split again
        // (`aBCd` -> `ABCd` -> `AbCd`), so settle on the fixpoint.
        let mut current = self.convert_once(ident);
        for _ in 0..=ident.chars().count() {
            let next = self.convert_once(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    fn convert_once(self, ident: &str) -> String {
        let words = split_words(ident);
        let mut out = String::with_capacity(ident.len() + words.len());
        for (i, word) in words.iter().enumerate() {
            match self {
                Self::Unaltered => out.push_str(word),
                Self::CamelCase if i == 0 => out.push_str(&word.to_lowercase()),
                Self::CamelCase | Self::PascalCase => push_capitalized(&mut out, word),
                Self::FlatLower => out.push_str(&word.to_lowercase()),
                Self::FlatUpper => out.push_str(&word.to_uppercase()),
                Self::SnakeLower => {
                    if i > 0 {
                        out.push('_');
                    }
                    out.push_str(&word.to_lowercase());
                }
                Self::SnakeUpper => {
                    if i > 0 {
                        out.push('_');
                    }
                    out.push_str(&word.to_uppercase());
                }
            }
        }
        out
    }
}

impl fmt::Display for NamingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown style name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown naming style `{0}`")]
pub struct UnknownStyle(pub String);

impl FromStr for NamingStyle {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == normalized)
            .ok_or_else(|| UnknownStyle(s.to_string()))
    }
}

fn push_capitalized(out: &mut String, word: &str) {
    let mut chars = word.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.push_str(&chars.as_str().to_lowercase());
    }
}

/// Splits an identifier into words.
///
/// Boundaries fall before an uppercase letter that follows a lowercase
/// letter or a digit, and before the last capital of an acronym run when a
/// lowercase letter follows it. `_` and `-` separate words and are dropped.
///
/// ```rust
/// use hermes_core::naming::split_words;
///
/// assert_eq!(split_words("getHTMLEntity"), vec!["get", "HTML", "Entity"]);
/// assert_eq!(split_words("userID"), vec!["user", "ID"]);
/// assert_eq!(split_words("get_item2Fa"), vec!["get", "item2", "Fa"]);
/// ```
#[must_use]
pub fn split_words(ident: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = ident.char_indices().collect();
    let mut words = Vec::new();
    let mut start: Option<usize> = None;

    for (i, &(pos, c)) in chars.iter().enumerate() {
        if c == '_' || c == '-' {
            if let Some(s) = start.take() {
                words.push(&ident[s..pos]);
            }
            continue;
        }

        let Some(s) = start else {
            start = Some(pos);
            continue;
        };

        let prev = chars[i - 1].1;
        let next = chars.get(i + 1).map(|&(_, c)| c);
        let boundary = c.is_uppercase()
            && (prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next.is_some_and(char::is_lowercase)));
        if boundary {
            words.push(&ident[s..pos]);
            start = Some(pos);
        }
    }

    if let Some(s) = start {
        words.push(&ident[s..]);
    }
    words
}
