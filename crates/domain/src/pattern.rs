//! URI patterns used by subscribers and directory listings.
//!
//! Matching follows shell `fnmatch` without path semantics: the whole URI
//! must match, `*` matches any run of characters including `/`, `?` matches
//! one character and `[...]` a character class.

use std::fmt;
use std::str::FromStr;

use glob::{MatchOptions, Pattern};

use crate::error::ValidationError;
use crate::uri::ResourceUri;

const OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// A compiled glob over resource URIs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UriPattern {
    source: String,
    pattern: Pattern,
}

impl UriPattern {
    /// Compile `text`. A leading `/` or `/host/` prefix is ignored so that
    /// patterns can be written like URIs.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedPattern`] if the glob is invalid.
    pub fn new(text: &str) -> Result<Self, ValidationError> {
        let source = text
            .trim()
            .strip_prefix("/host/")
            .or_else(|| text.trim().strip_prefix('/'))
            .unwrap_or(text.trim());
        if source.is_empty() {
            return Err(ValidationError::MalformedPattern(text.to_string()));
        }
        let pattern =
            Pattern::new(source).map_err(|_| ValidationError::MalformedPattern(text.to_string()))?;
        Ok(Self {
            source: source.to_string(),
            pattern,
        })
    }

    /// Split a comma-separated list into patterns.
    ///
    /// # Errors
    ///
    /// Fails on the first malformed entry.
    pub fn parse_list(text: &str) -> Result<Vec<Self>, ValidationError> {
        text.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Self::new)
            .collect()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn matches(&self, uri: &ResourceUri) -> bool {
        self.matches_str(&uri.to_string())
    }

    #[must_use]
    pub fn matches_str(&self, uri: &str) -> bool {
        self.pattern.matches_with(uri, OPTIONS)
    }
}

impl fmt::Display for UriPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for UriPattern {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
