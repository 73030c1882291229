//! Allow-list of known benign failure messages

use crate::error::ConfigError;
use regex::Regex;

/// Ordered list of compiled failure-message patterns
///
/// A pattern matches anywhere in the message. The first matching pattern
/// wins; a message matching none is not filtered.
#[derive(Debug, Clone, Default)]
pub struct ExceptionFilter {
    patterns: Vec<Regex>,
}

impl ExceptionFilter {
    /// Compile patterns in order
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidPattern`] for the first pattern that
    /// does not compile.
    pub fn new<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let pattern = p.as_ref();
                Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// First pattern matching `message`, if any
    #[must_use]
    pub fn matches(&self, message: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|re| re.is_match(message))
            .map(Regex::as_str)
    }

    /// Check if `message` is filtered out
    #[inline]
    #[must_use]
    pub fn is_filtered(&self, message: &str) -> bool {
        self.matches(message).is_some()
    }

    /// Number of patterns
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Check if no patterns are configured
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
