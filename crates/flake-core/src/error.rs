//! Error types for triage
//!
//! Two families:
//! - [`ConfigError`]: the configuration could not be loaded or is unusable
//! - [`TriageError`]: a single failure event could not be triaged
//!
//! Tracker unavailability and filtered failures are outcomes, not errors.

use flake_context::ContextError;
use flake_tracker::TrackerAuthorizationFailure;
use std::path::PathBuf;

/// Configuration loading or validation failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File that was requested
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::TriageConfig`]
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// An exception pattern is not a valid regular expression
    #[error("invalid exception pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// Offending pattern
        pattern: String,
        /// Compile error
        #[source]
        source: regex::Error,
    },

    /// A required setting is missing or inconsistent
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create invalid-setting error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Failure to triage one event
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    /// The failure carried no frames to render
    #[error("failure event has an empty frame chain")]
    EmptyFrameChain,

    /// The tracker rejected the configured credentials
    #[error(transparent)]
    TrackerAuthorization(#[from] TrackerAuthorizationFailure),
}

impl TriageError {
    /// Check if the error points at misconfiguration rather than bad input
    #[inline]
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::TrackerAuthorization(_))
    }
}

impl From<ContextError> for TriageError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::EmptyFrameChain => Self::EmptyFrameChain,
        }
    }
}
