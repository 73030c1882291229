//! Error types for failure context rendering

use std::path::PathBuf;

/// Errors raised while classifying or rendering a frame chain
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// The caller handed over a chain without frames
    #[error("frame chain is empty")]
    EmptyFrameChain,
}

/// A frame's source file could not be read
#[derive(Debug, thiserror::Error)]
#[error("source unavailable for {path}: {source}")]
pub struct SourceUnavailable {
    /// File that was requested
    pub path: PathBuf,
    /// Underlying IO failure
    #[source]
    pub source: std::io::Error,
}

impl SourceUnavailable {
    /// Create error for path
    pub fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn empty_chain_display() {
        assert_eq!(ContextError::EmptyFrameChain.to_string(), "frame chain is empty");
    }

    #[test]
    fn source_unavailable_mentions_path() {
        let err = SourceUnavailable::new(
            "/tmp/missing.py",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        let text = err.to_string();
        assert!(text.contains("/tmp/missing.py"));
        assert!(text.contains("gone"));
    }
}
