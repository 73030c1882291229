//! Error types for tracker access
//!
//! Transport failures split into two classes:
//! - transient (network, unexpected HTTP status, malformed body): retried
//! - authorization: fatal, surfaced as [`TrackerAuthorizationFailure`]

/// Failure of a single raw transport call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Credentials rejected by the tracker
    #[error("tracker rejected credentials (HTTP {status})")]
    Unauthorized {
        /// Response status, 401 or 403
        status: u16,
    },

    /// Non-success status other than an authorization failure
    #[error("tracker returned HTTP {status}")]
    Http {
        /// Response status
        status: u16,
    },

    /// Request never produced a response
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not have the expected shape
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl TransportError {
    /// Check if another attempt may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !self.is_authorization()
    }

    /// Check if the failure means the credentials are wrong
    #[inline]
    #[must_use]
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Classify an HTTP status
    ///
    /// `None` for success statuses.
    #[must_use]
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            200..=299 => None,
            401 | 403 => Some(Self::Unauthorized { status }),
            _ => Some(Self::Http { status }),
        }
    }
}

/// Tracker refused the configured credentials
///
/// Indicates misconfiguration rather than an outage; callers must not treat
/// it as the tracker being unavailable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("authorization failed during {operation}: {cause}")]
pub struct TrackerAuthorizationFailure {
    /// Tracker operation that was refused
    pub operation: String,
    /// Transport error reported by the tracker
    pub cause: TransportError,
}

impl TrackerAuthorizationFailure {
    /// Create failure for an operation
    pub fn new(operation: impl Into<String>, cause: TransportError) -> Self {
        Self {
            operation: operation.into(),
            cause,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(TransportError::from_status(200), None);
        assert_eq!(TransportError::from_status(201), None);
        assert_eq!(
            TransportError::from_status(403),
            Some(TransportError::Unauthorized { status: 403 })
        );
        assert_eq!(
            TransportError::from_status(401),
            Some(TransportError::Unauthorized { status: 401 })
        );
        assert_eq!(
            TransportError::from_status(502),
            Some(TransportError::Http { status: 502 })
        );
    }

    #[test]
    fn only_authorization_is_fatal() {
        assert!(!TransportError::Unauthorized { status: 403 }.is_retryable());
        assert!(TransportError::Http { status: 500 }.is_retryable());
        assert!(TransportError::Network("reset".into()).is_retryable());
        assert!(TransportError::Malformed("eof".into()).is_retryable());
    }

    #[test]
    fn authorization_failure_display() {
        let err = TrackerAuthorizationFailure::new(
            "search",
            TransportError::Unauthorized { status: 403 },
        );
        assert_eq!(
            err.to_string(),
            "authorization failed during search: tracker rejected credentials (HTTP 403)"
        );
    }
}
