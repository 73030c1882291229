//! Raw tracker transports
//!
//! A [`Connector`] opens a [`TrackerConnection`]; connections perform single
//! attempts and report every failure as a [`TransportError`]. Retrying and
//! degraded mode live in [`crate::RetryingTracker`].

use crate::error::TransportError;
use crate::types::{Issue, IssueFields, SearchCriteria};

pub mod jira;

/// Opens connections to a tracker
pub trait Connector {
    /// Connection handle produced on success
    type Connection: TrackerConnection;

    /// Open and verify a connection (single attempt)
    ///
    /// # Errors
    /// Returns [`TransportError`] on any failure.
    fn connect(&self) -> Result<Self::Connection, TransportError>;
}

/// Established tracker connection (single attempt per call)
pub trait TrackerConnection {
    /// Open issues matching `criteria`, oldest first
    ///
    /// # Errors
    /// Returns [`TransportError`] on any failure.
    fn search(&self, criteria: &SearchCriteria) -> Result<Vec<Issue>, TransportError>;

    /// Add a comment to an issue
    ///
    /// # Errors
    /// Returns [`TransportError`] on any failure.
    fn add_comment(&self, issue_key: &str, body: &str) -> Result<(), TransportError>;

    /// Create an issue
    ///
    /// # Errors
    /// Returns [`TransportError`] on any failure.
    fn create_issue(&self, fields: &IssueFields) -> Result<Issue, TransportError>;
}
