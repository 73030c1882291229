//! Tracker client interface and the retrying, lazily-connecting client

use crate::error::TrackerAuthorizationFailure;
use crate::retry::RetryPolicy;
use crate::transport::{Connector, TrackerConnection};
use crate::types::{Issue, IssueFields, SearchCriteria};
use crate::TransportError;
use std::fmt;

/// Outcome of a tracker call that did not hit an authorization failure
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerReply<T> {
    /// Call succeeded
    Done(T),
    /// Tracker could not be reached within the retry budget
    Unavailable,
}

impl<T> TrackerReply<T> {
    /// Check if the tracker was unreachable
    #[inline]
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    /// Successful value, if any
    #[inline]
    pub fn done(self) -> Option<T> {
        match self {
            Self::Done(value) => Some(value),
            Self::Unavailable => None,
        }
    }

    /// Map the successful value
    #[inline]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> TrackerReply<U> {
        match self {
            Self::Done(value) => TrackerReply::Done(f(value)),
            Self::Unavailable => TrackerReply::Unavailable,
        }
    }
}

/// Minimal tracker contract: search, comment, create
///
/// Implementations never return an error for an unreachable tracker; they
/// return [`TrackerReply::Unavailable`]. Only rejected credentials are errors.
pub trait IssueTracker {
    /// Open issues matching `criteria`, oldest first
    ///
    /// # Errors
    /// Returns [`TrackerAuthorizationFailure`] when credentials are rejected.
    fn search(
        &mut self,
        criteria: &SearchCriteria,
    ) -> Result<TrackerReply<Vec<Issue>>, TrackerAuthorizationFailure>;

    /// Add a comment to an existing issue
    ///
    /// # Errors
    /// Returns [`TrackerAuthorizationFailure`] when credentials are rejected.
    fn add_comment(
        &mut self,
        issue_key: &str,
        body: &str,
    ) -> Result<TrackerReply<()>, TrackerAuthorizationFailure>;

    /// Create a new issue
    ///
    /// # Errors
    /// Returns [`TrackerAuthorizationFailure`] when credentials are rejected.
    fn create_issue(
        &mut self,
        fields: &IssueFields,
    ) -> Result<TrackerReply<Issue>, TrackerAuthorizationFailure>;
}

impl<T: IssueTracker + ?Sized> IssueTracker for Box<T> {
    fn search(
        &mut self,
        criteria: &SearchCriteria,
    ) -> Result<TrackerReply<Vec<Issue>>, TrackerAuthorizationFailure> {
        (**self).search(criteria)
    }

    fn add_comment(
        &mut self,
        issue_key: &str,
        body: &str,
    ) -> Result<TrackerReply<()>, TrackerAuthorizationFailure> {
        (**self).add_comment(issue_key, body)
    }

    fn create_issue(
        &mut self,
        fields: &IssueFields,
    ) -> Result<TrackerReply<Issue>, TrackerAuthorizationFailure> {
        (**self).create_issue(fields)
    }
}

/// Lazily connecting tracker client with retries
///
/// The connection is opened on first use and reused for the session. After
/// any call comes back [`TrackerReply::Unavailable`] the cached connection
/// is dropped, so the next call reconnects first.
pub struct RetryingTracker<C: Connector> {
    connector: C,
    policy: RetryPolicy,
    connection: Option<C::Connection>,
}

impl<C: Connector> RetryingTracker<C> {
    /// Create client; nothing is contacted until the first call
    #[inline]
    #[must_use]
    pub fn new(connector: C, policy: RetryPolicy) -> Self {
        Self {
            connector,
            policy,
            connection: None,
        }
    }

    /// Retry policy in use
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Whether a connection is cached
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Establish the connection unless one is cached
    ///
    /// # Errors
    /// Returns [`TrackerAuthorizationFailure`] when credentials are rejected.
    pub fn connect(&mut self) -> Result<TrackerReply<()>, TrackerAuthorizationFailure> {
        if self.connection.is_some() {
            return Ok(TrackerReply::Done(()));
        }

        let connector = &self.connector;
        match self.policy.run("connect", || connector.connect())? {
            TrackerReply::Done(connection) => {
                tracing::debug!("tracker connection established");
                self.connection = Some(connection);
                Ok(TrackerReply::Done(()))
            }
            TrackerReply::Unavailable => Ok(TrackerReply::Unavailable),
        }
    }

    fn with_connection<T>(
        &mut self,
        operation: &'static str,
        mut call: impl FnMut(&C::Connection) -> Result<T, TransportError>,
    ) -> Result<TrackerReply<T>, TrackerAuthorizationFailure> {
        if self.connect()?.is_unavailable() {
            return Ok(TrackerReply::Unavailable);
        }
        let Some(connection) = self.connection.as_ref() else {
            return Ok(TrackerReply::Unavailable);
        };

        let reply = self.policy.run(operation, || call(connection))?;
        if reply.is_unavailable() {
            self.connection = None;
        }
        Ok(reply)
    }
}

impl<C: Connector + fmt::Debug> fmt::Debug for RetryingTracker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryingTracker")
            .field("connector", &self.connector)
            .field("policy", &self.policy)
            .field("connected", &self.connection.is_some())
            .finish()
    }
}

impl<C: Connector> IssueTracker for RetryingTracker<C> {
    fn search(
        &mut self,
        criteria: &SearchCriteria,
    ) -> Result<TrackerReply<Vec<Issue>>, TrackerAuthorizationFailure> {
        tracing::debug!(query = %criteria.to_jql(), "searching tracker");
        self.with_connection("search", |c| c.search(criteria))
    }

    fn add_comment(
        &mut self,
        issue_key: &str,
        body: &str,
    ) -> Result<TrackerReply<()>, TrackerAuthorizationFailure> {
        self.with_connection("add_comment", |c| c.add_comment(issue_key, body))
    }

    fn create_issue(
        &mut self,
        fields: &IssueFields,
    ) -> Result<TrackerReply<Issue>, TrackerAuthorizationFailure> {
        self.with_connection("create_issue", |c| c.create_issue(fields))
    }
}
