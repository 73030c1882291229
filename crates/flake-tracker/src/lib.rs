//! Issue tracker access for flaky-test triage
//!
//! Three interchangeable implementations of [`IssueTracker`]:
//! - [`RetryingTracker`]: connects lazily through a [`Connector`], retries
//!   transient transport failures and degrades to [`TrackerReply::Unavailable`]
//! - [`StdoutTracker`]: dry-run stub that prints what it would do
//! - a single-attempt client, which is [`RetryingTracker`] with
//!   [`RetryPolicy::no_retry`]
//!
//! Authorization failures are never retried and never reported as
//! unavailability; they surface as [`TrackerAuthorizationFailure`].
//!
//! # Example
//!
//! ```rust,ignore
//! use flake_tracker::{JiraAuth, JiraConnector, RetryPolicy, RetryingTracker};
//!
//! let connector = JiraConnector::new("https://jira.example.com", JiraAuth::bearer("t0ken"));
//! let mut tracker = RetryingTracker::new(connector, RetryPolicy::default());
//! let reply = tracker.search(&criteria)?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod client;
pub mod error;
pub mod retry;
pub mod stdout;
pub mod transport;
pub mod types;

pub use client::{IssueTracker, RetryingTracker, TrackerReply};
pub use error::{TrackerAuthorizationFailure, TransportError};
pub use retry::RetryPolicy;
pub use stdout::{StdoutTracker, DRY_RUN_ISSUE_KEY};
pub use transport::jira::{JiraAuth, JiraConnection, JiraConnector};
pub use transport::{Connector, TrackerConnection};
pub use types::{Issue, IssueFields, SearchCriteria, SearchOrder};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
