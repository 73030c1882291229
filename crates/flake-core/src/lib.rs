//! Flaky-test triage
//!
//! Reconciles a failed scenario against the issue tracker:
//! - skips failures whose message matches a known benign pattern
//! - renders a multi-frame failure context
//! - comments on the oldest open flaky issue for the scenario, or opens one
//! - annotates the failure with exactly one note about what happened
//!
//! The tracker being down never fails triage; only rejected credentials and
//! an empty frame chain are errors.
//!
//! # Example
//!
//! ```rust,ignore
//! use flake_core::prelude::*;
//!
//! let config = TriageConfig::load("flake-triage.toml")?;
//! let tracker = build_tracker(&config)?;
//! let mut reconciler = IssueReconciler::new(config, tracker, FsSourceReader)?;
//!
//! let mut notes = Vec::new();
//! let outcome = reconciler.triage(&failure, &mut notes)?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod annotate;
pub mod config;
pub mod error;
pub mod failure;
pub mod filter;
pub mod phrases;
pub mod reconcile;
pub mod session;

pub use annotate::AnnotationSink;
pub use config::{TrackerConfig, TriageConfig};
pub use error::{ConfigError, TriageError};
pub use failure::{parse_failures, ScenarioFailure, DEFAULT_PRIORITY};
pub use filter::ExceptionFilter;
pub use phrases::{Language, ReportingPhrases, EN_PHRASES, RU_PHRASES};
pub use reconcile::{Action, DegradedReason, IssueReconciler, Outcome};
pub use session::build_tracker;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        build_tracker, AnnotationSink, ConfigError, IssueReconciler, Outcome, ScenarioFailure,
        TriageConfig, TriageError,
    };
    pub use flake_context::{FrameChain, FsSourceReader, StackFrame};
    pub use flake_tracker::IssueTracker;
}
