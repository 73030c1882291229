//! Issue reconciliation
//!
//! Per failure event:
//!
//! ```text
//! Filtering -> Searching -> Found    -> Commenting -> Done | DegradedSkip
//!                        -> NotFound -> Creating   -> Done | DegradedSkip
//! ```
//!
//! Every terminal state writes exactly one annotation. At most one
//! mutating tracker call (comment or create) is made per event.

use crate::annotate::AnnotationSink;
use crate::config::TriageConfig;
use crate::error::{ConfigError, TriageError};
use crate::failure::ScenarioFailure;
use crate::filter::ExceptionFilter;
use crate::phrases::{fill, separator, ReportingPhrases};
use flake_context::{FailureContext, FailureContextRenderer, SourceReader};
use flake_tracker::{
    Issue, IssueFields, IssueTracker, TrackerAuthorizationFailure, TrackerReply,
};
use std::fmt;

/// What was done on the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Commented on an existing open issue
    Commented,
    /// Created a new issue
    Created,
}

/// Why triage stopped without touching the tracker's issues
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DegradedReason {
    /// Failure message matched an exception pattern
    Filtered {
        /// Pattern that matched
        pattern: String,
    },
    /// Tracker unreachable while searching
    SearchUnavailable,
    /// Tracker unreachable while commenting
    CommentUnavailable,
    /// Tracker unreachable while creating
    CreateUnavailable,
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filtered { .. } => f.write_str("filtered"),
            Self::SearchUnavailable => f.write_str("search-unavailable"),
            Self::CommentUnavailable => f.write_str("comment-unavailable"),
            Self::CreateUnavailable => f.write_str("create-unavailable"),
        }
    }
}

/// Terminal outcome of triaging one failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Reporting is switched off; nothing was done or annotated
    Disabled,
    /// Tracker updated
    Done {
        /// What was done
        action: Action,
        /// Key of the issue commented on or created
        issue_key: String,
    },
    /// Stopped early without error
    DegradedSkip(DegradedReason),
}

impl Outcome {
    /// Issue key for tracker-updating outcomes
    #[must_use]
    pub fn issue_key(&self) -> Option<&str> {
        match self {
            Self::Done { issue_key, .. } => Some(issue_key),
            _ => None,
        }
    }

    /// Check if triage stopped in degraded mode
    #[inline]
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::DegradedSkip(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("disabled"),
            Self::Done {
                action: Action::Commented,
                issue_key,
            } => write!(f, "commented {issue_key}"),
            Self::Done {
                action: Action::Created,
                issue_key,
            } => write!(f, "created {issue_key}"),
            Self::DegradedSkip(reason) => write!(f, "skipped ({reason})"),
        }
    }
}

/// Reconciles failures against the tracker
///
/// Holds one tracker for the whole session, so a live client connects once
/// and serves every failure triaged through this reconciler.
#[derive(Debug)]
pub struct IssueReconciler<T, R> {
    config: TriageConfig,
    filter: ExceptionFilter,
    renderer: FailureContextRenderer<R>,
    tracker: T,
}

impl<T: IssueTracker, R: SourceReader> IssueReconciler<T, R> {
    /// Create reconciler
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidPattern`] if an exception pattern does
    /// not compile.
    pub fn new(config: TriageConfig, tracker: T, reader: R) -> Result<Self, ConfigError> {
        let filter = config.exception_filter()?;
        let renderer = FailureContextRenderer::new(reader, config.project_dir.clone());
        Ok(Self {
            config,
            filter,
            renderer,
            tracker,
        })
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &TriageConfig {
        &self.config
    }

    /// Tracker in use
    #[inline]
    #[must_use]
    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    /// Consume and return the tracker
    pub fn into_tracker(self) -> T {
        self.tracker
    }

    /// Render the failure context without contacting the tracker
    ///
    /// # Errors
    /// Returns [`TriageError::EmptyFrameChain`] for a failure without frames.
    pub fn render(&self, failure: &ScenarioFailure) -> Result<FailureContext, TriageError> {
        Ok(self
            .renderer
            .render(&failure.frames, failure.scenario_path())?)
    }

    /// Triage one failure and annotate the outcome
    ///
    /// # Errors
    /// - [`TriageError::EmptyFrameChain`] before any tracker call, with no
    ///   annotation
    /// - [`TriageError::TrackerAuthorization`] after annotating
    pub fn triage(
        &mut self,
        failure: &ScenarioFailure,
        sink: &mut dyn AnnotationSink,
    ) -> Result<Outcome, TriageError> {
        if !self.config.report_enabled {
            tracing::debug!(test = %failure.test_name, "reporting disabled");
            return Ok(Outcome::Disabled);
        }

        if let Some(pattern) = self.filter.matches(&failure.error_message) {
            let pattern = pattern.to_string();
            sink.annotate(fill(self.phrases().filtered, &[("pattern", pattern.as_str())]));
            let outcome = Outcome::DegradedSkip(DegradedReason::Filtered { pattern });
            return Ok(self.finish(failure, outcome));
        }

        let context = self.render(failure)?;

        let outcome = match self.reconcile(failure, &context, sink) {
            Ok(outcome) => outcome,
            Err(err) => {
                sink.annotate(fill(
                    self.phrases().unauthorized,
                    &[("server", self.server()), ("operation", err.operation.as_str())],
                ));
                tracing::error!(test = %failure.test_name, error = %err, "triage aborted");
                return Err(err.into());
            }
        };
        Ok(self.finish(failure, outcome))
    }

    fn reconcile(
        &mut self,
        failure: &ScenarioFailure,
        context: &FailureContext,
        sink: &mut dyn AnnotationSink,
    ) -> Result<Outcome, TrackerAuthorizationFailure> {
        let scenario_path = failure.scenario_path.to_string_lossy();
        let criteria = self.config.tracker.search_criteria(&scenario_path);

        let found = match self.tracker.search(&criteria)? {
            TrackerReply::Done(found) => found,
            TrackerReply::Unavailable => {
                return Ok(self.degrade(
                    sink,
                    self.phrases().search_unavailable,
                    DegradedReason::SearchUnavailable,
                ));
            }
        };

        match found.into_iter().next() {
            Some(issue) => self.comment(failure, context, issue, sink),
            None => self.create(failure, context, sink),
        }
    }

    fn comment(
        &mut self,
        failure: &ScenarioFailure,
        context: &FailureContext,
        issue: Issue,
        sink: &mut dyn AnnotationSink,
    ) -> Result<Outcome, TrackerAuthorizationFailure> {
        let body = self.issue_text(self.phrases().comment, failure, context);

        match self.tracker.add_comment(&issue.key, &body)? {
            TrackerReply::Done(()) => {
                let link = self.issue_link(&issue.key);
                sink.annotate(fill(self.phrases().commented, &[("issue_link", link.as_str())]));
                Ok(Outcome::Done {
                    action: Action::Commented,
                    issue_key: issue.key,
                })
            }
            TrackerReply::Unavailable => Ok(self.degrade(
                sink,
                self.phrases().comment_unavailable,
                DegradedReason::CommentUnavailable,
            )),
        }
    }

    fn create(
        &mut self,
        failure: &ScenarioFailure,
        context: &FailureContext,
        sink: &mut dyn AnnotationSink,
    ) -> Result<Outcome, TrackerAuthorizationFailure> {
        let fields = self.issue_fields(failure, context);

        match self.tracker.create_issue(&fields)? {
            TrackerReply::Done(issue) => {
                let link = self.issue_link(&issue.key);
                sink.annotate(fill(self.phrases().created, &[("issue_link", link.as_str())]));
                Ok(Outcome::Done {
                    action: Action::Created,
                    issue_key: issue.key,
                })
            }
            TrackerReply::Unavailable => Ok(self.degrade(
                sink,
                self.phrases().create_unavailable,
                DegradedReason::CreateUnavailable,
            )),
        }
    }

    /// Fields for a new issue about `failure`
    #[must_use]
    pub fn issue_fields(&self, failure: &ScenarioFailure, context: &FailureContext) -> IssueFields {
        let tracker = &self.config.tracker;
        let summary = fill(
            self.phrases().summary,
            &[
                ("project_name", self.config.report_project_name.as_str()),
                ("test_name", failure.test_name.as_str()),
                ("priority", failure.priority.as_str()),
            ],
        );

        IssueFields {
            project: tracker.project.clone(),
            summary,
            description: self.issue_text(self.phrases().description, failure, context),
            issue_type: tracker.issue_type_id.clone(),
            components: tracker.components.clone(),
            labels: tracker.issue_labels(),
            extra: tracker.additional_fields.clone(),
        }
    }

    fn issue_text(
        &self,
        template: &str,
        failure: &ScenarioFailure,
        context: &FailureContext,
    ) -> String {
        let test_file = failure.scenario_path.to_string_lossy();
        let traceback = context.to_text();
        let separator = separator();
        let error = failure.rendered_error();
        let job_link = self.config.job_link();

        fill(
            template,
            &[
                ("test_name", failure.test_name.as_str()),
                ("test_file", test_file.as_ref()),
                ("priority", failure.priority.as_str()),
                ("traceback", traceback.as_str()),
                ("separator", separator.as_str()),
                ("error", error.as_str()),
                ("job_link", job_link.as_str()),
            ],
        )
    }

    fn degrade(
        &self,
        sink: &mut dyn AnnotationSink,
        template: &str,
        reason: DegradedReason,
    ) -> Outcome {
        sink.annotate(fill(template, &[("server", self.server())]));
        Outcome::DegradedSkip(reason)
    }

    fn finish(&self, failure: &ScenarioFailure, outcome: Outcome) -> Outcome {
        tracing::info!(
            test = %failure.test_name,
            scenario = %failure.scenario_path.display(),
            outcome = %outcome,
            "failure triaged"
        );
        outcome
    }

    fn issue_link(&self, key: &str) -> String {
        format!("{}/browse/{key}", self.server())
    }

    fn server(&self) -> &str {
        self.config.tracker.server.trim_end_matches('/')
    }

    fn phrases(&self) -> &'static ReportingPhrases {
        self.config.language.phrases()
    }
}
