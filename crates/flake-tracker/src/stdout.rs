//! Dry-run tracker
//!
//! Prints what a live tracker would be asked to do. Searches never find
//! anything, so every triaged failure goes down the "create" path and the
//! full issue text can be inspected locally.

use crate::client::{IssueTracker, TrackerReply};
use crate::error::TrackerAuthorizationFailure;
use crate::types::{Issue, IssueFields, SearchCriteria};
use std::io::{self, Write};

/// Key reported for issues "created" in dry-run mode
pub const DRY_RUN_ISSUE_KEY: &str = "DRY-RUN-1";

/// Tracker stub writing every request to an output stream
#[derive(Debug)]
pub struct StdoutTracker<W: Write = io::Stdout> {
    out: W,
}

impl StdoutTracker {
    /// Write to standard output
    #[must_use]
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for StdoutTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> StdoutTracker<W> {
    /// Write to an arbitrary stream
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    /// Consume and return the stream
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}") {
            tracing::debug!(error = %e, "dry-run output dropped");
        }
    }
}

impl<W: Write> IssueTracker for StdoutTracker<W> {
    fn search(
        &mut self,
        criteria: &SearchCriteria,
    ) -> Result<TrackerReply<Vec<Issue>>, TrackerAuthorizationFailure> {
        self.emit(&format!("search: {}", criteria.to_jql()));
        Ok(TrackerReply::Done(Vec::new()))
    }

    fn add_comment(
        &mut self,
        issue_key: &str,
        body: &str,
    ) -> Result<TrackerReply<()>, TrackerAuthorizationFailure> {
        self.emit(&format!("add_comment: {issue_key}\n{body}"));
        Ok(TrackerReply::Done(()))
    }

    fn create_issue(
        &mut self,
        fields: &IssueFields,
    ) -> Result<TrackerReply<Issue>, TrackerAuthorizationFailure> {
        self.emit(&format!(
            "create_issue:\nproject: {}\nsummary: {}\nlabels: {}\n{}",
            fields.project,
            fields.summary,
            fields.labels.join(", "),
            fields.description
        ));
        Ok(TrackerReply::Done(Issue::new(DRY_RUN_ISSUE_KEY)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SearchOrder;

    #[test]
    fn dry_run_never_finds_and_always_creates() {
        let mut tracker = StdoutTracker::with_writer(Vec::new());
        let criteria = SearchCriteria {
            project: "QA".into(),
            scenario_path: "scenarios/a.py".into(),
            statuses: vec!["Open".into()],
            label: "flaky".into(),
            order: SearchOrder::CreatedAscending,
        };

        let found = tracker.search(&criteria).unwrap();
        assert_eq!(found, TrackerReply::Done(Vec::new()));

        let fields = IssueFields {
            project: "QA".into(),
            summary: "summary".into(),
            description: "body".into(),
            issue_type: "3".into(),
            components: vec![],
            labels: vec!["flaky".into()],
            extra: Default::default(),
        };
        let created = tracker.create_issue(&fields).unwrap();
        assert_eq!(created, TrackerReply::Done(Issue::new(DRY_RUN_ISSUE_KEY)));

        let printed = String::from_utf8(tracker.into_inner()).unwrap();
        assert!(printed.starts_with("search: project = \"QA\""));
        assert!(printed.contains("summary: summary"));
    }
}
