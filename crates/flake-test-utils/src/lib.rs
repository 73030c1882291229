//! Testing utilities for the flake triage workspace
//!
//! Shared fixtures: a recording tracker with scripted replies, temporary
//! source trees and ready-made configs and failures.

#![allow(missing_docs)]

use flake_context::{FrameChain, StackFrame};
use flake_core::{ScenarioFailure, TrackerConfig, TriageConfig};
use flake_tracker::{
    Issue, IssueFields, IssueTracker, RetryPolicy, SearchCriteria, TrackerAuthorizationFailure,
    TrackerReply, TransportError,
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub type Reply<T> = Result<TrackerReply<T>, TrackerAuthorizationFailure>;

/// One call made against a [`RecordingTracker`]
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerCall {
    Search(SearchCriteria),
    AddComment { issue_key: String, body: String },
    CreateIssue(IssueFields),
}

impl TrackerCall {
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::Search(_))
    }
}

/// Tracker that logs every call and answers from per-operation scripts
///
/// Once a script runs dry the tracker answers: no search hits, comments
/// succeed, created issues get `NEW-{n}` keys.
#[derive(Debug, Default)]
pub struct RecordingTracker {
    calls: Vec<TrackerCall>,
    searches: VecDeque<Reply<Vec<Issue>>>,
    comments: VecDeque<Reply<()>>,
    creates: VecDeque<Reply<Issue>>,
}

impl RecordingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next search finds issues with these keys, oldest first
    pub fn with_found(mut self, keys: &[&str]) -> Self {
        let issues = keys.iter().map(|k| Issue::new(*k)).collect();
        self.searches.push_back(Ok(TrackerReply::Done(issues)));
        self
    }

    pub fn with_search(mut self, reply: Reply<Vec<Issue>>) -> Self {
        self.searches.push_back(reply);
        self
    }

    pub fn with_comment(mut self, reply: Reply<()>) -> Self {
        self.comments.push_back(reply);
        self
    }

    pub fn with_create(mut self, reply: Reply<Issue>) -> Self {
        self.creates.push_back(reply);
        self
    }

    pub fn calls(&self) -> &[TrackerCall] {
        &self.calls
    }

    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    pub fn mutating_calls(&self) -> Vec<&TrackerCall> {
        self.calls.iter().filter(|c| c.is_mutating()).collect()
    }

    pub fn created(&self) -> Vec<&IssueFields> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                TrackerCall::CreateIssue(fields) => Some(fields),
                _ => None,
            })
            .collect()
    }

    pub fn comments(&self) -> Vec<(&str, &str)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                TrackerCall::AddComment { issue_key, body } => {
                    Some((issue_key.as_str(), body.as_str()))
                }
                _ => None,
            })
            .collect()
    }
}

impl IssueTracker for RecordingTracker {
    fn search(&mut self, criteria: &SearchCriteria) -> Reply<Vec<Issue>> {
        self.calls.push(TrackerCall::Search(criteria.clone()));
        self.searches
            .pop_front()
            .unwrap_or(Ok(TrackerReply::Done(Vec::new())))
    }

    fn add_comment(&mut self, issue_key: &str, body: &str) -> Reply<()> {
        self.calls.push(TrackerCall::AddComment {
            issue_key: issue_key.to_string(),
            body: body.to_string(),
        });
        self.comments.pop_front().unwrap_or(Ok(TrackerReply::Done(())))
    }

    fn create_issue(&mut self, fields: &IssueFields) -> Reply<Issue> {
        self.calls.push(TrackerCall::CreateIssue(fields.clone()));
        let n = self.created().len();
        self.creates
            .pop_front()
            .unwrap_or_else(|| Ok(TrackerReply::Done(Issue::new(format!("NEW-{n}")))))
    }
}

/// Authorization failure as a live tracker would report it
pub fn forbidden(operation: &str) -> TrackerAuthorizationFailure {
    TrackerAuthorizationFailure::new(operation, TransportError::Unauthorized { status: 403 })
}

/// Temporary project tree holding scenario sources
#[derive(Debug)]
pub struct SourceTree {
    dir: TempDir,
}

impl SourceTree {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write `content` at `relative`, creating parent directories
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Write a file whose lines read `line 1` .. `line {count}`
    pub fn write_numbered(&self, relative: &str, count: usize) -> PathBuf {
        let content = (1..=count)
            .map(|n| format!("line {n}"))
            .collect::<Vec<_>>()
            .join("\n");
        self.write(relative, &content)
    }
}

impl Default for SourceTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Live-tracker config rooted at `project_dir`, without retry delays
pub fn sample_config(project_dir: &Path) -> TriageConfig {
    TriageConfig::new()
        .with_report_enabled(true)
        .with_dry_run(false)
        .with_project_dir(project_dir)
        .with_report_project_name("SomeAppName")
        .with_job("gitlab/{job_id}", "4")
        .with_retry(RetryPolicy::new(3, std::time::Duration::ZERO))
        .with_tracker(TrackerConfig {
            server: "http://mock".into(),
            project: "jira_project".into(),
            components: vec!["world".into()],
            labels: vec!["new_flaky".into(), "qa_tech_debt".into()],
            ..TrackerConfig::default()
        })
}

/// Failure whose single frame points into `tree` at `relative`
pub fn failure_in(
    tree: &SourceTree,
    relative: &str,
    anchor_line: usize,
    error_line: usize,
) -> ScenarioFailure {
    let frame = StackFrame::new(tree.path(relative), anchor_line, error_line);
    ScenarioFailure::new(
        "login with expired token",
        relative,
        "AssertionError",
        "401 != 200",
        FrameChain::new(vec![frame]),
    )
}
