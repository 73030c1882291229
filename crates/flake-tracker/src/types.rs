//! Tracker data types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Issue returned by the tracker; only `key` is relied upon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Tracker key, e.g. `QA-1276`
    pub key: String,
    /// Workflow status name, when the tracker reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Issue {
    /// Create issue with a key
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status: None,
        }
    }
}

/// Result ordering for searches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchOrder {
    /// Oldest issue first
    #[default]
    CreatedAscending,
}

/// What to look for when matching a failure to an open issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// Tracker project key
    pub project: String,
    /// Scenario path, matched as an exact phrase
    pub scenario_path: String,
    /// Statuses an issue may be in to count as open
    pub statuses: Vec<String>,
    /// Label every flaky-test issue carries
    pub label: String,
    /// Result ordering
    #[serde(default)]
    pub order: SearchOrder,
}

impl SearchCriteria {
    /// Render as a JQL query
    ///
    /// Every value is a quoted JQL string with backslashes and `"` escaped.
    ///
    /// ```text
    /// project = "QA" and description ~ "\"scenarios/login.py\"" and status in ("Open","Reopened") and labels = "flaky" ORDER BY created
    /// ```
    #[must_use]
    pub fn to_jql(&self) -> String {
        let statuses = self
            .statuses
            .iter()
            .map(|s| jql_string(s))
            .collect::<Vec<_>>()
            .join(",");
        let order = match self.order {
            SearchOrder::CreatedAscending => "ORDER BY created",
        };

        format!(
            "project = {} and description ~ \"\\\"{}\\\"\" and status in ({}) and labels = {} {}",
            jql_string(&self.project),
            jql_escape(&self.scenario_path),
            statuses,
            jql_string(&self.label),
            order
        )
    }
}

fn jql_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn jql_string(value: &str) -> String {
    format!("\"{}\"", jql_escape(value))
}

/// Fields of an issue to create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueFields {
    /// Tracker project key
    pub project: String,
    /// One-line summary
    pub summary: String,
    /// Long description
    pub description: String,
    /// Tracker issue type identifier
    pub issue_type: String,
    /// Component names
    pub components: Vec<String>,
    /// Labels, in order
    pub labels: Vec<String>,
    /// Extra tracker fields passed through verbatim
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn jql_matches_exact_phrase_and_orders_by_creation() {
        let criteria = SearchCriteria {
            project: "jira_project".into(),
            scenario_path: "scenarios/scenario_1.py".into(),
            statuses: vec!["Open".into(), "Reopened".into(), "In Progress".into()],
            label: "flaky".into(),
            order: SearchOrder::CreatedAscending,
        };

        assert_eq!(
            criteria.to_jql(),
            r#"project = "jira_project" and description ~ "\"scenarios/scenario_1.py\"" and status in ("Open","Reopened","In Progress") and labels = "flaky" ORDER BY created"#
        );
    }

    #[test]
    fn jql_quotes_values_with_spaces_and_escapes() {
        let criteria = SearchCriteria {
            project: "QA".into(),
            scenario_path: r"scenarios\win\login.py".into(),
            statuses: vec!["In \"Review\"".into()],
            label: "flaky test".into(),
            order: SearchOrder::CreatedAscending,
        };

        assert_eq!(
            criteria.to_jql(),
            r#"project = "QA" and description ~ "\"scenarios\\win\\login.py\"" and status in ("In \"Review\"") and labels = "flaky test" ORDER BY created"#
        );
    }

    #[test]
    fn issue_status_is_optional_on_the_wire() {
        let issue: Issue = serde_json::from_str(r#"{"key":"X-1"}"#).unwrap();
        assert_eq!(issue, Issue::new("X-1"));
    }
}
