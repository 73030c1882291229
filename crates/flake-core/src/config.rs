//! Triage configuration
//!
//! Loaded from TOML; every field has a default so a config file only needs
//! the settings that differ. Secrets may come from the environment instead
//! of the file:
//! - `FLAKE_TRACKER_TOKEN`: bearer token, replaces any configured auth
//! - `FLAKE_TRACKER_PASSWORD`: password for configured basic auth
//! - `FLAKE_JOB_ID`: CI job identifier substituted into `job_path`

use crate::error::ConfigError;
use crate::filter::ExceptionFilter;
use crate::phrases::Language;
use flake_tracker::{JiraAuth, RetryPolicy, SearchCriteria, SearchOrder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding a bearer token
pub const ENV_TRACKER_TOKEN: &str = "FLAKE_TRACKER_TOKEN";
/// Environment variable holding a basic-auth password
pub const ENV_TRACKER_PASSWORD: &str = "FLAKE_TRACKER_PASSWORD";
/// Environment variable holding the CI job id
pub const ENV_JOB_ID: &str = "FLAKE_JOB_ID";

/// Placeholder in `job_path` replaced by the job id
const JOB_ID_PLACEHOLDER: &str = "{job_id}";

/// Top-level triage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    /// Master switch; when off, failures are not triaged at all
    pub report_enabled: bool,
    /// Print tracker requests instead of sending them
    pub dry_run: bool,
    /// Tracker connection and issue settings
    pub tracker: TrackerConfig,
    /// Retry policy for every tracker operation
    pub retry: RetryPolicy,
    /// Project name shown in issue summaries
    pub report_project_name: String,
    /// CI job link template, may contain `{job_id}`
    pub job_path: String,
    /// CI job identifier
    pub job_id: String,
    /// Root that scenario paths are relative to
    pub project_dir: PathBuf,
    /// Failure-message patterns that suppress triage
    pub exceptions: Vec<String>,
    /// Language of issue text and annotations
    pub language: Language,
}

impl TriageConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file and apply environment overrides
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?.with_env_overrides(|key| std::env::var(key).ok());
        tracing::debug!(path = %path.display(), "loaded triage config");
        Ok(config)
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] on malformed input.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply overrides looked up by environment variable name
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(token) = lookup(ENV_TRACKER_TOKEN) {
            self.tracker.auth = Some(JiraAuth::bearer(token));
        } else if let Some(secret) = lookup(ENV_TRACKER_PASSWORD) {
            match &mut self.tracker.auth {
                Some(JiraAuth::Basic { password, .. }) => *password = secret,
                _ => tracing::warn!(
                    "{ENV_TRACKER_PASSWORD} is set but no basic auth user is configured; ignoring"
                ),
            }
        }
        if let Some(job_id) = lookup(ENV_JOB_ID) {
            self.job_id = job_id;
        }
        self
    }

    /// With report switch
    #[inline]
    #[must_use]
    pub fn with_report_enabled(mut self, enabled: bool) -> Self {
        self.report_enabled = enabled;
        self
    }

    /// With dry-run switch
    #[inline]
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// With tracker settings
    #[inline]
    #[must_use]
    pub fn with_tracker(mut self, tracker: TrackerConfig) -> Self {
        self.tracker = tracker;
        self
    }

    /// With retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// With project name for summaries
    #[inline]
    #[must_use]
    pub fn with_report_project_name(mut self, name: impl Into<String>) -> Self {
        self.report_project_name = name.into();
        self
    }

    /// With job link template and id
    #[inline]
    #[must_use]
    pub fn with_job(mut self, job_path: impl Into<String>, job_id: impl Into<String>) -> Self {
        self.job_path = job_path.into();
        self.job_id = job_id.into();
        self
    }

    /// With project root
    #[inline]
    #[must_use]
    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = dir.into();
        self
    }

    /// With exception patterns
    #[must_use]
    pub fn with_exceptions<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exceptions = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// With reporting language
    #[inline]
    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Link to the CI job, `job_path` with the job id filled in
    #[must_use]
    pub fn job_link(&self) -> String {
        self.job_path.replace(JOB_ID_PLACEHOLDER, &self.job_id)
    }

    /// Compile the exception patterns
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidPattern`] for the first bad pattern.
    pub fn exception_filter(&self) -> Result<ExceptionFilter, ConfigError> {
        ExceptionFilter::new(&self.exceptions)
    }

    /// Check the configuration is usable as given
    ///
    /// A live tracker needs a server, credentials and a project; a dry run
    /// or a disabled report needs none of them.
    ///
    /// # Errors
    /// Returns [`ConfigError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.exception_filter()?;

        if !self.report_enabled || self.dry_run {
            return Ok(());
        }
        if self.tracker.server.trim().is_empty() {
            return Err(ConfigError::invalid("tracker.server is required"));
        }
        if self.tracker.auth.is_none() {
            return Err(ConfigError::invalid(format!(
                "tracker.auth is required (or set {ENV_TRACKER_TOKEN})"
            )));
        }
        if self.tracker.project.trim().is_empty() {
            return Err(ConfigError::invalid("tracker.project is required"));
        }
        Ok(())
    }
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            report_enabled: false,
            dry_run: true,
            tracker: TrackerConfig::default(),
            retry: RetryPolicy::default(),
            report_project_name: "NOT_SET".into(),
            job_path: JOB_ID_PLACEHOLDER.into(),
            job_id: "NOT_SET".into(),
            project_dir: PathBuf::from("."),
            exceptions: vec![r".*codec can't decode byte.*".into()],
            language: Language::default(),
        }
    }
}

/// Tracker connection and issue settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Base URL of the tracker
    pub server: String,
    /// Credentials; optional for dry runs
    pub auth: Option<JiraAuth>,
    /// Project key issues live in
    pub project: String,
    /// Components set on created issues
    pub components: Vec<String>,
    /// Labels set on created issues, before the flaky label
    pub labels: Vec<String>,
    /// Label marking flaky-test issues, also required by searches
    pub flaky_label: String,
    /// Issue type id for created issues
    pub issue_type_id: String,
    /// Statuses counting as open
    pub search_statuses: Vec<String>,
    /// Substrings replaced with `.` in the searched scenario path
    pub search_forbidden_symbols: Vec<String>,
    /// Extra fields added to created issues
    pub additional_fields: BTreeMap<String, Value>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl TrackerConfig {
    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Labels for a new issue: configured labels followed by the flaky label
    #[must_use]
    pub fn issue_labels(&self) -> Vec<String> {
        self.labels
            .iter()
            .cloned()
            .chain(std::iter::once(self.flaky_label.clone()))
            .collect()
    }

    /// Scenario path made safe for embedding in a search query
    #[must_use]
    pub fn sanitize_search_term(&self, term: &str) -> String {
        self.search_forbidden_symbols
            .iter()
            .filter(|symbol| !symbol.is_empty())
            .fold(term.to_string(), |acc, symbol| acc.replace(symbol.as_str(), "."))
    }

    /// Search for open flaky issues about `scenario_path`
    #[must_use]
    pub fn search_criteria(&self, scenario_path: &str) -> SearchCriteria {
        SearchCriteria {
            project: self.project.clone(),
            scenario_path: self.sanitize_search_term(scenario_path),
            statuses: self.search_statuses.clone(),
            label: self.flaky_label.clone(),
            order: SearchOrder::CreatedAscending,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            auth: None,
            project: String::new(),
            components: Vec::new(),
            labels: Vec::new(),
            flaky_label: "flaky".into(),
            issue_type_id: "3".into(),
            search_statuses: vec!["Open".into(), "Reopened".into(), "In Progress".into()],
            search_forbidden_symbols: vec!["[".into(), "]".into(), "\"".into()],
            additional_fields: BTreeMap::new(),
            timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
report_enabled = true
dry_run = false
report_project_name = "SomeAppName"
job_path = "gitlab/{job_id}"
job_id = "4"
exceptions = ["timeout while reading"]

[tracker]
server = "https://jira.example.com"
project = "QA"
components = ["world"]
labels = ["new_flaky", "qa_tech_debt"]

[tracker.auth]
kind = "basic"
user = "bot"
password = "from-file"

[tracker.additional_fields]
customfield_10010 = "team-a"

[retry]
attempts = 5
"#;

    #[test]
    fn empty_file_gives_defaults() {
        let config = TriageConfig::from_toml("").unwrap();
        assert_eq!(config, TriageConfig::default());
        assert!(!config.report_enabled);
        assert!(config.dry_run);
        assert_eq!(config.tracker.flaky_label, "flaky");
        assert_eq!(config.tracker.issue_type_id, "3");
        assert_eq!(config.retry, RetryPolicy::new(3, Duration::from_secs(1)));
    }

    #[test]
    fn parses_full_sample() {
        let config = TriageConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.tracker.project, "QA");
        assert_eq!(config.tracker.auth, Some(JiraAuth::basic("bot", "from-file")));
        assert_eq!(config.tracker.additional_fields["customfield_10010"], "team-a");
        assert_eq!(config.retry.attempts, 5);
        assert_eq!(config.retry.delay, Duration::from_secs(1));
        assert_eq!(config.job_link(), "gitlab/4");
        config.validate().unwrap();
    }

    #[test]
    fn unknown_language_is_rejected() {
        let err = TriageConfig::from_toml("language = \"de\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn environment_overrides_secrets_and_job() {
        let env: HashMap<&str, &str> =
            [(ENV_TRACKER_PASSWORD, "from-env"), (ENV_JOB_ID, "77")].into();
        let config = TriageConfig::from_toml(SAMPLE)
            .unwrap()
            .with_env_overrides(|k| env.get(k).map(|v| (*v).to_string()));

        assert_eq!(config.tracker.auth, Some(JiraAuth::basic("bot", "from-env")));
        assert_eq!(config.job_link(), "gitlab/77");
    }

    #[test]
    fn token_override_replaces_basic_auth() {
        let config = TriageConfig::from_toml(SAMPLE)
            .unwrap()
            .with_env_overrides(|k| (k == ENV_TRACKER_TOKEN).then(|| "t0ken".to_string()));
        assert_eq!(config.tracker.auth, Some(JiraAuth::bearer("t0ken")));
    }

    #[test]
    fn live_tracker_requires_credentials() {
        let config = TriageConfig::new()
            .with_report_enabled(true)
            .with_dry_run(false)
            .with_tracker(TrackerConfig {
                server: "https://jira.example.com".into(),
                project: "QA".into(),
                ..TrackerConfig::default()
            });
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        assert!(config.with_dry_run(true).validate().is_ok());
    }

    #[test]
    fn bad_pattern_fails_validation() {
        let config = TriageConfig::new().with_exceptions(["(unclosed"]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn labels_keep_order_and_duplicates() {
        let tracker = TrackerConfig {
            labels: vec!["flaky".into(), "qa".into()],
            ..TrackerConfig::default()
        };
        assert_eq!(tracker.issue_labels(), vec!["flaky", "qa", "flaky"]);
    }

    #[test]
    fn search_term_is_sanitized() {
        let tracker = TrackerConfig::default();
        assert_eq!(
            tracker.sanitize_search_term(r#"scenarios/[param "a"].py"#),
            "scenarios/.param .a...py"
        );
        let criteria = tracker.search_criteria("scenarios/a[1].py");
        assert_eq!(criteria.scenario_path, "scenarios/a.1..py");
        assert_eq!(criteria.label, "flaky");
    }
}
