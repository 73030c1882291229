//! Tracker selection from configuration

use crate::config::TriageConfig;
use crate::error::ConfigError;
use flake_tracker::{IssueTracker, JiraConnector, RetryingTracker, StdoutTracker};

/// Build the tracker the configuration asks for
///
/// Dry runs get a [`StdoutTracker`]; otherwise a lazily connecting
/// [`RetryingTracker`] over the Jira transport. Nothing is contacted here.
///
/// # Errors
/// Returns [`ConfigError::Invalid`] when a live tracker has no credentials.
pub fn build_tracker(config: &TriageConfig) -> Result<Box<dyn IssueTracker>, ConfigError> {
    if config.dry_run {
        tracing::info!("dry run: tracker requests will be printed, not sent");
        return Ok(Box::new(StdoutTracker::new()));
    }

    let auth = config.tracker.auth.clone().ok_or_else(|| {
        ConfigError::invalid("tracker.auth is required unless dry_run is set")
    })?;
    let connector = JiraConnector::new(config.tracker.server.clone(), auth)
        .with_timeout(config.tracker.timeout());

    tracing::debug!(
        server = %connector.server(),
        attempts = config.retry.attempts,
        "using live tracker"
    );
    Ok(Box::new(RetryingTracker::new(connector, config.retry)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use flake_tracker::{JiraAuth, SearchCriteria, SearchOrder, TrackerReply};

    #[test]
    fn dry_run_tracker_never_finds_issues() {
        let mut tracker = build_tracker(&TriageConfig::new().with_dry_run(true)).unwrap();
        let criteria = SearchCriteria {
            project: "QA".into(),
            scenario_path: "scenarios/a.py".into(),
            statuses: vec!["Open".into()],
            label: "flaky".into(),
            order: SearchOrder::CreatedAscending,
        };
        assert_eq!(tracker.search(&criteria).unwrap(), TrackerReply::Done(Vec::new()));
    }

    #[test]
    fn live_tracker_needs_auth() {
        let config = TriageConfig::new().with_dry_run(false);
        assert!(matches!(build_tracker(&config), Err(ConfigError::Invalid(_))));

        let config = config.with_tracker(TrackerConfig {
            server: "https://jira.example.com".into(),
            auth: Some(JiraAuth::bearer("t")),
            ..TrackerConfig::default()
        });
        assert!(build_tracker(&config).is_ok());
    }
}
