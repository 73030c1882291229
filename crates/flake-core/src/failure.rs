//! Failure events handed over by the test runner

use flake_context::FrameChain;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Priority used when a scenario carries none
pub const DEFAULT_PRIORITY: &str = "NOT_SET_PRIORITY";

fn default_priority() -> String {
    DEFAULT_PRIORITY.to_string()
}

/// One failed scenario execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioFailure {
    /// Human-readable scenario name
    pub test_name: String,
    /// Scenario source path relative to the project root
    pub scenario_path: PathBuf,
    /// Priority label
    #[serde(default = "default_priority")]
    pub priority: String,
    /// Name of the raised error type
    pub error_type: String,
    /// Error message
    #[serde(default)]
    pub error_message: String,
    /// Call chain at the point of failure, outermost first
    pub frames: FrameChain,
}

impl ScenarioFailure {
    /// Create failure with the default priority
    pub fn new(
        test_name: impl Into<String>,
        scenario_path: impl Into<PathBuf>,
        error_type: impl Into<String>,
        error_message: impl Into<String>,
        frames: FrameChain,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            scenario_path: scenario_path.into(),
            priority: default_priority(),
            error_type: error_type.into(),
            error_message: error_message.into(),
            frames,
        }
    }

    /// With priority label
    #[inline]
    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = priority.into();
        self
    }

    /// Scenario path
    #[inline]
    #[must_use]
    pub fn scenario_path(&self) -> &Path {
        &self.scenario_path
    }

    /// Error as shown in reports: `{type}: {message}`
    #[must_use]
    pub fn rendered_error(&self) -> String {
        if self.error_message.is_empty() {
            self.error_type.clone()
        } else {
            format!("{}: {}", self.error_type, self.error_message)
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<ScenarioFailure>),
    One(Box<ScenarioFailure>),
}

/// Parse failure events from JSON: a single object or an array of them
///
/// # Errors
/// Returns the parser error for anything else.
pub fn parse_failures(json: &str) -> Result<Vec<ScenarioFailure>, serde_json::Error> {
    Ok(match serde_json::from_str(json)? {
        OneOrMany::Many(failures) => failures,
        OneOrMany::One(failure) => vec![*failure],
    })
}
