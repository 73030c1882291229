//! Command implementations for the `flake-triage` binary
//!
//! Reports go to the given writer (stdout in the binary); logs go to stderr.

use anyhow::{bail, Context, Result};
use flake_context::{FailureContextRenderer, FsSourceReader, SourceReader};
use flake_core::{
    build_tracker, parse_failures, IssueReconciler, Outcome, ScenarioFailure, TriageConfig,
    TriageError,
};
use flake_tracker::IssueTracker;
use std::io::{Read, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Install the global subscriber; `RUST_LOG` overrides the `info` default
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Counts of outcomes over one triage session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriageSummary {
    /// Events that updated the tracker
    pub reported: usize,
    /// Events skipped in degraded mode
    pub degraded: usize,
    /// Events ignored because reporting is off
    pub disabled: usize,
    /// Events rejected for breaking the input contract
    pub rejected: usize,
    /// Events whose triage stopped on rejected tracker credentials
    pub unauthorized: usize,
}

impl TriageSummary {
    /// Check if no event was rejected or refused by the tracker
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.rejected == 0 && self.unauthorized == 0
    }

    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Done { .. } => self.reported += 1,
            Outcome::DegradedSkip(_) => self.degraded += 1,
            Outcome::Disabled => self.disabled += 1,
        }
    }
}

/// Read failure events from a JSON file, or stdin for `-`
///
/// # Errors
/// Fails if the input cannot be read or is not a failure event (or array of
/// them).
pub fn load_events(path: &Path) -> Result<Vec<ScenarioFailure>> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read events from stdin")?;
        text
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read events from {}", path.display()))?
    };

    parse_failures(&text).with_context(|| format!("invalid failure events in {}", path.display()))
}

/// Triage `events` in one tracker session built from `config`
///
/// # Errors
/// Fails on unusable configuration or when output cannot be written.
pub fn run_triage(
    config: TriageConfig,
    events: &[ScenarioFailure],
    out: &mut dyn Write,
) -> Result<TriageSummary> {
    config.validate().context("invalid configuration")?;
    let tracker = build_tracker(&config).context("failed to set up tracker")?;
    let mut reconciler =
        IssueReconciler::new(config, tracker, FsSourceReader).context("invalid configuration")?;

    triage_events(&mut reconciler, events, out)
}

/// Triage `events` sequentially through an existing reconciler
///
/// Each event prints one `{test}: {outcome}` line followed by its
/// annotation. An event without frames is logged, counted as rejected and
/// skipped. Rejected credentials stop that event's triage only; the
/// session goes on with the next event.
///
/// # Errors
/// Fails when output cannot be written.
pub fn triage_events<T: IssueTracker, R: SourceReader>(
    reconciler: &mut IssueReconciler<T, R>,
    events: &[ScenarioFailure],
    out: &mut dyn Write,
) -> Result<TriageSummary> {
    let mut summary = TriageSummary::default();

    for failure in events {
        let mut notes = Vec::new();
        match reconciler.triage(failure, &mut notes) {
            Ok(outcome) => {
                writeln!(out, "{}: {outcome}", failure.test_name)?;
                summary.record(&outcome);
            }
            Err(TriageError::EmptyFrameChain) => {
                tracing::error!(test = %failure.test_name, "failure event has no frames, skipped");
                writeln!(out, "{}: rejected (no frames)", failure.test_name)?;
                summary.rejected += 1;
            }
            Err(TriageError::TrackerAuthorization(err)) => {
                tracing::error!(test = %failure.test_name, error = %err, "tracker rejected credentials");
                writeln!(out, "{}: unauthorized", failure.test_name)?;
                summary.unauthorized += 1;
            }
        }
        for note in &notes {
            writeln!(out, "  {note}")?;
        }
    }

    tracing::info!(
        reported = summary.reported,
        degraded = summary.degraded,
        rejected = summary.rejected,
        unauthorized = summary.unauthorized,
        "triage session finished"
    );
    Ok(summary)
}

/// Print the failure context of every event without contacting a tracker
///
/// # Errors
/// Fails on an event without frames or when output cannot be written.
pub fn render_events<R: SourceReader>(
    reader: R,
    project_dir: &Path,
    events: &[ScenarioFailure],
    out: &mut dyn Write,
) -> Result<()> {
    let renderer = FailureContextRenderer::new(reader, project_dir);

    for (i, failure) in events.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        let context = renderer
            .render(&failure.frames, failure.scenario_path())
            .with_context(|| format!("cannot render {}", failure.test_name))?;
        writeln!(out, "{context}")?;
        writeln!(out, "{}", failure.rendered_error())?;
    }
    Ok(())
}

/// Load and validate a config file, printing what it resolves to
///
/// # Errors
/// Fails if the config cannot be loaded or is unusable.
pub fn check_config(path: &Path, out: &mut dyn Write) -> Result<TriageConfig> {
    let config = TriageConfig::load(path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    config.validate().context("invalid configuration")?;

    let mode = match (config.report_enabled, config.dry_run) {
        (false, _) => "reporting disabled",
        (true, true) => "dry run",
        (true, false) => "live",
    };
    writeln!(out, "config ok: {mode}")?;
    if config.report_enabled && !config.dry_run {
        writeln!(
            out,
            "tracker: {} project {}",
            config.tracker.server, config.tracker.project
        )?;
    }
    writeln!(out, "exception patterns: {}", config.exceptions.len())?;
    Ok(config)
}

/// Override the config's dry-run switch from the command line
///
/// # Errors
/// Fails if dry run is forced off on a config that never enabled a tracker.
pub fn apply_dry_run_flag(config: TriageConfig, dry_run: Option<bool>) -> Result<TriageConfig> {
    match dry_run {
        None => Ok(config),
        Some(false) if config.tracker.server.is_empty() => {
            bail!("--no-dry-run needs tracker.server in the config")
        }
        Some(flag) => Ok(config.with_dry_run(flag)),
    }
}
