//! Scenario runner
//!
//! Runs scenario files and collects the results with JSON output.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::RuntimeConfig;
use crate::diagnostics::Finding;
use crate::scenario::Scenario;

/// Scenario result status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    /// The scenario could not be loaded, built or run
    Errored,
}

/// A single scenario result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario name
    pub name: String,
    /// File the scenario came from
    pub file: String,
    /// Scenario status
    pub status: ScenarioStatus,
    /// Wall-clock duration of the run
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    /// Clock reading when the loop went idle
    pub elapsed_ms: u64,
    /// Failed checks and the error that stopped the scenario, if any
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failures: Vec<Finding>,
    /// Rejections nobody handled
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub unhandled_rejections: Vec<Finding>,
}

/// Summary of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Total number of scenarios
    pub total: usize,
    /// Number of passed scenarios
    pub passed: usize,
    /// Number of failed scenarios
    pub failed: usize,
    /// Number of scenarios that could not run
    pub errored: usize,
    /// Total duration
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl RunSummary {
    pub fn success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }
}

/// Complete run results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResults {
    /// Summary statistics
    pub summary: RunSummary,
    /// Individual scenario results
    pub scenarios: Vec<ScenarioResult>,
}

/// Configuration for scenario runs
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Only run scenarios whose name contains this
    pub filter: Option<String>,
    /// Whether to stop on first failure
    pub fail_fast: bool,
    /// Event loop settings for scenarios without their own
    pub runtime: RuntimeConfig,
}

/// Scenario runner
pub struct ScenarioRunner {
    config: RunConfig,
    results: Vec<ScenarioResult>,
}

impl ScenarioRunner {
    /// Create a new runner with default configuration
    pub fn new() -> Self {
        Self::with_config(RunConfig::default())
    }

    /// Create a runner with specific configuration
    pub fn with_config(config: RunConfig) -> Self {
        Self {
            config,
            results: Vec::new(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Load and run one scenario file, recording its result.
    ///
    /// Returns `false` when the scenario was skipped by the filter.
    pub fn run_file(&mut self, path: &Path) -> bool {
        let start = Instant::now();
        let file = path.display().to_string();

        let scenario = match Scenario::load(path) {
            Ok(scenario) => scenario,
            Err(err) => {
                let name = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.clone());
                self.record(errored(name, file, start.elapsed(), &err));
                return true;
            }
        };

        if let Some(filter) = &self.config.filter {
            if !scenario.display_name().contains(filter.as_str()) {
                debug!(scenario = scenario.display_name(), "filtered out");
                return false;
            }
        }

        let name = scenario.display_name().to_string();
        let result = match scenario.run(&self.config.runtime) {
            Ok(report) => {
                let status = if report.passed() {
                    ScenarioStatus::Passed
                } else {
                    ScenarioStatus::Failed
                };
                let (failures, unhandled_rejections): (Vec<Finding>, Vec<Finding>) =
                    report.findings.into_iter().partition(Finding::is_error);
                ScenarioResult {
                    name,
                    file,
                    status,
                    duration: start.elapsed(),
                    elapsed_ms: report.elapsed_ms,
                    failures,
                    unhandled_rejections,
                }
            }
            Err(err) => errored(name, file, start.elapsed(), &err),
        };
        info!(scenario = %result.name, status = ?result.status, "scenario finished");
        self.record(result);
        true
    }

    /// Record a scenario result
    pub fn record(&mut self, result: ScenarioResult) {
        self.results.push(result);
    }

    /// Check if we should stop (fail_fast mode)
    pub fn should_stop(&self) -> bool {
        self.config.fail_fast
            && self
                .results
                .iter()
                .any(|r| r.status != ScenarioStatus::Passed)
    }

    /// Get current results
    pub fn results(&self) -> &[ScenarioResult] {
        &self.results
    }

    /// Generate final results
    pub fn finish(self, total_duration: Duration) -> RunResults {
        let count = |status: ScenarioStatus| self.results.iter().filter(|r| r.status == status).count();
        let passed = count(ScenarioStatus::Passed);
        let failed = count(ScenarioStatus::Failed);
        let errored = count(ScenarioStatus::Errored);

        RunResults {
            summary: RunSummary {
                total: self.results.len(),
                passed,
                failed,
                errored,
                duration: total_duration,
            },
            scenarios: self.results,
        }
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn errored(
    name: String,
    file: String,
    duration: Duration,
    err: &crate::scenario::ScenarioError,
) -> ScenarioResult {
    ScenarioResult {
        name,
        file,
        status: ScenarioStatus::Errored,
        duration,
        elapsed_ms: 0,
        failures: vec![Finding::error(err.code(), err.to_string())],
        unhandled_rejections: Vec::new(),
    }
}

// Serde helper for Duration in milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
