//! Behavior scenarios described in TOML.
//!
//! A scenario defines named futures over dynamic [`Value`](crate::value::Value)s,
//! runs the event loop until it goes idle, and then checks each future's
//! final state:
//!
//! ```toml
//! [[future]]
//! name = "source"
//! delay = { ms = 200, fulfill = 2 }
//!
//! [[future]]
//! name = "doubled"
//! from = "source"
//! steps = [{ then = { add = 2 } }]
//!
//! [[expect]]
//! future = "doubled"
//! fulfilled = 4
//! ```

pub mod build;
pub mod error;
pub mod expect;
pub mod model;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use build::{Builder, Built, Futures};
pub use error::ScenarioError;
pub use expect::Expectation;
pub use model::{DelayDef, ExpectDef, FutureDef, Scenario, StepDef};

use crate::config::RuntimeConfig;
use crate::diagnostics::error_codes::{expectation, warnings};
use crate::diagnostics::Finding;
use crate::runtime::Runtime;

/// What happened when a scenario ran
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario name
    pub name: String,
    /// Failed checks and warnings
    pub findings: Vec<Finding>,
    /// Tasks the event loop executed
    pub tasks_run: usize,
    /// Clock reading when the loop went idle
    pub elapsed_ms: u64,
}

impl ScenarioReport {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            findings: Vec::new(),
            tasks_run: 0,
            elapsed_ms: 0,
        }
    }

    /// A scenario passes when no finding is an error
    pub fn passed(&self) -> bool {
        !self.findings.iter().any(Finding::is_error)
    }
}

impl Scenario {
    /// Parse a scenario; `file_name` labels parse diagnostics
    pub fn parse(file_name: &str, source: &str) -> Result<Self, ScenarioError> {
        toml::from_str(source).map_err(|err| ScenarioError::parse(file_name, source, err))
    }

    /// Load a scenario file, naming it after the file stem unless it names
    /// itself
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let source = std::fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut scenario = Self::parse(&path.display().to_string(), &source)?;
        if scenario.name.is_none() {
            scenario.name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned());
        }
        Ok(scenario)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("scenario")
    }

    /// Runtime settings for this scenario: its own `[runtime]` table wins
    pub fn runtime_config(&self, defaults: &RuntimeConfig) -> RuntimeConfig {
        self.runtime.clone().unwrap_or_else(|| defaults.clone())
    }

    /// Build every future without running the event loop
    pub fn check(&self, defaults: &RuntimeConfig) -> Result<(), ScenarioError> {
        let runtime = Runtime::with_config(&self.runtime_config(defaults));
        match Builder::new(&runtime).build(self) {
            Ok(_) => Ok(()),
            Err(err) if self.expect_error.as_deref() == Some(err.code()) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Build the scenario, run the loop until idle and evaluate expectations
    pub fn run(&self, defaults: &RuntimeConfig) -> Result<ScenarioReport, ScenarioError> {
        let mut report = ScenarioReport::new(self.display_name());
        let runtime = Runtime::with_config(&self.runtime_config(defaults));

        let built = match (Builder::new(&runtime).build(self), &self.expect_error) {
            (Ok(built), None) => built,
            (Ok(_), Some(code)) => {
                report.findings.push(Finding::error(
                    expectation::EXPECTED_ERROR,
                    format!("expected error {}, but every future was built", code),
                ));
                return Ok(report);
            }
            (Err(err), Some(code)) if err.code() == code => {
                debug!(scenario = %report.name, %err, "expected error raised");
                return Ok(report);
            }
            (Err(err), Some(code)) => {
                report.findings.push(Finding::error(
                    expectation::EXPECTED_ERROR,
                    format!("expected error {}, found [{}] {}", code, err.code(), err),
                ));
                return Ok(report);
            }
            (Err(err), None) => return Err(err),
        };

        let stats = runtime.run()?;
        report.tasks_run = stats.tasks_run;
        report.elapsed_ms = stats.now_ms;

        for expectation in &built.expectations {
            report.findings.extend(expectation.evaluate());
        }

        let hits = built.unreachable_hits();
        if hits > 0 {
            report.findings.push(Finding::error(
                expectation::UNREACHABLE_HANDLER,
                format!("an `unreachable` handler ran {} time(s)", hits),
            ));
        }

        for id in runtime.unhandled_rejections() {
            let label = match built.futures.name_of(id) {
                Some(name) => format!("`{}`", name),
                None => id.to_string(),
            };
            report.findings.push(Finding::warning(
                warnings::UNHANDLED_REJECTION,
                format!("{} was rejected and never handled", label),
            ));
        }

        Ok(report)
    }
}
