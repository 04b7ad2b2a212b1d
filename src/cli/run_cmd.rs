//! Handler for the `deferred run` subcommand.

use std::path::PathBuf;
use std::time::Instant;

use crate::config::Config;
use crate::testing::{RunConfig, RunResults, ScenarioRunner, ScenarioStatus};

use super::collect_scenarios;

pub(crate) fn run_scenarios(
    paths: &[PathBuf],
    config: &Config,
    filter: Option<String>,
    fail_fast: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let files = collect_scenarios(paths)?;
    let start = Instant::now();

    let mut runner = ScenarioRunner::with_config(RunConfig {
        filter,
        fail_fast,
        runtime: config.runtime.clone(),
    });
    for file in &files {
        runner.run_file(file);
        if runner.should_stop() {
            break;
        }
    }
    let results = runner.finish(start.elapsed());

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print!("{}", render(&results));
    }

    if results.summary.success() {
        Ok(())
    } else {
        Err(format!(
            "{} scenario(s) did not pass",
            results.summary.failed + results.summary.errored
        )
        .into())
    }
}

/// Human-readable report
pub(super) fn render(results: &RunResults) -> String {
    let mut out = String::new();
    for scenario in &results.scenarios {
        let label = match scenario.status {
            ScenarioStatus::Passed => "PASS",
            ScenarioStatus::Failed => "FAIL",
            ScenarioStatus::Errored => "ERROR",
        };
        out.push_str(&format!(
            "{:<5} {} ({}ms virtual)\n",
            label, scenario.name, scenario.elapsed_ms
        ));
        for finding in scenario
            .failures
            .iter()
            .chain(&scenario.unhandled_rejections)
        {
            out.push_str(&format!("      {}\n", finding.to_human_readable()));
        }
    }

    let summary = &results.summary;
    out.push_str(&format!(
        "\n{} scenario(s): {} passed, {} failed, {} errored ({}ms)\n",
        summary.total,
        summary.passed,
        summary.failed,
        summary.errored,
        summary.duration.as_millis()
    ));
    out
}
