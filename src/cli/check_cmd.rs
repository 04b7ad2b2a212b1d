//! Handler for the `deferred check` subcommand.

use serde::Serialize;
use std::path::PathBuf;

use crate::config::Config;
use crate::diagnostics::Finding;
use crate::scenario::Scenario;

use super::collect_scenarios;

#[derive(Debug, Serialize)]
struct CheckEntry {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Finding>,
}

pub(crate) fn run_check(
    paths: &[PathBuf],
    config: &Config,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let files = collect_scenarios(paths)?;
    let mut entries = Vec::new();

    for file in &files {
        let checked = Scenario::load(file).and_then(|scenario| scenario.check(&config.runtime));
        let error = match checked {
            Ok(()) => None,
            Err(err) => {
                let finding = Finding::error(err.code(), err.to_string());
                if !json {
                    eprintln!("{:?}", miette::Report::new(err));
                }
                Some(finding)
            }
        };
        entries.push(CheckEntry {
            file: file.display().to_string(),
            error,
        });
    }

    let failed = entries.iter().filter(|e| e.error.is_some()).count();
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if failed == 0 {
        println!("Checked {} scenario file(s), no errors", entries.len());
    }

    if failed > 0 {
        return Err(format!("{} of {} scenario file(s) have errors", failed, entries.len()).into());
    }
    Ok(())
}
