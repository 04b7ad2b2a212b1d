//! Command-line interface for deferred
//!
//! Provides commands: run, check, explain

mod check_cmd;
mod explain_cmd;
mod run_cmd;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::{Config, CONFIG_FILE};

/// deferred - run promise behavior scenarios on a deterministic event loop
#[derive(Parser, Debug)]
#[command(name = "deferred")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to the nearest deferred.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (e.g. "debug", "deferred=trace")
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run scenario files
    Run {
        /// Files or directories to run
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Only run scenarios whose name contains this
        #[arg(long)]
        filter: Option<String>,

        /// Stop after the first scenario that does not pass
        #[arg(long)]
        fail_fast: bool,
    },

    /// Parse and build scenarios without running them
    Check {
        /// Files or directories to check
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,
    },

    /// Explain an error or warning code in detail
    Explain {
        /// Code to explain (e.g., E1001, W0001)
        code: String,
    },
}

impl Cli {
    /// Run the CLI
    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        let cli = Cli::parse();
        let config = cli.load_config()?;
        let level = cli.log_level.as_deref().unwrap_or(config.log.level.as_str());
        crate::logging::init(level);

        match cli.command {
            Command::Run {
                paths,
                filter,
                fail_fast,
            } => {
                run_cmd::run_scenarios(&paths, &config, filter, fail_fast, cli.json)?;
            }
            Command::Check { paths } => {
                check_cmd::run_check(&paths, &config, cli.json)?;
            }
            Command::Explain { code } => {
                explain_cmd::run_explain(&code)?;
            }
        }

        Ok(())
    }

    fn load_config(&self) -> Result<Config, Box<dyn std::error::Error>> {
        let config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::discover(&std::env::current_dir()?)?,
        };
        Ok(config)
    }
}

/// Scenario files named by `paths`; directories are walked recursively
fn collect_scenarios(paths: &[PathBuf]) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<_> = walkdir(path)?
                .into_iter()
                .filter(|entry| is_scenario_file(entry))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn is_scenario_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "toml")
        && path.file_name().is_some_and(|name| name != CONFIG_FILE)
}

/// Simple recursive directory walker
fn walkdir(path: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut results = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let entry_path = entry.path();
        if entry_path.is_file() {
            results.push(entry_path);
        } else if entry_path.is_dir() {
            results.extend(walkdir(&entry_path)?);
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests;
