//! Project configuration (`deferred.toml`)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::runtime::{ClockKind, DEFAULT_TASK_BUDGET};

/// Name of the project configuration file
pub const CONFIG_FILE: &str = "deferred.toml";

/// Project configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Event loop settings
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

/// Event loop settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Clock driving timers
    #[serde(default)]
    pub clock: ClockKind,

    /// Maximum number of tasks a single run may execute
    #[serde(default = "default_task_budget")]
    pub task_budget: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            clock: ClockKind::default(),
            task_budget: default_task_budget(),
        }
    }
}

fn default_task_budget() -> usize {
    DEFAULT_TASK_BUDGET
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset (e.g. "warn", "deferred=trace")
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Parse error
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// Serialization error
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl Config {
    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize the configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load `deferred.toml` from `start` or its nearest ancestor that has
    /// one; defaults apply when none is found.
    pub fn discover(start: &Path) -> Result<Self, ConfigError> {
        match find_config_file(start) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}

/// Find `deferred.toml` by searching upward from a directory.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut dir = if start.is_file() {
        start.parent().unwrap_or(start).to_path_buf()
    } else {
        start.to_path_buf()
    };
    loop {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        match dir.parent() {
            Some(parent) => dir = parent.to_path_buf(),
            None => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.runtime.clock, ClockKind::Virtual);
        assert_eq!(config.runtime.task_budget, DEFAULT_TASK_BUDGET);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_parse_full_config() {
        let content = r#"
[runtime]
clock = "system"
task_budget = 500

[log]
level = "deferred=trace"
"#;
        let config = Config::parse(content).unwrap();
        assert_eq!(config.runtime.clock, ClockKind::System);
        assert_eq!(config.runtime.task_budget, 500);
        assert_eq!(config.log.level, "deferred=trace");
    }

    #[test]
    fn test_parse_rejects_unknown_clock() {
        let err = Config::parse("[runtime]\nclock = \"sundial\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_to_toml_round_trips() {
        let mut config = Config::default();
        config.runtime.task_budget = 42;
        let text = config.to_toml().unwrap();
        assert_eq!(Config::parse(&text).unwrap(), config);
    }

    #[test]
    fn test_discover_walks_up_to_project_root() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILE),
            "[runtime]\ntask_budget = 7\n",
        )
        .unwrap();
        let nested = tmp.path().join("scenarios").join("deep");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(
            find_config_file(&nested),
            Some(tmp.path().join(CONFIG_FILE))
        );
        let config = Config::discover(&nested).unwrap();
        assert_eq!(config.runtime.task_budget, 7);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = Config::load(&tmp.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
