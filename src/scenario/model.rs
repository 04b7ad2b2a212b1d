//! Scenario file structure, as deserialized from TOML

use serde::Deserialize;

use crate::config::RuntimeConfig;

/// A scenario file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Scenario name; defaults to the file stem
    pub name: Option<String>,

    /// Free-form description
    pub description: Option<String>,

    /// Event loop settings overriding the project's
    pub runtime: Option<RuntimeConfig>,

    /// Future definitions, evaluated in order
    #[serde(default, rename = "future")]
    pub futures: Vec<FutureDef>,

    /// Checks made once the loop goes idle
    #[serde(default, rename = "expect")]
    pub expectations: Vec<ExpectDef>,

    /// Code of the construction error this scenario must raise
    pub expect_error: Option<String>,
}

/// One `[[future]]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FutureDef {
    pub name: String,
    pub init: Option<toml::Value>,
    pub resolve: Option<toml::Value>,
    pub reject: Option<toml::Value>,
    pub delay: Option<DelayDef>,
    pub all: Option<Vec<String>>,
    pub race: Option<Vec<String>>,
    pub from: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepDef>,
}

impl FutureDef {
    /// Names of the source keys present in this definition
    pub fn sources(&self) -> Vec<&'static str> {
        [
            ("init", self.init.is_some()),
            ("resolve", self.resolve.is_some()),
            ("reject", self.reject.is_some()),
            ("delay", self.delay.is_some()),
            ("all", self.all.is_some()),
            ("race", self.race.is_some()),
            ("from", self.from.is_some()),
        ]
        .into_iter()
        .filter(|(_, present)| *present)
        .map(|(key, _)| key)
        .collect()
    }
}

/// A timer-settled source
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DelayDef {
    pub ms: u64,
    pub fulfill: Option<toml::Value>,
    pub reject: Option<toml::Value>,
}

/// One chain step on a `from` source
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepDef {
    pub then: Option<toml::Value>,
    pub catch: Option<toml::Value>,
}

/// One `[[expect]]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectDef {
    pub future: String,
    pub state: Option<String>,
    pub fulfilled: Option<toml::Value>,
    pub rejected: Option<toml::Value>,
    pub same_as: Option<String>,
    pub not_same_as: Option<String>,
}
