//! Diagnostic reporting for scenario runs
//!
//! Every problem carries a stable error code so that machine consumers can
//! match on it and `deferred explain` can describe it.

use serde::{Deserialize, Serialize};

pub mod error_codes;
pub use error_codes::*;

/// Severity level for findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A problem observed while running a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Stable code (e.g., "E2001")
    pub code: String,

    /// Severity level
    pub severity: Severity,

    /// Primary message
    pub message: String,
}

impl Finding {
    /// Create an error finding
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// Create a warning finding
    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Format for terminal output
    pub fn to_human_readable(&self) -> String {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        format!("{}[{}]: {}", label, self.code, self.message)
    }
}
