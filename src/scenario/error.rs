//! Scenario error types.

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode, SourceSpan};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::diagnostics::error_codes::{construction, scenario};
use crate::runtime::RuntimeError;

/// Errors raised while loading, building or running a scenario
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scenario file: {message}")]
    Parse {
        message: String,
        src: NamedSource<String>,
        span: Option<SourceSpan>,
    },

    #[error("unknown future `{name}`")]
    UnknownFuture { name: String },

    #[error("future `{name}` is defined more than once")]
    DuplicateFuture { name: String },

    #[error("future `{name}` {problem}")]
    InvalidSource { name: String, problem: String },

    #[error("invalid handler in future `{future}`: {message}")]
    InvalidHandler { future: String, message: String },

    #[error("invalid value: {message}")]
    InvalidValue { message: String },

    #[error("invalid expectation for `{future}`: {message}")]
    InvalidExpectation { future: String, message: String },

    #[error("initializer of future `{future}` is not callable (found {found})")]
    NotCallable { future: String, found: &'static str },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl Diagnostic for ScenarioError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(ScenarioError::code(self)))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self {
            ScenarioError::Parse { .. } => {
                "scenario files are TOML; see `deferred explain E0001`"
            }
            ScenarioError::UnknownFuture { .. } => {
                "a definition may only refer to futures defined above it"
            }
            ScenarioError::InvalidSource { .. } => {
                "use exactly one of `init`, `resolve`, `reject`, `delay`, `all`, `race` or `from`"
            }
            ScenarioError::InvalidHandler { .. } => {
                "handlers are \"identity\", \"unreachable\", or a table with one of `return`, `throw`, `reject`, `adopt`, `add`"
            }
            ScenarioError::NotCallable { .. } => "`init` must be an array of steps",
            ScenarioError::Runtime(err) => return err.help(),
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        match self {
            ScenarioError::Parse { src, .. } => Some(src),
            _ => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            ScenarioError::Parse {
                span: Some(span), ..
            } => Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
                Some("here".to_string()),
                *span,
            )))),
            _ => None,
        }
    }
}

impl ScenarioError {
    /// Stable diagnostic code for this error
    pub fn code(&self) -> &'static str {
        match self {
            ScenarioError::Read { .. } => scenario::READ_FAILED,
            ScenarioError::Parse { .. } => scenario::PARSE_ERROR,
            ScenarioError::UnknownFuture { .. } => scenario::UNKNOWN_FUTURE,
            ScenarioError::DuplicateFuture { .. } => scenario::DUPLICATE_FUTURE,
            ScenarioError::InvalidSource { .. } => scenario::INVALID_SOURCE,
            ScenarioError::InvalidHandler { .. } => scenario::INVALID_HANDLER,
            ScenarioError::InvalidValue { .. } => scenario::INVALID_VALUE,
            ScenarioError::InvalidExpectation { .. } => scenario::INVALID_EXPECTATION,
            ScenarioError::NotCallable { .. } => construction::NOT_CALLABLE,
            ScenarioError::Runtime(err) => err.code(),
        }
    }

    pub(crate) fn parse(file_name: &str, source: &str, err: toml::de::Error) -> Self {
        ScenarioError::Parse {
            message: err.message().to_string(),
            src: NamedSource::new(file_name, source.to_string()),
            span: err.span().map(SourceSpan::from),
        }
    }

    pub(crate) fn handler(future: &str, message: impl Into<String>) -> Self {
        ScenarioError::InvalidHandler {
            future: future.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn value(message: impl Into<String>) -> Self {
        ScenarioError::InvalidValue {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_source(name: &str, problem: impl Into<String>) -> Self {
        ScenarioError::InvalidSource {
            name: name.to_string(),
            problem: problem.into(),
        }
    }
}
