//! Checks made against named futures after the loop goes idle

use super::build::{to_value, Futures};
use super::error::ScenarioError;
use super::model::ExpectDef;
use crate::diagnostics::error_codes::expectation;
use crate::diagnostics::Finding;
use crate::future::State;
use crate::value::{DynFuture, Value};

#[derive(Debug, Clone)]
enum Check {
    State(&'static str),
    Fulfilled(Value),
    Rejected(Value),
    SameAs(String, DynFuture),
    NotSameAs(String, DynFuture),
}

/// Every check declared for one future
#[derive(Debug, Clone)]
pub struct Expectation {
    future: String,
    target: DynFuture,
    checks: Vec<Check>,
}

impl Expectation {
    pub(crate) fn build(def: &ExpectDef, futures: &Futures) -> Result<Self, ScenarioError> {
        let invalid = |message: &str| ScenarioError::InvalidExpectation {
            future: def.future.clone(),
            message: message.to_string(),
        };

        let target = futures.get(&def.future)?;
        let mut checks = Vec::new();
        if let Some(state) = &def.state {
            let label = match state.as_str() {
                "pending" => "pending",
                "fulfilled" => "fulfilled",
                "rejected" => "rejected",
                _ => return Err(invalid("`state` is one of pending, fulfilled, rejected")),
            };
            checks.push(Check::State(label));
        }
        if let Some(raw) = &def.fulfilled {
            checks.push(Check::Fulfilled(to_value(raw, futures)?));
        }
        if let Some(raw) = &def.rejected {
            checks.push(Check::Rejected(to_value(raw, futures)?));
        }
        if let Some(name) = &def.same_as {
            checks.push(Check::SameAs(name.clone(), futures.get(name)?));
        }
        if let Some(name) = &def.not_same_as {
            checks.push(Check::NotSameAs(name.clone(), futures.get(name)?));
        }
        if checks.is_empty() {
            return Err(invalid("nothing to check"));
        }

        Ok(Self {
            future: def.future.clone(),
            target,
            checks,
        })
    }

    /// Compare the future's current state with every check
    pub fn evaluate(&self) -> Vec<Finding> {
        let state = self.target.state();
        self.checks
            .iter()
            .filter_map(|check| self.evaluate_one(check, &state))
            .collect()
    }

    fn evaluate_one(&self, check: &Check, state: &State<Value, Value>) -> Option<Finding> {
        let name = &self.future;
        match check {
            Check::State(label) if state.label() != *label => Some(Finding::error(
                expectation::STATE_MISMATCH,
                format!("`{}`: expected {}, found {}", name, label, describe(state)),
            )),
            Check::State(_) => None,
            Check::Fulfilled(expected) => match state {
                State::Fulfilled(actual) if actual == expected => None,
                State::Fulfilled(actual) => Some(Finding::error(
                    expectation::VALUE_MISMATCH,
                    format!("`{}`: expected fulfilled with {}, found {}", name, expected, actual),
                )),
                other => Some(Finding::error(
                    expectation::STATE_MISMATCH,
                    format!(
                        "`{}`: expected fulfilled with {}, found {}",
                        name,
                        expected,
                        describe(other)
                    ),
                )),
            },
            Check::Rejected(expected) => match state {
                State::Rejected(actual) if actual == expected => None,
                State::Rejected(actual) => Some(Finding::error(
                    expectation::VALUE_MISMATCH,
                    format!("`{}`: expected rejected with {}, found {}", name, expected, actual),
                )),
                other => Some(Finding::error(
                    expectation::STATE_MISMATCH,
                    format!(
                        "`{}`: expected rejected with {}, found {}",
                        name,
                        expected,
                        describe(other)
                    ),
                )),
            },
            Check::SameAs(other, future) if !self.target.ptr_eq(future) => Some(Finding::error(
                expectation::IDENTITY_MISMATCH,
                format!(
                    "`{}` ({}) is not the same future as `{}` ({})",
                    name,
                    self.target.id(),
                    other,
                    future.id()
                ),
            )),
            Check::NotSameAs(other, future) if self.target.ptr_eq(future) => Some(Finding::error(
                expectation::IDENTITY_MISMATCH,
                format!("`{}` is the same future as `{}`", name, other),
            )),
            Check::SameAs(..) | Check::NotSameAs(..) => None,
        }
    }
}

fn describe(state: &State<Value, Value>) -> String {
    match state {
        State::Pending => "pending".to_string(),
        State::Fulfilled(value) => format!("fulfilled with {}", value),
        State::Rejected(reason) => format!("rejected with {}", reason),
    }
}
