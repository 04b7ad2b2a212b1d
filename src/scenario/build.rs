//! Turning scenario definitions into live futures on a runtime.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, warn};

use super::error::ScenarioError;
use super::expect::Expectation;
use super::model::{FutureDef, Scenario, StepDef};
use crate::future::{FutureId, Outcome};
use crate::runtime::Runtime;
use crate::value::{DynFuture, Value};

/// Named futures, in definition order
#[derive(Debug, Default)]
pub struct Futures {
    entries: Vec<(String, DynFuture)>,
    index: HashMap<String, usize>,
}

impl Futures {
    /// Look up a future by name
    pub fn get(&self, name: &str) -> Result<DynFuture, ScenarioError> {
        self.index
            .get(name)
            .map(|&i| self.entries[i].1.clone())
            .ok_or_else(|| ScenarioError::UnknownFuture {
                name: name.to_string(),
            })
    }

    /// Name a future was first defined under
    pub fn name_of(&self, id: FutureId) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, future)| future.id() == id)
            .map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    fn insert(&mut self, name: &str, future: DynFuture) {
        self.index.insert(name.to_string(), self.entries.len());
        self.entries.push((name.to_string(), future));
    }
}

/// A scenario whose futures exist on a runtime, ready to run
#[derive(Debug)]
pub struct Built {
    pub futures: Futures,
    pub expectations: Vec<Expectation>,
    unreachable_hits: Rc<Cell<usize>>,
}

impl Built {
    /// Times an `unreachable` handler has run
    pub fn unreachable_hits(&self) -> usize {
        self.unreachable_hits.get()
    }
}

/// What a handler does with the value or reason it receives
#[derive(Debug, Clone)]
enum Handler {
    Identity,
    Unreachable,
    Return(Value),
    Throw(Value),
    Reject(Value),
    Adopt(DynFuture),
    Add(i64),
}

/// State shared by every handler of one scenario
#[derive(Clone)]
struct HandlerContext {
    runtime: Runtime,
    unreachable_hits: Rc<Cell<usize>>,
}

impl Handler {
    fn invoke(self, input: Value, ctx: &HandlerContext) -> Outcome<Value, Value> {
        match self {
            Handler::Identity => returned(input),
            Handler::Unreachable => {
                ctx.unreachable_hits.set(ctx.unreachable_hits.get() + 1);
                warn!(%input, "unreachable handler ran");
                Outcome::Reject(Value::from("unreachable handler ran"))
            }
            Handler::Return(value) => returned(value),
            Handler::Throw(reason) => Outcome::Reject(reason),
            Handler::Reject(reason) => Outcome::Adopt(ctx.runtime.rejected(reason)),
            Handler::Adopt(future) => Outcome::Adopt(future),
            Handler::Add(n) => match input {
                Value::Int(i) => match i.checked_add(n) {
                    Some(sum) => Outcome::Fulfill(Value::Int(sum)),
                    None => Outcome::Reject(Value::from("integer overflow")),
                },
                other => Outcome::Reject(Value::Text(format!(
                    "cannot add {} to {}",
                    n,
                    other.type_name()
                ))),
            },
        }
    }
}

/// A handler's return value; returning a future adopts it
fn returned(value: Value) -> Outcome<Value, Value> {
    match value {
        Value::Future(future) => Outcome::Adopt(future),
        other => Outcome::Fulfill(other),
    }
}

/// One synchronous action of an initializer
#[derive(Debug, Clone)]
enum InitStep {
    Settle(Value),
    Fail(Value),
    Throw(Value),
    SettleAfter(u64, Value),
    FailAfter(u64, Value),
}

/// Builds a scenario's futures in definition order
pub struct Builder<'a> {
    runtime: &'a Runtime,
    futures: Futures,
    ctx: HandlerContext,
}

impl<'a> Builder<'a> {
    pub fn new(runtime: &'a Runtime) -> Self {
        Self {
            runtime,
            futures: Futures::default(),
            ctx: HandlerContext {
                runtime: runtime.clone(),
                unreachable_hits: Rc::new(Cell::new(0)),
            },
        }
    }

    /// Create every future and resolve every expectation
    pub fn build(mut self, scenario: &Scenario) -> Result<Built, ScenarioError> {
        for def in &scenario.futures {
            if self.futures.contains(&def.name) {
                return Err(ScenarioError::DuplicateFuture {
                    name: def.name.clone(),
                });
            }
            let future = self.define(def)?;
            debug!(name = %def.name, future = %future.id(), "defined future");
            self.futures.insert(&def.name, future);
        }

        let expectations = scenario
            .expectations
            .iter()
            .map(|def| Expectation::build(def, &self.futures))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Built {
            futures: self.futures,
            expectations,
            unreachable_hits: self.ctx.unreachable_hits,
        })
    }

    fn define(&self, def: &FutureDef) -> Result<DynFuture, ScenarioError> {
        let sources = def.sources();
        match sources.len() {
            0 => return Err(ScenarioError::invalid_source(&def.name, "has no source")),
            1 => {}
            _ => {
                return Err(ScenarioError::invalid_source(
                    &def.name,
                    format!("has several sources: {}", sources.join(", ")),
                ))
            }
        }
        if !def.steps.is_empty() && def.from.is_none() {
            return Err(ScenarioError::invalid_source(
                &def.name,
                "has `steps` but no `from`",
            ));
        }

        if let Some(init) = &def.init {
            let steps = self.init_steps(&def.name, init)?;
            return Ok(self.construct(steps));
        }
        if let Some(raw) = &def.resolve {
            return Ok(self.runtime.resolve(self.value(raw)?));
        }
        if let Some(raw) = &def.reject {
            return Ok(self.runtime.rejected(self.value(raw)?));
        }
        if let Some(delay) = &def.delay {
            let step = match (&delay.fulfill, &delay.reject) {
                (Some(raw), None) => InitStep::SettleAfter(delay.ms, self.value(raw)?),
                (None, Some(raw)) => InitStep::FailAfter(delay.ms, self.value(raw)?),
                _ => {
                    return Err(ScenarioError::invalid_source(
                        &def.name,
                        "`delay` needs exactly one of `fulfill` or `reject`",
                    ))
                }
            };
            return Ok(self.construct(vec![step]));
        }
        if let Some(names) = &def.all {
            let inputs = self.lookup_all(names)?;
            return Ok(self.runtime.all_with(inputs, Value::List));
        }
        if let Some(names) = &def.race {
            let inputs = self.lookup_all(names)?;
            return Ok(self.runtime.race(inputs));
        }

        let source = match &def.from {
            Some(from) => self.futures.get(from)?,
            None => return Err(ScenarioError::invalid_source(&def.name, "has no source")),
        };
        def.steps
            .iter()
            .try_fold(source, |future, step| self.chain(&def.name, &future, step))
    }

    /// Run an initializer's steps synchronously inside `Runtime::future`
    fn construct(&self, steps: Vec<InitStep>) -> DynFuture {
        let rt = self.runtime;
        rt.future(|resolver| {
            for step in steps {
                match step {
                    InitStep::Settle(value) => resolver.resolve(value),
                    InitStep::Fail(reason) => resolver.fail(reason),
                    InitStep::Throw(reason) => return Err(reason),
                    InitStep::SettleAfter(ms, value) => {
                        let resolver = resolver.clone();
                        rt.set_timeout(ms, move || resolver.resolve(value));
                    }
                    InitStep::FailAfter(ms, reason) => {
                        let resolver = resolver.clone();
                        rt.set_timeout(ms, move || resolver.fail(reason));
                    }
                }
            }
            Ok(())
        })
    }

    fn chain(
        &self,
        name: &str,
        future: &DynFuture,
        step: &StepDef,
    ) -> Result<DynFuture, ScenarioError> {
        let on_fulfilled = step
            .then
            .as_ref()
            .map(|raw| self.handler(name, raw))
            .transpose()?;
        let on_rejected = step
            .catch
            .as_ref()
            .map(|raw| self.handler(name, raw))
            .transpose()?;

        let ctx = self.ctx.clone();
        let chained = match (on_fulfilled, on_rejected) {
            (Some(then), Some(catch)) => {
                let catch_ctx = ctx.clone();
                future.then_both(
                    move |value| then.invoke(value, &ctx),
                    move |reason| catch.invoke(reason, &catch_ctx),
                )
            }
            (Some(then), None) => future.then(move |value| then.invoke(value, &ctx)),
            (None, Some(catch)) => future.catch(move |reason| catch.invoke(reason, &ctx)),
            (None, None) => {
                return Err(ScenarioError::handler(
                    name,
                    "a step needs `then`, `catch` or both",
                ))
            }
        };
        Ok(chained)
    }

    fn lookup_all(&self, names: &[String]) -> Result<Vec<DynFuture>, ScenarioError> {
        names.iter().map(|name| self.futures.get(name)).collect()
    }

    fn value(&self, raw: &toml::Value) -> Result<Value, ScenarioError> {
        to_value(raw, &self.futures)
    }

    fn handler(&self, future: &str, raw: &toml::Value) -> Result<Handler, ScenarioError> {
        let table = match raw {
            toml::Value::String(name) => {
                return match name.as_str() {
                    "identity" => Ok(Handler::Identity),
                    "unreachable" => Ok(Handler::Unreachable),
                    other => Err(ScenarioError::handler(
                        future,
                        format!("unknown handler \"{}\"", other),
                    )),
                }
            }
            toml::Value::Table(table) if table.len() == 1 => table,
            other => {
                return Err(ScenarioError::handler(
                    future,
                    format!("expected a name or a single-key table, found {}", other),
                ))
            }
        };

        let Some((key, arg)) = table.iter().next() else {
            return Err(ScenarioError::handler(future, "empty handler table"));
        };
        match key.as_str() {
            "return" => Ok(Handler::Return(self.value(arg)?)),
            "throw" => Ok(Handler::Throw(self.value(arg)?)),
            "reject" => Ok(Handler::Reject(self.value(arg)?)),
            "adopt" => match arg {
                toml::Value::String(name) => Ok(Handler::Adopt(self.futures.get(name)?)),
                _ => Err(ScenarioError::handler(future, "`adopt` takes a future name")),
            },
            "add" => match arg {
                toml::Value::Integer(n) => Ok(Handler::Add(*n)),
                _ => Err(ScenarioError::handler(future, "`add` takes an integer")),
            },
            other => Err(ScenarioError::handler(
                future,
                format!("unknown handler `{}`", other),
            )),
        }
    }

    fn init_steps(&self, future: &str, raw: &toml::Value) -> Result<Vec<InitStep>, ScenarioError> {
        let toml::Value::Array(items) = raw else {
            return Err(ScenarioError::NotCallable {
                future: future.to_string(),
                found: raw.type_str(),
            });
        };
        items.iter().map(|item| self.init_step(future, item)).collect()
    }

    fn init_step(&self, future: &str, raw: &toml::Value) -> Result<InitStep, ScenarioError> {
        let invalid = |message: String| ScenarioError::handler(future, message);
        let (key, arg) = match raw {
            toml::Value::Table(table) if table.len() == 1 => match table.iter().next() {
                Some(entry) => entry,
                None => return Err(invalid("empty initializer step".to_string())),
            },
            other => {
                return Err(invalid(format!(
                    "initializer steps are single-key tables, found {}",
                    other
                )))
            }
        };
        match key.as_str() {
            "settle" => Ok(InitStep::Settle(self.value(arg)?)),
            "fail" => Ok(InitStep::Fail(self.value(arg)?)),
            "throw" => Ok(InitStep::Throw(self.value(arg)?)),
            "settle_after" | "fail_after" => {
                let (ms, value) = self.timed(arg).map_err(invalid)?;
                let value = self.value(value)?;
                Ok(if key == "settle_after" {
                    InitStep::SettleAfter(ms, value)
                } else {
                    InitStep::FailAfter(ms, value)
                })
            }
            other => Err(invalid(format!("unknown initializer step `{}`", other))),
        }
    }

    /// Split `{ ms = n, value = v }`
    fn timed<'v>(&self, raw: &'v toml::Value) -> Result<(u64, &'v toml::Value), String> {
        let toml::Value::Table(table) = raw else {
            return Err("timed steps take `{ ms, value }`".to_string());
        };
        let ms = match table.get("ms") {
            Some(toml::Value::Integer(ms)) => {
                u64::try_from(*ms).map_err(|_| format!("negative delay {}", ms))?
            }
            _ => return Err("timed steps need an integer `ms`".to_string()),
        };
        let value = table
            .get("value")
            .ok_or_else(|| "timed steps need a `value`".to_string())?;
        if table.len() != 2 {
            return Err("timed steps take only `ms` and `value`".to_string());
        }
        Ok((ms, value))
    }
}

/// Convert a TOML literal into a [`Value`], resolving future references
pub fn to_value(raw: &toml::Value, futures: &Futures) -> Result<Value, ScenarioError> {
    match raw {
        toml::Value::Integer(n) => Ok(Value::Int(*n)),
        toml::Value::Float(f) => Ok(Value::Float(*f)),
        toml::Value::Boolean(b) => Ok(Value::Bool(*b)),
        toml::Value::String(s) => Ok(Value::Text(s.clone())),
        toml::Value::Array(items) => items
            .iter()
            .map(|item| to_value(item, futures))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        toml::Value::Table(table) if table.is_empty() => Ok(Value::Unit),
        toml::Value::Table(table) => match table.get("future") {
            Some(toml::Value::String(name)) if table.len() == 1 => {
                futures.get(name).map(Value::Future)
            }
            _ => Err(ScenarioError::value(format!(
                "tables other than `{{}}` and `{{ future = \"name\" }}` are not values: {}",
                raw
            ))),
        },
        toml::Value::Datetime(dt) => Err(ScenarioError::value(format!(
            "datetimes are not values: {}",
            dt
        ))),
    }
}
