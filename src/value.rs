//! Dynamic values carried by scenario futures.
//!
//! Any value may be a fulfillment value or a rejection reason. A
//! [`Value::Future`] handed to a resolver's `resolve` is adopted; handed to
//! `fail` it is just the reason.

use crate::future::{Future, Resolution};

/// A future whose values and reasons are dynamic
pub type DynFuture = Future<Value, Value>;

/// Runtime value
#[derive(Debug, Clone)]
pub enum Value {
    /// Unit value
    Unit,
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// Boolean
    Bool(bool),
    /// Text string
    Text(String),
    /// List of values
    List(Vec<Value>),
    /// Handle to a future
    Future(DynFuture),
}

impl Value {
    /// Name of this value's type, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "Unit",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Bool(_) => "Bool",
            Value::Text(_) => "Text",
            Value::List(_) => "List",
            Value::Future(_) => "Future",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        values_equal(self, other)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<DynFuture> for Value {
    fn from(future: DynFuture) -> Self {
        Value::Future(future)
    }
}

/// Settling with a future-valued `Value` adopts that future
impl From<Value> for Resolution<Value, Value> {
    fn from(value: Value) -> Self {
        match value {
            Value::Future(future) => Resolution::Future(future),
            other => Resolution::Value(other),
        }
    }
}

/// Compare two values for equality
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Unit, Value::Unit) => true,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Text(a), Value::Text(b)) => a == b,
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
        }
        // Futures are equal only to themselves
        (Value::Future(a), Value::Future(b)) => a.ptr_eq(b),
        _ => false,
    }
}

/// Format a value for display
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Unit => "()".to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) => {
            if f.fract() == 0.0 {
                format!("{:.1}", f)
            } else {
                f.to_string()
            }
        }
        Value::Bool(b) => b.to_string(),
        Value::Text(s) => format!("{:?}", s),
        Value::List(items) => {
            let item_strs: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", item_strs.join(", "))
        }
        Value::Future(future) => format!("<{}>", future.id()),
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_value(self))
    }
}
