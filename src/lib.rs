//! deferred
//!
//! Single-assignment deferred results ("futures") with then/catch chaining,
//! `all`/`race` combinators, and a deterministic single-threaded event loop.
//! Behavior scenarios written in TOML run against the same runtime.

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod future;
pub mod logging;
pub mod runtime;
pub mod scenario;
pub mod testing;
pub mod value;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::future::{Future, FutureId, Outcome, Resolution, Resolver, State};
    pub use crate::runtime::{Runtime, RuntimeError};
    pub use crate::value::{DynFuture, Value};
}
