//! Handler for the `deferred explain` subcommand.

use crate::diagnostics::error_codes::ALL_CODES;

pub(crate) fn run_explain(code: &str) -> Result<(), Box<dyn std::error::Error>> {
    match get_error_explanation(code) {
        Some(text) => {
            println!("{}", text);
            Ok(())
        }
        None => {
            eprintln!("Unknown error code: {}", code);
            eprintln!();
            eprintln!("Valid error codes:");
            eprintln!("  E0xxx  Scenario file errors (E0001-E0008)");
            eprintln!("  E1xxx  Construction errors (E1001)");
            eprintln!("  E2xxx  Expectation failures (E2001-E2005)");
            eprintln!("  E3xxx  Event loop errors (E3001-E3002)");
            eprintln!("  W0xxx  Warnings (W0001)");
            Err(format!("unknown error code {} ({} codes known)", code, ALL_CODES.len()).into())
        }
    }
}

/// Get a detailed explanation for an error code.
pub(super) fn get_error_explanation(code: &str) -> Option<String> {
    let explanation = match code {
        // Scenario file errors
        "E0001" => {
            r#"E0001: Invalid scenario file

The file is not valid TOML, or it uses a key a scenario does not have.

Example:
  [[future]]
  name = 1          # expected a string

Fix: Correct the TOML at the labelled location. Top-level keys are
`name`, `description`, `expect_error`, `[runtime]`, `[[future]]` and
`[[expect]]`.
"#
        }
        "E0002" => {
            r#"E0002: Unknown future

A definition, value or expectation names a future that does not exist.
Futures are defined in file order, so a definition can only refer to
futures defined above it.

Example:
  [[future]]
  name = "b"
  from = "a"        # `a` is defined further down

Fix: Move the referenced definition up, or correct the name.
"#
        }
        "E0003" => {
            r#"E0003: Duplicate future

Two `[[future]]` tables use the same name.

Fix: Give each future a unique name.
"#
        }
        "E0004" => {
            r#"E0004: Invalid source

Every future needs exactly one source: `init`, `resolve`, `reject`,
`delay`, `all`, `race` or `from`. `steps` is only allowed together with
`from`, and `delay` needs exactly one of `fulfill` or `reject`.

Example:
  [[future]]
  name = "p"
  resolve = 1
  reject = 2        # two sources

Fix: Keep one source per definition.
"#
        }
        "E0005" => {
            r#"E0005: Invalid handler

A chain step or initializer step is malformed.

Handlers are "identity", "unreachable", or a single-key table:
  { return = v }    fulfill with v
  { throw = v }     reject with v
  { reject = v }    return a future rejected with v
  { adopt = "name" } return the named future
  { add = n }       add n to an integer

Initializer steps are single-key tables: `settle`, `fail`, `throw`,
`settle_after = { ms, value }` and `fail_after = { ms, value }`.
Each chain step needs `then`, `catch` or both.
"#
        }
        "E0006" => {
            r#"E0006: Invalid value

A TOML literal has no value equivalent. Integers, floats, booleans,
strings and arrays are values; `{}` is unit and `{ future = "name" }`
refers to a future. Other tables and datetimes are rejected.
"#
        }
        "E0007" => {
            r#"E0007: Invalid expectation

An `[[expect]]` table has nothing to check, or uses an unknown state.

Example:
  [[expect]]
  future = "p"
  state = "done"    # pending, fulfilled or rejected

Fix: Add at least one of `state`, `fulfilled`, `rejected`, `same_as`
or `not_same_as`.
"#
        }
        "E0008" => {
            r#"E0008: Unreadable scenario file

The scenario file could not be read from disk.

Fix: Check the path and file permissions.
"#
        }

        // Construction errors
        "E1001" => {
            r#"E1001: Initializer not callable

A future was constructed with something that is not an initializer.
Construction fails immediately; no future is created.

Example:
  [[future]]
  name = "p"
  init = 5          # must be an array of steps

Fix: Pass an array of initializer steps. A scenario that means to
exercise this error declares `expect_error = "E1001"`.
"#
        }

        // Expectation failures
        "E2001" => {
            r#"E2001: State mismatch

After the event loop went idle, a future was in a different state than
expected (pending, fulfilled or rejected).
"#
        }
        "E2002" => {
            r#"E2002: Value mismatch

A future settled in the expected state but with a different value or
reason. Values compare structurally; futures compare by identity.
"#
        }
        "E2003" => {
            r#"E2003: Identity mismatch

A `same_as` or `not_same_as` check failed. Resolving with an existing
future returns that very future, while rejecting with one always creates
a new future.
"#
        }
        "E2004" => {
            r#"E2004: Expected error not raised

The scenario declares `expect_error`, but building it either succeeded
or failed with a different code.
"#
        }
        "E2005" => {
            r#"E2005: Unreachable handler ran

A handler marked "unreachable" was invoked. Such handlers sit on paths
that must never run, e.g. the fulfillment handler of a rejected future.
"#
        }

        // Event loop errors
        "E3001" => {
            r#"E3001: Stalled

The loop was asked to wait for a future, but no microtasks or timers
remain that could ever settle it.

Fix: Make sure every initializer settles its future or schedules a
timer that does. A future that adopts itself never settles.
"#
        }
        "E3002" => {
            r#"E3002: Task budget exhausted

More tasks ran than the configured budget allows. This usually means
a chain keeps rescheduling itself.

Fix: Look for cycles, or raise the budget:
  [runtime]
  task_budget = 5000000
"#
        }

        // Warnings
        "W0001" => {
            r#"W0001: Unhandled rejection

A future was rejected and never had a handler attached. The rejection
did not fail the scenario, but nothing observed it either.

Fix: Attach a `catch` step, or expect the rejection explicitly.
"#
        }
        _ => return None,
    };
    Some(explanation.to_string())
}
