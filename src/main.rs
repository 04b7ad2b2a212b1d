//! deferred CLI - run promise behavior scenarios

use std::process::ExitCode;

use deferred::cli::Cli;

fn main() -> ExitCode {
    match Cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
