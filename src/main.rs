//! solflat - Flatten Solidity sources into a single file

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = solflat::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
