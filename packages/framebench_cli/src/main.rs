#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

//! Binary entry point of `framebench`.
//!
//! Excluded from mutation testing because process exit behavior can only be observed by
//! spawning the binary.

use std::io;
use std::process::ExitCode;

use framebench_cli::{Args, execute};

#[cfg_attr(test, mutants::skip)]
fn main() -> ExitCode {
    let args: Args = argh::from_env();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_writer(io::stderr)
        .init();

    match execute(&args, &mut io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "framebench failed");
            ExitCode::FAILURE
        }
    }
}
