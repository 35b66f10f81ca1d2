//! The main entrypoint for the OOB update wrapper

use anyhow::Result;

fn run() -> Result<()> {
    oob_guard_utils::initialize_tracing();
    tracing::trace!("starting {}", env!("CARGO_PKG_NAME"));
    oob_guard_lib::cli::run_from_iter(std::env::args_os())
}

fn main() {
    // In order to print the error in a custom format (with :#) our
    // main simply invokes a run() where all the work is done; on success
    // the delegate has replaced this process.
    // This code just captures any errors.
    if let Err(e) = run() {
        tracing::error!("{:#}", e);
        std::process::exit(oob_guard_lib::exit_code_for(&e));
    }
}
