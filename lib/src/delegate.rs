//! Handing off to the delegate program.
//!
//! The binary replaces itself with the delegate via [`exec_delegate`], so
//! signals, exit codes and the process id all belong to the delegate.
//! [`run_delegate`] keeps the caller alive instead, for embedding.

use std::ffi::OsString;
use std::os::unix::process::CommandExt;
use std::process::Command;

use anyhow::Result;
use fn_error_context::context;
use oob_guard_utils::{exit_code, CommandDisplay, CommandRunExt};

use crate::config::DelegateSpec;

/// Build the delegate command line: the configured program and arguments,
/// followed by `forwarded` unmodified.
pub fn delegate_command(spec: &DelegateSpec, forwarded: &[OsString]) -> Command {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args).args(forwarded);
    cmd
}

/// Replace the current process with the delegate. Only returns on failure.
#[context("Executing {}", spec.program)]
pub fn exec_delegate(spec: &DelegateSpec, forwarded: &[OsString]) -> Result<()> {
    let mut cmd = delegate_command(spec, forwarded);
    tracing::debug!("exec: {}", CommandDisplay::new(&cmd));
    Err(cmd.exec().into())
}

/// Run the delegate as a child with inherited stdio and return its exit
/// code. Signals sent to the process group reach the caller too.
#[context("Running {}", spec.program)]
pub fn run_delegate(spec: &DelegateSpec, forwarded: &[OsString]) -> Result<i32> {
    let mut cmd = delegate_command(spec, forwarded);
    tracing::debug!("Running {}", CommandDisplay::new(&cmd));
    let status = cmd.run_status()?;
    let code = exit_code(status);
    tracing::debug!("{} exited with {code}", spec.program);
    Ok(code)
}
