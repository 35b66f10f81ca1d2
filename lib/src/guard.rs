//! The guard sequence: tools, space, dependency, then the delegate.

use std::ffi::OsString;

use anyhow::Result;

use crate::config::GuardConfig;
use crate::delegate::{exec_delegate, run_delegate};
use crate::dependency::ensure_dependency;
use crate::space::check_space;
use crate::tools::check_tools;

/// Run every precondition check in order. A failed tool or space check
/// stops here with a [`crate::GuardError`].
pub fn check_preconditions(config: &GuardConfig) -> Result<()> {
    check_tools(&config.tools)?;
    let available = check_space(&config.space)?;
    tracing::debug!("Space check passed with {available} MB free");
    let outcome = ensure_dependency(&config.dependency)?;
    tracing::debug!("Dependency {}: {outcome:?}", config.dependency.name);
    Ok(())
}

/// Check the preconditions, then replace this process with the delegate.
/// Only returns on failure; the delegate is not started if a check fails.
pub fn exec_guard(config: &GuardConfig, forwarded: &[OsString]) -> Result<()> {
    check_preconditions(config)?;
    exec_delegate(&config.delegate, forwarded)
}

/// Check the preconditions, then run the delegate as a child process and
/// return its exit code.
pub fn run_guard(config: &GuardConfig, forwarded: &[OsString]) -> Result<i32> {
    check_preconditions(config)?;
    run_delegate(&config.delegate, forwarded)
}
