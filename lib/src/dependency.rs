//! Making sure the delegate's runtime dependency is installed.
//!
//! Installation walks an ordered list of strategies (by default an online
//! install followed by an offline one from the bundled package directory)
//! and stops at the first that succeeds. The probe is not re-run afterwards.

use anyhow::{Context, Result};
use oob_guard_utils::{new_command, CommandRunExt};

use crate::config::{DependencySpec, InstallStrategy};
use crate::GuardError;

/// What [`ensure_dependency`] ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyOutcome {
    /// The probe succeeded; nothing was installed.
    AlreadyPresent,
    /// Installed using the named strategy.
    Installed {
        /// Label of the strategy that succeeded.
        via: String,
    },
    /// Every strategy failed, and the dependency is not required.
    Unresolved,
}

/// Try each strategy in order and return the first one for which `attempt`
/// succeeds. Failed attempts are logged and otherwise ignored.
pub fn first_success<'a, T, F>(strategies: &'a [T], mut attempt: F) -> Option<&'a T>
where
    F: FnMut(&T) -> Result<()>,
{
    strategies.iter().find(|&s| match attempt(s) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("{e:#}");
            false
        }
    })
}

/// Run the dependency's probe.
pub fn dependency_present(spec: &DependencySpec) -> Result<bool> {
    Ok(new_command(&spec.probe)
        .with_context(|| format!("Probing for {}", spec.name))?
        .probe())
}

fn install(name: &str, strategy: &InstallStrategy) -> Result<()> {
    tracing::info!("Installing {name} ({})", strategy.label);
    new_command(&strategy.command)?
        .log_debug()
        .run_with_cmd_context()
        .with_context(|| format!("Installing {name} ({})", strategy.label))
}

/// Install the dependency unless it is already present.
pub fn ensure_dependency(spec: &DependencySpec) -> Result<DependencyOutcome> {
    if dependency_present(spec)? {
        tracing::debug!("{} is already installed", spec.name);
        return Ok(DependencyOutcome::AlreadyPresent);
    }
    tracing::info!("{} is not installed", spec.name);
    match first_success(&spec.install, |s| install(&spec.name, s)) {
        Some(s) => {
            tracing::info!("Installed {} ({})", spec.name, s.label);
            Ok(DependencyOutcome::Installed {
                via: s.label.clone(),
            })
        }
        None if spec.required => Err(GuardError::DependencyUnavailable {
            name: spec.name.clone(),
        }
        .into()),
        None => {
            tracing::warn!("Could not install {}; continuing without it", spec.name);
            Ok(DependencyOutcome::Unresolved)
        }
    }
}
