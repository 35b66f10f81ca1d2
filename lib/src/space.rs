//! Free space checks.

use anyhow::Result;
use camino::Utf8Path;
use fn_error_context::context;

use crate::config::SpaceRequirement;
use crate::GuardError;

const MIB: u64 = 1024 * 1024;

/// Space available to unprivileged users on the filesystem holding
/// `path`, in MiB.
#[context("Querying available space on {path}")]
pub fn available_mb(path: &Utf8Path) -> Result<u64> {
    let st = rustix::fs::statvfs(path.as_std_path())?;
    Ok(st.f_bavail.saturating_mul(st.f_frsize) / MIB)
}

/// Compare a measured value against the requirement.
pub fn ensure_sufficient(path: &Utf8Path, available_mb: u64, required_mb: u64) -> Result<()> {
    if available_mb < required_mb {
        return Err(GuardError::InsufficientSpace {
            path: path.to_owned(),
            available_mb,
            required_mb,
        }
        .into());
    }
    Ok(())
}

/// Check the space requirement, returning the available MiB on success.
pub fn check_space(req: &SpaceRequirement) -> Result<u64> {
    let available = available_mb(&req.path)?;
    tracing::debug!(
        "{}: {available} MB available, {} MB required",
        req.path,
        req.threshold_mb
    );
    ensure_sufficient(&req.path, available, req.threshold_mb)?;
    Ok(available)
}
