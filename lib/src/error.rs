//! Guard failures and the exit codes reported for them.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Exit code for errors that are not a [`GuardError`].
pub const EXIT_FAILURE: i32 = 1;
/// Exit code when required tools are missing.
pub const EXIT_MISSING_TOOLS: i32 = 3;
/// Exit code when the scratch filesystem is too full.
pub const EXIT_INSUFFICIENT_SPACE: i32 = 4;
/// Exit code when a required dependency could not be installed.
pub const EXIT_DEPENDENCY_UNAVAILABLE: i32 = 5;

/// A failed precondition which stops the guard before the delegate runs.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum GuardError {
    #[error("Missing required tools: {}", .0.join(", "))]
    MissingTools(Vec<String>),
    #[error("Insufficient space on {path}: {available_mb} MB available, {required_mb} MB required")]
    InsufficientSpace {
        path: Utf8PathBuf,
        available_mb: u64,
        required_mb: u64,
    },
    #[error("Dependency {name} is not installed and all install attempts failed")]
    DependencyUnavailable { name: String },
}

impl GuardError {
    /// The process exit code reported for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            GuardError::MissingTools(_) => EXIT_MISSING_TOOLS,
            GuardError::InsufficientSpace { .. } => EXIT_INSUFFICIENT_SPACE,
            GuardError::DependencyUnavailable { .. } => EXIT_DEPENDENCY_UNAVAILABLE,
        }
    }
}

/// Find the exit code for an error, looking through any added context.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|e| e.downcast_ref::<GuardError>())
        .map_or(EXIT_FAILURE, GuardError::exit_code)
}
