//! # Guard command line
//!
//! The guard has no options of its own: every argument is passed to
//! the delegate exactly as given, so no argument parser sits in front of them.

use std::ffi::OsString;

use anyhow::Result;

use crate::config::GuardConfig;

/// Primary entrypoint. The first element of `args` is the program name and
/// is dropped; the rest are forwarded. On success the process becomes the
/// delegate, so this only returns on failure.
pub fn run_from_iter<I>(args: I) -> Result<()>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    let forwarded: Vec<OsString> = args.into_iter().skip(1).map(Into::into).collect();
    let config = GuardConfig::load()?;
    tracing::trace!("{config:?}");
    crate::guard::exec_guard(&config, &forwarded)
}
