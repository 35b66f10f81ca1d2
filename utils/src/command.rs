//! Helpers intended for [`std::process::Command`] and related structures.

use std::ffi::OsStr;
use std::fmt::Display;
use std::os::unix::process::ExitStatusExt;
use std::process::{Command, ExitStatus, Stdio};

use anyhow::{Context, Result, bail};

/// Exit code reported by POSIX shells for a child killed by a signal is
/// this value plus the signal number.
const SIGNAL_EXIT_BASE: i32 = 128;

/// Build a [`Command`] from an argv vector, where the first element is the
/// program and the remaining elements are its arguments.
pub fn new_command<S: AsRef<OsStr>>(argv: &[S]) -> Result<Command> {
    let Some((program, args)) = argv.split_first() else {
        bail!("Empty command line");
    };
    let mut cmd = Command::new(program);
    cmd.args(args);
    Ok(cmd)
}

/// Map a child exit status onto the exit code a shell would report for it.
pub fn exit_code(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signo)) => SIGNAL_EXIT_BASE + signo,
        // Neither an exit code nor a signal; treat as a generic failure
        (None, None) => 1,
    }
}

/// Render a command line with POSIX shell quoting, for log messages.
#[derive(Debug)]
pub struct CommandDisplay<'a> {
    cmd: &'a Command,
}

impl<'a> CommandDisplay<'a> {
    /// Wrap the provided command.
    pub fn new(cmd: &'a Command) -> Self {
        Self { cmd }
    }
}

impl Display for CommandDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let words = std::iter::once(self.cmd.get_program()).chain(self.cmd.get_args());
        for (i, word) in words.enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            let word = word.to_string_lossy();
            match shlex::try_quote(&word) {
                Ok(quoted) => f.write_str(&quoted)?,
                // Only possible with an embedded NUL
                Err(_) => write!(f, "{word:?}")?,
            }
        }
        Ok(())
    }
}

/// Helpers intended for [`std::process::Command`].
pub trait CommandRunExt {
    /// Log (at debug level) the full child commandline.
    fn log_debug(&mut self) -> &mut Self;

    /// Execute the child process with inherited stdio and return its status.
    fn run_status(&mut self) -> Result<ExitStatus>;

    /// Execute the child process; an unsuccessful exit is an error
    /// that includes the command line.
    fn run_with_cmd_context(&mut self) -> Result<()>;

    /// Run the child with all stdio detached, reporting only whether it
    /// exited successfully. A child that cannot be spawned did not succeed.
    fn probe(&mut self) -> bool;
}

impl CommandRunExt for Command {
    fn log_debug(&mut self) -> &mut Self {
        tracing::debug!("exec: {}", CommandDisplay::new(self));
        self
    }

    fn run_status(&mut self) -> Result<ExitStatus> {
        self.status()
            .with_context(|| format!("Spawning {}", CommandDisplay::new(self)))
    }

    fn run_with_cmd_context(&mut self) -> Result<()> {
        let st = self.run_status()?;
        if !st.success() {
            bail!("Subprocess failed: {}: {st}", CommandDisplay::new(self));
        }
        Ok(())
    }

    fn probe(&mut self) -> bool {
        self.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        match self.status() {
            Ok(st) => {
                tracing::debug!("probe {}: {st}", CommandDisplay::new(self));
                st.success()
            }
            Err(e) => {
                tracing::debug!("probe {}: {e}", CommandDisplay::new(self));
                false
            }
        }
    }
}
