//! Pre-flight checks for tracescreen
//!
//! Validates the target and the tracer before anything is spawned.
//! Provides clear, actionable error messages when requirements aren't met.

#![allow(unsafe_code)] // kill() and geteuid() require unsafe

use anyhow::{bail, Result};
use std::io;
use std::path::PathBuf;

use crate::domain::{Pid, SpawnError};
use crate::tracer::TracerCommand;

/// Yama setting that restricts attaching to non-descendant processes
const PTRACE_SCOPE_PATH: &str = "/proc/sys/kernel/yama/ptrace_scope";

/// Check if the target process exists
///
/// # Errors
/// Returns an error if there is no process with this pid.
pub fn check_process_exists(pid: Pid) -> Result<()> {
    if pid.0 <= 0 {
        bail!("Invalid PID {}: must be a positive process id", pid.0);
    }

    // Signal 0 performs the existence and permission checks only
    // SAFETY: kill with signal 0 sends nothing
    if unsafe { libc::kill(pid.as_raw(), 0) } == 0 {
        return Ok(());
    }
    match io::Error::last_os_error().raw_os_error() {
        // Exists but belongs to someone else; the tracer reports the details
        Some(libc::EPERM) => Ok(()),
        _ => bail!(
            "Process {} not found.\n\n\
             Is the process still running? Check with: ps -p {}",
            pid.0,
            pid.0
        ),
    }
}

/// Locate the tracer executable.
///
/// # Errors
/// Returns [`SpawnError::TracerMissing`] if the program cannot be found.
pub fn check_tracer(command: &TracerCommand) -> Result<PathBuf> {
    which::which(command.program()).map_err(|_| {
        SpawnError::TracerMissing { program: command.display_name() }.into()
    })
}

/// Print warnings about settings likely to make the attach fail.
pub fn warn_about_privileges(quiet: bool) {
    if quiet {
        return;
    }
    // SAFETY: geteuid has no preconditions
    let is_root = unsafe { libc::geteuid() } == 0;
    let scope = std::fs::read_to_string(PTRACE_SCOPE_PATH).ok();
    if let Some(warning) = scope.as_deref().and_then(|s| ptrace_scope_warning(s, is_root)) {
        eprintln!("warning: {warning}");
    }
}

/// Warning text for a Yama `ptrace_scope` value, if one applies.
fn ptrace_scope_warning(scope: &str, is_root: bool) -> Option<String> {
    let level: u8 = scope.trim().parse().ok()?;
    match level {
        0 => None,
        1 | 2 if is_root => None,
        1 => Some(
            "ptrace_scope is 1, attaching to a process that is not a child needs root \
             (run with sudo)"
                .to_string(),
        ),
        2 => Some("ptrace_scope is 2, only root can attach (run with sudo)".to_string()),
        _ => Some(format!("ptrace_scope is {level}, attaching is disabled on this system")),
    }
}
