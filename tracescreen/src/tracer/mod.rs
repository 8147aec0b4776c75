//! Child process control for the external syscall tracer.
//!
//! - [`TracerCommand`]: which executable to run and with which arguments
//! - [`TraceSession`]: one spawned tracer, its output pipe and its lifecycle

mod session;

pub use session::{ReadOutcome, TraceSession, TRACER_EXEC_FAILED};

use crate::domain::{Pid, SpawnError};
use std::ffi::OsString;

/// Default per-call string truncation passed to the tracer (`-s`).
pub const DEFAULT_STRING_LIMIT: usize = 512;

/// Tracer executable for this platform, if one is known.
#[cfg(target_os = "linux")]
pub const PLATFORM_TRACER: Option<&str> = Some("strace");

#[cfg(any(
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly",
    target_os = "illumos",
    target_os = "solaris"
))]
pub const PLATFORM_TRACER: Option<&str> = Some("truss");

#[cfg(not(any(
    target_os = "linux",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly",
    target_os = "illumos",
    target_os = "solaris"
)))]
pub const PLATFORM_TRACER: Option<&str> = None;

/// A fully resolved tracer invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracerCommand {
    program: OsString,
    args: Vec<OsString>,
}

impl TracerCommand {
    /// Arbitrary command. The caller is responsible for binding it to a pid.
    pub fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: Into<OsString>,
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        Self { program: program.into(), args: args.into_iter().map(Into::into).collect() }
    }

    /// The platform tracer attached to `pid`.
    ///
    /// # Errors
    /// [`SpawnError::UnsupportedPlatform`] when neither `strace` nor `truss`
    /// applies to this platform.
    pub fn for_platform(pid: Pid, string_limit: usize) -> Result<Self, SpawnError> {
        let program = PLATFORM_TRACER.ok_or(SpawnError::UnsupportedPlatform)?;
        Self::with_program(program, pid, string_limit)
    }

    /// Run `program` with this platform's tracer arguments.
    ///
    /// Used for `--tracer`, e.g. a tracer installed outside `$PATH`.
    ///
    /// # Errors
    /// [`SpawnError::UnsupportedPlatform`] on platforms without a known
    /// argument vocabulary.
    pub fn with_program(
        program: impl Into<OsString>,
        pid: Pid,
        string_limit: usize,
    ) -> Result<Self, SpawnError> {
        let args = platform_args(pid, string_limit).ok_or(SpawnError::UnsupportedPlatform)?;
        Ok(Self::new(program, args))
    }

    #[must_use]
    pub fn program(&self) -> &OsString {
        &self.program
    }

    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Program name for messages.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

#[cfg(target_os = "linux")]
#[allow(clippy::unnecessary_wraps)]
fn platform_args(pid: Pid, string_limit: usize) -> Option<Vec<String>> {
    // -T: time spent in each call, -tt: wall clock with microseconds
    Some(vec![
        "-T".to_string(),
        "-tt".to_string(),
        "-s".to_string(),
        string_limit.to_string(),
        "-p".to_string(),
        pid.0.to_string(),
    ])
}

#[cfg(any(
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly",
    target_os = "illumos",
    target_os = "solaris"
))]
#[allow(clippy::unnecessary_wraps)]
fn platform_args(pid: Pid, string_limit: usize) -> Option<Vec<String>> {
    Some(vec!["-s".to_string(), string_limit.to_string(), "-p".to_string(), pid.0.to_string()])
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly",
    target_os = "illumos",
    target_os = "solaris"
)))]
fn platform_args(_pid: Pid, _string_limit: usize) -> Option<Vec<String>> {
    None
}
