//! Tracer session: spawn, non-blocking output pipe, exit detection, teardown.

#![allow(unsafe_code)] // pipe(2), fcntl(2) and kill(2) require unsafe

use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd};
use std::process::{Child, Command, Stdio};

use log::{debug, info, warn};

use super::TracerCommand;
use crate::domain::{Pid, SpawnError};

/// Exit status a tracer wrapper uses when its `exec` fails.
///
/// Such a child exits right away having written only its diagnostic, so it
/// is handled like any other tracer that died; the status is only logged.
pub const TRACER_EXEC_FAILED: i32 = 127;

/// Result of one read attempt on the tracer stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` bytes were placed at the start of the buffer
    Data(usize),
    /// Nothing available: would block, EOF, or a transient read error
    Empty,
}

/// One running tracer bound to a target process.
///
/// Owns the child and the read end of its output pipe. Dropping the session
/// tears it down.
#[derive(Debug)]
pub struct TraceSession {
    target: Pid,
    child: Option<Child>,
    alive: bool,
    stream: Option<File>,
}

impl TraceSession {
    /// Spawn `command` with stdout and stderr both redirected into one
    /// non-blocking pipe.
    ///
    /// # Errors
    /// Returns [`SpawnError`] if the pipe cannot be created or configured, or
    /// if the tracer process cannot be started. Descriptors created before the
    /// failure are closed.
    pub fn start(target: Pid, command: &TracerCommand) -> Result<Self, SpawnError> {
        let (read_end, write_end) = cloexec_pipe().map_err(SpawnError::Pipe)?;
        set_nonblocking(read_end.as_fd()).map_err(SpawnError::NonBlocking)?;
        set_nonblocking(write_end.as_fd()).map_err(SpawnError::NonBlocking)?;

        let stderr_end = write_end.try_clone().map_err(SpawnError::Pipe)?;

        // The Command temporary owns our copies of the write end and drops
        // them at the end of this statement, so EOF reaches the reader once
        // the child exits.
        let child = Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::from(write_end))
            .stderr(Stdio::from(stderr_end))
            .spawn()
            .map_err(|source| {
                let program = command.display_name();
                if source.kind() == io::ErrorKind::NotFound {
                    SpawnError::TracerMissing { program }
                } else {
                    SpawnError::ProcessCreation { program, source }
                }
            })?;

        info!(
            "Started {} (child {}) tracing process {}",
            command.display_name(),
            child.id(),
            target.0
        );

        Ok(Self { target, child: Some(child), alive: true, stream: Some(File::from(read_end)) })
    }

    /// Process being traced.
    #[must_use]
    pub fn target(&self) -> Pid {
        self.target
    }

    /// Pid of the tracer child while it is tracked.
    #[must_use]
    pub fn child_pid(&self) -> Option<Pid> {
        self.child.as_ref().and_then(|c| Pid::try_from(c.id()).ok())
    }

    /// False once the child has been observed to exit or the session was shut down.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Descriptor to wait on for output, while the tracer is alive.
    #[must_use]
    pub fn stream_fd(&self) -> Option<BorrowedFd<'_>> {
        if self.alive {
            self.stream.as_ref().map(AsFd::as_fd)
        } else {
            None
        }
    }

    /// Non-blocking check for tracer exit.
    ///
    /// Reaps the child if it has exited. Once this returns true it keeps
    /// returning true, including after [`shutdown`](Self::shutdown).
    pub fn poll_exited(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            self.alive = false;
            return true;
        };

        match child.try_wait() {
            Ok(Some(status)) => {
                if self.alive {
                    if status.code() == Some(TRACER_EXEC_FAILED) {
                        warn!("Tracer could not be executed ({status})");
                    } else {
                        info!("Tracer for process {} exited ({status})", self.target.0);
                    }
                }
                self.alive = false;
                true
            }
            Ok(None) => false,
            Err(e) => {
                debug!("waitpid on tracer failed, treating it as exited: {e}");
                self.alive = false;
                true
            }
        }
    }

    /// Read at most `buf.len()` bytes without blocking.
    ///
    /// Read errors are not fatal to the session; they are logged and reported
    /// as an empty read so the caller falls through to the exit check.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> ReadOutcome {
        let Some(stream) = self.stream.as_mut() else {
            return ReadOutcome::Empty;
        };

        match stream.read(buf) {
            Ok(0) => ReadOutcome::Empty,
            Ok(n) => ReadOutcome::Data(n),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
                ReadOutcome::Empty
            }
            Err(e) => {
                debug!("Read from tracer stream failed: {e}");
                ReadOutcome::Empty
            }
        }
    }

    /// Terminate and reap the tracer, then close the stream.
    ///
    /// Idempotent. A child that already exited is reaped without being
    /// signalled.
    pub fn shutdown(&mut self) {
        if let Some(mut child) = self.child.take() {
            if !matches!(child.try_wait(), Ok(Some(_))) {
                terminate(&child);
                reap(&mut child);
            }
        }
        self.alive = false;
        self.stream = None;
    }
}

impl Drop for TraceSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn terminate(child: &Child) {
    let Ok(pid) = Pid::try_from(child.id()) else {
        return;
    };
    // SAFETY: kill(2) has no memory-safety preconditions; the pid belongs to
    // a child we have not reaped yet, so it cannot have been recycled.
    if unsafe { libc::kill(pid.as_raw(), libc::SIGTERM) } == -1 {
        debug!("SIGTERM to tracer {} failed: {}", pid.0, io::Error::last_os_error());
    }
}

/// Wait for the child, retrying when a signal interrupts the wait.
fn reap(child: &mut Child) {
    loop {
        match child.wait() {
            Ok(status) => {
                debug!("Reaped tracer {} ({status})", child.id());
                return;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                warn!("Failed to reap tracer {}: {e}", child.id());
                return;
            }
        }
    }
}

#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly",
    target_os = "illumos",
    target_os = "solaris"
))]
fn cloexec_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    let mut fds: [libc::c_int; 2] = [-1, -1];
    // SAFETY: fds is a valid two-element array for pipe2 to fill
    if unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) } == -1 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: pipe2 succeeded, both descriptors are open and owned by nobody else
    Ok(unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) })
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly",
    target_os = "illumos",
    target_os = "solaris"
)))]
fn cloexec_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    let mut fds: [libc::c_int; 2] = [-1, -1];
    // SAFETY: fds is a valid two-element array for pipe to fill
    if unsafe { libc::pipe(fds.as_mut_ptr()) } == -1 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: pipe succeeded, both descriptors are open and owned by nobody else
    let (read_end, write_end) =
        unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };
    set_fd_flag(read_end.as_fd(), libc::F_GETFD, libc::F_SETFD, libc::FD_CLOEXEC)?;
    set_fd_flag(write_end.as_fd(), libc::F_GETFD, libc::F_SETFD, libc::FD_CLOEXEC)?;
    Ok((read_end, write_end))
}

fn set_nonblocking(fd: BorrowedFd<'_>) -> io::Result<()> {
    set_fd_flag(fd, libc::F_GETFL, libc::F_SETFL, libc::O_NONBLOCK)
}

fn set_fd_flag(
    fd: BorrowedFd<'_>,
    get: libc::c_int,
    set: libc::c_int,
    flag: libc::c_int,
) -> io::Result<()> {
    let raw = fd.as_raw_fd();
    // SAFETY: raw is a live descriptor borrowed for the duration of the call
    let flags = unsafe { libc::fcntl(raw, get) };
    if flags == -1 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: as above
    if unsafe { libc::fcntl(raw, set, flags | flag) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
