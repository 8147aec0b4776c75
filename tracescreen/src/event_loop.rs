//! Single-threaded tick loop.
//!
//! Each tick waits, for at most one interval, on the keyboard and the tracer
//! stream together, then services whichever is ready:
//!
//! ```text
//!            poll(key_fd, tracer_fd, interval)
//!                 │                    │
//!   tracer ready ─┤                    ├─ nothing / empty read
//!                 ▼                    ▼
//!   read ≤ READ_CHUNK bytes      tracer alive? → poll_exited
//!   capturing? → assemble           exited → never read again
//!                 │                    │
//!                 └──────┬─────────────┘
//!                        ▼
//!              pending key events → handle_key
//! ```
//!
//! The poll is the only place the loop blocks. A tick either reads or checks
//! for exit, never both, so a stream is not read once it is flagged dead.

#![allow(unsafe_code)] // poll(2) requires unsafe

use std::io;
use std::os::fd::{AsRawFd, BorrowedFd};
use std::time::Duration;

use crossterm::event::KeyCode;

use crate::screen::{KeyOutcome, TraceScreen};
use crate::sink::LineView;
use crate::tracer::{ReadOutcome, TraceSession};

/// Upper bound on bytes taken from the tracer per tick.
pub const READ_CHUNK: usize = 1024;

/// Key events handled per tick before going back to the tracer.
pub const MAX_KEYS_PER_TICK: usize = 64;

/// Default bound on the per-tick wait.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1);

/// Input relevant to the trace screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyCode),
    /// The terminal changed size; only a redraw is needed
    Resize,
}

/// Source of operator input.
pub trait KeySource {
    /// Descriptor that becomes readable when input is pending, if any.
    ///
    /// Only used to wake the wait early; `next_event` is always consulted.
    fn wait_fd(&self) -> Option<BorrowedFd<'_>> {
        None
    }

    /// Next pending event without blocking.
    ///
    /// # Errors
    /// Returns an error if the input device cannot be read.
    fn next_event(&mut self) -> io::Result<Option<InputEvent>>;
}

/// Which descriptors `wait_ready` found readable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Readiness {
    pub keys: bool,
    pub tracer: bool,
}

/// Wait up to `timeout` for either descriptor to become readable.
///
/// The timeout is rounded up to whole milliseconds (at least 1). A wait
/// interrupted by a signal reports nothing ready.
///
/// # Errors
/// Returns the `poll(2)` error for anything other than `EINTR`.
pub fn wait_ready(
    key_fd: Option<BorrowedFd<'_>>,
    tracer_fd: Option<BorrowedFd<'_>>,
    timeout: Duration,
) -> io::Result<Readiness> {
    let mut fds: Vec<libc::pollfd> = [key_fd, tracer_fd]
        .into_iter()
        .map(|fd| libc::pollfd {
            // A negative fd is skipped by poll(2), which keeps the slots fixed.
            fd: fd.map_or(-1, |fd| fd.as_raw_fd()),
            events: libc::POLLIN,
            revents: 0,
        })
        .collect();

    let millis = libc::c_int::try_from(timeout.as_micros().div_ceil(1000))
        .unwrap_or(libc::c_int::MAX)
        .max(1);

    // SAFETY: fds is a valid, initialised array of pollfd for its whole length
    #[allow(clippy::cast_possible_truncation)]
    let ready = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, millis) };
    if ready == -1 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(Readiness::default());
        }
        return Err(err);
    }

    let is_ready = |pfd: &libc::pollfd| {
        pfd.fd >= 0 && pfd.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0
    };
    Ok(Readiness { keys: is_ready(&fds[0]), tracer: is_ready(&fds[1]) })
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Display content or state changed
    pub redraw: bool,
    /// The screen was closed during this tick
    pub closed: bool,
}

impl<V: LineView> TraceScreen<V> {
    /// Run one iteration of the event loop.
    ///
    /// # Errors
    /// Returns an error if the wait itself fails or the key source cannot be
    /// read. Tracer read errors never surface here.
    pub fn tick<K: KeySource + ?Sized>(
        &mut self,
        keys: &mut K,
        interval: Duration,
    ) -> io::Result<TickOutcome> {
        let mut outcome = TickOutcome::default();
        if self.is_closed() {
            outcome.closed = true;
            return Ok(outcome);
        }

        let ready = {
            let tracer_fd = self.session.as_ref().and_then(|s| s.stream_fd());
            wait_ready(keys.wait_fd(), tracer_fd, interval)?
        };

        let mut buf = [0u8; READ_CHUNK];
        outcome.redraw |= self.service_tracer(ready.tracer, &mut buf);

        for _ in 0..MAX_KEYS_PER_TICK {
            match keys.next_event()? {
                Some(InputEvent::Key(key)) => match self.handle_key(key) {
                    KeyOutcome::Redraw => outcome.redraw = true,
                    KeyOutcome::Unchanged => {}
                    KeyOutcome::Close => {
                        outcome.closed = true;
                        break;
                    }
                },
                Some(InputEvent::Resize) => outcome.redraw = true,
                None => break,
            }
        }

        Ok(outcome)
    }

    /// Read once if the tracer stream is ready; if nothing was read, check
    /// whether the tracer exited. Returns true if the display changed.
    pub(crate) fn service_tracer(&mut self, tracer_ready: bool, buf: &mut [u8]) -> bool {
        if !self.is_tracer_alive() {
            return false;
        }

        if tracer_ready {
            if let Some(ReadOutcome::Data(n)) = self.session.as_mut().map(|s| s.read_chunk(buf)) {
                return self.ingest(&buf[..n]);
            }
        }

        if !self.session.as_mut().is_some_and(TraceSession::poll_exited) {
            return false;
        }
        self.finish_stream();
        // The status line changes even with no new text
        true
    }
}
