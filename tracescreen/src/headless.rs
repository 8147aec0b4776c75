//! Headless mode: stream tracer output to a writer without a terminal UI.
//!
//! Runs the same wait/read/assemble cycle as the trace screen but writes
//! each line out as it completes. Useful for piping into other tools and
//! for running under CI where no TTY is available.

use anyhow::{Context, Result};
use log::{debug, info};
use std::io::Write;
use std::time::{Duration, Instant};

use crate::assembler::LineAssembler;
use crate::event_loop::{wait_ready, READ_CHUNK};
use crate::tracer::{ReadOutcome, TraceSession};

/// Reads allowed after the tracer exits, so a writer that outlived it
/// cannot keep the run going.
pub const EXIT_DRAIN_READS: usize = 64;

/// Totals for one headless run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadlessSummary {
    /// Lines written, including a final line without newline
    pub lines: usize,
    /// Raw bytes read from the tracer
    pub bytes: usize,
    /// The tracer exited on its own, as opposed to hitting the time limit
    pub tracer_exited: bool,
}

struct LineWriter<'a, W: Write> {
    out: &'a mut W,
    assembler: LineAssembler,
    summary: HeadlessSummary,
}

impl<W: Write> LineWriter<'_, W> {
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.summary.bytes += chunk.len();
        for edit in self.assembler.feed(chunk) {
            self.out.write_all(edit.text().as_bytes())?;
            if edit.is_complete() {
                self.out.write_all(b"\n")?;
                self.summary.lines += 1;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn finish(mut self) -> Result<HeadlessSummary> {
        if let Some(edit) = self.assembler.finish() {
            self.out.write_all(edit.text().as_bytes())?;
        }
        if self.assembler.has_pending_continuation() {
            self.out.write_all(b"\n")?;
            self.summary.lines += 1;
        }
        self.out.flush()?;
        Ok(self.summary)
    }
}

/// Copy `session` output to `out` line by line until the tracer exits or
/// `limit` elapses. The session is shut down before returning.
///
/// # Errors
/// Returns an error if waiting on the tracer or writing to `out` fails.
pub fn run<W: Write>(
    session: &mut TraceSession,
    out: &mut W,
    interval: Duration,
    limit: Option<Duration>,
) -> Result<HeadlessSummary> {
    let started = Instant::now();
    let mut writer =
        LineWriter { out, assembler: LineAssembler::new(), summary: HeadlessSummary::default() };
    let mut buf = [0u8; READ_CHUNK];

    info!("Streaming trace of process {} to output", session.target().0);
    loop {
        if limit.is_some_and(|limit| started.elapsed() >= limit) {
            debug!("Time limit reached after {:.1}s", started.elapsed().as_secs_f64());
            break;
        }

        let ready = wait_ready(None, session.stream_fd(), interval)
            .context("Failed waiting for tracer output")?;
        if ready.tracer {
            if let ReadOutcome::Data(n) = session.read_chunk(&mut buf) {
                writer.write_chunk(&buf[..n])?;
                continue;
            }
        }

        if !session.is_alive() || session.poll_exited() {
            // Last lines written just before exit, up to EXIT_DRAIN_READS chunks
            for _ in 0..EXIT_DRAIN_READS {
                let ReadOutcome::Data(n) = session.read_chunk(&mut buf) else { break };
                writer.write_chunk(&buf[..n])?;
            }
            writer.summary.tracer_exited = true;
            break;
        }
    }

    session.shutdown();
    let summary = writer.finish()?;
    info!("Wrote {} lines ({} bytes) from tracer", summary.lines, summary.bytes);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Pid;
    use crate::tracer::TracerCommand;

    fn sh(script: &str) -> TraceSession {
        let cmd = TracerCommand::new("/bin/sh", ["-c", script]);
        TraceSession::start(Pid::try_from(std::process::id()).unwrap(), &cmd).unwrap()
    }

    #[test]
    fn test_lines_are_copied_in_order() {
        let mut session = sh("printf 'alpha\\nbe'; sleep 0.05; printf 'ta\\ngamma'");
        let mut out = Vec::new();
        let summary = run(&mut session, &mut out, Duration::from_millis(1), None).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "alpha\nbeta\ngamma\n");
        assert_eq!(summary.lines, 3);
        assert_eq!(summary.bytes, 16);
        assert!(summary.tracer_exited);
        assert!(!session.is_alive());
    }

    #[test]
    fn test_stderr_is_captured() {
        let mut session = sh("echo out; echo err >&2");
        let mut out = Vec::new();
        run(&mut session, &mut out, Duration::from_millis(1), None).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("out\n"));
        assert!(text.contains("err\n"));
    }

    #[test]
    fn test_time_limit_stops_long_tracer() {
        let mut session = sh("echo started; exec sleep 30");
        let mut out = Vec::new();
        let summary = run(
            &mut session,
            &mut out,
            Duration::from_millis(1),
            Some(Duration::from_millis(300)),
        )
        .unwrap();

        assert!(!summary.tracer_exited);
        assert_eq!(String::from_utf8(out).unwrap(), "started\n");
        assert!(!session.is_alive());
    }

    #[test]
    fn test_silent_tracer_writes_nothing() {
        let mut session = sh("exit 0");
        let mut out = Vec::new();
        let summary = run(&mut session, &mut out, Duration::from_millis(1), None).unwrap();
        assert!(out.is_empty());
        assert_eq!(summary.lines, 0);
    }

    #[test]
    fn test_truncated_utf8_tail_is_flushed() {
        let mut session = sh("printf 'tail \\342\\202'");
        let mut out = Vec::new();
        let summary = run(&mut session, &mut out, Duration::from_millis(1), None).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "tail \u{FFFD}\n");
        assert_eq!(summary.lines, 1);
    }
}
