//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::tracer::DEFAULT_STRING_LIMIT;

#[derive(Parser, Debug)]
#[command(
    name = "tracescreen",
    version,
    about = "Live system call trace of a running process",
    after_help = "\
KEYS:
    F8 / f      Toggle auto-follow of the newest line
    F9 / t      Stop / resume tracing
    F3 / /      Search          F4 / \\      Filter
    Esc / q     Close and detach the tracer

EXAMPLES:
    sudo tracescreen nginx                   Find the PID by process name
    sudo tracescreen --pid 1234              Explicit PID
    sudo tracescreen -p 1234 --headless      Stream the trace to stdout"
)]
pub struct Args {
    /// Process name to trace (PID auto-detected from /proc)
    #[arg(value_name = "PROCESS", conflicts_with = "pid")]
    pub process: Option<String>,

    /// Process ID to trace
    #[arg(short, long)]
    pub pid: Option<i32>,

    /// Tracer executable to run instead of the platform default (strace/truss)
    #[arg(long, value_name = "PROGRAM")]
    pub tracer: Option<String>,

    /// Maximum string size printed by the tracer
    #[arg(short = 's', long, default_value_t = DEFAULT_STRING_LIMIT)]
    pub string_limit: usize,

    /// Upper bound on each wait for tracer output or keys, in milliseconds
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: u64,

    /// Start with auto-follow enabled
    #[arg(short, long)]
    pub follow: bool,

    /// Stream the trace to stdout instead of opening the TUI
    #[arg(long)]
    pub headless: bool,

    /// Stop after N seconds in headless mode (0 = until the tracer exits)
    #[arg(long, default_value = "0", requires = "headless")]
    pub duration: u64,

    /// Write logs to FILE (logging is otherwise off while the TUI runs)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Headless time limit, `None` when unlimited.
    #[must_use]
    pub fn duration_limit(&self) -> Option<Duration> {
        (self.duration > 0).then(|| Duration::from_secs(self.duration))
    }
}
