//! # tracescreen - Live System Call Trace Viewer
//!
//! tracescreen attaches the platform's syscall tracer (`strace` on Linux,
//! `truss` on the BSDs and Solaris) to a running process and shows its
//! output as a live, scrollable list. The operator can pause and resume
//! capture and have the view follow the newest line.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Target Process                           │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ ptrace
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │            strace -T -tt -s 512 -p PID  /  truss ...            │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ stdout + stderr, one non-blocking pipe
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  tracescreen (This Crate)                       │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │   tracer     │──▶│  assembler   │──▶│    sink      │         │
//! │  │(TraceSession)│   │ (LineEdits)  │   │ (LineView)   │         │
//! │  └──────────────┘   └──────────────┘   └──────┬───────┘         │
//! │         ▲                                     │                 │
//! │         │ poll(key fd, tracer fd)             ▼                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │  event_loop  │──▶│    screen    │   │ tui/headless │         │
//! │  │   (tick)     │   │ (F8/F9 state)│   │  (output)    │         │
//! │  └──────────────┘   └──────────────┘   └──────────────┘         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! ### Core Pipeline Modules
//!
//! - [`tracer`]: tracer command line per platform, child spawn over a
//!   non-blocking pipe, exit detection and teardown
//! - [`assembler`]: turn arbitrarily split reads into whole display lines
//! - [`event_loop`]: the bounded `poll(2)` wait and the per-tick read/exit/key cycle
//! - [`screen`]: capture and follow toggles, close handling, the capture gate
//! - [`sink`]: the [`sink::LineView`] capability the screen writes through
//!
//! ### UI and Support Modules
//!
//! - [`tui`]: ratatui trace list with search and filter, function key bar
//! - [`headless`]: stream the trace to any writer without a terminal
//! - [`cli`]: Command-line argument parsing and configuration
//! - [`process_lookup`]: resolve a process name to a PID via `/proc`
//! - [`preflight`]: target and tracer checks before spawning
//! - [`domain`]: Core domain types and errors
//!
//! ## Typical Usage
//!
//! ```bash
//! # Trace a process by PID
//! sudo ./tracescreen --pid <PID>
//!
//! # Follow the newest call from the start
//! sudo ./tracescreen nginx --follow
//!
//! # Stream for 10 seconds without the TUI
//! sudo ./tracescreen --pid <PID> --headless --duration 10 > trace.log
//! ```

// Expose modules for testing
pub mod assembler;
pub mod cli;
pub mod domain;
pub mod event_loop;
pub mod headless;
pub mod preflight;
pub mod process_lookup;
pub mod screen;
pub mod sink;
pub mod tracer;
pub mod tui;
