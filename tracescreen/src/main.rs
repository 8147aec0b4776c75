//! # tracescreen - Main Entry Point
//!
//! Supports two operational modes:
//! - **Live TUI** (`--pid <PID>` or `tracescreen <PROCESS>`): interactive trace screen
//! - **Headless** (`--headless`): stream the trace to stdout, no terminal needed

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::fs::File;
use std::io;

use tracescreen::cli::Args;
use tracescreen::domain::Pid;
use tracescreen::preflight::{check_process_exists, check_tracer, warn_about_privileges};
use tracescreen::process_lookup::{command_for_pid, find_process_by_name};
use tracescreen::screen::TraceScreen;
use tracescreen::tracer::{TraceSession, TracerCommand};
use tracescreen::{headless, tui};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_NOPERM: i32 = 77;

fn main() {
    let args = Args::parse();
    std::process::exit(match run(&args) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let msg = err.to_string().to_lowercase();
    if msg.contains("permission denied") || msg.contains("not permitted") {
        EXIT_NOPERM
    } else if msg.contains("missing required argument") {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

/// Set up `env_logger` for the chosen mode.
///
/// Log lines would tear the TUI apart, so without `--log-file` logging
/// stays off unless running headless (stderr).
fn init_logging(args: &Args) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(ref path) = args.log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file: {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    } else if !args.headless {
        return Ok(());
    }
    builder.init();
    Ok(())
}

/// Resolve the target PID and its command line from CLI arguments.
///
/// - `tracescreen nginx` - find process by name
/// - `tracescreen --pid 1234` - explicit PID
fn resolve_target(args: &Args) -> Result<(Pid, String)> {
    if let Some(ref name) = args.process {
        let info = find_process_by_name(name)?;
        return Ok((info.pid, info.command));
    }

    if let Some(pid) = args.pid {
        let pid = Pid(pid);
        check_process_exists(pid)?;
        return Ok((pid, command_for_pid(pid)));
    }

    anyhow::bail!(
        "Missing required argument: PROCESS or --pid\n\n\
         Usage:\n  \
         tracescreen nginx             Find the PID by process name\n  \
         tracescreen --pid 1234        Explicit PID\n\n\
         Run 'tracescreen --help' for more options"
    )
}

fn run(args: &Args) -> Result<()> {
    init_logging(args)?;

    let (pid, command) = resolve_target(args)?;
    let tracer = match args.tracer {
        Some(ref program) => TracerCommand::with_program(program, pid, args.string_limit),
        None => TracerCommand::for_platform(pid, args.string_limit),
    };

    // A missing tracer is fatal headless; the TUI shows it as a notice line
    if let Ok(ref cmd) = tracer {
        match check_tracer(cmd) {
            Ok(path) => info!("Using tracer {}", path.display()),
            Err(e) if args.headless => return Err(e),
            Err(e) => warn!("{e}"),
        }
    }
    warn_about_privileges(args.quiet);

    if !args.quiet {
        eprintln!("tracescreen v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("pid: {}", pid.0);
        eprintln!("command: {command}");
        if let Ok(ref cmd) = tracer {
            eprintln!("tracer: {}", cmd.display_name());
        }
    }

    if args.headless {
        let mut session = TraceSession::start(pid, &tracer?)?;
        let stdout = io::stdout();
        let summary =
            headless::run(&mut session, &mut stdout.lock(), args.interval(), args.duration_limit())?;
        if !args.quiet {
            let reason = if summary.tracer_exited { "tracer exited" } else { "duration limit reached" };
            eprintln!("\n{reason}: {} lines, {} bytes", summary.lines, summary.bytes);
        }
        return Ok(());
    }

    let screen =
        TraceScreen::open(tui::TraceView::new(), pid, command, tracer).with_follow(args.follow);
    tui::run(screen, args.interval())
}
