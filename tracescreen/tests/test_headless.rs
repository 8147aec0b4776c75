use std::time::Duration;

use tracescreen::domain::Pid;
use tracescreen::headless;
use tracescreen::tracer::{TraceSession, TracerCommand};

fn start(script: &str) -> TraceSession {
    let cmd = TracerCommand::new("/bin/sh", ["-c", script]);
    TraceSession::start(Pid::try_from(std::process::id()).unwrap(), &cmd).unwrap()
}

#[test]
fn test_output_matches_tracer_bytes() {
    let expected = "10:01:02.000001 write(1, \"héllo wörld\", 13) = 13 <0.000010>\n".repeat(100);
    let mut session = start(&format!("printf '%s' '{expected}'"));
    let mut out = Vec::new();

    let summary = headless::run(&mut session, &mut out, Duration::from_millis(1), None).unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), expected);
    assert_eq!(summary.lines, 100);
    assert_eq!(summary.bytes, expected.len());
    assert!(summary.tracer_exited);
}

#[test]
fn test_unterminated_last_line_is_closed() {
    let mut session = start("printf 'one\\ntwo'");
    let mut out = Vec::new();
    let summary = headless::run(&mut session, &mut out, Duration::from_millis(1), None).unwrap();
    assert_eq!(out, b"one\ntwo\n");
    assert_eq!(summary.lines, 2);
}
