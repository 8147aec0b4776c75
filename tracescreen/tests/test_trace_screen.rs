//! End-to-end tests driving the trace screen tick loop against real child
//! processes, with `/bin/sh` standing in for the tracer.

use crossterm::event::KeyCode;
use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

use tracescreen::domain::{Pid, SpawnError};
use tracescreen::event_loop::{InputEvent, KeySource};
use tracescreen::screen::TraceScreen;
use tracescreen::sink::LineView;
use tracescreen::tracer::TracerCommand;
use tracescreen::tui::TraceView;

const INTERVAL: Duration = Duration::from_millis(1);
const TIMEOUT: Duration = Duration::from_secs(10);

/// Keys queued by the test, handed out on the next tick.
#[derive(Default)]
struct ScriptedKeys {
    queue: VecDeque<InputEvent>,
}

impl ScriptedKeys {
    fn press(&mut self, key: KeyCode) {
        self.queue.push_back(InputEvent::Key(key));
    }
}

impl KeySource for ScriptedKeys {
    fn next_event(&mut self) -> io::Result<Option<InputEvent>> {
        Ok(self.queue.pop_front())
    }
}

fn own_pid() -> Pid {
    Pid::try_from(std::process::id()).unwrap()
}

fn open(script: &str) -> TraceScreen<TraceView> {
    let cmd = TracerCommand::new("/bin/sh", ["-c", script]);
    TraceScreen::open(TraceView::new(), own_pid(), "test", Ok(cmd))
}

/// Like `open`, but the tracer stays alive briefly after its last write.
/// Output still in the pipe when exit is detected is never read.
fn open_lingering(script: &str) -> TraceScreen<TraceView> {
    open(&format!("{script}; sleep 0.2"))
}

fn tick_until<F>(screen: &mut TraceScreen<TraceView>, keys: &mut ScriptedKeys, done: F)
where
    F: Fn(&TraceScreen<TraceView>) -> bool,
{
    let started = Instant::now();
    while !done(screen) {
        assert!(started.elapsed() < TIMEOUT, "timed out waiting on the tracer");
        screen.tick(keys, INTERVAL).unwrap();
    }
}

fn run_to_exit(screen: &mut TraceScreen<TraceView>, keys: &mut ScriptedKeys) {
    tick_until(screen, keys, |s| !s.is_tracer_alive());
}

fn lines(screen: &TraceScreen<TraceView>) -> Vec<String> {
    let view = screen.view();
    (0..view.len()).filter_map(|i| view.line(i)).map(str::to_string).collect()
}

#[test]
fn test_tracer_exiting_immediately_leaves_empty_buffer() {
    let mut screen = open("exit 0");
    let mut keys = ScriptedKeys::default();
    run_to_exit(&mut screen, &mut keys);

    assert!(screen.view().is_empty());
    assert!(!screen.is_closed());

    // Ticks after exit neither read nor fail
    for _ in 0..5 {
        let outcome = screen.tick(&mut keys, INTERVAL).unwrap();
        assert!(!outcome.closed);
    }
    assert!(screen.view().is_empty());
}

#[test]
fn test_split_output_is_reassembled() {
    let mut screen = open_lingering("printf 'alpha\\nbe'; sleep 0.1; printf 'ta\\ngamma'");
    let mut keys = ScriptedKeys::default();
    run_to_exit(&mut screen, &mut keys);

    assert_eq!(lines(&screen), ["alpha", "beta", "gamma"]);
}

#[test]
fn test_output_after_pause_is_discarded() {
    let mut screen = open("sleep 0.3; echo hidden; echo also hidden");
    let mut keys = ScriptedKeys::default();
    keys.press(KeyCode::F(9));
    screen.tick(&mut keys, INTERVAL).unwrap();
    assert!(!screen.state().capturing);
    assert_eq!(screen.state().capture_label(), "Resume Tracing");

    run_to_exit(&mut screen, &mut keys);
    assert!(screen.view().is_empty());
}

#[test]
fn test_capture_resumes_with_new_output() {
    let mut screen = open_lingering("echo first; sleep 0.5; echo second");
    let mut keys = ScriptedKeys::default();
    tick_until(&mut screen, &mut keys, |s| s.view().len() == 1);

    keys.press(KeyCode::Char('t'));
    keys.press(KeyCode::Char('t'));
    run_to_exit(&mut screen, &mut keys);

    assert!(screen.state().capturing);
    assert_eq!(lines(&screen), ["first", "second"]);
}

#[test]
fn test_follow_keeps_newest_line_selected() {
    let mut screen = open_lingering("i=0; while [ $i -lt 200 ]; do echo \"line $i\"; i=$((i+1)); done");
    let mut keys = ScriptedKeys::default();
    keys.press(KeyCode::F(8));
    run_to_exit(&mut screen, &mut keys);

    assert!(screen.state().follow);
    assert_eq!(screen.view().len(), 200);
    assert_eq!(screen.view().selected_line(), Some("line 199"));
}

#[test]
fn test_navigation_drops_follow() {
    let mut screen = open_lingering("echo a; echo b; echo c").with_follow(true);
    let mut keys = ScriptedKeys::default();
    run_to_exit(&mut screen, &mut keys);
    assert_eq!(screen.view().selected(), 2);

    keys.press(KeyCode::Up);
    screen.tick(&mut keys, INTERVAL).unwrap();
    assert!(!screen.state().follow);
    assert_eq!(screen.view().selected_line(), Some("b"));
}

#[test]
fn test_quit_key_closes_and_stops_tracer() {
    let mut screen = open("echo started; exec sleep 30");
    let mut keys = ScriptedKeys::default();
    tick_until(&mut screen, &mut keys, |s| !s.view().is_empty());

    keys.press(KeyCode::Char('q'));
    let outcome = screen.tick(&mut keys, INTERVAL).unwrap();
    assert!(outcome.closed);
    assert!(screen.is_closed());
    assert!(!screen.is_tracer_alive());
    assert!(screen.session().is_some_and(|s| s.stream_fd().is_none()));

    // A closed screen reports closed without waiting
    assert!(screen.tick(&mut keys, INTERVAL).unwrap().closed);
}

#[test]
fn test_search_prompt_swallows_toggle_keys() {
    let mut screen = open("echo read; echo write; echo tty");
    let mut keys = ScriptedKeys::default();
    run_to_exit(&mut screen, &mut keys);

    for key in [KeyCode::Char('/'), KeyCode::Char('t'), KeyCode::Char('f')] {
        keys.press(key);
    }
    screen.tick(&mut keys, INTERVAL).unwrap();
    assert!(screen.state().capturing);
    assert!(!screen.state().follow);
    assert!(!screen.is_closed());
    assert_eq!(screen.view().search_text(), "tf");

    // Esc leaves the prompt instead of closing the screen
    keys.press(KeyCode::Esc);
    screen.tick(&mut keys, INTERVAL).unwrap();
    assert!(!screen.is_closed());
}

#[test]
fn test_filter_applies_to_live_output() {
    let mut screen = open_lingering("sleep 0.2; echo 'read(3)'; echo 'write(1)'; echo 'read(4)'");
    let mut keys = ScriptedKeys::default();
    keys.press(KeyCode::F(4));
    for c in "READ".chars() {
        keys.press(KeyCode::Char(c));
    }
    keys.press(KeyCode::Enter);
    run_to_exit(&mut screen, &mut keys);

    assert_eq!(lines(&screen), ["read(3)", "read(4)"]);
    assert_eq!(screen.view().total_lines(), 3);
}

#[test]
fn test_missing_tracer_shows_notice() {
    let cmd = TracerCommand::new("definitely-not-a-tracer-xyz", ["-p", "1"]);
    let mut screen = TraceScreen::open(TraceView::new(), own_pid(), "test", Ok(cmd));
    assert!(screen.session().is_none());
    assert_eq!(
        lines(&screen),
        ["Could not execute 'definitely-not-a-tracer-xyz'. Please make sure it is available in your $PATH."]
    );

    let mut keys = ScriptedKeys::default();
    keys.press(KeyCode::Esc);
    assert!(screen.tick(&mut keys, INTERVAL).unwrap().closed);
}

#[test]
fn test_unsupported_platform_shows_notice() {
    let screen =
        TraceScreen::open(TraceView::new(), own_pid(), "test", Err(SpawnError::UnsupportedPlatform));
    assert_eq!(lines(&screen), ["Tracing unavailable on not supported system."]);
    assert_eq!(screen.title(), format!("Trace of process {} - test", own_pid().0));
}

#[test]
fn test_stderr_and_stdout_share_the_buffer() {
    let mut screen = open_lingering("echo out; echo err >&2");
    let mut keys = ScriptedKeys::default();
    run_to_exit(&mut screen, &mut keys);

    let got = lines(&screen);
    assert_eq!(got.len(), 2);
    assert!(got.contains(&"out".to_string()));
    assert!(got.contains(&"err".to_string()));
}
