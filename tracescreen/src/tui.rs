//! # Terminal User Interface (TUI)
//!
//! Full-screen live trace view using `ratatui`.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ TRACE | PID 1234 | [LIVE] [FOLLOW] | 812 lines           │  header
//! ├ Trace of process 1234 - nginx ───────────────────────────┤
//! │ 10:01:02.123 read(3, "...", 512) = 17 <0.000011>         │
//! │ ...                                                      │  TraceView
//! ├──────────────────────────────────────────────────────────┤
//! │ F3:Search F4:Filter F8:AutoScroll F9:Stop Tracing ...    │  function bar
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Sub-Modules
//!
//! - `view` - scrollable line list with search and filter
//! - `function_bar` - key hints and prompt line
//! - `theme` - Color scheme

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::debug;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::io::{self, IsTerminal};
use std::os::fd::{AsFd, BorrowedFd};
use std::time::{Duration, Instant};

mod function_bar;
mod theme;
pub mod view; // Public for integration tests

use theme::{tracer_status, CAUTION_AMBER, HUD_GREEN, STYLE_DIM, STYLE_HEADING};
pub use view::TraceView;

use crate::domain::TuiError;
use crate::event_loop::{InputEvent, KeySource};
use crate::screen::TraceScreen;
use crate::sink::LineView;

/// Minimum time between two frames while output is streaming in.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Keyboard, resize and mouse wheel input from the controlling terminal.
pub struct TerminalKeys {
    stdin: io::Stdin,
}

impl TerminalKeys {
    #[must_use]
    pub fn new() -> Self {
        Self { stdin: io::stdin() }
    }
}

impl Default for TerminalKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySource for TerminalKeys {
    fn wait_fd(&self) -> Option<BorrowedFd<'_>> {
        Some(self.stdin.as_fd())
    }

    fn next_event(&mut self) -> io::Result<Option<InputEvent>> {
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    return Ok(Some(InputEvent::Key(key.code)));
                }
                Event::Resize(..) => return Ok(Some(InputEvent::Resize)),
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => return Ok(Some(InputEvent::Key(KeyCode::Up))),
                    MouseEventKind::ScrollDown => {
                        return Ok(Some(InputEvent::Key(KeyCode::Down)));
                    }
                    _ => {}
                },
                _ => {}
            }
        }
        Ok(None)
    }
}

/// Run the trace screen until the operator closes it.
///
/// The tracer is torn down before the terminal is restored, also when the
/// loop fails.
///
/// # Errors
/// Returns an error if stdin is not a terminal, or terminal setup,
/// rendering or input fails.
pub fn run(mut screen: TraceScreen<TraceView>, interval: Duration) -> Result<()> {
    if !io::stdin().is_terminal() {
        screen.close();
        return Err(TuiError::TerminalError("stdin is not a terminal".to_string()).into());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut screen, interval);
    screen.close();

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    screen: &mut TraceScreen<TraceView>,
    interval: Duration,
) -> Result<()> {
    let mut keys = TerminalKeys::new();
    let mut dirty = true;
    let mut last_frame: Option<Instant> = None;

    loop {
        if dirty && last_frame.is_none_or(|t| t.elapsed() >= FRAME_INTERVAL) {
            terminal.draw(|f| draw(f, screen))?;
            last_frame = Some(Instant::now());
            dirty = false;
        }

        let outcome = screen.tick(&mut keys, interval)?;
        if outcome.closed {
            debug!("Trace screen closed");
            return Ok(());
        }
        dirty |= outcome.redraw;
    }
}

/// Render one frame: header, trace list, function bar.
pub fn draw(f: &mut Frame, screen: &mut TraceScreen<TraceView>) {
    let outer_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Trace lines
            Constraint::Length(3), // Function bar
        ])
        .split(f.area());

    render_header(f, outer_layout[0], screen);

    let title = screen.title();
    let state = screen.state();
    screen.view_mut().render(f, outer_layout[1], &title);
    function_bar::render(f, outer_layout[2], state, screen.view());
}

fn render_header(f: &mut Frame, area: Rect, screen: &TraceScreen<TraceView>) {
    let state = screen.state();
    let (status, status_color) =
        tracer_status(screen.session().is_some(), screen.is_tracer_alive(), state.capturing);
    let view = screen.view();

    let mut spans = vec![
        Span::styled("TRACE", STYLE_HEADING),
        Span::styled(" | ", STYLE_DIM),
        Span::styled(format!("PID {}", screen.target().0), Style::new().fg(HUD_GREEN)),
        Span::styled(" | ", STYLE_DIM),
        Span::styled(status, Style::new().fg(status_color)),
    ];
    if state.follow {
        spans.push(Span::styled(" [FOLLOW]", Style::new().fg(CAUTION_AMBER)));
    }
    spans.push(Span::styled(" | ", STYLE_DIM));
    let count = if view.len() == view.total_lines() {
        format!("{} lines", view.total_lines())
    } else {
        format!("{}/{} lines", view.len(), view.total_lines())
    };
    spans.push(Span::styled(count, Style::new().fg(HUD_GREEN)));

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).border_style(Style::new().fg(HUD_GREEN)));
    f.render_widget(header, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Pid;
    use ratatui::backend::TestBackend;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(ratatui::buffer::Cell::symbol).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_draw_unavailable_screen() {
        let mut screen = TraceScreen::unavailable(
            TraceView::new(),
            Pid(4321),
            "sleep",
            "Tracing unavailable on not supported system.",
        );
        let mut terminal = Terminal::new(TestBackend::new(100, 12)).unwrap();
        terminal.draw(|f| draw(f, &mut screen)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("PID 4321"));
        assert!(text.contains("[UNAVAILABLE]"));
        assert!(text.contains("Trace of process 4321 - sleep"));
        assert!(text.contains("Tracing unavailable on not supported system."));
        assert!(text.contains("Stop Tracing"));
    }

    #[test]
    fn test_draw_shows_follow_and_counts() {
        let mut screen = TraceScreen::unavailable(TraceView::new(), Pid(7), "cat", "first")
            .with_follow(true);
        screen.ingest(b"second\nthird\n");
        let mut terminal = Terminal::new(TestBackend::new(100, 12)).unwrap();
        terminal.draw(|f| draw(f, &mut screen)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("[FOLLOW]"));
        assert!(text.contains("3 lines"));
        assert!(text.contains("third"));
    }
}
