//! Trace screen controller.
//!
//! Glues the tracer session, the line assembler and a [`LineView`] together
//! and owns the two pieces of operator state:
//!
//! | state       | toggled by | effect                                      |
//! |-------------|------------|---------------------------------------------|
//! | `capturing` | F9 / `t`   | tracer bytes are assembled, or drained      |
//! | `follow`    | F8 / `f`   | selection pinned to the newest line         |
//!
//! Any other key disengages follow and goes to the view. Esc / `q` / F10
//! close the screen and tear the tracer down.

use crossterm::event::KeyCode;
use log::{info, warn};

use crate::assembler::LineAssembler;
use crate::domain::{Pid, SpawnError};
use crate::sink::{apply_edit, pin_to_newest, LineView};
use crate::tracer::{TraceSession, TracerCommand};

/// Operator-controlled screen state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenState {
    /// Tracer output is being added to the display
    pub capturing: bool,
    /// Selection follows the newest line
    pub follow: bool,
}

impl Default for ScreenState {
    fn default() -> Self {
        Self { capturing: true, follow: false }
    }
}

impl ScreenState {
    /// Hint for the capture toggle key: what pressing it will do.
    #[must_use]
    pub fn capture_label(&self) -> &'static str {
        if self.capturing {
            "Stop Tracing"
        } else {
            "Resume Tracing"
        }
    }
}

/// What the caller should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Redraw,
    Unchanged,
    /// The screen was closed and the tracer torn down
    Close,
}

/// The live trace screen for one target process.
pub struct TraceScreen<V: LineView> {
    pub(crate) view: V,
    pub(crate) state: ScreenState,
    pub(crate) assembler: LineAssembler,
    pub(crate) session: Option<TraceSession>,
    target: Pid,
    command: String,
    closed: bool,
}

impl<V: LineView> TraceScreen<V> {
    /// Screen over a running tracer session.
    pub fn new(view: V, session: TraceSession, command: impl Into<String>) -> Self {
        let target = session.target();
        Self {
            view,
            state: ScreenState::default(),
            assembler: LineAssembler::new(),
            session: Some(session),
            target,
            command: command.into(),
            closed: false,
        }
    }

    /// Screen without a tracer, showing `notice` as its only line.
    pub fn unavailable(view: V, target: Pid, command: impl Into<String>, notice: &str) -> Self {
        let mut screen = Self {
            view,
            state: ScreenState::default(),
            assembler: LineAssembler::new(),
            session: None,
            target,
            command: command.into(),
            closed: false,
        };
        screen.view.append_line(notice);
        screen
    }

    /// Start `tracer` against `target`, falling back to a notice screen if
    /// the tracer cannot be started.
    pub fn open(
        view: V,
        target: Pid,
        command: impl Into<String>,
        tracer: Result<TracerCommand, SpawnError>,
    ) -> Self {
        match tracer.and_then(|cmd| TraceSession::start(target, &cmd)) {
            Ok(session) => Self::new(view, session, command),
            Err(e) => {
                if e.is_unsupported() {
                    info!("No tracer for this platform");
                } else {
                    warn!("Tracing process {} unavailable: {e}", target.0);
                }
                Self::unavailable(view, target, command, &e.to_string())
            }
        }
    }

    /// Start with follow engaged or not.
    #[must_use]
    pub fn with_follow(mut self, follow: bool) -> Self {
        self.state.follow = follow;
        if follow {
            pin_to_newest(&mut self.view);
        }
        self
    }

    #[must_use]
    pub fn state(&self) -> ScreenState {
        self.state
    }

    #[must_use]
    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    #[must_use]
    pub fn session(&self) -> Option<&TraceSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn target(&self) -> Pid {
        self.target
    }

    #[must_use]
    pub fn title(&self) -> String {
        format!("Trace of process {} - {}", self.target.0, self.command)
    }

    /// True while a tracer is running and its output is being read.
    #[must_use]
    pub fn is_tracer_alive(&self) -> bool {
        self.session.as_ref().is_some_and(TraceSession::is_alive)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Route one key press.
    pub fn handle_key(&mut self, key: KeyCode) -> KeyOutcome {
        if self.closed {
            return KeyOutcome::Close;
        }

        // An open prompt takes every key, including the toggle letters.
        if !self.view.is_editing() {
            match key {
                KeyCode::F(8) | KeyCode::Char('f') => {
                    self.state.follow = !self.state.follow;
                    if self.state.follow {
                        pin_to_newest(&mut self.view);
                    }
                    return KeyOutcome::Redraw;
                }
                KeyCode::F(9) | KeyCode::Char('t') => {
                    self.toggle_capture();
                    return KeyOutcome::Redraw;
                }
                KeyCode::Esc | KeyCode::F(10) | KeyCode::Char('q') => {
                    self.close();
                    return KeyOutcome::Close;
                }
                _ => {}
            }
        }

        self.state.follow = false;
        if self.view.handle_key(key) {
            KeyOutcome::Redraw
        } else {
            KeyOutcome::Unchanged
        }
    }

    /// Feed bytes read from the tracer. Returns true if the display changed.
    ///
    /// While capture is paused the bytes are dropped.
    pub fn ingest(&mut self, chunk: &[u8]) -> bool {
        if !self.state.capturing {
            return false;
        }
        let edits = self.assembler.feed(chunk);
        for edit in &edits {
            apply_edit(&mut self.view, edit, self.state.follow);
        }
        !edits.is_empty()
    }

    /// Show what the assembler still holds once the tracer output has ended.
    pub(crate) fn finish_stream(&mut self) {
        if !self.state.capturing {
            return;
        }
        if let Some(edit) = self.assembler.finish() {
            apply_edit(&mut self.view, &edit, self.state.follow);
        }
    }

    /// Stop the tracer and close the stream. Safe to call more than once.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(session) = self.session.as_mut() {
            session.shutdown();
        }
    }

    fn toggle_capture(&mut self) {
        self.state.capturing = !self.state.capturing;
        if self.state.capturing {
            info!("Resumed capturing trace of process {}", self.target.0);
        } else {
            // A line cut by the pause is left as is; output after resuming
            // starts a new entry.
            self.assembler.reset();
            info!("Paused capturing trace of process {}", self.target.0);
        }
    }
}
