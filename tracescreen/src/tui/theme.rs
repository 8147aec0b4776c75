//! TUI color theme
//!
//! HUD-inspired color scheme for the terminal interface

use ratatui::style::{Color, Modifier, Style};

// HUD color scheme (F-35 inspired)
pub const HUD_GREEN: Color = Color::Rgb(0, 255, 0);
pub const CRITICAL_RED: Color = Color::Rgb(255, 0, 0);
pub const CAUTION_AMBER: Color = Color::Rgb(255, 191, 0);
pub const INFO_DIM: Color = Color::Rgb(0, 180, 0);
pub const BACKGROUND: Color = Color::Rgb(0, 20, 0);

pub const STYLE_HEADING: Style = Style::new().fg(HUD_GREEN).add_modifier(Modifier::BOLD);
pub const STYLE_DIM: Style = Style::new().fg(INFO_DIM);
pub const STYLE_KEY: Style = Style::new().fg(CAUTION_AMBER);
pub const STYLE_TEXT: Style = Style::new().fg(Color::White);
pub const STYLE_SELECTED: Style =
    Style::new().fg(BACKGROUND).bg(HUD_GREEN).add_modifier(Modifier::BOLD);
pub const STYLE_MATCH: Style = Style::new().fg(CAUTION_AMBER);

/// Tracer status tag shown in the header and its color
/// - Tracer running, capturing: `[LIVE]` (Green)
/// - Tracer running, paused: `[PAUSED]` (Amber)
/// - Tracer gone: `[EXITED]` (Red)
/// - Never started: `[UNAVAILABLE]` (Red)
#[must_use]
pub fn tracer_status(started: bool, alive: bool, capturing: bool) -> (&'static str, Color) {
    match (started, alive, capturing) {
        (false, _, _) => ("[UNAVAILABLE]", CRITICAL_RED),
        (true, false, _) => ("[EXITED]", CRITICAL_RED),
        (true, true, true) => ("[LIVE]", HUD_GREEN),
        (true, true, false) => ("[PAUSED]", CAUTION_AMBER),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracer_status() {
        assert_eq!(tracer_status(true, true, true), ("[LIVE]", HUD_GREEN));
        assert_eq!(tracer_status(true, true, false), ("[PAUSED]", CAUTION_AMBER));
        assert_eq!(tracer_status(true, false, true).0, "[EXITED]");
        assert_eq!(tracer_status(false, false, true).0, "[UNAVAILABLE]");
    }
}
