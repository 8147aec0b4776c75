use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::theme::{CAUTION_AMBER, HUD_GREEN, STYLE_DIM, STYLE_KEY};
use super::view::{Prompt, TraceView};
use crate::screen::ScreenState;

/// Function key hints for the current screen state.
///
/// The capture label names what F9 will do, the follow hint shows whether
/// follow is engaged.
#[must_use]
pub fn hints(state: ScreenState, prompt: Prompt) -> Vec<(&'static str, &'static str)> {
    match prompt {
        Prompt::Search => vec![("F3", "Next"), ("Enter", "Done"), ("Esc", "Cancel")],
        Prompt::Filter => vec![("Enter", "Done"), ("Esc", "Clear")],
        Prompt::None => vec![
            ("F3", "Search"),
            ("F4", "Filter"),
            ("F8", if state.follow { "AutoScroll*" } else { "AutoScroll" }),
            ("F9", state.capture_label()),
            ("Esc", "Done"),
        ],
    }
}

/// Bottom bar: key hints, or the prompt being edited.
pub fn render(f: &mut Frame, area: Rect, state: ScreenState, view: &TraceView) {
    let mut spans: Vec<Span> = hints(state, view.prompt())
        .into_iter()
        .flat_map(|(key, label)| {
            [Span::styled(key, STYLE_KEY), Span::styled(format!(":{label} "), STYLE_DIM)]
        })
        .collect();

    match view.prompt() {
        Prompt::Search => {
            spans.push(Span::styled(
                format!("Search: {}_", view.search_text()),
                Style::new().fg(CAUTION_AMBER),
            ));
        }
        Prompt::Filter => {
            spans.push(Span::styled(
                format!("Filter: {}_", view.filter_text()),
                Style::new().fg(CAUTION_AMBER),
            ));
        }
        Prompt::None if !view.filter_text().is_empty() => {
            spans.push(Span::styled("[Filtered]", Style::new().fg(CAUTION_AMBER)));
        }
        Prompt::None => {}
    }

    let bar = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).border_style(Style::new().fg(HUD_GREEN)));
    f.render_widget(bar, area);
}
