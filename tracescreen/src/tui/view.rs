//! Scrollable trace list with search and filter prompts.
//!
//! # Key Types
//!
//! - [`TraceView`] - the line buffer plus selection, scroll and prompt state
//! - [`Prompt`] - which text prompt (if any) owns the keyboard
//!
//! # Index spaces
//!
//! `lines` holds every captured line. While a filter is active only the
//! matching lines are listed; `selected`, `scroll` and everything exposed
//! through [`LineView`] count in that visible space.

use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::theme::{HUD_GREEN, STYLE_MATCH, STYLE_SELECTED, STYLE_TEXT};
use crate::sink::LineView;

/// Text prompt currently open in the function bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Prompt {
    #[default]
    None,
    Search,
    Filter,
}

/// The trace line list.
#[derive(Debug, Default)]
pub struct TraceView {
    lines: Vec<String>,
    /// Indices into `lines` that match `filter` (maintained only while filtering)
    filtered: Vec<usize>,
    filter: String,
    search: String,
    prompt: Prompt,
    selected: usize,
    scroll: usize,
    /// Rows available at the last render, used for paging
    page_height: usize,
}

impl TraceView {
    #[must_use]
    pub fn new() -> Self {
        Self { page_height: 1, ..Self::default() }
    }

    #[must_use]
    pub fn prompt(&self) -> Prompt {
        self.prompt
    }

    #[must_use]
    pub fn search_text(&self) -> &str {
        &self.search
    }

    #[must_use]
    pub fn filter_text(&self) -> &str {
        &self.filter
    }

    /// Number of captured lines, including those hidden by the filter.
    #[must_use]
    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }

    /// Visible line at `index`.
    #[must_use]
    pub fn line(&self, index: usize) -> Option<&str> {
        self.buffer_index(index).map(|i| self.lines[i].as_str())
    }

    #[must_use]
    pub fn selected_line(&self) -> Option<&str> {
        self.line(self.selected)
    }

    fn is_filtering(&self) -> bool {
        !self.filter.is_empty()
    }

    fn buffer_index(&self, visible: usize) -> Option<usize> {
        if self.is_filtering() {
            self.filtered.get(visible).copied()
        } else {
            (visible < self.lines.len()).then_some(visible)
        }
    }

    fn last_index(&self) -> usize {
        self.len().saturating_sub(1)
    }

    fn matches_filter(&self, line: &str) -> bool {
        contains_ignore_case(line, &self.filter)
    }

    /// Change the filter text, keeping the selection on the same line or
    /// the next one still shown.
    fn edit_filter(&mut self, edit: impl FnOnce(&mut String)) {
        let anchor = self.buffer_index(self.selected).unwrap_or(0);
        edit(&mut self.filter);
        self.filtered = if self.is_filtering() {
            (0..self.lines.len()).filter(|&i| self.matches_filter(&self.lines[i])).collect()
        } else {
            Vec::new()
        };
        self.selected = if self.is_filtering() {
            self.filtered.iter().position(|&i| i >= anchor).unwrap_or(self.last_index())
        } else {
            anchor.min(self.last_index())
        };
    }

    /// Select the first visible line at or after `from` that contains the
    /// search text, wrapping around once.
    fn search_from(&mut self, from: usize) {
        let len = self.len();
        if self.search.is_empty() || len == 0 {
            return;
        }
        let hit = (0..len)
            .map(|offset| (from + offset) % len)
            .find(|&i| self.line(i).is_some_and(|l| contains_ignore_case(l, &self.search)));
        if let Some(i) = hit {
            self.selected = i;
        }
    }

    fn move_by(&mut self, delta: isize) {
        self.selected = self.selected.saturating_add_signed(delta).min(self.last_index());
    }

    fn handle_search_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Esc => {
                self.search.clear();
                self.prompt = Prompt::None;
            }
            KeyCode::Enter => self.prompt = Prompt::None,
            KeyCode::F(3) => self.search_from(self.selected + 1),
            KeyCode::Backspace => {
                self.search.pop();
            }
            KeyCode::Char(c) => {
                self.search.push(c);
                self.search_from(self.selected);
            }
            _ => return false,
        }
        true
    }

    fn handle_filter_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Esc => {
                self.prompt = Prompt::None;
                self.edit_filter(String::clear);
            }
            KeyCode::Enter => self.prompt = Prompt::None,
            KeyCode::Backspace => self.edit_filter(|f| {
                f.pop();
            }),
            KeyCode::Char(c) => self.edit_filter(|f| f.push(c)),
            _ => return false,
        }
        true
    }

    fn handle_nav_key(&mut self, key: KeyCode) -> bool {
        let page = isize::try_from(self.page_height.max(1)).unwrap_or(isize::MAX);
        match key {
            KeyCode::Up => self.move_by(-1),
            KeyCode::Down => self.move_by(1),
            KeyCode::PageUp => self.move_by(-page),
            KeyCode::PageDown => self.move_by(page),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.last_index(),
            KeyCode::F(3) | KeyCode::Char('/') => {
                self.search.clear();
                self.prompt = Prompt::Search;
            }
            KeyCode::F(4) | KeyCode::Char('\\') => self.prompt = Prompt::Filter,
            _ => return false,
        }
        true
    }

    /// Bring the selection into a window of `height` rows.
    fn scroll_to_selection(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected < self.scroll {
            self.scroll = self.selected;
        } else if self.selected >= self.scroll + height {
            self.scroll = self.selected + 1 - height;
        }
        self.scroll = self.scroll.min(self.len().saturating_sub(height));
    }

    /// Render the visible window of lines into `area`.
    pub fn render(&mut self, f: &mut Frame, area: Rect, title: &str) {
        let height = usize::from(area.height.saturating_sub(2));
        self.page_height = height.max(1);
        self.scroll_to_selection(height);

        let highlight = (self.prompt == Prompt::Search && !self.search.is_empty())
            .then_some(self.search.as_str());

        let rows: Vec<Line> = (self.scroll..(self.scroll + height).min(self.len()))
            .filter_map(|i| self.line(i).map(|text| (i, text)))
            .map(|(i, text)| {
                if i == self.selected {
                    Line::from(Span::styled(text.to_string(), STYLE_SELECTED))
                } else if highlight.is_some_and(|h| contains_ignore_case(text, h)) {
                    Line::from(Span::styled(text.to_string(), STYLE_MATCH))
                } else {
                    Line::from(Span::styled(text.to_string(), STYLE_TEXT))
                }
            })
            .collect();

        let widget = Paragraph::new(rows).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {title} "))
                .border_style(Style::new().fg(HUD_GREEN)),
        );
        f.render_widget(widget, area);
    }
}

impl LineView for TraceView {
    fn append_line(&mut self, text: &str) {
        self.lines.push(text.to_string());
        if self.is_filtering() && self.matches_filter(text) {
            self.filtered.push(self.lines.len() - 1);
        }
    }

    fn extend_last_line(&mut self, text: &str) {
        let Some(last) = self.lines.len().checked_sub(1) else {
            self.append_line(text);
            return;
        };
        self.lines[last].push_str(text);
        // Extending can only add a match, never remove one.
        if self.is_filtering()
            && self.filtered.last() != Some(&last)
            && self.matches_filter(&self.lines[last])
        {
            self.filtered.push(last);
        }
    }

    fn set_selected(&mut self, index: usize) {
        self.selected = index.min(self.last_index());
    }

    fn selected(&self) -> usize {
        self.selected
    }

    fn len(&self) -> usize {
        if self.is_filtering() {
            self.filtered.len()
        } else {
            self.lines.len()
        }
    }

    fn is_editing(&self) -> bool {
        self.prompt != Prompt::None
    }

    fn handle_key(&mut self, key: KeyCode) -> bool {
        match self.prompt {
            Prompt::Search => self.handle_search_key(key),
            Prompt::Filter => self.handle_filter_key(key),
            Prompt::None => self.handle_nav_key(key),
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
