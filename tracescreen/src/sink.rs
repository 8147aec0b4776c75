//! Display sink: the scrollable line view capability and follow-aware glue.
//!
//! The trace screen never owns a concrete widget. It writes through
//! [`LineView`], which the TUI implements with a ratatui list
//! ([`crate::tui::TraceView`]) and tests implement with plain vectors.

use crossterm::event::KeyCode;

use crate::assembler::LineEdit;

/// Append-only, scrollable list of text lines.
///
/// Indices (`selected`, `len`) are in the view's visible space; a view that
/// filters its lines reports only the lines it shows.
pub trait LineView {
    /// Add a new entry at the end.
    fn append_line(&mut self, text: &str);

    /// Concatenate onto the most recent entry (which may be filtered out of
    /// view). With no entry at all this behaves like `append_line`.
    fn extend_last_line(&mut self, text: &str);

    fn set_selected(&mut self, index: usize);

    fn selected(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A text prompt (search, filter) currently owns the keyboard.
    fn is_editing(&self) -> bool {
        false
    }

    /// Generic navigation. Returns true when the view needs a redraw.
    fn handle_key(&mut self, key: KeyCode) -> bool;
}

/// Move the selection to the newest line.
pub fn pin_to_newest<V: LineView + ?Sized>(view: &mut V) {
    if let Some(last) = view.len().checked_sub(1) {
        view.set_selected(last);
    }
}

/// Apply one assembler edit, keeping the newest line selected when `follow`.
pub fn apply_edit<V: LineView + ?Sized>(view: &mut V, edit: &LineEdit, follow: bool) {
    match edit {
        LineEdit::Append { text, .. } => view.append_line(text),
        LineEdit::Extend { text, .. } => view.extend_last_line(text),
    }
    if follow {
        pin_to_newest(view);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Minimal in-memory view for state machine tests.
    #[derive(Debug, Default)]
    pub struct VecView {
        pub lines: Vec<String>,
        pub selected: usize,
        pub nav_keys: usize,
    }

    impl LineView for VecView {
        fn append_line(&mut self, text: &str) {
            self.lines.push(text.to_string());
        }

        fn extend_last_line(&mut self, text: &str) {
            match self.lines.last_mut() {
                Some(last) => last.push_str(text),
                None => self.lines.push(text.to_string()),
            }
        }

        fn set_selected(&mut self, index: usize) {
            self.selected = index;
        }

        fn selected(&self) -> usize {
            self.selected
        }

        fn len(&self) -> usize {
            self.lines.len()
        }

        fn handle_key(&mut self, key: KeyCode) -> bool {
            self.nav_keys += 1;
            match key {
                KeyCode::Up => self.selected = self.selected.saturating_sub(1),
                KeyCode::Down => {
                    self.selected = (self.selected + 1).min(self.lines.len().saturating_sub(1));
                }
                _ => return false,
            }
            true
        }
    }
}
