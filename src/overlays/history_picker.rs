//! History picker overlay. Enter sends the selected command to the PTY by
//! first erasing the current line (`Ctrl+U`, `0x15`) then writing the
//! command verbatim -- no trailing newline, so the user can still edit
//! before running it.

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::List;
use ratatui::widgets::ListItem;
use ratatui::widgets::ListState;

use super::Overlay;
use super::OverlayMessage;

pub const ERASE_LINE: u8 = 0x15;

#[derive(Debug, Default)]
pub struct HistoryPicker {
    entries: Vec<String>,
    filter: String,
    visible: bool,
    selected: usize,
}

impl HistoryPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, entries: Vec<String>, initial_filter: String) {
        self.entries = entries;
        self.filter = initial_filter;
        self.visible = true;
        self.selected = 0;
    }

    fn matches(&self) -> Vec<&String> {
        if self.filter.is_empty() {
            return self.entries.iter().rev().collect();
        }
        self.entries
            .iter()
            .rev()
            .filter(|e| e.contains(&self.filter))
            .collect()
    }

    /// Bytes to write to the PTY for a selected command: erase-line then
    /// the command text, with no trailing newline.
    pub fn bytes_for(command: &str) -> Vec<u8> {
        let mut bytes = vec![ERASE_LINE];
        bytes.extend_from_slice(command.as_bytes());
        bytes
    }
}

impl Overlay for HistoryPicker {
    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_size(&mut self, _width: u16, _height: u16) {}

    fn update(&mut self, key: KeyEvent) -> Option<OverlayMessage> {
        match key.code {
            KeyCode::Esc => {
                self.hide();
                Some(OverlayMessage::HistoryCancel)
            }
            KeyCode::Enter => {
                let chosen = self.matches().get(self.selected).map(|s| s.to_string());
                self.hide();
                chosen.map(OverlayMessage::HistorySelect)
            }
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            KeyCode::Down => {
                let len = self.matches().len();
                if len > 0 {
                    self.selected = (self.selected + 1).min(len - 1);
                }
                None
            }
            KeyCode::Backspace => {
                self.filter.pop();
                self.selected = 0;
                None
            }
            KeyCode::Char(c) => {
                self.filter.push(c);
                self.selected = 0;
                None
            }
            _ => None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self.matches().iter().map(|e| ListItem::new(e.as_str())).collect();
        let mut state = ListState::default();
        state.select(Some(self.selected));
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("history: {}", self.filter)),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        frame.render_stateful_widget(list, area, &mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_bytes_erase_then_write_no_newline() {
        let bytes = HistoryPicker::bytes_for("git status");
        assert_eq!(bytes[0], ERASE_LINE);
        assert_eq!(&bytes[1..], b"git status");
        assert!(!bytes.ends_with(b"\n"));
    }
}
