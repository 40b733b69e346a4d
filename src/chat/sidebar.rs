//! Chat sidebar widget: renders as `messages ∥ input`, owns the text input
//! field and the focus-sensitive submit behavior. The streaming mutation
//! logic itself lives in [`super::stream::StreamCoordinator`]; this module
//! is purely the sidebar's own input buffer and layout.

use ratatui::Frame;
use ratatui::layout::Constraint;
use ratatui::layout::Direction;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Wrap;

use super::ChatHistory;
use crate::llm::Role;

/// Which pane owns the keyboard. Meaningful only while the sidebar is
/// visible.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Terminal,
    SidebarInput,
}

#[derive(Debug, Default)]
pub struct Sidebar {
    visible: bool,
    input: String,
}

impl Sidebar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    /// Clears and returns the input buffer if non-empty.
    pub fn take_submission(&mut self) -> Option<String> {
        if self.input.trim().is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.input))
    }

    /// Splits the available width ~60/40 between terminal and sidebar, each
    /// pane clamped to a minimum width.
    pub fn split(area: Rect, min_width: u16) -> (Rect, Rect) {
        let sidebar_width = (area.width * 2 / 5).max(min_width).min(area.width.saturating_sub(min_width));
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Min(min_width),
                Constraint::Length(sidebar_width),
            ])
            .split(area);
        (chunks[0], chunks[1])
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, history: &ChatHistory, focus: Focus) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(3)])
            .split(area);

        let lines: Vec<Line> = history
            .messages()
            .iter()
            .map(|m| {
                let prefix = match m.role {
                    Role::User => "you",
                    Role::Assistant => "assistant",
                    Role::System => "system",
                };
                Line::from(format!("{prefix}: {}", m.content))
            })
            .collect();
        let messages = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("chat"))
            .wrap(Wrap { trim: false });
        frame.render_widget(messages, chunks[0]);

        let input_style = if focus == Focus::SidebarInput {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let input = Paragraph::new(self.input.as_str())
            .style(input_style)
            .block(Block::default().borders(Borders::ALL).title("message"));
        frame.render_widget(input, chunks[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_does_not_submit() {
        let mut sidebar = Sidebar::new();
        assert!(sidebar.take_submission().is_none());
    }

    #[test]
    fn submission_clears_buffer() {
        let mut sidebar = Sidebar::new();
        sidebar.push_char('h');
        sidebar.push_char('i');
        let submitted = sidebar.take_submission();
        assert_eq!(submitted, Some("hi".to_string()));
        assert_eq!(sidebar.input(), "");
    }

    #[test]
    fn split_respects_minimum_width() {
        let area = Rect::new(0, 0, 100, 40);
        let (left, right) = Sidebar::split(area, 20);
        assert!(left.width >= 20);
        assert!(right.width >= 20);
        assert_eq!(left.width + right.width, area.width);
    }
}
