//! Result panel overlay: scrollable read-only body, used to show
//! non-streaming palette command output (e.g. a model catalog dump).

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Wrap;

use super::Overlay;
use super::OverlayMessage;

#[derive(Debug, Default)]
pub struct ResultPanel {
    title: String,
    lines: Vec<String>,
    scroll: u16,
    visible: bool,
    height: u16,
}

impl ResultPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, title: String, body: String) {
        self.title = title;
        self.lines = body.lines().map(str::to_string).collect();
        self.scroll = 0;
        self.visible = true;
    }

    fn max_scroll(&self) -> u16 {
        let content = self.lines.len() as u16;
        content.saturating_sub(self.height.max(1))
    }
}

impl Overlay for ResultPanel {
    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_size(&mut self, _width: u16, height: u16) {
        self.height = height;
    }

    fn update(&mut self, key: KeyEvent) -> Option<OverlayMessage> {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.hide();
                Some(OverlayMessage::ResultClosed)
            }
            KeyCode::Up => {
                self.scroll = self.scroll.saturating_sub(1);
                None
            }
            KeyCode::Down => {
                self.scroll = (self.scroll + 1).min(self.max_scroll());
                None
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(self.height.max(1));
                None
            }
            KeyCode::PageDown => {
                self.scroll = (self.scroll + self.height.max(1)).min(self.max_scroll());
                None
            }
            _ => None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let text: Vec<Line> = self.lines.iter().map(|l| Line::from(l.as_str())).collect();
        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title(self.title.clone()))
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0));
        frame.render_widget(paragraph, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_is_clamped_to_content_length() {
        let mut panel = ResultPanel::new();
        panel.set_size(10, 3);
        panel.open("result".into(), "a\nb\nc\nd\ne".into());
        for _ in 0..20 {
            panel.update(KeyEvent::from(KeyCode::Down));
        }
        assert_eq!(panel.scroll, panel.max_scroll());
    }

    #[test]
    fn esc_closes_and_emits_result_closed() {
        let mut panel = ResultPanel::new();
        panel.open("result".into(), "body".into());
        let msg = panel.update(KeyEvent::from(KeyCode::Esc));
        assert!(matches!(msg, Some(OverlayMessage::ResultClosed)));
        assert!(!panel.is_visible());
    }
}
