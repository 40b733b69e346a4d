//! Generic filterable option picker overlay, used for settings fields with
//! a fixed enum of choices (provider, log level, log format).

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

#[derive(Debug, Default)]
pub struct OptionPicker {
    field: String,
    options: Vec<String>,
    filter: String,
    visible: bool,
    selected: usize,
}

impl OptionPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, field: String, options: Vec<String>) {
        self.field = field;
        self.options = options;
        self.filter.clear();
        self.visible = true;
        self.selected = 0;
    }

    fn matches(&self) -> Vec<&String> {
        if self.filter.is_empty() {
            return self.options.iter().collect();
        }
        self.options.iter().filter(|o| o.contains(&self.filter)).collect()
    }
}

impl Overlay for OptionPicker {
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
                Some(OverlayMessage::PickerCancelled)
            }
            KeyCode::Enter => {
                let chosen = self.matches().get(self.selected).map(|o| o.to_string());
                self.hide();
                chosen.map(|value| OverlayMessage::OptionSelected {
                    field: self.field.clone(),
                    value,
                })
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
        let items: Vec<ListItem> = self.matches().iter().map(|o| ListItem::new(o.as_str())).collect();
        let mut state = ListState::default();
        state.select(Some(self.selected));
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("{}: {}", self.field, self.filter)),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        frame.render_stateful_widget(list, area, &mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_emits_field_and_value() {
        let mut picker = OptionPicker::new();
        picker.open("log_level".into(), vec!["debug".into(), "info".into()]);
        let msg = picker.update(KeyEvent::from(KeyCode::Enter));
        match msg {
            Some(OverlayMessage::OptionSelected { field, value }) => {
                assert_eq!(field, "log_level");
                assert_eq!(value, "debug");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn filter_narrows_matches() {
        let mut picker = OptionPicker::new();
        picker.open("provider".into(), vec!["openai".into(), "anthropic".into()]);
        picker.update(KeyEvent::from(KeyCode::Char('a')));
        assert_eq!(picker.matches().len(), 2);
        picker.update(KeyEvent::from(KeyCode::Char('n')));
        assert_eq!(picker.matches(), vec![&"anthropic".to_string()]);
    }
}
