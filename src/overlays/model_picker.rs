//! Model picker overlay: opened from a settings model field, lists the
//! provider's cached model catalog, filterable, Enter selects.

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
pub struct ModelPicker {
    field: String,
    models: Vec<String>,
    filter: String,
    visible: bool,
    selected: usize,
    loading: bool,
}

impl ModelPicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opened before the model list is known; `set_models` fills it in once
    /// the provider fetch completes.
    pub fn open_loading(&mut self, field: String) {
        self.field = field;
        self.models.clear();
        self.filter.clear();
        self.visible = true;
        self.selected = 0;
        self.loading = true;
    }

    pub fn set_models(&mut self, models: Vec<String>) {
        self.models = models;
        self.loading = false;
        self.selected = 0;
    }

    fn matches(&self) -> Vec<&String> {
        if self.filter.is_empty() {
            return self.models.iter().collect();
        }
        self.models.iter().filter(|m| m.contains(&self.filter)).collect()
    }
}

impl Overlay for ModelPicker {
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
                if self.loading {
                    return None;
                }
                let chosen = self.matches().get(self.selected).map(|m| m.to_string());
                self.hide();
                chosen.map(|model| OverlayMessage::ModelSelected {
                    field: self.field.clone(),
                    model,
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
        let title = if self.loading {
            "models: loading...".to_string()
        } else {
            format!("models: {}", self.filter)
        };
        let items: Vec<ListItem> = self.matches().iter().map(|m| ListItem::new(m.as_str())).collect();
        let mut state = ListState::default();
        state.select(Some(self.selected));
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        frame.render_stateful_widget(list, area, &mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_while_loading_is_ignored() {
        let mut picker = ModelPicker::new();
        picker.open_loading("model".into());
        let key = KeyEvent::from(KeyCode::Enter);
        assert!(picker.update(key).is_none());
        assert!(picker.is_visible());
    }

    #[test]
    fn enter_after_load_emits_selection() {
        let mut picker = ModelPicker::new();
        picker.open_loading("model".into());
        picker.set_models(vec!["gpt-4o".into(), "gpt-4o-mini".into()]);
        let msg = picker.update(KeyEvent::from(KeyCode::Enter));
        match msg {
            Some(OverlayMessage::ModelSelected { field, model }) => {
                assert_eq!(field, "model");
                assert_eq!(model, "gpt-4o");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
