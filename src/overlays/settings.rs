//! Settings panel overlay: editable list of fields with numeric/boolean
//! validation. Enter edits or toggles the selected field; `s` or closing
//! with unsaved changes triggers save.

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

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Numeric,
    Boolean,
    Model,
    /// Fixed choice list; Enter opens an [`super::option_picker::OptionPicker`].
    Option(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct Field {
    pub key: String,
    pub label: String,
    pub value: String,
    pub kind: FieldKind,
}

#[derive(Debug, Default)]
pub struct Settings {
    fields: Vec<Field>,
    visible: bool,
    selected: usize,
    editing: Option<String>,
    dirty: bool,
    error: Option<String>,
}

impl Settings {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            visible: false,
            selected: 0,
            editing: None,
            dirty: false,
            error: None,
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark unsaved changes, for field updates applied outside
    /// [`Self::validate_and_commit`] (e.g. a picker-driven selection).
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn validate_and_commit(&mut self, index: usize, raw: String) -> Result<(), String> {
        let field = &mut self.fields[index];
        if field.kind == FieldKind::Numeric && raw.parse::<f64>().is_err() {
            return Err(format!("{} must be numeric", field.label));
        }
        field.value = raw;
        self.dirty = true;
        Ok(())
    }
}

impl Overlay for Settings {
    fn show(&mut self) {
        self.visible = true;
        self.error = None;
    }

    fn hide(&mut self) {
        self.visible = false;
        self.editing = None;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_size(&mut self, _width: u16, _height: u16) {}

    fn update(&mut self, key: KeyEvent) -> Option<OverlayMessage> {
        if let Some(buf) = self.editing.clone() {
            return match key.code {
                KeyCode::Enter => {
                    let result = self.validate_and_commit(self.selected, buf);
                    self.editing = None;
                    match result {
                        Ok(()) => None,
                        Err(reason) => {
                            self.error = Some(reason.clone());
                            Some(OverlayMessage::ValidationError(reason))
                        }
                    }
                }
                KeyCode::Esc => {
                    self.editing = None;
                    None
                }
                KeyCode::Backspace => {
                    let mut buf = buf;
                    buf.pop();
                    self.editing = Some(buf);
                    None
                }
                KeyCode::Char(c) => {
                    let mut buf = buf;
                    buf.push(c);
                    self.editing = Some(buf);
                    None
                }
                _ => None,
            };
        }

        match key.code {
            KeyCode::Esc => {
                self.hide();
                if self.dirty {
                    Some(OverlayMessage::SettingsSaved)
                } else {
                    Some(OverlayMessage::SettingsCancelled)
                }
            }
            KeyCode::Char('s') => {
                self.hide();
                Some(OverlayMessage::SettingsSaved)
            }
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            KeyCode::Down => {
                if !self.fields.is_empty() {
                    self.selected = (self.selected + 1).min(self.fields.len() - 1);
                }
                None
            }
            KeyCode::Enter => {
                let field = self.fields.get(self.selected)?;
                match &field.kind {
                    FieldKind::Model => Some(OverlayMessage::OpenModelPicker {
                        field: field.key.clone(),
                    }),
                    FieldKind::Option(choices) => Some(OverlayMessage::OpenOptionPicker {
                        field: field.key.clone(),
                        options: choices.clone(),
                    }),
                    FieldKind::Boolean => {
                        let next = if field.value == "true" { "false" } else { "true" }.to_string();
                        let _ = self.validate_and_commit(self.selected, next);
                        None
                    }
                    FieldKind::Text | FieldKind::Numeric => {
                        self.editing = Some(field.value.clone());
                        None
                    }
                }
            }
            _ => None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .fields
            .iter()
            .map(|f| ListItem::new(format!("{:<20} {}", f.label, f.value)))
            .collect();
        let mut state = ListState::default();
        state.select(Some(self.selected));
        let title = self.error.clone().unwrap_or_else(|| "settings".to_string());
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
    fn non_numeric_value_in_numeric_field_is_rejected() {
        let mut settings = Settings::new(vec![Field {
            key: "temperature".into(),
            label: "Temperature".into(),
            value: "0.2".into(),
            kind: FieldKind::Numeric,
        }]);
        let err = settings.validate_and_commit(0, "not-a-number".into());
        assert!(err.is_err());
        assert_eq!(settings.fields()[0].value, "0.2");
    }
}
