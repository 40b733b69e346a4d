//! Command palette overlay.

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

#[derive(Debug, Clone)]
pub struct PaletteCommand {
    pub name: String,
    pub description: String,
}

#[derive(Debug)]
pub struct Palette {
    commands: Vec<PaletteCommand>,
    filter: String,
    visible: bool,
    selected: usize,
    width: u16,
    height: u16,
}

impl Palette {
    pub fn new(commands: Vec<PaletteCommand>) -> Self {
        Self {
            commands,
            filter: String::new(),
            visible: false,
            selected: 0,
            width: 0,
            height: 0,
        }
    }

    fn matches(&self) -> Vec<&PaletteCommand> {
        if self.filter.is_empty() {
            return self.commands.iter().collect();
        }
        self.commands
            .iter()
            .filter(|c| c.name.contains(&self.filter))
            .collect()
    }
}

impl Overlay for Palette {
    fn show(&mut self) {
        self.visible = true;
        self.filter.clear();
        self.selected = 0;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    fn update(&mut self, key: KeyEvent) -> Option<OverlayMessage> {
        match key.code {
            KeyCode::Esc => {
                self.hide();
                Some(OverlayMessage::PaletteCancel)
            }
            KeyCode::Enter => {
                let matches = self.matches();
                let chosen = matches.get(self.selected).map(|c| c.name.clone());
                self.hide();
                chosen.map(OverlayMessage::PaletteSelect)
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
        let items: Vec<ListItem> = self
            .matches()
            .iter()
            .map(|c| ListItem::new(format!("{:<20} {}", c.name, c.description)))
            .collect();
        let mut state = ListState::default();
        state.select(Some(self.selected));
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(format!("/{}", self.filter)))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        frame.render_stateful_widget(list, area, &mut state);
    }
}
