//! Overlay stack: modal UI widgets sharing a focus protocol. At most one is
//! visible at a time; opening one hides any other.

pub mod history_picker;
pub mod model_picker;
pub mod option_picker;
pub mod palette;
pub mod result_panel;
pub mod settings;

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;

/// Messages an overlay emits back to the event loop. The loop decides the
/// outcome.
#[derive(Debug, Clone)]
pub enum OverlayMessage {
    PaletteSelect(String),
    PaletteCancel,
    HistorySelect(String),
    HistoryCancel,
    SettingsSaved,
    SettingsCancelled,
    OpenModelPicker { field: String },
    OpenOptionPicker { field: String, options: Vec<String> },
    ModelSelected { field: String, model: String },
    OptionSelected { field: String, value: String },
    PickerCancelled,
    ResultClosed,
    ValidationError(String),
}

pub trait Overlay {
    fn show(&mut self);
    fn hide(&mut self);
    fn is_visible(&self) -> bool;
    fn set_size(&mut self, width: u16, height: u16);
    fn update(&mut self, key: KeyEvent) -> Option<OverlayMessage>;
    fn render(&self, frame: &mut Frame, area: Rect);
}

/// Which overlay (if any) currently owns the keyboard.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    #[default]
    None,
    Palette,
    HistoryPicker,
    Settings,
    ModelPicker,
    OptionPicker,
    ResultPanel,
}

/// Tracks which single overlay is visible. Individual overlay widgets live
/// in the owning `App`/`Model`; this just enforces the "at most one visible"
/// invariant and the priority-routing contract.
#[derive(Debug, Default)]
pub struct OverlayStack {
    active: OverlayKind,
}

impl OverlayStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> OverlayKind {
        self.active
    }

    pub fn is_any_visible(&self) -> bool {
        self.active != OverlayKind::None
    }

    /// Opening any overlay hides whichever was previously active.
    pub fn open(&mut self, kind: OverlayKind) {
        self.active = kind;
    }

    pub fn close(&mut self) {
        self.active = OverlayKind::None;
    }

    /// Blocking overlays consume every keystroke while visible; all
    /// overlays in this design are blocking.
    pub fn is_blocking(&self) -> bool {
        self.is_any_visible()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_hides_previous() {
        let mut stack = OverlayStack::new();
        stack.open(OverlayKind::Palette);
        assert_eq!(stack.active(), OverlayKind::Palette);
        stack.open(OverlayKind::Settings);
        assert_eq!(stack.active(), OverlayKind::Settings);
    }

    #[test]
    fn close_clears_visibility() {
        let mut stack = OverlayStack::new();
        stack.open(OverlayKind::HistoryPicker);
        assert!(stack.is_blocking());
        stack.close();
        assert!(!stack.is_blocking());
    }
}
