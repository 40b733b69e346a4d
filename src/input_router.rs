//! Input router: a stateful classifier over keystrokes that decides whether
//! a key goes to the PTY, an overlay, or fires a core command.

use std::time::Duration;
use std::time::Instant;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;

/// What the router decided to do with one input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterAction {
    /// Write these bytes to the PTY.
    WriteToPty(Vec<u8>),
    /// Write bytes to the PTY and also snapshot the line buffer as a
    /// submitted command (Enter).
    SubmitCommand { bytes: Vec<u8>, command: String },
    CtrlD,
    ExitConfirmed,
    ToggleChat,
    ShowHistoryPicker { initial_filter: String },
    FocusSwitch,
    ShowPalette,
    /// Nothing to do (e.g. a keystroke swallowed by secret mode).
    Ignored,
}

const CTRL_D_WINDOW: Duration = Duration::from_secs(2);

#[derive(Debug, Default)]
pub struct InputRouter {
    line_buffer: String,
    application_cursor_keys: bool,
    bracketed_paste_enabled: bool,
    full_screen: bool,
    last_ctrl_d: Option<Instant>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_full_screen(&mut self, active: bool) {
        self.full_screen = active;
    }

    pub fn set_application_cursor_keys(&mut self, enabled: bool) {
        self.application_cursor_keys = enabled;
    }

    pub fn set_bracketed_paste(&mut self, enabled: bool) {
        self.bracketed_paste_enabled = enabled;
    }

    pub fn line_buffer(&self) -> &str {
        &self.line_buffer
    }

    /// Detect DECCKM / bracketed-paste mode changes from PTY output bytes.
    pub fn observe_output(&mut self, bytes: &[u8]) {
        if contains(bytes, b"\x1b[?1h") {
            self.application_cursor_keys = true;
        }
        if contains(bytes, b"\x1b[?1l") {
            self.application_cursor_keys = false;
        }
        if contains(bytes, b"\x1b[?2004h") {
            self.bracketed_paste_enabled = true;
        }
        if contains(bytes, b"\x1b[?2004l") {
            self.bracketed_paste_enabled = false;
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, secret_mode: bool) -> RouterAction {
        if self.full_screen {
            return RouterAction::WriteToPty(encode_key(key, self.application_cursor_keys));
        }

        if secret_mode {
            self.line_buffer.clear();
            // Still forward the keystroke so the shell's password prompt
            // keeps working; only local capture is suppressed.
            return RouterAction::WriteToPty(encode_key(key, self.application_cursor_keys));
        }

        match (key.code, key.modifiers) {
            (KeyCode::Char('d'), KeyModifiers::CONTROL) => {
                let now = Instant::now();
                let double = self
                    .last_ctrl_d
                    .map(|prev| now.duration_since(prev) <= CTRL_D_WINDOW)
                    .unwrap_or(false);
                if double {
                    self.last_ctrl_d = None;
                    RouterAction::ExitConfirmed
                } else {
                    self.last_ctrl_d = Some(now);
                    RouterAction::CtrlD
                }
            }
            (KeyCode::Char('t'), KeyModifiers::CONTROL) => RouterAction::ToggleChat,
            (KeyCode::Char('r'), KeyModifiers::CONTROL) => RouterAction::ShowHistoryPicker {
                initial_filter: self.line_buffer.clone(),
            },
            (KeyCode::BackTab, _) => RouterAction::FocusSwitch,
            (KeyCode::Char('/'), KeyModifiers::NONE) if self.line_buffer.is_empty() => {
                RouterAction::ShowPalette
            }
            (KeyCode::Enter, _) => {
                let command = std::mem::take(&mut self.line_buffer);
                RouterAction::SubmitCommand {
                    bytes: b"\r".to_vec(),
                    command,
                }
            }
            (KeyCode::Backspace, _) => {
                self.line_buffer.pop();
                RouterAction::WriteToPty(vec![0x7f])
            }
            (KeyCode::Char(c), _) => {
                self.line_buffer.push(c);
                RouterAction::WriteToPty(c.to_string().into_bytes())
            }
            _ => RouterAction::WriteToPty(encode_key(key, self.application_cursor_keys)),
        }
    }

    /// Apply a bracketed paste payload, honoring the current terminal mode.
    pub fn handle_paste(&mut self, text: &str) -> Vec<u8> {
        if let Some(after_last_newline) = text.rsplit('\n').next() {
            self.line_buffer.push_str(after_last_newline);
        }
        if !self.full_screen && self.bracketed_paste_enabled {
            let mut bytes = Vec::with_capacity(text.len() + 12);
            bytes.extend_from_slice(b"\x1b[200~");
            bytes.extend_from_slice(text.as_bytes());
            bytes.extend_from_slice(b"\x1b[201~");
            bytes
        } else {
            text.as_bytes().to_vec()
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len().max(1))
        .any(|window| window == needle)
}

fn encode_key(key: KeyEvent, application_cursor_keys: bool) -> Vec<u8> {
    match key.code {
        KeyCode::Up => arrow(b'A', application_cursor_keys),
        KeyCode::Down => arrow(b'B', application_cursor_keys),
        KeyCode::Right => arrow(b'C', application_cursor_keys),
        KeyCode::Left => arrow(b'D', application_cursor_keys),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => vec![0x03],
        KeyCode::Char('z') if key.modifiers.contains(KeyModifiers::CONTROL) => vec![0x1a],
        KeyCode::Char(c) => c.to_string().into_bytes(),
        KeyCode::Backspace => vec![0x7f],
        KeyCode::Delete => vec![0x1b, b'[', b'3', b'~'],
        KeyCode::Tab => vec![b'\t'],
        KeyCode::Enter => vec![b'\r'],
        KeyCode::Esc => vec![0x1b],
        _ => Vec::new(),
    }
}

fn arrow(letter: u8, application_mode: bool) -> Vec<u8> {
    if application_mode {
        vec![0x1b, b'O', letter]
    } else {
        vec![0x1b, b'[', letter]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn slash_at_line_start_opens_palette() {
        let mut router = InputRouter::new();
        let action = router.handle_key(key(KeyCode::Char('/'), KeyModifiers::NONE), false);
        assert_eq!(action, RouterAction::ShowPalette);
    }

    #[test]
    fn slash_mid_line_is_forwarded() {
        let mut router = InputRouter::new();
        router.handle_key(key(KeyCode::Char('a'), KeyModifiers::NONE), false);
        let action = router.handle_key(key(KeyCode::Char('/'), KeyModifiers::NONE), false);
        assert_eq!(action, RouterAction::WriteToPty(b"/".to_vec()));
    }

    #[test]
    fn single_ctrl_d_does_not_exit_double_does() {
        let mut router = InputRouter::new();
        let first = router.handle_key(key(KeyCode::Char('d'), KeyModifiers::CONTROL), false);
        assert_eq!(first, RouterAction::CtrlD);
        let second = router.handle_key(key(KeyCode::Char('d'), KeyModifiers::CONTROL), false);
        assert_eq!(second, RouterAction::ExitConfirmed);
    }

    #[test]
    fn arrow_keys_respect_application_mode() {
        let mut router = InputRouter::new();
        router.set_application_cursor_keys(true);
        let action = router.handle_key(key(KeyCode::Up, KeyModifiers::NONE), false);
        assert_eq!(action, RouterAction::WriteToPty(vec![0x1b, b'O', b'A']));
    }

    #[test]
    fn secret_mode_suppresses_line_buffer_capture() {
        let mut router = InputRouter::new();
        for c in "hunter2".chars() {
            router.handle_key(key(KeyCode::Char(c), KeyModifiers::NONE), true);
        }
        assert_eq!(router.line_buffer(), "");
    }

    #[test]
    fn enter_submits_and_clears_buffer() {
        let mut router = InputRouter::new();
        for c in "echo hi".chars() {
            router.handle_key(key(KeyCode::Char(c), KeyModifiers::NONE), false);
        }
        let action = router.handle_key(key(KeyCode::Enter, KeyModifiers::NONE), false);
        assert_eq!(
            action,
            RouterAction::SubmitCommand {
                bytes: b"\r".to_vec(),
                command: "echo hi".to_string(),
            }
        );
        assert_eq!(router.line_buffer(), "");
    }

    #[test]
    fn full_screen_forwards_every_keystroke() {
        let mut router = InputRouter::new();
        router.set_full_screen(true);
        let action = router.handle_key(key(KeyCode::Char('/'), KeyModifiers::NONE), false);
        assert_eq!(action, RouterAction::WriteToPty(b"/".to_vec()));
    }
}
