//! Transforms raw PTY bytes into newline-free display lines for the
//! scrollback. Maintains a current-line byte buffer and a column cursor; a
//! line is emitted whenever LF is seen.
//!
//! A small byte-level state machine rather than a full terminal emulator --
//! this one only tracks a single line, never a 2D grid (that's
//! `fullscreen::Panel`'s job).

const TAB_WIDTH: usize = 4;

#[derive(Debug, Default)]
pub struct Normalizer {
    /// Current line buffer; byte-for-byte, SGR sequences preserved.
    line: Vec<u8>,
    /// Column cursor, in "cells" (bytes here; good enough for the ASCII/SGR
    /// content this wrapper deals with -- full Unicode width accounting
    /// lives in the ratatui rendering layer, not the scrollback model).
    col: usize,
    completed: Vec<String>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The not-yet-terminated line currently being written, for the cursor
    /// overlay. Empty once the last byte fed was a newline.
    pub fn current_line(&self) -> String {
        String::from_utf8_lossy(&self.line).into_owned()
    }

    /// Column of the write cursor within [`Self::current_line`].
    pub fn cursor_col(&self) -> usize {
        self.col
    }

    /// Feed a chunk of bytes (already known to be `plain`, i.e. not part of
    /// an alt-screen sequence) through the normalizer. Returns the lines
    /// completed by this chunk, in order; any partial line remains buffered
    /// for the next call.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.completed.clear();
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            match b {
                b'\n' => {
                    self.emit_line();
                    i += 1;
                }
                b'\r' => {
                    if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                        self.emit_line();
                        i += 2;
                    } else if i + 1 < bytes.len() && bytes[i + 1] == 0x1b {
                        // `\r` followed by ESC: don't wipe the line, just
                        // rewind the cursor (preserves colored prompt redraws).
                        self.col = 0;
                        i += 1;
                    } else {
                        self.col = 0;
                        i += 1;
                    }
                }
                0x08 | 0x7f => {
                    self.col = self.col.saturating_sub(1);
                    i += 1;
                }
                b'\t' => {
                    let next_stop = ((self.col / TAB_WIDTH) + 1) * TAB_WIDTH;
                    while self.col < next_stop {
                        self.write_char(b' ');
                    }
                    i += 1;
                }
                0x1b => {
                    let consumed = self.handle_escape(&bytes[i..]);
                    i += consumed.max(1);
                }
                _ => {
                    self.write_char(b);
                    i += 1;
                }
            }
        }
        std::mem::take(&mut self.completed)
    }

    fn emit_line(&mut self) {
        let line = String::from_utf8_lossy(&self.line).replace(['\r', '\n'], "");
        self.completed.push(line);
        self.line.clear();
        self.col = 0;
    }

    fn write_char(&mut self, b: u8) {
        if self.col < self.line.len() {
            self.line[self.col] = b;
        } else {
            while self.line.len() < self.col {
                self.line.push(b' ');
            }
            self.line.push(b);
        }
        self.col += 1;
    }

    fn erase_to_eol(&mut self) {
        self.line.truncate(self.col);
    }

    fn cursor_left(&mut self, n: usize) {
        self.col = self.col.saturating_sub(n);
    }

    fn cursor_right(&mut self, n: usize) {
        self.col += n;
    }

    fn delete_chars(&mut self, n: usize) {
        let end = (self.col + n).min(self.line.len());
        if self.col < end {
            self.line.drain(self.col..end);
        }
    }

    fn erase_chars(&mut self, n: usize) {
        let end = (self.col + n).min(self.line.len());
        for cell in self.line.iter_mut().take(end).skip(self.col) {
            *cell = b' ';
        }
    }

    /// Handle one `ESC`-introduced sequence at the start of `bytes`. Returns
    /// the number of bytes consumed (at least 1).
    fn handle_escape(&mut self, bytes: &[u8]) -> usize {
        if bytes.len() < 2 {
            return 1;
        }
        match bytes[1] {
            b'[' => self.handle_csi(bytes),
            b']' => self.handle_osc(bytes),
            _ => {
                // Preserve SGR-adjacent or unknown simple escapes verbatim as
                // part of the line content so colors survive; two bytes.
                self.write_char(bytes[0]);
                self.write_char(bytes[1]);
                2
            }
        }
    }

    fn handle_csi(&mut self, bytes: &[u8]) -> usize {
        // bytes[0..2] == ESC [ ; params follow until a final byte in 0x40..=0x7e.
        let mut end = 2;
        while end < bytes.len() && !(0x40..=0x7e).contains(&bytes[end]) {
            end += 1;
        }
        if end >= bytes.len() {
            return bytes.len();
        }
        let final_byte = bytes[end];
        let params = &bytes[2..end];
        let consumed = end + 1;

        match final_byte {
            b'm' => {
                // SGR: preserve byte-for-byte.
                for &b in &bytes[..consumed] {
                    self.write_raw(b);
                }
            }
            b'K' => self.erase_to_eol(),
            b'D' => self.cursor_left(parse_param(params, 1)),
            b'C' => self.cursor_right(parse_param(params, 1)),
            b'H' | b'f' => {
                // Absolute position: only the column component matters for a
                // single-line model; row addressing is a full-screen concern.
                let col = params
                    .split(|&b| b == b';')
                    .nth(1)
                    .map(|p| parse_param(p, 1))
                    .unwrap_or(1);
                self.col = col.saturating_sub(1);
            }
            b'P' => self.delete_chars(parse_param(params, 1)),
            b'X' => self.erase_chars(parse_param(params, 1)),
            _ => {
                // Unknown CSI: skipped silently.
            }
        }
        consumed
    }

    fn handle_osc(&mut self, bytes: &[u8]) -> usize {
        // OSC ... (BEL | ESC \\): stripped entirely.
        let mut i = 2;
        while i < bytes.len() {
            if bytes[i] == 0x07 {
                return i + 1;
            }
            if bytes[i] == 0x1b && i + 1 < bytes.len() && bytes[i + 1] == b'\\' {
                return i + 2;
            }
            i += 1;
        }
        bytes.len()
    }

    fn write_raw(&mut self, b: u8) {
        if self.col < self.line.len() {
            self.line.insert(self.col, b);
        } else {
            self.line.push(b);
        }
        self.col += 1;
    }
}

fn parse_param(bytes: &[u8], default: usize) -> usize {
    if bytes.is_empty() {
        return default;
    }
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.split(';').next())
        .and_then(|s| s.parse().ok())
        .filter(|&n: &usize| n != 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent_on_plain_text() {
        let mut n = Normalizer::new();
        let lines = n.feed(b"hello\nworld\n");
        assert_eq!(lines, vec!["hello".to_string(), "world".to_string()]);
    }

    #[test]
    fn trailing_partial_line_is_buffered() {
        let mut n = Normalizer::new();
        let lines = n.feed(b"hello\nworld");
        assert_eq!(lines, vec!["hello".to_string()]);
        let more = n.feed(b"!\n");
        assert_eq!(more, vec!["world!".to_string()]);
    }

    #[test]
    fn overwrite_on_cr() {
        let mut n = Normalizer::new();
        let lines = n.feed(b"prompt$ \roverwrite$ \n");
        assert_eq!(lines, vec!["overwrite$ ".to_string()]);
    }

    #[test]
    fn readline_erase() {
        let mut n = Normalizer::new();
        let lines = n.feed(b"ab\x08 \x08\n");
        assert_eq!(lines, vec!["a".to_string()]);
    }

    #[test]
    fn csi_cursor_back_edit() {
        let mut n = Normalizer::new();
        let lines = n.feed(b"git staus\x1b[2Dtus\n");
        assert_eq!(lines, vec!["git status".to_string()]);
    }

    #[test]
    fn cr_before_escape_does_not_wipe_line() {
        let mut n = Normalizer::new();
        // `\r` then ESC[32m (color) then more text, then newline: the line
        // content should still read as the full colored prompt, not wiped.
        let lines = n.feed(b"abc\r\x1b[32mdef\n");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("def"));
    }

    #[test]
    fn osc_sequences_are_stripped() {
        let mut n = Normalizer::new();
        let lines = n.feed(b"\x1b]0;window title\x07hello\n");
        assert_eq!(lines, vec!["hello".to_string()]);
    }

    #[test]
    fn tab_expands_to_next_multiple_of_four() {
        let mut n = Normalizer::new();
        let lines = n.feed(b"a\tb\n");
        assert_eq!(lines, vec!["a   b".to_string()]);
    }

    #[test]
    fn unknown_csi_is_skipped_silently() {
        let mut n = Normalizer::new();
        let lines = n.feed(b"abc\x1b[9zdef\n");
        assert_eq!(lines, vec!["abcdef".to_string()]);
    }
}
