//! Full-screen panel: a `vt100`-backed terminal emulator for editors and
//! pagers, parameterized by (rows, cols) minus a one-cell decorative border.

use ratatui::text::Line;

pub struct Panel {
    parser: vt100::Parser,
    rows: u16,
    cols: u16,
}

const BORDER: u16 = 1;

impl Panel {
    pub fn new(rows: u16, cols: u16) -> Self {
        let (content_rows, content_cols) = content_size(rows, cols);
        Self {
            parser: vt100::Parser::new(content_rows, content_cols, 0),
            rows,
            cols,
        }
    }

    pub fn write(&mut self, bytes: &[u8]) {
        self.parser.process(bytes);
    }

    pub fn resize(&mut self, rows: u16, cols: u16) {
        self.rows = rows;
        self.cols = cols;
        let (content_rows, content_cols) = content_size(rows, cols);
        self.parser.set_size(content_rows, content_cols);
    }

    pub fn reset(&mut self) {
        let (content_rows, content_cols) = content_size(self.rows, self.cols);
        self.parser = vt100::Parser::new(content_rows, content_cols, 0);
    }

    pub fn cursor(&self) -> (u16, u16) {
        self.parser.screen().cursor_position()
    }

    /// Render the emulated screen as ratatui lines, SGR-styled, inset by the
    /// one-cell border.
    pub fn render(&self) -> Vec<Line<'static>> {
        let screen = self.parser.screen();
        let (rows, cols) = content_size(self.rows, self.cols);
        let mut lines = Vec::with_capacity(rows as usize);
        for row in 0..rows {
            let mut spans = Vec::new();
            for col in 0..cols {
                if let Some(cell) = screen.cell(row, col) {
                    let style = cell_style(cell);
                    spans.push(ratatui::text::Span::styled(cell.contents(), style));
                }
            }
            lines.push(Line::from(spans));
        }
        lines
    }
}

fn content_size(rows: u16, cols: u16) -> (u16, u16) {
    (rows.saturating_sub(BORDER * 2), cols.saturating_sub(BORDER * 2))
}

fn cell_style(cell: &vt100::Cell) -> ratatui::style::Style {
    let mut style = ratatui::style::Style::default();
    if let Some(fg) = vt_color_to_ratatui(cell.fgcolor()) {
        style = style.fg(fg);
    }
    if let Some(bg) = vt_color_to_ratatui(cell.bgcolor()) {
        style = style.bg(bg);
    }
    if cell.bold() {
        style = style.add_modifier(ratatui::style::Modifier::BOLD);
    }
    if cell.italic() {
        style = style.add_modifier(ratatui::style::Modifier::ITALIC);
    }
    if cell.underline() {
        style = style.add_modifier(ratatui::style::Modifier::UNDERLINED);
    }
    if cell.inverse() {
        style = style.add_modifier(ratatui::style::Modifier::REVERSED);
    }
    style
}

fn vt_color_to_ratatui(color: vt100::Color) -> Option<ratatui::style::Color> {
    match color {
        vt100::Color::Default => None,
        vt100::Color::Idx(i) => Some(ratatui::style::Color::Indexed(i)),
        vt100::Color::Rgb(r, g, b) => Some(ratatui::style::Color::Rgb(r, g, b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_are_contained_to_the_panel() {
        let mut panel = Panel::new(24, 80);
        panel.write(b"hello world");
        let lines = panel.render();
        let first: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(first.starts_with("hello world"));
    }

    #[test]
    fn reset_clears_contents() {
        let mut panel = Panel::new(24, 80);
        panel.write(b"hello world");
        panel.reset();
        let lines = panel.render();
        let first: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(first.trim().is_empty());
    }
}
