//! Status bar: one-line footer with cwd, git branch, active model label,
//! and a transient message, truncated to width with an ellipsis.

use std::path::Path;
use std::path::PathBuf;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::Paragraph;

#[derive(Debug, Default)]
pub struct StatusBar {
    cwd: Option<PathBuf>,
    branch: Option<String>,
    model: String,
    transient: Option<String>,
}

impl StatusBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cwd(&mut self, cwd: Option<PathBuf>) {
        self.branch = cwd.as_deref().and_then(read_git_branch);
        self.cwd = cwd;
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn set_transient(&mut self, message: impl Into<String>) {
        self.transient = Some(message.into());
    }

    pub fn clear_transient(&mut self) {
        self.transient = None;
    }

    fn text(&self) -> String {
        let cwd = self
            .cwd
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "?".to_string());
        let mut parts = vec![cwd];
        if let Some(branch) = &self.branch {
            parts.push(format!("({branch})"));
        }
        parts.push(self.model.clone());
        if let Some(t) = &self.transient {
            parts.push(t.clone());
        }
        parts.join("  ")
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let truncated = truncate_ellipsis(&self.text(), area.width as usize);
        frame.render_widget(Paragraph::new(truncated).style(Style::default()), area);
    }
}

/// Best-effort current branch name by reading `.git/HEAD` directly, no
/// `git` subprocess. Returns `None` if not inside a repo or HEAD is
/// detached in a format we don't parse.
fn read_git_branch(cwd: &Path) -> Option<String> {
    let mut dir = cwd.to_path_buf();
    loop {
        let head = dir.join(".git").join("HEAD");
        if head.is_file() {
            let content = std::fs::read_to_string(&head).ok()?;
            let content = content.trim();
            return content
                .strip_prefix("ref: refs/heads/")
                .map(str::to_string)
                .or_else(|| Some(content.get(..7).unwrap_or(content).to_string()));
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Truncate to at most `width` display columns, appending `...` when
/// truncated. Uses display width rather than char count so wide (e.g. CJK)
/// characters don't overflow the footer.
fn truncate_ellipsis(s: &str, width: usize) -> String {
    use unicode_width::UnicodeWidthChar;
    use unicode_width::UnicodeWidthStr;

    if width == 0 {
        return String::new();
    }
    if s.width() <= width {
        return s.to_string();
    }
    if width <= 3 {
        let mut out = String::new();
        let mut used = 0;
        for c in s.chars() {
            let w = c.width().unwrap_or(0);
            if used + w > width {
                break;
            }
            used += w;
            out.push(c);
        }
        return out;
    }
    let keep = width - 3;
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > keep {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_unchanged() {
        assert_eq!(truncate_ellipsis("hello", 20), "hello");
    }

    #[test]
    fn long_text_gets_ellipsis() {
        let truncated = truncate_ellipsis("/home/user/project/deeply/nested", 12);
        assert_eq!(truncated.chars().count(), 12);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn branch_not_found_outside_repo() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_git_branch(dir.path()).is_none());
    }

    #[test]
    fn branch_parsed_from_head_ref() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join(".git").join("HEAD"), "ref: refs/heads/main\n").unwrap();
        assert_eq!(read_git_branch(dir.path()), Some("main".to_string()));
    }
}
