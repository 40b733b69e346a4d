//! Command record extraction and history merge. The prompt-line heuristic
//! is fragile across shells and prompt themes; this implements only the
//! contract it can name reliably -- `$ ` / `# ` delimiter, last occurrence
//! -- and nothing fancier.

use chrono::DateTime;
use chrono::Utc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    pub command: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub working_dir: Option<String>,
    pub exit_code: Option<i32>,
}

/// Extract a command from a normalized prompt line using the last
/// occurrence of `$ ` or `# ` as the delimiter.
pub fn extract_command(line: &str) -> Option<String> {
    let dollar = line.rfind("$ ");
    let hash = line.rfind("# ");
    let idx = match (dollar, hash) {
        (Some(d), Some(h)) => Some(d.max(h)),
        (Some(d), None) => Some(d),
        (None, Some(h)) => Some(h),
        (None, None) => None,
    }?;
    let command = line[idx + 2..].trim();
    if command.is_empty() {
        None
    } else {
        Some(command.to_string())
    }
}

/// Session-scoped command history, deduped against the immediately prior
/// record within a 2-second window.
#[derive(Debug, Default)]
pub struct SessionHistory {
    records: Vec<CommandRecord>,
}

const DEDUP_WINDOW_SECONDS: i64 = 2;

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: CommandRecord) {
        if let Some(last) = self.records.last() {
            let within_window =
                (record.start_time - last.start_time).num_seconds().abs() <= DEDUP_WINDOW_SECONDS;
            if within_window && last.command == record.command {
                return;
            }
        }
        self.records.push(record);
    }

    pub fn records(&self) -> &[CommandRecord] {
        &self.records
    }

    pub fn commands(&self) -> Vec<String> {
        self.records.iter().map(|r| r.command.clone()).collect()
    }
}

/// Merge session history (first) with shell history, preserving session-
/// first order, deduplicating case-sensitively, and dropping empty/
/// whitespace-only entries.
pub fn merge(session_history: &[String], shell_history: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut merged = Vec::new();
    for entry in session_history.iter().chain(shell_history.iter()) {
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            merged.push(trimmed.to_string());
        }
    }
    merged
}

/// Read the shell history file used by the history picker: `$HISTFILE` if
/// set, otherwise a shell-appropriate default under `$HOME`.
pub fn read_shell_history() -> Vec<String> {
    let path = std::env::var("HISTFILE").map(std::path::PathBuf::from).ok().or_else(|| {
        dirs::home_dir().map(|home| {
            let shell = crate::pty::login_shell();
            if shell.ends_with("zsh") {
                home.join(".zsh_history")
            } else {
                home.join(".bash_history")
            }
        })
    });
    let Some(path) = path else {
        return Vec::new();
    };
    let Ok(contents) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    contents
        .lines()
        .map(|line| {
            // zsh extended history prefixes entries with `: <ts>:<dur>;`.
            line.split_once(';').map(|(_, cmd)| cmd).unwrap_or(line).to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn extracts_command_after_last_delimiter() {
        assert_eq!(
            extract_command("user@host:~/proj$ git status"),
            Some("git status".to_string())
        );
        assert_eq!(
            extract_command("root@host:/# ls -la"),
            Some("ls -la".to_string())
        );
        assert_eq!(extract_command("no delimiter here"), None);
    }

    #[test]
    fn dedupes_identical_command_within_window() {
        let mut h = SessionHistory::new();
        h.push(CommandRecord {
            command: "ls".into(),
            start_time: ts(0),
            end_time: None,
            working_dir: None,
            exit_code: None,
        });
        h.push(CommandRecord {
            command: "ls".into(),
            start_time: ts(1),
            end_time: None,
            working_dir: None,
            exit_code: None,
        });
        assert_eq!(h.records().len(), 1);

        h.push(CommandRecord {
            command: "ls".into(),
            start_time: ts(5),
            end_time: None,
            working_dir: None,
            exit_code: None,
        });
        assert_eq!(h.records().len(), 2);
    }

    #[test]
    fn merge_preserves_session_first_order_and_dedupes() {
        let session = vec!["git status".to_string(), "ls".to_string()];
        let shell = vec!["ls".to_string(), "  ".to_string(), "echo hi".to_string()];
        let merged = merge(&session, &shell);
        assert_eq!(
            merged,
            vec!["git status".to_string(), "ls".to_string(), "echo hi".to_string()]
        );
    }

    #[test]
    fn merge_is_case_sensitive() {
        let session = vec!["Ls".to_string()];
        let shell = vec!["ls".to_string()];
        let merged = merge(&session, &shell);
        assert_eq!(merged, vec!["Ls".to_string(), "ls".to_string()]);
    }
}
