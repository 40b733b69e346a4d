use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Result;
use crate::error::WtfError;

/// Supported LLM providers. New variants fall back to the OpenAI-compatible
/// wire format (see `llm::openai_compatible`) unless they grow a dedicated
/// adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Openrouter,
    Openai,
    Copilot,
    Anthropic,
    Google,
}

impl Provider {
    pub fn default_api_url(self) -> &'static str {
        match self {
            Provider::Openrouter => "https://openrouter.ai/api/v1",
            Provider::Openai => "https://api.openai.com/v1",
            Provider::Copilot => "https://api.githubcopilot.com",
            Provider::Anthropic => "https://api.anthropic.com/v1",
            Provider::Google => "https://generativelanguage.googleapis.com/v1beta",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Text,
}

impl Default for LogFormat {
    fn default() -> Self {
        LogFormat::Text
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub api_timeout_seconds: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            api_url: None,
            temperature: Some(0.2),
            max_tokens: Some(2048),
            api_timeout_seconds: Some(20),
        }
    }
}

/// Top-level config persisted at `~/.wtf_cli/config.json`. Unknown keys are
/// ignored on load (`serde(deny_unknown_fields)` is deliberately absent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_provider")]
    pub llm_provider: Provider,
    #[serde(default)]
    pub providers: HashMap<Provider, ProviderConfig>,
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    #[serde(default = "default_context_window")]
    pub context_window: usize,
    #[serde(default)]
    pub log_level: LogLevel,
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_provider() -> Provider {
    Provider::Openai
}

fn default_buffer_size() -> usize {
    2000
}

fn default_context_window() -> usize {
    4000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_provider: default_provider(),
            providers: HashMap::new(),
            buffer_size: default_buffer_size(),
            context_window: default_context_window(),
            log_level: LogLevel::default(),
            log_format: LogFormat::default(),
            log_file: None,
        }
    }
}

impl Config {
    pub fn active_provider_config(&self) -> ProviderConfig {
        self.providers
            .get(&self.llm_provider)
            .cloned()
            .unwrap_or_default()
    }
}

/// Directory under `$HOME` where all wtf-cli state lives.
pub fn wtf_home() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| {
        WtfError::Other(anyhow::anyhow!("could not determine home directory"))
    })?;
    Ok(home.join(".wtf_cli"))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(wtf_home()?.join("config.json"))
}

/// Load the config file, creating `~/.wtf_cli` if necessary. Returns the
/// default config when the file does not yet exist; a malformed existing
/// file is a fatal startup error.
pub fn load() -> Result<Config> {
    let home = wtf_home()?;
    std::fs::create_dir_all(&home).map_err(|source| WtfError::ConfigRead {
        path: home.clone(),
        source,
    })?;
    let path = home.join("config.json");
    load_from(&path)
}

fn load_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|source| WtfError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| WtfError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Persist the config back to `~/.wtf_cli/config.json`, used by the settings
/// overlay on save.
pub fn save(config: &Config) -> Result<()> {
    let path = config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| WtfError::ConfigRead {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let serialized = serde_json::to_string_pretty(config).map_err(|source| WtfError::ConfigParse {
        path: path.clone(),
        source,
    })?;
    std::fs::write(&path, serialized).map_err(|source| WtfError::ConfigRead { path, source })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let cfg = load_from(&path).unwrap();
        assert_eq!(cfg.buffer_size, 2000);
        assert_eq!(cfg.context_window, 4000);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"llm_provider": "openai", "buffer_size": 500, "totally_unknown": 42}"#,
        )
        .unwrap();
        let cfg = load_from(&path).unwrap();
        assert_eq!(cfg.buffer_size, 500);
        assert_eq!(cfg.llm_provider, Provider::Openai);
    }

    #[test]
    fn malformed_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_from(&path).is_err());
    }
}
