use std::path::PathBuf;

/// Domain error type for `wtf-cli`.
///
/// A typed error returned from library code; `main.rs` adds
/// `anyhow::Context` on top at the process boundary.
#[derive(thiserror::Error, Debug)]
pub enum WtfError {
    #[error("failed to spawn shell {shell:?}: {source}")]
    PtySpawn {
        shell: String,
        #[source]
        source: std::io::Error,
    },

    #[error("PTY read failed")]
    PtyRead(#[source] std::io::Error),

    #[error("PTY write failed")]
    PtyWrite(#[source] std::io::Error),

    #[error("PTY resize failed")]
    PtyResize(#[source] anyhow::Error),

    #[error("config file {path:?} could not be parsed: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("config file {path:?} could not be read: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model fetch from provider {provider} failed: {source}")]
    ModelFetch {
        provider: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("LLM stream error: {0}")]
    Stream(String),

    #[error("invalid value for field {field}: {reason}")]
    OverlayValidation { field: String, reason: String },

    #[error("stdout is not a terminal")]
    NotATerminal,

    #[error("terminal I/O error: {0}")]
    Io(#[source] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, WtfError>;
