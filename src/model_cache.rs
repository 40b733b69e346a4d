use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::config::wtf_home;
use crate::error::Result;
use crate::error::WtfError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCache {
    pub updated_at: DateTime<Utc>,
    pub models: Vec<ModelInfo>,
}

fn cache_path() -> Result<std::path::PathBuf> {
    Ok(wtf_home()?.join("models_cache.json"))
}

/// Read the cache; a missing or malformed file is treated as "no cache" so
/// the model picker can still open with whatever was cached even if a
/// fresh fetch fails.
pub fn read() -> Option<ModelCache> {
    let path = cache_path().ok()?;
    let contents = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}

pub fn write(cache: &ModelCache) -> Result<()> {
    let path = cache_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| WtfError::ConfigRead {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let serialized = serde_json::to_string_pretty(cache).map_err(|source| WtfError::ConfigParse {
        path: path.clone(),
        source,
    })?;
    std::fs::write(&path, serialized).map_err(|source| WtfError::ConfigRead { path, source })?;
    Ok(())
}
