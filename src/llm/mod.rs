//! LLM adapter contract. Only the streaming interface is specified in
//! depth; `openai_compatible` implements one real wire format since at
//! least one concrete adapter is needed for the stream coordinator to
//! exercise end-to-end.

pub mod openai_compatible;

use futures::stream::BoxStream;
use serde::Deserialize;
use serde::Serialize;

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::model_cache::ModelInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// One event in the ordered delta stream.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Delta(String),
    Done,
    Err(String),
}

/// Adapter contract every provider implements.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    async fn stream_chat(&self, req: ChatRequest) -> Result<BoxStream<'static, StreamEvent>>;
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;
}

/// Construct the provider implementation for a config entry. Every named
/// provider resolves to the OpenAI-compatible wire format today; see
/// DESIGN.md for why only one wire format is implemented in depth.
pub fn build_provider(config: &ProviderConfig, default_url: &str) -> openai_compatible::OpenAiCompatibleProvider {
    openai_compatible::OpenAiCompatibleProvider::new(
        config.api_key.clone().unwrap_or_default(),
        config
            .api_url
            .clone()
            .unwrap_or_else(|| default_url.to_string()),
        std::time::Duration::from_secs(config.api_timeout_seconds.unwrap_or(20)),
    )
}
