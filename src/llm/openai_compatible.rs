//! OpenAI-compatible chat-completions streaming client (covers
//! `openai`/`openrouter`/copilot-style gateways). `eventsource_stream`
//! decodes the response body into named SSE events, a background task turns
//! those into [`StreamEvent`] values on an `mpsc` channel, and the caller
//! gets back a plain stream so the coordinator doesn't need to know about
//! reqwest or SSE framing at all.

use std::time::Duration;

use eventsource_stream::Eventsource;
use futures::StreamExt;
use futures::stream::BoxStream;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::ChatRequest;
use super::LlmProvider;
use super::StreamEvent;
use crate::error::Result;
use crate::error::WtfError;
use crate::model_cache::ModelInfo;

pub struct OpenAiCompatibleProvider {
    api_key: String,
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Self {
        Self {
            api_key,
            base_url,
            timeout,
            http: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletionChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Deserialize, Default)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    async fn stream_chat(&self, req: ChatRequest) -> Result<BoxStream<'static, StreamEvent>> {
        let body = json!({
            "model": req.model,
            "temperature": req.temperature,
            "max_tokens": req.max_tokens,
            "stream": true,
            "messages": req.messages.iter().map(|m| json!({
                "role": match m.role {
                    super::Role::User => "user",
                    super::Role::Assistant => "assistant",
                    super::Role::System => "system",
                },
                "content": m.content,
            })).collect::<Vec<_>>(),
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| WtfError::Stream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(WtfError::Stream(format!("provider returned {status}")));
        }

        let (tx, rx) = mpsc::channel::<StreamEvent>(64);
        let mut events = response.bytes_stream().eventsource();
        tokio::spawn(async move {
            while let Some(event) = events.next().await {
                match event {
                    Ok(event) => {
                        if event.data == "[DONE]" {
                            let _ = tx.send(StreamEvent::Done).await;
                            break;
                        }
                        match serde_json::from_str::<ChatCompletionChunk>(&event.data) {
                            Ok(chunk) => {
                                if let Some(choice) = chunk.choices.into_iter().next() {
                                    if let Some(content) = choice.delta.content {
                                        if !content.is_empty()
                                            && tx.send(StreamEvent::Delta(content)).await.is_err()
                                        {
                                            break;
                                        }
                                    }
                                }
                            }
                            Err(_) => continue,
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(StreamEvent::Err(e.to_string())).await;
                        break;
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let response = self
            .http
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| WtfError::ModelFetch {
                provider: self.base_url.clone(),
                source: e.into(),
            })?;

        let parsed: ModelsResponse = response.json().await.map_err(|e| WtfError::ModelFetch {
            provider: self.base_url.clone(),
            source: e.into(),
        })?;

        Ok(parsed
            .data
            .into_iter()
            .map(|m| ModelInfo {
                name: m.id.clone(),
                id: m.id,
            })
            .collect())
    }
}
