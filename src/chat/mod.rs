//! Chat sidebar data model.

pub mod sidebar;
pub mod stream;

use crate::llm::Role;

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Set once a streamed message is finalized by a `done` event; further
    /// mutation is a programming error after this point.
    pub immutable: bool,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            immutable: true,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            immutable: true,
        }
    }
}

/// Append-only list of chat messages owned by the sidebar. The last
/// assistant message may be mutated while streaming.
#[derive(Debug, Default)]
pub struct ChatHistory {
    messages: Vec<ChatMessage>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last_assistant_mut(&mut self) -> Option<&mut ChatMessage> {
        self.messages
            .iter_mut()
            .rev()
            .find(|m| matches!(m.role, Role::Assistant))
    }

    pub fn last_assistant(&self) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, Role::Assistant))
    }

    /// Drop the last message if it is the unmodified streaming placeholder.
    /// Used when a stream errors out before any delta arrived.
    pub fn remove_trailing_placeholder(&mut self, placeholder: &str) {
        if let Some(last) = self.messages.last() {
            if matches!(last.role, Role::Assistant) && last.content == placeholder && !last.immutable {
                self.messages.pop();
            }
        }
    }

    /// The messages as a provider-ready list, for building context.
    pub fn to_llm_messages(&self) -> Vec<crate::llm::ChatMessage> {
        self.messages
            .iter()
            .map(|m| crate::llm::ChatMessage {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }
}
