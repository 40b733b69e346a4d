//! Stream coordinator: converts LLM delta events into mutations of the
//! sidebar's last assistant message, with throttled rendering.

use super::ChatHistory;
use super::ChatMessage;
use crate::llm::Role;

pub const THINKING_PLACEHOLDER: &str = "Thinking...";
pub const THROTTLE_MS: u64 = 50;

/// What the caller should do after feeding an event to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderAction {
    /// Re-render now, and arm a throttle timer if not already armed.
    RenderAndArmTimer,
    /// State changed but nothing should be rendered until the timer fires.
    Silent,
    /// Re-render now; no timer involved.
    RenderNow,
    /// Nothing changed.
    None,
}

#[derive(Debug, Default)]
pub struct StreamCoordinator {
    active: bool,
    placeholder_active: bool,
    throttle_pending: bool,
}

impl StreamCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start a new stream. Refuses (returns `false`) if one is already in
    /// flight.
    pub fn start(&mut self, history: &mut ChatHistory) -> bool {
        if self.active {
            return false;
        }
        history.push(ChatMessage {
            role: Role::Assistant,
            content: THINKING_PLACEHOLDER.to_string(),
            immutable: false,
        });
        self.active = true;
        self.placeholder_active = true;
        self.throttle_pending = false;
        true
    }

    /// The first non-empty delta replaces the placeholder; subsequent
    /// deltas append.
    pub fn on_delta(&mut self, history: &mut ChatHistory, delta: &str) -> RenderAction {
        if !self.active || delta.is_empty() {
            return RenderAction::None;
        }
        let Some(msg) = history.last_assistant_mut() else {
            return RenderAction::None;
        };
        if self.placeholder_active {
            msg.content = delta.to_string();
            self.placeholder_active = false;
        } else {
            msg.content.push_str(delta);
        }

        if self.throttle_pending {
            RenderAction::Silent
        } else {
            self.throttle_pending = true;
            RenderAction::RenderAndArmTimer
        }
    }

    /// The throttle timer fired; flush if a render is pending.
    pub fn on_throttle_tick(&mut self) -> RenderAction {
        if self.throttle_pending {
            self.throttle_pending = false;
            RenderAction::RenderNow
        } else {
            RenderAction::None
        }
    }

    pub fn on_done(&mut self, history: &mut ChatHistory) {
        if let Some(msg) = history.last_assistant_mut() {
            msg.immutable = true;
        }
        self.reset();
    }

    pub fn on_err(&mut self, history: &mut ChatHistory, message: &str) {
        if self.placeholder_active {
            history.remove_trailing_placeholder(THINKING_PLACEHOLDER);
        }
        history.push(ChatMessage::system(format!("Error: {message}")));
        self.reset();
    }

    fn reset(&mut self) {
        self.active = false;
        self.placeholder_active = false;
        self.throttle_pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_then_replace_then_append() {
        let mut history = ChatHistory::new();
        let mut coord = StreamCoordinator::new();
        assert!(coord.start(&mut history));
        assert_eq!(history.last_assistant().unwrap().content, THINKING_PLACEHOLDER);

        let action = coord.on_delta(&mut history, "Hel");
        assert_eq!(action, RenderAction::RenderAndArmTimer);
        assert_eq!(history.last_assistant().unwrap().content, "Hel");

        let action = coord.on_delta(&mut history, "lo");
        assert_eq!(action, RenderAction::Silent);
        assert_eq!(history.last_assistant().unwrap().content, "Hello");

        coord.on_done(&mut history);
        assert!(history.last_assistant().unwrap().immutable);
        assert_eq!(history.last_assistant().unwrap().content, "Hello");
        assert!(!coord.is_active());
    }

    #[test]
    fn second_submission_is_refused_while_active() {
        let mut history = ChatHistory::new();
        let mut coord = StreamCoordinator::new();
        assert!(coord.start(&mut history));
        assert!(!coord.start(&mut history));
    }

    #[test]
    fn error_before_any_delta_removes_placeholder() {
        let mut history = ChatHistory::new();
        let mut coord = StreamCoordinator::new();
        coord.start(&mut history);
        coord.on_err(&mut history, "boom");
        assert_eq!(history.messages().len(), 1);
        assert_eq!(history.messages()[0].content, "Error: boom");
        assert!(!coord.is_active());
    }

    #[test]
    fn throttle_tick_only_renders_when_pending() {
        let mut history = ChatHistory::new();
        let mut coord = StreamCoordinator::new();
        coord.start(&mut history);
        coord.on_delta(&mut history, "a");
        assert_eq!(coord.on_throttle_tick(), RenderAction::RenderNow);
        assert_eq!(coord.on_throttle_tick(), RenderAction::None);
    }
}
