//! Append-only conversation state of one run.
//!
//! Turns are stored as they happened. [`Transcript::to_messages`] renders
//! them into chat messages, optionally eliding old screen observations so the
//! prompt does not grow with every capture.

use crate::llm::types::{ChatMessage, ToolCall};

const ELIDED_OBSERVATION: &str = "SCREEN_CONTEXT: (omitted, superseded by a newer capture)";

#[derive(Debug, Clone, PartialEq)]
pub enum ConversationTurn {
    System(String),
    Goal(String),
    Observation(String),
    Assistant {
        content: String,
        tool_calls: Vec<ToolCall>,
    },
    ToolResult {
        call_id: String,
        tool: String,
        content: String,
    },
}

impl ConversationTurn {
    fn to_message(&self) -> ChatMessage {
        match self {
            ConversationTurn::System(text) => ChatMessage::system(text.as_str()),
            ConversationTurn::Goal(goal) => ChatMessage::user(format!("GOAL: {goal}")),
            ConversationTurn::Observation(screen) => {
                ChatMessage::user(format!("SCREEN_CONTEXT:\n{screen}"))
            }
            ConversationTurn::Assistant {
                content,
                tool_calls,
            } => ChatMessage::assistant(content.as_str(), tool_calls.clone()),
            ConversationTurn::ToolResult {
                call_id, content, ..
            } => ChatMessage::tool(call_id.as_str(), content.as_str()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<ConversationTurn>,
}

impl Transcript {
    pub fn new(system_prompt: &str, goal: &str) -> Self {
        Self {
            turns: vec![
                ConversationTurn::System(system_prompt.to_string()),
                ConversationTurn::Goal(goal.to_string()),
            ],
        }
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Render as chat messages. With `max_observations = Some(n)` only the
    /// newest `n` observations keep their payload; older ones are replaced by
    /// a short placeholder. Turn order and count never change.
    pub fn to_messages(&self, max_observations: Option<usize>) -> Vec<ChatMessage> {
        let total = self
            .turns
            .iter()
            .filter(|t| matches!(t, ConversationTurn::Observation(_)))
            .count();
        let keep_from = max_observations.map_or(0, |n| total.saturating_sub(n));

        let mut seen = 0;
        self.turns
            .iter()
            .map(|turn| match turn {
                ConversationTurn::Observation(_) => {
                    seen += 1;
                    if seen <= keep_from {
                        ChatMessage::user(ELIDED_OBSERVATION)
                    } else {
                        turn.to_message()
                    }
                }
                _ => turn.to_message(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::tool_call;

    fn sample() -> Transcript {
        let mut t = Transcript::new("system", "open settings");
        t.push(ConversationTurn::Observation("screen 1".into()));
        t.push(ConversationTurn::Assistant {
            content: String::new(),
            tool_calls: vec![tool_call("c1", "android_home", "{}")],
        });
        t.push(ConversationTurn::ToolResult {
            call_id: "c1".into(),
            tool: "android_home".into(),
            content: "Pressed HOME".into(),
        });
        t.push(ConversationTurn::Observation("screen 2".into()));
        t
    }

    #[test]
    fn renders_roles_in_order() {
        let messages = sample().to_messages(None);
        let roles: Vec<_> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "user", "assistant", "tool", "user"]);
        assert_eq!(messages[1].content.as_deref(), Some("GOAL: open settings"));
        assert_eq!(messages[4].tool_call_id.as_deref(), Some("c1"));
        assert_eq!(messages[3].content, None);
    }

    #[test]
    fn old_observations_are_elided_when_bounded() {
        let transcript = sample();
        let messages = transcript.to_messages(Some(1));
        assert_eq!(messages.len(), transcript.len());
        assert_eq!(messages[2].content.as_deref(), Some(ELIDED_OBSERVATION));
        assert_eq!(
            messages[5].content.as_deref(),
            Some("SCREEN_CONTEXT:\nscreen 2")
        );
        // the stored turns keep the full payload
        assert_eq!(
            transcript.turns()[2],
            ConversationTurn::Observation("screen 1".into())
        );
    }

    #[test]
    fn bound_larger_than_history_keeps_everything() {
        let transcript = sample();
        assert_eq!(transcript.to_messages(Some(5)), transcript.to_messages(None));
    }
}
