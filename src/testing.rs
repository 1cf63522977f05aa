//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::device::transport::DeviceTransport;
use crate::errors::{DroidClawError, DroidClawResult};
use crate::llm::provider::LlmProvider;
use crate::llm::types::{CallConfig, ChatMessage, FunctionCall, LlmResponse, ToolCall, ToolDef};
use crate::perception::traits::ScreenSource;

pub fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCall {
    ToolCall {
        id: id.into(),
        call_type: "function".into(),
        function: FunctionCall {
            name: name.into(),
            arguments: arguments.into(),
        },
    }
}

/// Records every command; optionally fails all of them.
#[derive(Default)]
pub struct RecordingTransport {
    commands: Mutex<Vec<String>>,
    fail_with: Option<String>,
}

impl RecordingTransport {
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeviceTransport for RecordingTransport {
    async fn run(&self, args: &[&str]) -> DroidClawResult<String> {
        self.commands.lock().unwrap().push(args.join(" "));
        if let Some(msg) = &self.fail_with {
            return Err(DroidClawError::Transport(msg.clone()));
        }
        Ok(String::new())
    }
}

/// Returns the same observation every time and counts captures.
pub struct StaticScreen {
    pub observation: String,
    pub captures: Mutex<u32>,
}

impl StaticScreen {
    pub fn new(observation: &str) -> Self {
        Self {
            observation: observation.into(),
            captures: Mutex::new(0),
        }
    }

    pub fn captures(&self) -> u32 {
        *self.captures.lock().unwrap()
    }
}

#[async_trait]
impl ScreenSource for StaticScreen {
    async fn capture(&self) -> String {
        *self.captures.lock().unwrap() += 1;
        self.observation.clone()
    }
}

/// Plays back scripted replies; once the script is empty it keeps
/// answering with plain text.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<DroidClawResult<LlmResponse>>>,
    pub seen: Mutex<Vec<Vec<ChatMessage>>>,
    pub seen_tools: Mutex<Vec<Vec<ToolDef>>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<DroidClawResult<LlmResponse>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

pub fn reply_with_calls(calls: Vec<ToolCall>) -> DroidClawResult<LlmResponse> {
    Ok(LlmResponse {
        content: String::new(),
        reasoning: String::new(),
        tool_calls: calls,
    })
}

pub fn reply_text(text: &str) -> DroidClawResult<LlmResponse> {
    Ok(LlmResponse {
        content: text.into(),
        ..LlmResponse::default()
    })
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolDef>,
        _cfg: &CallConfig,
    ) -> DroidClawResult<LlmResponse> {
        self.seen.lock().unwrap().push(messages);
        self.seen_tools.lock().unwrap().push(tools);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| reply_text("still thinking"))
    }
}
