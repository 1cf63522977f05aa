//! End-to-end run against stub collaborators: the model taps the Settings
//! icon, then reports completion.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use droidclaw_lib::agent_engine::engine::AgentEngine;
use droidclaw_lib::agent_engine::state::{AgentState, LoopConfig};
use droidclaw_lib::agent_engine::transcript::ConversationTurn;
use droidclaw_lib::device::transport::DeviceTransport;
use droidclaw_lib::errors::DroidClawResult;
use droidclaw_lib::executor::dispatcher::Dispatcher;
use droidclaw_lib::executor::host::HostActions;
use droidclaw_lib::executor::input::AndroidInput;
use droidclaw_lib::executor::safety::HostPolicy;
use droidclaw_lib::llm::provider::LlmProvider;
use droidclaw_lib::llm::types::{
    CallConfig, ChatMessage, FunctionCall, LlmResponse, ToolCall, ToolDef,
};
use droidclaw_lib::perception::traits::ScreenSource;
use droidclaw_lib::tools::registry::ToolRegistry;

const HOME_SCREEN: &str = r#"[
  {"type": "TextView", "text": "Settings", "bounds": [50, 150, 150, 250], "center": [100, 200], "clickable": true}
]"#;

#[derive(Default)]
struct Device {
    commands: Mutex<Vec<String>>,
}

#[async_trait]
impl DeviceTransport for Device {
    async fn run(&self, args: &[&str]) -> DroidClawResult<String> {
        self.commands.lock().unwrap().push(args.join(" "));
        Ok(String::new())
    }
}

struct Screen;

#[async_trait]
impl ScreenSource for Screen {
    async fn capture(&self) -> String {
        HOME_SCREEN.to_string()
    }
}

struct Model {
    replies: Mutex<VecDeque<Vec<ToolCall>>>,
    dispatched: Mutex<Vec<String>>,
}

#[async_trait]
impl LlmProvider for Model {
    fn name(&self) -> &str {
        "stub"
    }

    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        _tools: Vec<ToolDef>,
        _cfg: &CallConfig,
    ) -> DroidClawResult<LlmResponse> {
        assert!(messages
            .iter()
            .any(|m| m.content.as_deref().is_some_and(|c| c.contains("Settings"))));
        let calls = self.replies.lock().unwrap().pop_front().unwrap_or_default();
        self.dispatched
            .lock()
            .unwrap()
            .extend(calls.iter().map(|c| c.function.name.clone()));
        Ok(LlmResponse {
            tool_calls: calls,
            ..LlmResponse::default()
        })
    }
}

fn call(id: &str, name: &str, arguments: &str) -> ToolCall {
    ToolCall {
        id: id.into(),
        call_type: "function".into(),
        function: FunctionCall {
            name: name.into(),
            arguments: arguments.into(),
        },
    }
}

#[tokio::test]
async fn tap_settings_then_complete() {
    let device = Arc::new(Device::default());
    let model = Arc::new(Model {
        replies: Mutex::new(VecDeque::from(vec![
            vec![call("call_1", "android_tap", r#"{"x": 100, "y": 200}"#)],
            vec![call("call_2", "task_complete", r#"{"summary": "Opened Settings"}"#)],
        ])),
        dispatched: Mutex::new(Vec::new()),
    });

    let registry = Arc::new(ToolRegistry::builtin().unwrap());
    let dispatcher = Dispatcher::new(
        registry.clone(),
        AndroidInput::new(device.clone(), Duration::ZERO, Duration::ZERO),
        HostActions::new(Duration::from_secs(5)),
        HostPolicy::default(),
    );
    let engine = AgentEngine::new(
        model.clone(),
        CallConfig {
            model: "stub-model".into(),
            stream: false,
            temperature: 0.1,
        },
        registry,
        dispatcher,
        Arc::new(Screen),
        LoopConfig {
            max_iterations: 10,
            iteration_pause: Duration::ZERO,
            max_observations: Some(2),
        },
    );

    let report = engine.run("tap settings").await.unwrap();

    assert_eq!(
        report.state,
        AgentState::Done {
            summary: "Opened Settings".into()
        }
    );
    assert_eq!(report.iterations, 2);
    assert_eq!(
        *model.dispatched.lock().unwrap(),
        vec!["android_tap".to_string(), "task_complete".to_string()]
    );
    assert_eq!(
        *device.commands.lock().unwrap(),
        vec!["shell input tap 100 200".to_string()]
    );
    assert_eq!(report.actions.len(), 2);
    assert_eq!(report.actions[0].result, "Tapped at (100, 200)");
    assert_eq!(report.actions[1].tool, "task_complete");

    let turns = report.transcript.turns();
    assert_eq!(turns[1], ConversationTurn::Goal("tap settings".into()));
    let results: Vec<_> = turns
        .iter()
        .filter_map(|t| match t {
            ConversationTurn::ToolResult { call_id, tool, content } => {
                Some((call_id.as_str(), tool.as_str(), content.as_str()))
            }
            _ => None,
        })
        .collect();
    assert_eq!(results, vec![("call_1", "android_tap", "Tapped at (100, 200)")]);
    // system, goal, then observation + assistant + tool result, observation + assistant
    assert_eq!(turns.len(), 7);
}
