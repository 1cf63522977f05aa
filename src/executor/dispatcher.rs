// Tool call dispatcher: resolve → parse → gate → execute → render as text.
use std::sync::Arc;

use crate::errors::DispatchError;
use crate::executor::host::HostActions;
use crate::executor::input::AndroidInput;
use crate::executor::safety::HostPolicy;
use crate::llm::types::ToolCall;
use crate::tools::catalog::{self, ToolInvocation};
use crate::tools::registry::ToolRegistry;

/// What the agent loop should do with a dispatched call.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Text to append as the tool result.
    ToolResult(String),
    /// `task_complete` was called; the run is over.
    Completed { summary: String },
}

pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    android: AndroidInput,
    host: HostActions,
    policy: HostPolicy,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ToolRegistry>,
        android: AndroidInput,
        host: HostActions,
        policy: HostPolicy,
    ) -> Self {
        Self {
            registry,
            android,
            host,
            policy,
        }
    }

    /// Turn a model tool call into a typed invocation without executing it.
    pub fn resolve(&self, call: &ToolCall) -> Result<ToolInvocation, DispatchError> {
        let name = call.function.name.as_str();
        let tool = self
            .registry
            .lookup(name)
            .ok_or_else(|| DispatchError::UnknownTool(name.to_string()))?;

        let raw = call.function.arguments.trim();
        let args: serde_json::Value = if raw.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(raw).map_err(|e| {
                DispatchError::invalid(name, format!("arguments are not valid JSON: {e}"))
            })?
        };
        ToolInvocation::parse(&tool.action, &args)
    }

    /// Execute one call. Never fails: every problem is rendered into the result text.
    pub async fn dispatch(&self, call: &ToolCall) -> DispatchOutcome {
        let invocation = match self.resolve(call) {
            Ok(inv) => inv,
            Err(e) => {
                tracing::warn!(tool = %call.function.name, error = %e, "dispatch rejected");
                return DispatchOutcome::ToolResult(format!("Error: {e}"));
            }
        };

        let kind = invocation.kind();
        tracing::info!(
            tool = kind.name(),
            domain = ?kind.domain(),
            call_id = %call.id,
            "dispatching"
        );

        if let Some(denied) = self.policy.denial(&invocation) {
            tracing::warn!(tool = kind.name(), "blocked by host policy");
            return DispatchOutcome::ToolResult(denied);
        }

        let is_control = matches!(invocation, ToolInvocation::TaskComplete { .. });
        let result = self.execute(invocation).await;
        if is_control {
            if let Some(summary) = catalog::completion_summary(&result) {
                return DispatchOutcome::Completed {
                    summary: summary.to_string(),
                };
            }
        }
        DispatchOutcome::ToolResult(result)
    }

    async fn execute(&self, invocation: ToolInvocation) -> String {
        match invocation {
            ToolInvocation::AndroidTap { x, y } => self.android.tap(x, y).await,
            ToolInvocation::AndroidType { text, x, y } => {
                let focus = x.zip(y);
                self.android.type_text(&text, focus).await
            }
            ToolInvocation::AndroidHome => self.android.home().await,
            ToolInvocation::AndroidBack => self.android.back().await,
            ToolInvocation::AndroidSwipe { x1, y1, x2, y2, duration_ms } => {
                self.android.swipe(x1, y1, x2, y2, duration_ms).await
            }
            ToolInvocation::AndroidWait { seconds } => self.android.wait(seconds).await,
            ToolInvocation::HostReadFile { filepath } => self.host.read_file(&filepath).await,
            ToolInvocation::HostWriteFile { filepath, content } => {
                self.host.write_file(&filepath, &content).await
            }
            ToolInvocation::HostRunCommand { command } => self.host.run_command(&command).await,
            ToolInvocation::HostListDirectory { directory } => {
                self.host.list_directory(&directory).await
            }
            ToolInvocation::TaskComplete { summary } => catalog::task_complete(&summary),
        }
    }
}
