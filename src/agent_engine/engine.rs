use std::sync::Arc;

use crate::agent_engine::loop_control::LoopController;
use crate::agent_engine::state::{ActionRecord, AgentState, LoopConfig, RunReport};
use crate::agent_engine::transcript::{ConversationTurn, Transcript};
use crate::errors::DroidClawResult;
use crate::executor::dispatcher::{DispatchOutcome, Dispatcher};
use crate::llm::provider::LlmProvider;
use crate::llm::types::{CallConfig, ToolDef};
use crate::perception::traits::ScreenSource;
use crate::tools::catalog::task_complete;
use crate::tools::registry::ToolRegistry;

const SYSTEM_PROMPT: &str = "\
You are DroidClaw, an Android driver agent. Your job is to achieve the user's goal by operating the device.

Every turn you receive the current screen as a JSON list of interactive UI elements.
Each element carries its text, accessibility description and (x, y) `center` coordinates.

Rules:
- Act through the provided tools only. Tap elements using their `center` coordinates.
- To type into a field, pass its coordinates to `android_type` so it gets focused first.
- Use `android_wait` when the screen is still loading.
- Host tools operate on the computer running the agent, not on the phone.
- When the goal is achieved, call `task_complete` with a short summary.";

pub struct AgentEngine {
    provider: Arc<dyn LlmProvider>,
    call_cfg: CallConfig,
    registry: Arc<ToolRegistry>,
    dispatcher: Dispatcher,
    screen: Arc<dyn ScreenSource>,
    config: LoopConfig,
}

impl AgentEngine {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        call_cfg: CallConfig,
        registry: Arc<ToolRegistry>,
        dispatcher: Dispatcher,
        screen: Arc<dyn ScreenSource>,
        config: LoopConfig,
    ) -> Self {
        Self {
            provider,
            call_cfg,
            registry,
            dispatcher,
            screen,
            config,
        }
    }

    /// Drive the perceive → reason → act cycle until the goal is reported
    /// complete or the iteration budget runs out.
    ///
    /// Only a failing reasoning service ends the run with `Err`; action and
    /// perception failures are fed back to the model as text.
    pub async fn run(&self, goal: &str) -> DroidClawResult<RunReport> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let tools: Vec<ToolDef> = self.registry.tool_defs();
        let mut transcript = Transcript::new(SYSTEM_PROMPT, goal);
        let mut loop_ctrl = LoopController::new(self.config.max_iterations);
        let mut actions = Vec::new();
        let mut state = AgentState::Running;

        tracing::info!(
            run_id = %run_id,
            goal = %goal,
            max_iterations = self.config.max_iterations,
            tools = tools.len(),
            "agent run started"
        );

        while loop_ctrl.begin_iteration() {
            let iteration = loop_ctrl.iterations();
            tracing::info!(iteration, "step started");

            // ── Perceive ──────────────────────────────────────────────────
            let observation = self.screen.capture().await;
            tracing::debug!(bytes = observation.len(), "observation captured");
            transcript.push(ConversationTurn::Observation(observation));

            // ── Reason ────────────────────────────────────────────────────
            let messages = transcript.to_messages(self.config.max_observations);
            let response = match self
                .provider
                .chat(messages, tools.clone(), &self.call_cfg)
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::error!(run_id = %run_id, iteration, error = %e, "LLM call failed");
                    return Err(e);
                }
            };
            if !response.reasoning.is_empty() {
                tracing::debug!(reasoning = %response.reasoning, "model reasoning");
            }
            transcript.push(ConversationTurn::Assistant {
                content: response.content.clone(),
                tool_calls: response.tool_calls.clone(),
            });

            // ── Act ───────────────────────────────────────────────────────
            if response.tool_calls.is_empty() {
                tracing::info!(remark = %response.content, "no tool call in reply");
            }
            for call in &response.tool_calls {
                match self.dispatcher.dispatch(call).await {
                    DispatchOutcome::Completed { summary } => {
                        tracing::info!(summary = %summary, iteration, "goal achieved");
                        actions.push(ActionRecord {
                            iteration,
                            call_id: call.id.clone(),
                            tool: call.function.name.clone(),
                            arguments: call.function.arguments.clone(),
                            result: task_complete(&summary),
                            timestamp: chrono::Utc::now(),
                        });
                        state = AgentState::Done { summary };
                        break;
                    }
                    DispatchOutcome::ToolResult(result) => {
                        tracing::info!(tool = %call.function.name, result = %result, "tool result");
                        transcript.push(ConversationTurn::ToolResult {
                            call_id: call.id.clone(),
                            tool: call.function.name.clone(),
                            content: result.clone(),
                        });
                        actions.push(ActionRecord {
                            iteration,
                            call_id: call.id.clone(),
                            tool: call.function.name.clone(),
                            arguments: call.function.arguments.clone(),
                            result,
                            timestamp: chrono::Utc::now(),
                        });
                    }
                }
            }

            if state.is_terminal() {
                break;
            }
            if loop_ctrl.remaining() > 0 && !self.config.iteration_pause.is_zero() {
                tokio::time::sleep(self.config.iteration_pause).await;
            }
        }

        if state == AgentState::Running {
            tracing::warn!(
                run_id = %run_id,
                iterations = loop_ctrl.iterations(),
                "iteration budget exhausted"
            );
            state = AgentState::Exhausted;
        }

        Ok(RunReport {
            run_id,
            state,
            iterations: loop_ctrl.iterations(),
            actions,
            transcript,
        })
    }
}
