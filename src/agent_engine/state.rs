use std::time::Duration;

use crate::agent_engine::transcript::Transcript;
use crate::config::AgentConfig;

/// Lifecycle states of a DroidClaw run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AgentState {
    Running,
    Done { summary: String },
    /// The iteration budget ran out before `task_complete` was called.
    Exhausted,
}

impl AgentState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AgentState::Running)
    }
}

/// One dispatched tool call and the text it produced.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ActionRecord {
    pub iteration: u32,
    pub call_id: String,
    pub tool: String,
    pub arguments: String,
    pub result: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LoopConfig {
    pub max_iterations: u32,
    pub iteration_pause: Duration,
    pub max_observations: Option<usize>,
}

impl LoopConfig {
    pub fn from_agent_config(cfg: &AgentConfig) -> Self {
        Self {
            max_iterations: cfg.max_iterations,
            iteration_pause: Duration::from_millis(cfg.iteration_pause_ms),
            max_observations: cfg.max_observations,
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self::from_agent_config(&AgentConfig::default())
    }
}

/// Everything a caller gets back from [`AgentEngine::run`](super::engine::AgentEngine::run).
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub state: AgentState,
    pub iterations: u32,
    pub actions: Vec<ActionRecord>,
    pub transcript: Transcript,
}
