use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{DroidClawError, DroidClawResult};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmConfig {
    #[serde(default)]
    pub active_provider: String,
    #[serde(default)]
    pub providers: HashMap<String, ProviderEntry>,
    /// Role-to-model mapping. If a role is absent, falls back to active_provider defaults.
    #[serde(default)]
    pub roles: RolesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub display_name: String,
    /// Full chat-completions endpoint, e.g. `https://api.openai.com/v1/chat/completions`.
    pub api_base: String,
    /// Default model for this provider (used as fallback when no role config exists).
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Optional API key stored in config.toml (falls back to env var DROIDCLAW_<ID>_API_KEY).
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Maps agent roles to specific provider+model combinations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RolesConfig {
    /// Tool-calling / function-call capable model driving the device.
    pub tools: Option<RoleEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleEntry {
    /// Must match a key under [llm.providers.*].
    pub provider: String,
    /// Model name sent to the API.
    pub model: String,
    /// Use SSE streaming.
    #[serde(default)]
    pub stream: bool,
    /// Overrides the provider-level temperature for this role.
    pub temperature: Option<f64>,
}

fn default_temperature() -> f64 {
    0.1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_adb_path")]
    pub adb_path: String,
    /// Passed as `adb -s <serial>` when several devices are attached.
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default = "default_remote_dump")]
    pub remote_dump_path: String,
    #[serde(default = "default_local_dump")]
    pub local_dump_path: PathBuf,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            adb_path: default_adb_path(),
            serial: None,
            remote_dump_path: default_remote_dump(),
            local_dump_path: default_local_dump(),
        }
    }
}

fn default_adb_path() -> String {
    "adb".into()
}

fn default_remote_dump() -> String {
    "/sdcard/window_dump.xml".into()
}

fn default_local_dump() -> PathBuf {
    PathBuf::from("window_dump.xml")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Pause between iterations so on-device effects settle before the next capture.
    #[serde(default = "default_iteration_pause_ms")]
    pub iteration_pause_ms: u64,
    /// Delay after every device action.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Delay between the focusing tap and the text input of `android_type`.
    #[serde(default = "default_focus_delay_ms")]
    pub focus_delay_ms: u64,
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    /// Keep only the newest N screen observations verbatim in the prompt.
    #[serde(default)]
    pub max_observations: Option<usize>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            iteration_pause_ms: default_iteration_pause_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            focus_delay_ms: default_focus_delay_ms(),
            command_timeout_secs: default_command_timeout_secs(),
            max_observations: None,
        }
    }
}

fn default_max_iterations() -> u32 {
    10
}

fn default_iteration_pause_ms() -> u64 {
    2000
}

fn default_settle_delay_ms() -> u64 {
    500
}

fn default_focus_delay_ms() -> u64 {
    500
}

fn default_command_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    #[serde(default = "default_true")]
    pub allow_terminal_commands: bool,
    #[serde(default = "default_true")]
    pub allow_file_operations: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            allow_terminal_commands: true,
            allow_file_operations: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn resolve_config_path(explicit: Option<&Path>) -> DroidClawResult<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(DroidClawError::Config(format!(
            "config file {} does not exist",
            path.display()
        )));
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Ok(candidate);
            }
        }
    }

    let cwd = std::env::current_dir()?;
    let candidate = cwd.join("config.toml");
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Ok(candidate);
    }

    if let Some(dir) = dirs::config_dir() {
        let candidate = dir.join("droidclaw").join("config.toml");
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config found in user config dir");
            return Ok(candidate);
        }
    }

    Err(DroidClawError::Config(
        "config.toml not found next to executable, in working directory or user config dir"
            .into(),
    ))
}

pub fn parse_config(content: &str) -> DroidClawResult<AppConfig> {
    let config: AppConfig = toml::from_str(content)?;
    if config.agent.max_iterations == 0 {
        return Err(DroidClawError::Config(
            "agent.max_iterations must be at least 1".into(),
        ));
    }
    Ok(config)
}

pub fn load_config(explicit: Option<&Path>) -> DroidClawResult<AppConfig> {
    let path = resolve_config_path(explicit)?;
    let content = std::fs::read_to_string(&path)?;
    let config = parse_config(&content)?;
    tracing::info!(path = %path.display(), provider = %config.llm.active_provider, "config loaded");
    Ok(config)
}
