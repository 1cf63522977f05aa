//! DroidClaw command line entry point.
//!
//! Usage:
//!   droidclaw "open the settings app"
//!   droidclaw --max-steps 20 --config ./config.toml "turn on wifi"
//!   droidclaw            # prompts for the goal

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use droidclaw_lib::agent_engine::engine::AgentEngine;
use droidclaw_lib::agent_engine::state::{AgentState, LoopConfig};
use droidclaw_lib::config::load_config;
use droidclaw_lib::device::adb::AdbTransport;
use droidclaw_lib::device::transport::DeviceTransport;
use droidclaw_lib::errors::{DroidClawError, DroidClawResult};
use droidclaw_lib::executor::dispatcher::Dispatcher;
use droidclaw_lib::executor::host::HostActions;
use droidclaw_lib::executor::input::AndroidInput;
use droidclaw_lib::executor::safety::HostPolicy;
use droidclaw_lib::llm::registry::ProviderRegistry;
use droidclaw_lib::perception::adb_screen::AdbScreenSource;
use droidclaw_lib::tools::registry::ToolRegistry;

/// DroidClaw: drive an Android device toward a goal with an LLM.
#[derive(Parser)]
#[command(name = "droidclaw", version, about)]
struct Cli {
    /// What the agent should achieve. Read from stdin when omitted.
    goal: Option<String>,

    /// Iteration budget; overrides `agent.max_iterations`.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_steps: Option<u32>,

    /// Path to config.toml.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(AgentState::Done { summary }) => {
            println!("Goal achieved: {summary}");
            ExitCode::SUCCESS
        }
        Ok(_) => {
            println!("Stopped: iteration budget exhausted before the goal was reached.");
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> DroidClawResult<AgentState> {
    let config = load_config(cli.config.as_deref())?;

    let goal = match cli.goal {
        Some(goal) => goal,
        None => prompt_goal().await?,
    };
    if goal.trim().is_empty() {
        return Err(DroidClawError::Agent("goal must not be empty".into()));
    }

    let providers = ProviderRegistry::from_config(&config);
    let (provider, call_cfg) = providers.tools_call_config()?;

    let transport: Arc<dyn DeviceTransport> = Arc::new(AdbTransport::from_config(&config.device));
    let screen = Arc::new(AdbScreenSource::from_config(transport.clone(), &config.device));
    let agent = &config.agent;
    let android = AndroidInput::new(
        transport,
        Duration::from_millis(agent.settle_delay_ms),
        Duration::from_millis(agent.focus_delay_ms),
    );
    let host = HostActions::new(Duration::from_secs(agent.command_timeout_secs));

    let registry = Arc::new(ToolRegistry::builtin()?);
    let dispatcher = Dispatcher::new(
        registry.clone(),
        android,
        host,
        HostPolicy::from(&config.safety),
    );

    let mut loop_config = LoopConfig::from_agent_config(agent);
    if let Some(steps) = cli.max_steps {
        loop_config.max_iterations = steps;
    }

    let engine = AgentEngine::new(provider, call_cfg, registry, dispatcher, screen, loop_config);
    let report = engine.run(goal.trim()).await?;
    tracing::info!(
        run_id = %report.run_id,
        iterations = report.iterations,
        actions = report.actions.len(),
        state = ?report.state,
        "run finished"
    );
    Ok(report.state)
}

async fn prompt_goal() -> DroidClawResult<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"Enter your goal: ").await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(line.trim().to_string())
}
