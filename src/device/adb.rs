use async_trait::async_trait;
use tokio::process::Command;

use crate::config::DeviceConfig;
use crate::device::transport::DeviceTransport;
use crate::errors::{DroidClawError, DroidClawResult};

/// Runs commands through the `adb` binary on the host.
pub struct AdbTransport {
    adb_path: String,
    serial: Option<String>,
}

impl AdbTransport {
    pub fn new(adb_path: String, serial: Option<String>) -> Self {
        Self { adb_path, serial }
    }

    pub fn from_config(cfg: &DeviceConfig) -> Self {
        Self::new(cfg.adb_path.clone(), cfg.serial.clone())
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.adb_path);
        if let Some(serial) = &self.serial {
            cmd.arg("-s").arg(serial);
        }
        cmd.args(args).kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl DeviceTransport for AdbTransport {
    async fn run(&self, args: &[&str]) -> DroidClawResult<String> {
        tracing::debug!(adb = %self.adb_path, ?args, "adb command");
        let output = self.command(args).output().await.map_err(|e| {
            DroidClawError::Transport(format!("failed to run {}: {e}", self.adb_path))
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        // Advisory only: adb reports some failures on stderr with a zero exit code.
        if stderr.to_lowercase().contains("error") {
            tracing::warn!(?args, stderr = %stderr.trim(), "adb reported an error");
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
