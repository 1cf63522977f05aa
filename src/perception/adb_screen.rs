use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::DeviceConfig;
use crate::device::transport::DeviceTransport;
use crate::errors::{DroidClawError, DroidClawResult};
use crate::perception::sanitizer::get_interactive_elements;
use crate::perception::traits::ScreenSource;

/// Captures the UI hierarchy with `uiautomator dump` and pulls it to the host.
pub struct AdbScreenSource {
    transport: Arc<dyn DeviceTransport>,
    remote_dump_path: String,
    local_dump_path: PathBuf,
}

impl AdbScreenSource {
    pub fn new(
        transport: Arc<dyn DeviceTransport>,
        remote_dump_path: String,
        local_dump_path: PathBuf,
    ) -> Self {
        Self {
            transport,
            remote_dump_path,
            local_dump_path,
        }
    }

    pub fn from_config(transport: Arc<dyn DeviceTransport>, cfg: &DeviceConfig) -> Self {
        Self::new(
            transport,
            cfg.remote_dump_path.clone(),
            cfg.local_dump_path.clone(),
        )
    }

    async fn capture_xml(&self) -> DroidClawResult<String> {
        // A dump left over from an earlier iteration must never be mistaken
        // for the current screen.
        match tokio::fs::remove_file(&self.local_dump_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        self.transport
            .run(&["shell", "uiautomator", "dump", self.remote_dump_path.as_str()])
            .await?;
        let local = self.local_dump_path.to_string_lossy();
        self.transport
            .run(&["pull", self.remote_dump_path.as_str(), local.as_ref()])
            .await?;

        if !tokio::fs::try_exists(&self.local_dump_path).await.unwrap_or(false) {
            return Err(DroidClawError::Perception("Could not capture screen.".into()));
        }
        Ok(tokio::fs::read_to_string(&self.local_dump_path).await?)
    }
}

#[async_trait]
impl ScreenSource for AdbScreenSource {
    async fn capture(&self) -> String {
        let xml = match self.capture_xml().await {
            Ok(xml) => xml,
            Err(DroidClawError::Perception(msg)) => {
                tracing::warn!(%msg, "screen capture failed");
                return format!("Error: {msg}");
            }
            Err(e) => {
                tracing::warn!(error = %e, "screen capture failed");
                return format!("Error: Could not capture screen. {e}");
            }
        };

        let elements = get_interactive_elements(&xml);
        tracing::info!(elements = elements.len(), "screen captured");
        match serde_json::to_string_pretty(&elements) {
            Ok(json) => json,
            Err(e) => format!("Error: could not serialize screen elements: {e}"),
        }
    }
}
