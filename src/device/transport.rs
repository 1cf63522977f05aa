use async_trait::async_trait;

use crate::errors::DroidClawResult;

/// Sends one command to the device and returns its captured text output.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    /// `args` are everything after the transport binary, e.g.
    /// `["shell", "input", "tap", "10", "20"]`. Returns trimmed stdout.
    async fn run(&self, args: &[&str]) -> DroidClawResult<String>;
}
