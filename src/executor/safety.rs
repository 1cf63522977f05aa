// Host-side safety gate, configured from the `[safety]` section.
use crate::config::SafetyConfig;
use crate::tools::catalog::ToolInvocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostPolicy {
    pub allow_terminal_commands: bool,
    pub allow_file_operations: bool,
}

impl Default for HostPolicy {
    fn default() -> Self {
        Self {
            allow_terminal_commands: true,
            allow_file_operations: true,
        }
    }
}

impl From<&SafetyConfig> for HostPolicy {
    fn from(cfg: &SafetyConfig) -> Self {
        Self {
            allow_terminal_commands: cfg.allow_terminal_commands,
            allow_file_operations: cfg.allow_file_operations,
        }
    }
}

impl HostPolicy {
    /// Reason the invocation must not run, if the policy forbids it.
    pub fn denial(&self, invocation: &ToolInvocation) -> Option<String> {
        match invocation {
            ToolInvocation::HostRunCommand { .. } if !self.allow_terminal_commands => Some(
                "Error: host command execution is disabled by configuration".to_string(),
            ),
            ToolInvocation::HostReadFile { .. }
            | ToolInvocation::HostWriteFile { .. }
            | ToolInvocation::HostListDirectory { .. }
                if !self.allow_file_operations =>
            {
                Some("Error: host file operations are disabled by configuration".to_string())
            }
            _ => None,
        }
    }
}
