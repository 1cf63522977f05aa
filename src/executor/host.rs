// Host-side actions: file access and bounded shell commands.
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

const PIPE_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

pub struct HostActions {
    command_timeout: Duration,
}

impl HostActions {
    pub fn new(command_timeout: Duration) -> Self {
        Self { command_timeout }
    }

    pub async fn read_file(&self, filepath: &str) -> String {
        tracing::info!(path = %filepath, "host read");
        match tokio::fs::read(filepath).await {
            Ok(bytes) if bytes.is_empty() => format!("File {filepath} is empty"),
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => format!("Error: could not read {filepath}: {e}"),
        }
    }

    pub async fn write_file(&self, filepath: &str, content: &str) -> String {
        tracing::info!(path = %filepath, bytes = content.len(), "host write");
        if let Some(parent) = Path::new(filepath).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    return format!("Error: could not create {}: {e}", parent.display());
                }
            }
        }
        match tokio::fs::write(filepath, content).await {
            Ok(()) => format!("Wrote {} bytes to {filepath}", content.len()),
            Err(e) => format!("Error: could not write {filepath}: {e}"),
        }
    }

    pub async fn list_directory(&self, directory: &str) -> String {
        tracing::info!(dir = %directory, "host list");
        let mut dir = match tokio::fs::read_dir(directory).await {
            Ok(d) => d,
            Err(e) => return format!("Error: could not list {directory}: {e}"),
        };
        let mut entries = Vec::new();
        loop {
            match dir.next_entry().await {
                Ok(Some(entry)) => {
                    let mut name = entry.file_name().to_string_lossy().into_owned();
                    if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                        name.push('/');
                    }
                    entries.push(name);
                }
                Ok(None) => break,
                Err(e) => return format!("Error: could not list {directory}: {e}"),
            }
        }
        if entries.is_empty() {
            return format!("Directory {directory} is empty");
        }
        entries.sort();
        entries.join("\n")
    }

    /// Run `command` through the platform shell. On unix the shell leads its
    /// own process group; when it exits or the timeout fires, the whole group
    /// is killed so no background job or subshell outlives the call.
    pub async fn run_command(&self, command: &str) -> String {
        tracing::info!(command = %command, timeout_secs = self.command_timeout.as_secs(), "host command");
        let mut cmd = shell(command);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(c) => c,
            Err(e) => return format!("Error: could not start command: {e}"),
        };
        let pgid = child.id();

        let stdout = tokio::spawn(read_pipe(child.stdout.take()));
        let stderr = tokio::spawn(read_pipe(child.stderr.take()));

        let waited = tokio::time::timeout(self.command_timeout, child.wait()).await;
        kill_process_group(pgid);

        let status = match waited {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => return format!("Error: command failed: {e}"),
            Err(_) => {
                let secs = self.command_timeout.as_secs();
                tracing::warn!(command = %command, secs, "host command timed out, killing");
                if let Err(e) = child.start_kill() {
                    tracing::debug!(error = %e, "shell already gone after group kill");
                }
                let _ = child.wait().await;
                return format!("Error: Command timed out after {secs} seconds");
            }
        };

        let out = drain(stdout).await;
        let err = drain(stderr).await;
        format_output(status.code(), &out, &err)
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            tracing::debug!(error = %e, "reading command output failed");
        }
    }
    buf
}

/// Output collected by a pipe reader. A writer that escaped the process
/// group could hold the pipe open forever, so the wait is bounded.
async fn drain(reader: JoinHandle<Vec<u8>>) -> Vec<u8> {
    match tokio::time::timeout(PIPE_DRAIN_TIMEOUT, reader).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "output reader task failed");
            Vec::new()
        }
        Err(_) => {
            tracing::warn!("command output still open after the shell exited");
            Vec::new()
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pgid: Option<u32>) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pgid) = pgid.and_then(|id| i32::try_from(id).ok()) else {
        return;
    };
    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => tracing::warn!(pgid, error = %e, "could not kill process group"),
    }
}

#[cfg(windows)]
fn kill_process_group(_pgid: Option<u32>) {}

#[cfg(unix)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

fn format_output(code: Option<i32>, stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);
    let mut text = stdout.trim_end().to_string();
    if !stderr.trim().is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str("STDERR:\n");
        text.push_str(stderr.trim_end());
    }
    match code {
        Some(0) => {}
        Some(c) => text.push_str(&format!("\n(exit code {c})")),
        None => text.push_str("\n(terminated by signal)"),
    }
    if text.trim().is_empty() {
        return "Command completed with no output".to_string();
    }
    text.trim_start_matches('\n').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> HostActions {
        HostActions::new(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn write_then_read_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/notes.txt");
        let path = path.to_str().unwrap();

        let msg = host().write_file(path, "hello device").await;
        assert_eq!(msg, format!("Wrote 12 bytes to {path}"));
        assert_eq!(host().read_file(path).await, "hello device");
    }

    #[tokio::test]
    async fn read_missing_file_is_error_text() {
        let msg = host().read_file("/definitely/missing/file.txt").await;
        assert!(msg.starts_with("Error: could not read"));
    }

    #[tokio::test]
    async fn list_directory_sorts_and_marks_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "x").unwrap();
        std::fs::create_dir(dir.path().join("a_dir")).unwrap();
        let listing = host().list_directory(dir.path().to_str().unwrap()).await;
        assert_eq!(listing, "a_dir/\nb.txt");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_output_and_exit_code() {
        assert_eq!(host().run_command("echo hi").await, "hi");
        let msg = host().run_command("echo oops >&2; exit 3").await;
        assert_eq!(msg, "STDERR:\noops\n(exit code 3)");
        assert_eq!(host().run_command("true").await, "Command completed with no output");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timed_out_command_is_killed() {
        let dir = tempfile::tempdir().unwrap();
        let sentinel = dir.path().join("sentinel");
        let host = HostActions::new(Duration::from_secs(1));
        let cmd = format!("sleep 3 && touch {}", sentinel.display());

        let msg = host.run_command(&cmd).await;
        assert_eq!(msg, "Error: Command timed out after 1 seconds");

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(!sentinel.exists(), "command kept running after timeout");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timed_out_subshell_is_killed_with_its_group() {
        let dir = tempfile::tempdir().unwrap();
        let sentinel = dir.path().join("sentinel");
        let host = HostActions::new(Duration::from_secs(1));
        let cmd = format!("(sleep 2; touch {}); true", sentinel.display());

        let msg = host.run_command(&cmd).await;
        assert_eq!(msg, "Error: Command timed out after 1 seconds");

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!sentinel.exists(), "subshell kept running after timeout");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn background_job_does_not_hold_the_call_open() {
        let dir = tempfile::tempdir().unwrap();
        let sentinel = dir.path().join("sentinel");
        let cmd = format!("(sleep 2; touch {}) & echo hi", sentinel.display());

        let started = std::time::Instant::now();
        let msg = host().run_command(&cmd).await;
        assert_eq!(msg, "hi");
        assert!(started.elapsed() < Duration::from_secs(2));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!sentinel.exists(), "background job outlived the command");
    }
}
