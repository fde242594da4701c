//! Stdio transport: a child process speaking newline-delimited JSON-RPC.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use convoy_core::McpClientError;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;

use super::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, Transport};

/// Default guard on handshake reads against a child that never answers.
/// npx can be slow on first start.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Methods whose reads are guarded. Tool calls run as long as they need.
const HANDSHAKE_METHODS: &[&str] = &["initialize", "tools/list"];

struct StdioPipes {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// Transport over a spawned child process.
pub struct StdioTransport {
    label: String,
    handshake_timeout: Duration,
    pipes: Mutex<Option<StdioPipes>>,
    child: Mutex<Option<Child>>,
}

impl StdioTransport {
    /// Spawn `program` with exactly `env` as its environment.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        label: &str,
        program: &Path,
        args: &[String],
        env: &BTreeMap<String, String>,
    ) -> Result<Self, McpClientError> {
        let mut command = Command::new(program);
        command
            .args(args)
            .env_clear()
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            McpClientError::SpawnFailed(format!(
                "Failed to spawn '{}': {e}\nArgs: {args:?}\nEffective PATH: {}",
                program.display(),
                env.get("PATH").map_or("", String::as_str)
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpClientError::SpawnFailed("Failed to get stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpClientError::SpawnFailed("Failed to get stdout".to_string()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(label.to_string(), stderr));
        }

        tracing::debug!(server_name = %label, program = %program.display(), "Spawned stdio tool server");

        Ok(Self {
            label: label.to_string(),
            handshake_timeout: HANDSHAKE_TIMEOUT,
            pipes: Mutex::new(Some(StdioPipes {
                stdin,
                stdout: BufReader::new(stdout),
            })),
            child: Mutex::new(Some(child)),
        })
    }

    /// Override the guard applied to `initialize` and `tools/list` reads.
    #[must_use]
    pub fn with_handshake_timeout(mut self, limit: Duration) -> Self {
        self.handshake_timeout = limit;
        self
    }

    async fn write_line(pipes: &mut StdioPipes, line: &str) -> Result<(), McpClientError> {
        pipes.stdin.write_all(line.as_bytes()).await?;
        pipes.stdin.write_all(b"\n").await?;
        pipes.stdin.flush().await?;
        Ok(())
    }
}

/// Read lines until the response for `id` shows up.
///
/// Blank lines, non-JSON output (npx install chatter), and server-initiated
/// messages are skipped.
async fn read_response(
    label: &str,
    reader: &mut BufReader<ChildStdout>,
    id: u64,
) -> Result<JsonRpcResponse, McpClientError> {
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Err(McpClientError::ProtocolError(
                "Server closed connection".to_string(),
            ));
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<JsonRpcResponse>(trimmed) {
            Ok(response) if response.answers(id) => return Ok(response),
            Ok(other) => {
                tracing::debug!(server_name = %label, method = ?other.method, id = ?other.id, "Skipping unrelated JSON-RPC message");
            }
            Err(_) => {
                tracing::debug!(server_name = %label, line = trimmed, "Skipping non-JSON-RPC output");
            }
        }
    }
}

async fn forward_stderr(label: String, stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::debug!(server_name = %label, "stderr: {line}");
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn request(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, McpClientError> {
        let line = serde_json::to_string(&request)?;
        let mut guard = self.pipes.lock().await;
        let pipes = guard.as_mut().ok_or(McpClientError::NotConnected)?;

        Self::write_line(pipes, &line).await?;

        let guarded = HANDSHAKE_METHODS.contains(&request.method.as_str());
        let read = read_response(&self.label, &mut pipes.stdout, request.id);
        if guarded {
            timeout(self.handshake_timeout, read)
                .await
                .map_err(|_| McpClientError::Timeout)?
        } else {
            read.await
        }
    }

    async fn notify(&self, notification: JsonRpcNotification) -> Result<(), McpClientError> {
        let line = serde_json::to_string(&notification)?;
        let mut guard = self.pipes.lock().await;
        let pipes = guard.as_mut().ok_or(McpClientError::NotConnected)?;
        Self::write_line(pipes, &line).await
    }

    async fn close(&self) {
        // Dropping stdin signals EOF before the kill.
        self.pipes.lock().await.take();
        if let Some(mut child) = self.child.lock().await.take() {
            if let Err(e) = child.kill().await {
                tracing::debug!(server_name = %self.label, error = %e, "Tool server already exited");
            }
        }
    }
}
