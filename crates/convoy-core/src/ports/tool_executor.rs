//! Tool execution port used by the conversation orchestrator.
//!
//! The orchestrator never talks to connections directly. It asks an
//! executor for the catalog and hands it one tool call at a time; the
//! executor resolves ownership, invokes the server, and normalizes the
//! result to a string.

use async_trait::async_trait;
use thiserror::Error;

use super::tool_server::McpClientError;
use crate::domain::{ServerStatus, ServerTool, ToolCall};

/// Errors scoped to a single tool call.
///
/// The orchestrator contains these: they become tool-result content and
/// never abort the round.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Server not found: {0}")]
    ServerNotFound(String),

    #[error("Server {server_id} is not connected: {reason}")]
    ServerUnavailable { server_id: String, reason: String },

    #[error("Invalid arguments for tool {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Tool {tool} reported an error: {message}")]
    Remote { tool: String, message: String },

    #[error(transparent)]
    Client(#[from] McpClientError),
}

/// Successful tool execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolExecution {
    /// Server that executed the call.
    pub server_id: String,
    /// Result normalized to a single string.
    pub result: String,
}

/// Port giving access to the tool catalog and tool execution.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Full server-tagged tool catalog.
    async fn available_tools(&self) -> Vec<ServerTool>;

    /// Execute one tool call against its owning server.
    async fn execute(&self, call: &ToolCall) -> Result<ToolExecution, ToolError>;

    /// One status entry per configured server, in configuration order.
    async fn server_status(&self) -> Vec<ServerStatus>;
}
