//! Tool server client port.
//!
//! This is the consumed capability of an MCP client: connect to a server,
//! list its tools, and call one. `convoy-mcp` provides the JSON-RPC
//! implementation; tests substitute their own.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{ServerConfig, Tool};

/// Errors that can occur during tool server client operations.
#[derive(Debug, Error)]
pub enum McpClientError {
    #[error("Failed to spawn MCP server process: {0}")]
    SpawnFailed(String),

    #[error("Failed to communicate with MCP server: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP transport error: {0}")]
    Http(String),

    #[error("MCP protocol error: {0}")]
    ProtocolError(String),

    #[error("Timeout waiting for MCP server response")]
    Timeout,

    #[error("MCP server returned error: code={code}, message={message}")]
    ServerError { code: i64, message: String },

    #[error("Server not connected")]
    NotConnected,

    #[error("Invalid server configuration: {0}")]
    InvalidConfig(String),
}

/// Tool definition as listed by an MCP server (`tools/list`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpTool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "inputSchema", skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

impl McpTool {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    #[must_use]
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Convert into the function-tool shape offered to providers.
    pub fn into_tool(self) -> Tool {
        let mut tool = Tool::new(self.name);
        if let Some(desc) = self.description {
            tool = tool.with_description(desc);
        }
        tool.with_parameters(self.input_schema.unwrap_or(Value::Null))
    }
}

/// Result of `tools/call`.
///
/// `content` is kept as raw JSON: servers return an array of content
/// blocks, but some return a plain string or an arbitrary object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Value,
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl CallToolResult {
    /// A successful single text block result.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: serde_json::json!([{ "type": "text", "text": text.into() }]),
            is_error: false,
        }
    }
}

/// A connected tool server session.
#[async_trait]
pub trait ToolServerClient: Send + Sync {
    /// List the tools the server exposes.
    async fn list_tools(&self) -> Result<Vec<McpTool>, McpClientError>;

    /// Invoke a tool with already-parsed JSON arguments.
    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<CallToolResult, McpClientError>;

    /// Tear the session down (kills stdio children). Default: nothing to do.
    async fn disconnect(&self) {}
}

/// Factory that opens a session for one server configuration.
#[async_trait]
pub trait ToolServerConnector: Send + Sync {
    async fn connect(
        &self,
        config: &ServerConfig,
    ) -> Result<Arc<dyn ToolServerClient>, McpClientError>;
}
