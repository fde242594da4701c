//! MCP JSON-RPC client for communicating with tool servers.
//!
//! Implements the MCP protocol (JSON-RPC 2.0) over a pluggable
//! [`Transport`]: stdio, legacy HTTP+SSE, and streamable HTTP.
//! Reference: <https://spec.modelcontextprotocol.io/>

mod sse;
mod sse_parser;
mod stdio;
mod streamable_http;

pub use sse::SseTransport;
pub use sse_parser::{SseEvent, SseParser};
pub use stdio::{HANDSHAKE_TIMEOUT, StdioTransport};
pub use streamable_http::StreamableHttpTransport;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use convoy_core::{CallToolResult, McpClientError, McpTool, ToolServerClient};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Protocol revision sent in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 notification (no id, no response).
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: Value,
}

/// JSON-RPC 2.0 message received from a server.
///
/// `method` is only present when the server sends its own request or
/// notification; transports skip those while waiting for a response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Whether this message answers the request with the given id.
    pub fn answers(&self, id: u64) -> bool {
        self.method.is_none() && self.id == Some(id)
    }
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

/// MCP initialize result.
#[derive(Debug, Clone, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    #[serde(rename = "serverInfo", default)]
    pub server_info: Option<ServerInfo>,
    #[serde(default)]
    pub capabilities: ServerCapabilities,
}

/// Server information from initialize.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Server capabilities. Only `tools` matters to this client.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServerCapabilities {
    #[serde(default)]
    pub tools: Option<Value>,
}

/// One page of a `tools/list` result.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListToolsPage {
    #[serde(default)]
    tools: Vec<McpTool>,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Message channel to one tool server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and wait for the response carrying the same id.
    async fn request(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, McpClientError>;

    /// Fire-and-forget notification.
    async fn notify(&self, notification: JsonRpcNotification) -> Result<(), McpClientError>;

    /// Release the underlying process or connection.
    async fn close(&self);
}

/// An initialized MCP session over some transport.
pub struct McpClient {
    transport: Box<dyn Transport>,
    request_id: AtomicU64,
    server_info: Option<ServerInfo>,
    capabilities: ServerCapabilities,
}

impl McpClient {
    /// Run the `initialize` handshake over `transport`.
    pub async fn connect(transport: Box<dyn Transport>) -> Result<Self, McpClientError> {
        let mut client = Self {
            transport,
            request_id: AtomicU64::new(1),
            server_info: None,
            capabilities: ServerCapabilities::default(),
        };
        if let Err(e) = client.initialize().await {
            client.transport.close().await;
            return Err(e);
        }
        Ok(client)
    }

    async fn initialize(&mut self) -> Result<(), McpClientError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "clientInfo": {
                "name": "convoy",
                "version": env!("CARGO_PKG_VERSION")
            },
            "capabilities": {}
        });

        let result: InitializeResult = self.request("initialize", Some(params)).await?;
        tracing::debug!(
            protocol_version = %result.protocol_version,
            server = result.server_info.as_ref().map_or("unknown", |s| s.name.as_str()),
            "MCP session initialized"
        );
        self.server_info = result.server_info;
        self.capabilities = result.capabilities;

        self.transport
            .notify(JsonRpcNotification {
                jsonrpc: "2.0",
                method: "notifications/initialized".to_string(),
                params: json!({}),
            })
            .await
    }

    /// Server info reported during initialize.
    pub const fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<T, McpClientError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let response = self
            .transport
            .request(JsonRpcRequest {
                jsonrpc: "2.0",
                id,
                method: method.to_string(),
                params,
            })
            .await?;

        if let Some(err) = response.error {
            return Err(McpClientError::ServerError {
                code: err.code,
                message: err.message,
            });
        }

        let result = response.result.ok_or_else(|| {
            McpClientError::ProtocolError("Missing result in response".to_string())
        })?;

        serde_json::from_value(result).map_err(Into::into)
    }
}

#[async_trait]
impl ToolServerClient for McpClient {
    async fn list_tools(&self) -> Result<Vec<McpTool>, McpClientError> {
        if self.capabilities.tools.is_none() {
            return Ok(Vec::new());
        }

        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let page: ListToolsPage = self.request("tools/list", params).await?;
            tools.extend(page.tools);

            match page.next_cursor {
                Some(next) if !next.is_empty() => {
                    if cursor.as_deref() == Some(next.as_str()) {
                        tracing::warn!(cursor = %next, "tools/list repeated its cursor, stopping");
                        break;
                    }
                    cursor = Some(next);
                }
                _ => break,
            }
        }
        Ok(tools)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<CallToolResult, McpClientError> {
        let params = json!({
            "name": name,
            "arguments": arguments
        });
        self.request("tools/call", Some(params)).await
    }

    async fn disconnect(&self) {
        self.transport.close().await;
    }
}

/// Convert configured header pairs into a reqwest header map.
pub(crate) fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, McpClientError> {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| McpClientError::InvalidConfig(format!("Invalid header name {key}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| McpClientError::InvalidConfig(format!("Invalid header value for {key}: {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

pub(crate) fn http_error(err: &reqwest::Error) -> McpClientError {
    McpClientError::Http(err.to_string())
}
