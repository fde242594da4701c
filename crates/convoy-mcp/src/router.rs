//! Tool call routing: name to owning server, arguments to JSON, result to text.

use async_trait::async_trait;
use convoy_core::{ServerStatus, ServerTool, ToolCall, ToolError, ToolExecution, ToolExecutor};
use serde_json::{Map, Value};

use crate::manager::{ConnectionSnapshot, ServerConnectionManager};

/// Dispatches model-issued tool calls against a connection snapshot.
pub struct ToolRouter;

impl ToolRouter {
    /// Execute one call.
    ///
    /// Lookup failures, bad arguments, and `isError` results come back as
    /// [`ToolError`]; the caller decides how to contain them.
    pub async fn execute(
        call: &ToolCall,
        snapshot: &ConnectionSnapshot,
    ) -> Result<ToolExecution, ToolError> {
        let name = call.name();
        let tool = snapshot
            .tool(name)
            .ok_or_else(|| ToolError::ToolNotFound(name.to_string()))?;

        let connection = snapshot
            .connection(&tool.server_id)
            .ok_or_else(|| ToolError::ServerNotFound(tool.server_id.clone()))?;
        let client = connection
            .client()
            .ok_or_else(|| ToolError::ServerUnavailable {
                server_id: tool.server_id.clone(),
                reason: connection
                    .error
                    .clone()
                    .unwrap_or_else(|| "not connected".to_string()),
            })?;

        let arguments = Self::parse_arguments(name, &call.function.arguments)?;

        tracing::debug!(tool = name, server_id = %tool.server_id, call_id = %call.id, "Executing tool");
        let result = client.call_tool(name, arguments).await?;
        let text = Self::normalize_content(&result.content);

        if result.is_error {
            return Err(ToolError::Remote {
                tool: name.to_string(),
                message: text,
            });
        }

        Ok(ToolExecution {
            server_id: tool.server_id.clone(),
            result: text,
        })
    }

    /// Parse the JSON-encoded argument string. Empty means no arguments.
    pub fn parse_arguments(tool: &str, raw: &str) -> Result<Map<String, Value>, ToolError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(ToolError::InvalidArguments {
                tool: tool.to_string(),
                reason: format!("expected a JSON object, got {}", json_kind(&other)),
            }),
            Err(e) => Err(ToolError::InvalidArguments {
                tool: tool.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Flatten tool output to one string.
    ///
    /// Content blocks: text blocks contribute their text, anything else
    /// its JSON encoding, joined by newlines. A plain string passes
    /// through; other values are JSON-encoded.
    pub fn normalize_content(content: &Value) -> String {
        match content {
            Value::Null => String::new(),
            Value::String(text) => text.clone(),
            Value::Array(blocks) => blocks
                .iter()
                .map(|block| {
                    let is_text = block.get("type").and_then(Value::as_str) == Some("text");
                    match block.get("text").and_then(Value::as_str) {
                        Some(text) if is_text => text.to_string(),
                        _ => block.to_string(),
                    }
                })
                .collect::<Vec<_>>()
                .join("\n"),
            other => other.to_string(),
        }
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl ToolExecutor for ServerConnectionManager {
    async fn available_tools(&self) -> Vec<ServerTool> {
        self.initialize().await.catalog().to_vec()
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolExecution, ToolError> {
        let snapshot = self.initialize().await;
        ToolRouter::execute(call, &snapshot).await
    }

    async fn server_status(&self) -> Vec<ServerStatus> {
        self.initialize().await.statuses()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockConnector, MockServer};
    use convoy_core::{CallToolResult, ServerConfig};
    use serde_json::json;
    use std::sync::Arc;

    async fn manager_with(server: MockServer) -> ServerConnectionManager {
        let connector = MockConnector::new()
            .with_server("math", server)
            .with_failing("offline");
        let manager = ServerConnectionManager::new(
            vec![
                ServerConfig::script("math", "/srv/math.py", vec![]),
                ServerConfig::remote("offline", "http://127.0.0.1:9/mcp"),
            ],
            Arc::new(connector),
        );
        manager.initialize().await;
        manager
    }

    #[tokio::test]
    async fn test_execute_routes_to_owner() {
        let server = MockServer::new(&["add"]).with_result("add", CallToolResult::text("42"));
        let log = server.call_log();
        let manager = manager_with(server).await;

        let call = ToolCall::new("call_1", "add", r#"{"a": 40, "b": 2}"#);
        let execution = manager.execute(&call).await.unwrap();
        assert_eq!(execution.server_id, "math");
        assert_eq!(execution.result, "42");

        let log = log.lock().unwrap();
        assert_eq!(log[0].0, "add");
        assert_eq!(log[0].1["a"], 40);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let manager = manager_with(MockServer::new(&["add"])).await;
        let call = ToolCall::new("call_1", "divide", "{}");
        assert!(matches!(
            manager.execute(&call).await,
            Err(ToolError::ToolNotFound(name)) if name == "divide"
        ));
    }

    #[tokio::test]
    async fn test_empty_arguments_are_empty_object() {
        let server = MockServer::new(&["now"]).with_result("now", CallToolResult::text("noon"));
        let log = server.call_log();
        let manager = manager_with(server).await;

        let execution = manager.execute(&ToolCall::new("c", "now", "")).await.unwrap();
        assert_eq!(execution.result, "noon");
        assert!(log.lock().unwrap()[0].1.is_empty());
    }

    #[tokio::test]
    async fn test_non_object_arguments_rejected() {
        let manager = manager_with(MockServer::new(&["add"])).await;
        let result = manager.execute(&ToolCall::new("c", "add", "[1, 2]")).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments { .. })));
    }

    #[tokio::test]
    async fn test_is_error_becomes_remote_error() {
        let server = MockServer::new(&["add"]).with_result(
            "add",
            CallToolResult {
                content: json!([{"type": "text", "text": "division by zero"}]),
                is_error: true,
            },
        );
        let manager = manager_with(server).await;
        match manager.execute(&ToolCall::new("c", "add", "{}")).await {
            Err(ToolError::Remote { tool, message }) => {
                assert_eq!(tool, "add");
                assert_eq!(message, "division by zero");
            }
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_client_error_propagates() {
        // No canned result: the mock answers with a JSON-RPC error.
        let manager = manager_with(MockServer::new(&["add"])).await;
        let result = manager.execute(&ToolCall::new("c", "add", "{}")).await;
        assert!(matches!(result, Err(ToolError::Client(_))));
    }

    #[test]
    fn test_normalize_content_blocks() {
        let content = json!([
            {"type": "text", "text": "line one"},
            {"type": "image", "data": "AAA", "mimeType": "image/png"},
            {"type": "text", "text": "line two"}
        ]);
        let text = ToolRouter::normalize_content(&content);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "line one");
        assert!(lines[1].contains("\"image\""));
        assert_eq!(lines[2], "line two");
    }

    #[test]
    fn test_normalize_content_scalars() {
        assert_eq!(ToolRouter::normalize_content(&json!("plain")), "plain");
        assert_eq!(ToolRouter::normalize_content(&json!({"k": 1})), r#"{"k":1}"#);
        assert_eq!(ToolRouter::normalize_content(&Value::Null), "");
    }

    #[tokio::test]
    async fn test_catalog_and_status_via_executor() {
        let manager = manager_with(MockServer::new(&["add", "sub"])).await;
        assert_eq!(manager.available_tools().await.len(), 2);

        let statuses = manager.server_status().await;
        assert_eq!(statuses.len(), 2);
        assert!(statuses[0].connected);
        assert!(!statuses[1].connected);
    }
}
