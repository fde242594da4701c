//! In-memory tool servers for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use convoy_core::{
    CallToolResult, McpClientError, McpTool, ServerConfig, ToolServerClient, ToolServerConnector,
};
use serde_json::{Map, Value, json};

/// A fake server: fixed tool list, canned call results.
#[derive(Clone)]
pub struct MockServer {
    tools: Vec<McpTool>,
    results: HashMap<String, CallToolResult>,
    fail_list: bool,
    disconnects: Arc<AtomicUsize>,
    calls: Arc<Mutex<Vec<(String, Map<String, Value>)>>>,
}

impl MockServer {
    pub fn new(tools: &[&str]) -> Self {
        Self {
            tools: tools
                .iter()
                .map(|name| {
                    McpTool::new(*name)
                        .with_description(format!("{name} tool"))
                        .with_input_schema(json!({"type": "object", "properties": {}}))
                })
                .collect(),
            results: HashMap::new(),
            fail_list: false,
            disconnects: Arc::default(),
            calls: Arc::default(),
        }
    }

    #[must_use]
    pub fn with_result(mut self, tool: &str, result: CallToolResult) -> Self {
        self.results.insert(tool.to_string(), result);
        self
    }

    #[must_use]
    pub const fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn disconnect_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.disconnects)
    }

    pub fn call_log(&self) -> Arc<Mutex<Vec<(String, Map<String, Value>)>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl ToolServerClient for MockServer {
    async fn list_tools(&self) -> Result<Vec<McpTool>, McpClientError> {
        if self.fail_list {
            return Err(McpClientError::ProtocolError("tools/list exploded".to_string()));
        }
        Ok(self.tools.clone())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<CallToolResult, McpClientError> {
        self.calls.lock().unwrap().push((name.to_string(), arguments));
        self.results
            .get(name)
            .cloned()
            .ok_or_else(|| McpClientError::ServerError {
                code: -32601,
                message: format!("Unknown tool: {name}"),
            })
    }

    async fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Connector handing out [`MockServer`]s by server id.
#[derive(Default)]
pub struct MockConnector {
    servers: HashMap<String, MockServer>,
    failing: Vec<String>,
    delay: Option<Duration>,
    connects: Mutex<HashMap<String, usize>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_server(mut self, id: &str, server: MockServer) -> Self {
        self.servers.insert(id.to_string(), server);
        self
    }

    #[must_use]
    pub fn with_failing(mut self, id: &str) -> Self {
        self.failing.push(id.to_string());
        self
    }

    #[must_use]
    pub const fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay = Some(Duration::from_millis(ms));
        self
    }

    pub fn connect_count(&self, id: &str) -> usize {
        self.connects.lock().unwrap().get(id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ToolServerConnector for MockConnector {
    async fn connect(
        &self,
        config: &ServerConfig,
    ) -> Result<Arc<dyn ToolServerClient>, McpClientError> {
        *self
            .connects
            .lock()
            .unwrap()
            .entry(config.id.clone())
            .or_default() += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.contains(&config.id) {
            return Err(McpClientError::Http("connection refused".to_string()));
        }

        self.servers
            .get(&config.id)
            .cloned()
            .map(|server| Arc::new(server) as Arc<dyn ToolServerClient>)
            .ok_or_else(|| McpClientError::SpawnFailed(format!("no such server: {}", config.id)))
    }
}
