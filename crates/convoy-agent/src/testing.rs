//! Hand-written port stubs for orchestrator and engine tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use convoy_core::{
    ChatMessage, ChatResponse, ConnectionTest, ProviderAdapter, ProviderError, ProviderType,
    ServerStatus, ServerTool, ServerType, Tool, ToolCall, ToolError, ToolExecution, ToolExecutor,
};

/// One `send_message` call as the stub saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Option<Vec<Tool>>,
    pub enabled_servers: Option<Vec<String>>,
}

impl RecordedRequest {
    pub fn tool_names(&self) -> Vec<String> {
        self.tools
            .iter()
            .flatten()
            .map(|t| t.name().to_string())
            .collect()
    }
}

/// Provider returning queued responses, then failing once the queue is empty.
pub struct StubProvider {
    replies: Mutex<VecDeque<ChatResponse>>,
    failure: Option<(u16, String)>,
    connection: ConnectionTest,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl StubProvider {
    pub fn replying(replies: Vec<ChatResponse>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            failure: None,
            connection: ConnectionTest::ok(Some(vec!["stub-model".to_string()])),
            requests: Mutex::default(),
        }
    }

    pub fn failing(status: u16, body: &str) -> Self {
        Self {
            failure: Some((status, body.to_string())),
            ..Self::replying(Vec::new())
        }
    }

    pub fn with_connection(mut self, connection: ConnectionTest) -> Self {
        self.connection = connection;
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> RecordedRequest {
        self.requests.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl ProviderAdapter for StubProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::OpenAi
    }

    fn model(&self) -> &str {
        "stub-model"
    }

    async fn send_message(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[Tool]>,
    ) -> Result<ChatResponse, ProviderError> {
        self.send_message_with_servers(messages, tools, None).await
    }

    async fn send_message_with_servers(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[Tool]>,
        enabled_server_ids: Option<&[String]>,
    ) -> Result<ChatResponse, ProviderError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            messages: messages.to_vec(),
            tools: tools.map(<[Tool]>::to_vec),
            enabled_servers: enabled_server_ids.map(<[String]>::to_vec),
        });

        if let Some((status, body)) = &self.failure {
            return Err(ProviderError::status(ProviderType::OpenAi, *status, body));
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ProviderError::transport(ProviderType::OpenAi, "no scripted reply left"))
    }

    async fn test_connection(&self) -> ConnectionTest {
        self.connection.clone()
    }
}

/// Executor over a fixed catalog with scripted results.
#[derive(Default)]
pub struct StubExecutor {
    tools: Vec<ServerTool>,
    results: HashMap<String, Result<String, String>>,
    executed: Mutex<Vec<String>>,
}

impl StubExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, server_id: &str, name: &str) -> Self {
        self.tools.push(ServerTool::new(server_id, Tool::new(name)));
        self
    }

    pub fn with_result(mut self, name: &str, result: &str) -> Self {
        self.results.insert(name.to_string(), Ok(result.to_string()));
        self
    }

    pub fn with_failure(mut self, name: &str, message: &str) -> Self {
        self.results.insert(name.to_string(), Err(message.to_string()));
        self
    }

    /// Names of tools that reached execution, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolExecutor for StubExecutor {
    async fn available_tools(&self) -> Vec<ServerTool> {
        self.tools.clone()
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolExecution, ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == call.name())
            .ok_or_else(|| ToolError::ToolNotFound(call.name().to_string()))?;
        self.executed.lock().unwrap().push(call.name().to_string());

        match self.results.get(call.name()) {
            Some(Ok(result)) => Ok(ToolExecution {
                server_id: tool.server_id.clone(),
                result: result.clone(),
            }),
            Some(Err(message)) => Err(ToolError::Remote {
                tool: call.name().to_string(),
                message: message.clone(),
            }),
            None => Ok(ToolExecution {
                server_id: tool.server_id.clone(),
                result: String::new(),
            }),
        }
    }

    async fn server_status(&self) -> Vec<ServerStatus> {
        let mut statuses: Vec<ServerStatus> = Vec::new();
        for tool in &self.tools {
            match statuses.iter_mut().find(|s| s.id == tool.server_id) {
                Some(status) => status.tool_count += 1,
                None => statuses.push(ServerStatus {
                    id: tool.server_id.clone(),
                    name: tool.server_id.clone(),
                    server_type: ServerType::Stdio,
                    connected: true,
                    valid: true,
                    error: None,
                    tool_count: 1,
                }),
            }
        }
        statuses
    }
}
