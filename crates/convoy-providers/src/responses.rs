//! OpenAI Responses API adapter.
//!
//! Unlike the other adapters, tools are not executed locally: URL-based
//! tool servers are handed to the provider as `mcp` tool descriptors and
//! the provider calls them itself. The calls come back already executed,
//! in [`ChatResponse::provider_tool_calls`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use convoy_core::{
    ChatChoice, ChatMessage, ChatResponse, ConnectionTest, MessageRole, ProviderAdapter,
    ProviderError, ProviderToolCall, ProviderType, ServerConfig, ServerType, Tool, ToolCall, Usage,
};
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::{probe, send_json};
use crate::openai::model_ids;

#[derive(Debug, Serialize)]
pub(crate) struct ResponsesRequest<'a> {
    model: &'a str,
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<String>,
    #[serde(skip_serializing_if = "no_servers")]
    tools: &'a [McpToolDescriptor],
}

fn no_servers(servers: &&[McpToolDescriptor]) -> bool {
    servers.is_empty()
}

/// Pass-through descriptor for a remote tool server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct McpToolDescriptor {
    #[serde(rename = "type")]
    kind: &'static str,
    server_url: String,
    server_label: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    headers: BTreeMap<String, String>,
    require_approval: &'static str,
}

impl McpToolDescriptor {
    /// Descriptor for a URL-based server. Stdio servers have none.
    pub fn from_server(config: &ServerConfig) -> Option<Self> {
        if config.effective_type() == ServerType::Stdio {
            return None;
        }
        let url = config.url.as_deref().filter(|u| !u.is_empty())?;
        Some(Self {
            kind: "mcp",
            server_url: url.to_string(),
            server_label: config.id.clone(),
            headers: config.headers.clone(),
            require_approval: "never",
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponsesResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
    #[serde(default)]
    usage: Option<ResponsesUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputItem {
    McpCall {
        #[serde(default)]
        id: String,
        name: String,
        #[serde(default)]
        arguments: String,
        #[serde(default)]
        server_label: String,
        #[serde(default)]
        output: Option<String>,
        #[serde(default)]
        error: Option<Value>,
    },
    Message {
        #[serde(default)]
        content: Vec<MessageContent>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MessageContent {
    OutputText {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ResponsesUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

pub(crate) fn format_request<'a>(
    model: &'a str,
    messages: &[ChatMessage],
    servers: &'a [McpToolDescriptor],
) -> ResponsesRequest<'a> {
    let instructions = messages
        .iter()
        .find(|m| m.role == MessageRole::System)
        .map(|m| m.content_str().to_string());

    ResponsesRequest {
        model,
        input: messages
            .last()
            .map(|m| m.content_str().to_string())
            .unwrap_or_default(),
        instructions,
        tools: servers,
    }
}

fn error_text(error: Value) -> Option<String> {
    match error {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(
            other
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| other.to_string(), String::from),
        ),
    }
}

pub(crate) fn parse_response(response: ResponsesResponse) -> ChatResponse {
    let mut text = String::new();
    let mut provider_calls = Vec::new();
    for item in response.output {
        match item {
            OutputItem::McpCall {
                id,
                name,
                arguments,
                server_label,
                output,
                error,
            } => provider_calls.push(ProviderToolCall {
                call: ToolCall::new(id, name, arguments),
                server_label,
                output,
                error: error.and_then(error_text),
            }),
            OutputItem::Message { content } => {
                for part in content {
                    if let MessageContent::OutputText { text: part } = part {
                        text.push_str(&part);
                    }
                }
            }
            OutputItem::Other => {}
        }
    }

    ChatResponse {
        choices: vec![ChatChoice {
            index: 0,
            message: ChatMessage::assistant(text),
            finish_reason: Some("stop".to_string()),
        }],
        usage: response
            .usage
            .map(|u| Usage::new(u.input_tokens, u.output_tokens)),
        provider_tool_calls: provider_calls,
    }
}

pub struct ResponsesAdapter {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    servers: Vec<McpToolDescriptor>,
}

impl ResponsesAdapter {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        servers: &[ServerConfig],
    ) -> Self {
        let servers: Vec<_> = servers.iter().filter_map(McpToolDescriptor::from_server).collect();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            servers,
        }
    }

    /// Tool servers handed to the provider.
    pub fn servers(&self) -> &[McpToolDescriptor] {
        &self.servers
    }

    /// Descriptors for the servers the caller enabled, in configuration order.
    pub fn enabled_servers(&self, enabled_server_ids: Option<&[String]>) -> Vec<McpToolDescriptor> {
        self.servers
            .iter()
            .filter(|d| enabled_server_ids.is_none_or(|ids| ids.contains(&d.server_label)))
            .cloned()
            .collect()
    }

    fn headers(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.api_key)
    }
}

#[async_trait]
impl ProviderAdapter for ResponsesAdapter {
    fn provider_type(&self) -> ProviderType {
        ProviderType::OpenAiResponses
    }

    fn model(&self) -> &str {
        &self.model
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
        // Function tools are served by the provider through the MCP descriptors.
        let servers = self.enabled_servers(enabled_server_ids);
        let body = format_request(&self.model, messages, &servers);
        tracing::debug!(
            model = %self.model,
            server_count = servers.len(),
            local_tool_count = tools.map_or(0, <[Tool]>::len),
            "Sending Responses request"
        );

        let request = self
            .headers(self.http.post(format!("{}/responses", self.base_url)))
            .json(&body);
        let response = send_json(ProviderType::OpenAiResponses, request).await?;
        Ok(parse_response(response))
    }

    async fn test_connection(&self) -> ConnectionTest {
        let request = self.headers(self.http.get(format!("{}/models", self.base_url)));
        probe(request, model_ids).await
    }
}
