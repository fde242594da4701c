//! Anthropic Messages API adapter.

use async_trait::async_trait;
use convoy_core::{
    ChatChoice, ChatMessage, ChatResponse, ConnectionTest, MessageRole, ProviderAdapter,
    ProviderError, ProviderType, Tool, ToolCall, Usage,
};
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::{probe, send_json};
use crate::openai::model_ids;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const MAX_TOKENS: u32 = 4096;

#[derive(Debug, Serialize)]
pub(crate) struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ClaudeMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ClaudeTool<'a>>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
    role: &'static str,
    content: ClaudeContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ClaudeContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Serialize)]
struct ClaudeTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<ClaudeUsage>,
}

#[derive(Debug, Deserialize)]
struct ClaudeUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

fn to_claude_message(message: &ChatMessage) -> Option<ClaudeMessage> {
    match message.role {
        MessageRole::System => None,
        MessageRole::User => Some(ClaudeMessage {
            role: "user",
            content: ClaudeContent::Text(message.content_str().to_string()),
        }),
        MessageRole::Tool => Some(ClaudeMessage {
            role: "user",
            content: ClaudeContent::Text(format!("Tool result: {}", message.content_str())),
        }),
        MessageRole::Assistant if message.has_tool_calls() => {
            let mut blocks = Vec::with_capacity(message.tool_calls().len() + 1);
            if !message.content_str().is_empty() {
                blocks.push(ContentBlock::Text {
                    text: message.content_str().to_string(),
                });
            }
            blocks.extend(message.tool_calls().iter().map(|call| ContentBlock::ToolUse {
                id: call.id.clone(),
                name: call.function.name.clone(),
                input: parse_input(&call.function.arguments),
            }));
            Some(ClaudeMessage {
                role: "assistant",
                content: ClaudeContent::Blocks(blocks),
            })
        }
        MessageRole::Assistant => Some(ClaudeMessage {
            role: "assistant",
            content: ClaudeContent::Text(message.content_str().to_string()),
        }),
    }
}

fn parse_input(arguments: &str) -> Value {
    if arguments.trim().is_empty() {
        return Value::Object(serde_json::Map::new());
    }
    serde_json::from_str(arguments).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Tool call arguments are not valid JSON, sending empty input");
        Value::Object(serde_json::Map::new())
    })
}

pub(crate) fn format_request<'a>(
    model: &'a str,
    messages: &[ChatMessage],
    tools: Option<&'a [Tool]>,
) -> MessagesRequest<'a> {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == MessageRole::System)
        .map(ChatMessage::content_str)
        .filter(|s| !s.is_empty())
        .collect();

    MessagesRequest {
        model,
        max_tokens: MAX_TOKENS,
        system: (!system.is_empty()).then(|| system.join("\n\n")),
        messages: messages.iter().filter_map(to_claude_message).collect(),
        tools: tools
            .unwrap_or_default()
            .iter()
            .map(|tool| ClaudeTool {
                name: tool.name(),
                description: tool.description(),
                input_schema: &tool.function.parameters,
            })
            .collect(),
    }
}

pub(crate) fn parse_response(response: MessagesResponse) -> ChatResponse {
    let mut text = String::new();
    let mut calls = Vec::new();
    for block in response.content {
        match block {
            ContentBlock::Text { text: part } => text.push_str(&part),
            ContentBlock::ToolUse { id, name, input } => {
                calls.push(ToolCall::new(id, name, input.to_string()));
            }
            ContentBlock::Unsupported => {}
        }
    }

    let message = if calls.is_empty() {
        ChatMessage::assistant(text)
    } else {
        if !text.is_empty() {
            tracing::debug!(
                dropped_chars = text.len(),
                call_count = calls.len(),
                "Discarding text blocks sent alongside tool_use"
            );
        }
        ChatMessage::assistant_tool_calls(calls)
    };
    let finish_reason = response.stop_reason.map(|reason| match reason.as_str() {
        "tool_use" => "tool_calls".to_string(),
        "end_turn" | "stop_sequence" => "stop".to_string(),
        "max_tokens" => "length".to_string(),
        _ => reason,
    });

    ChatResponse {
        choices: vec![ChatChoice {
            index: 0,
            message,
            finish_reason,
        }],
        usage: response
            .usage
            .map(|u| Usage::new(u.input_tokens, u.output_tokens)),
        provider_tool_calls: Vec::new(),
    }
}

pub struct ClaudeAdapter {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ClaudeAdapter {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn headers(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
    }
}

#[async_trait]
impl ProviderAdapter for ClaudeAdapter {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Claude
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn send_message(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[Tool]>,
    ) -> Result<ChatResponse, ProviderError> {
        let body = format_request(&self.model, messages, tools);
        tracing::debug!(
            model = %self.model,
            message_count = body.messages.len(),
            tool_count = body.tools.len(),
            "Sending Claude request"
        );

        let request = self
            .headers(self.http.post(format!("{}/messages", self.base_url)))
            .json(&body);
        let response = send_json(ProviderType::Claude, request).await?;
        Ok(parse_response(response))
    }

    async fn test_connection(&self) -> ConnectionTest {
        let request = self.headers(self.http.get(format!("{}/models", self.base_url)));
        probe(request, model_ids).await
    }
}
