//! OpenAI-compatible chat completions adapter.
//!
//! The internal chat contract already is the chat-completions format, so
//! translation here is mostly framing: model, messages, tools.

use async_trait::async_trait;
use convoy_core::{
    ChatChoice, ChatMessage, ChatResponse, ConnectionTest, ProviderAdapter, ProviderError,
    ProviderType, Tool, Usage,
};
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::{probe, send_json};

/// Wire request for `POST /chat/completions`.
#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Tool]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

/// Wire response from `POST /chat/completions`.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

pub(crate) fn format_request<'a>(
    model: &'a str,
    messages: &'a [ChatMessage],
    tools: Option<&'a [Tool]>,
) -> ChatCompletionRequest<'a> {
    let tools = tools.filter(|t| !t.is_empty());
    ChatCompletionRequest {
        model,
        messages,
        tools,
        tool_choice: tools.map(|_| "auto"),
    }
}

pub(crate) fn parse_response(
    provider: ProviderType,
    response: ChatCompletionResponse,
) -> Result<ChatResponse, ProviderError> {
    if response.choices.is_empty() {
        return Err(ProviderError::invalid_response(
            provider,
            "response contained no choices",
        ));
    }

    let choices = response
        .choices
        .into_iter()
        .map(|mut choice| {
            // Some backends send `tool_calls: []`, or text alongside calls.
            if choice.message.has_tool_calls() {
                choice.message.content = None;
            } else {
                choice.message.tool_calls = None;
            }
            choice
        })
        .collect();

    Ok(ChatResponse {
        choices,
        usage: response
            .usage
            .map(|u| Usage::new(u.prompt_tokens, u.completion_tokens)),
        provider_tool_calls: Vec::new(),
    })
}

/// Model ids from an OpenAI-style `GET /models` body.
pub(crate) fn model_ids(body: &Value) -> Option<Vec<String>> {
    let data = body.get("data")?.as_array()?;
    Some(
        data.iter()
            .filter_map(|m| m.get("id").and_then(Value::as_str).map(String::from))
            .collect(),
    )
}

/// Adapter for OpenAI and any server speaking its chat-completions API.
pub struct OpenAiAdapter {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiAdapter {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn headers(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.api_key)
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn provider_type(&self) -> ProviderType {
        ProviderType::OpenAi
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
            message_count = messages.len(),
            tool_count = body.tools.map_or(0, <[Tool]>::len),
            "Sending chat completion"
        );

        let request = self
            .headers(self.http.post(format!("{}/chat/completions", self.base_url)))
            .json(&body);
        let response = send_json(ProviderType::OpenAi, request).await?;
        parse_response(ProviderType::OpenAi, response)
    }

    async fn test_connection(&self) -> ConnectionTest {
        let request = self.headers(self.http.get(format!("{}/models", self.base_url)));
        probe(request, model_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubServer;
    use axum::http::StatusCode;
    use convoy_core::ToolCall;
    use serde_json::json;

    fn completion(message: Value) -> Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{"index": 0, "message": message, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        })
    }

    #[test]
    fn test_format_request_omits_empty_tools() {
        let messages = vec![ChatMessage::user("hi")];
        let body = serde_json::to_value(format_request("gpt-4o", &messages, Some(&[]))).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[tokio::test]
    async fn test_send_message_round_trip() {
        let stub = StubServer::start().await;
        stub.respond(
            "/v1/chat/completions",
            StatusCode::OK,
            completion(json!({"role": "assistant", "content": "Hello!"})),
        );
        let adapter = OpenAiAdapter::new(format!("{}/v1", stub.base_url), "sk-test", "gpt-4o");

        let tools = vec![Tool::new("echo").with_description("Echo")];
        let response = adapter
            .send_message(&[ChatMessage::user("Hi")], Some(&tools))
            .await
            .unwrap();
        assert_eq!(response.reply_text(), "Hello!");
        assert_eq!(response.usage.unwrap().total_tokens, 15);

        let request = stub.last_request();
        assert_eq!(request.header("authorization"), Some("Bearer sk-test"));
        assert_eq!(request.body["model"], "gpt-4o");
        assert_eq!(request.body["tools"][0]["type"], "function");
        assert_eq!(request.body["tools"][0]["function"]["name"], "echo");
        assert_eq!(request.body["tool_choice"], "auto");
    }

    #[tokio::test]
    async fn test_tool_calls_parsed_with_null_content() {
        let stub = StubServer::start().await;
        stub.respond(
            "/chat/completions",
            StatusCode::OK,
            completion(json!({
                "role": "assistant",
                "content": "",
                "tool_calls": [{"id": "call_1", "type": "function", "function": {"name": "add", "arguments": "{\"a\":1}"}}]
            })),
        );
        let adapter = OpenAiAdapter::new(stub.base_url.clone(), "k", "m");
        let response = adapter.send_message(&[ChatMessage::user("add")], None).await.unwrap();

        assert_eq!(response.tool_calls(), &[ToolCall::new("call_1", "add", "{\"a\":1}")]);
        assert!(response.message().unwrap().content.is_none());
    }

    #[tokio::test]
    async fn test_error_status_truncated() {
        let stub = StubServer::start().await;
        stub.respond(
            "/chat/completions",
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": "x".repeat(2000)}),
        );
        let adapter = OpenAiAdapter::new(stub.base_url.clone(), "k", "m");
        match adapter.send_message(&[ChatMessage::user("hi")], None).await {
            Err(ProviderError::Status { status, body, .. }) => {
                assert_eq!(status, 500);
                assert!(body.chars().count() <= convoy_core::ports::ERROR_BODY_LIMIT + 3);
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_lists_models() {
        let stub = StubServer::start().await;
        stub.respond(
            "/models",
            StatusCode::OK,
            json!({"data": [{"id": "gpt-4o"}, {"id": "gpt-4o-mini"}]}),
        );
        let adapter = OpenAiAdapter::new(stub.base_url.clone(), "k", "gpt-4o");
        let result = adapter.test_connection().await;
        assert!(result.connected);
        assert_eq!(result.models.unwrap(), vec!["gpt-4o", "gpt-4o-mini"]);
    }

    #[tokio::test]
    async fn test_connection_invalid_key() {
        let stub = StubServer::start().await;
        stub.respond("/models", StatusCode::UNAUTHORIZED, json!({"error": "bad key"}));
        let adapter = OpenAiAdapter::new(stub.base_url.clone(), "nope", "gpt-4o");
        let result = adapter.test_connection().await;
        assert!(!result.connected);
        assert_eq!(result.error.as_deref(), Some("Invalid API key"));
    }
}
