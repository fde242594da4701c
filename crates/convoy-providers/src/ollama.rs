//! Ollama native `/api/chat` adapter.
//!
//! Ollama carries tool call arguments as JSON objects while the internal
//! contract carries them as strings, so both directions convert.

use async_trait::async_trait;
use convoy_core::{
    ChatChoice, ChatMessage, ChatResponse, ConnectionTest, MessageRole, ProviderAdapter,
    ProviderError, ProviderType, Tool, ToolCall, Usage,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::http::{probe, send_json};

#[derive(Debug, Serialize)]
pub(crate) struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Tool]>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: MessageRole,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OllamaToolCall>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    function: OllamaFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OllamaChatResponse {
    message: OllamaMessage,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// String arguments to the object Ollama expects. Unparsable input becomes `{}`.
fn arguments_to_object(arguments: &str) -> Value {
    match serde_json::from_str::<Value>(arguments) {
        Ok(value @ Value::Object(_)) => value,
        _ => Value::Object(Map::new()),
    }
}

/// Ollama arguments back to the string form.
fn arguments_to_string(arguments: Value) -> String {
    match arguments {
        Value::String(s) => s,
        Value::Null => "{}".to_string(),
        other => other.to_string(),
    }
}

fn to_ollama_message(message: &ChatMessage) -> OllamaMessage {
    OllamaMessage {
        role: message.role,
        content: message.content_str().to_string(),
        tool_calls: message
            .tool_calls()
            .iter()
            .map(|call| OllamaToolCall {
                id: Some(call.id.clone()),
                function: OllamaFunction {
                    name: call.function.name.clone(),
                    arguments: arguments_to_object(&call.function.arguments),
                },
            })
            .collect(),
    }
}

pub(crate) fn format_request<'a>(
    model: &'a str,
    messages: &[ChatMessage],
    tools: Option<&'a [Tool]>,
) -> OllamaChatRequest<'a> {
    OllamaChatRequest {
        model,
        messages: messages.iter().map(to_ollama_message).collect(),
        stream: false,
        tools: tools.filter(|t| !t.is_empty()),
    }
}

pub(crate) fn parse_response(response: OllamaChatResponse) -> ChatResponse {
    let calls: Vec<ToolCall> = response
        .message
        .tool_calls
        .into_iter()
        .enumerate()
        .map(|(index, call)| {
            let id = call
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("call_{index}"));
            ToolCall::new(id, call.function.name, arguments_to_string(call.function.arguments))
        })
        .collect();

    let message = if calls.is_empty() {
        ChatMessage::assistant(response.message.content)
    } else {
        ChatMessage::assistant_tool_calls(calls)
    };
    let usage = match (response.prompt_eval_count, response.eval_count) {
        (None, None) => None,
        (prompt, completion) => Some(Usage::new(prompt.unwrap_or(0), completion.unwrap_or(0))),
    };

    ChatResponse {
        choices: vec![ChatChoice {
            index: 0,
            message,
            finish_reason: response.done_reason,
        }],
        usage,
        provider_tool_calls: Vec::new(),
    }
}

fn tag_names(body: &Value) -> Option<Vec<String>> {
    let models = body.get("models")?.as_array()?;
    Some(
        models
            .iter()
            .filter_map(|m| m.get("name").and_then(Value::as_str).map(String::from))
            .collect(),
    )
}

pub struct OllamaAdapter {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaAdapter {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for OllamaAdapter {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Ollama
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
        tracing::debug!(model = %self.model, message_count = body.messages.len(), "Sending Ollama chat");

        let request = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&body);
        let response = send_json(ProviderType::Ollama, request).await?;
        Ok(parse_response(response))
    }

    async fn test_connection(&self) -> ConnectionTest {
        probe(self.http.get(format!("{}/api/tags", self.base_url)), tag_names).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubServer;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_arguments_sent_as_objects() {
        let messages = vec![
            ChatMessage::user("sum"),
            ChatMessage::assistant_tool_calls(vec![
                ToolCall::new("c1", "add", r#"{"a":1,"b":2}"#),
                ToolCall::new("c2", "broken", "not json"),
            ]),
            ChatMessage::tool_result("c1", "3"),
        ];
        let body = serde_json::to_value(format_request("llama3.2", &messages, None)).unwrap();

        assert_eq!(body["stream"], false);
        let calls = &body["messages"][1]["tool_calls"];
        assert_eq!(calls[0]["function"]["arguments"], json!({"a": 1, "b": 2}));
        assert_eq!(calls[1]["function"]["arguments"], json!({}));
        assert_eq!(body["messages"][2]["role"], "tool");
        assert_eq!(body["messages"][2]["content"], "3");
    }

    #[test]
    fn test_missing_ids_assigned_by_index() {
        let response: OllamaChatResponse = serde_json::from_value(json!({
            "model": "llama3.2",
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    {"function": {"name": "a", "arguments": {"x": 1}}},
                    {"function": {"name": "b", "arguments": {}}}
                ]
            },
            "done": true
        }))
        .unwrap();
        let parsed = parse_response(response);
        let calls = parsed.tool_calls();
        assert_eq!(calls[0].id, "call_0");
        assert_eq!(calls[0].function.arguments, r#"{"x":1}"#);
        assert_eq!(calls[1].id, "call_1");
        assert_eq!(calls[1].function.arguments, "{}");
    }

    #[tokio::test]
    async fn test_chat_round_trip() {
        let stub = StubServer::start().await;
        stub.respond(
            "/api/chat",
            StatusCode::OK,
            json!({
                "model": "llama3.2",
                "message": {"role": "assistant", "content": "Hi there"},
                "done": true,
                "done_reason": "stop",
                "prompt_eval_count": 8,
                "eval_count": 3
            }),
        );
        let adapter = OllamaAdapter::new(stub.base_url.clone(), "llama3.2");
        let tools = vec![Tool::new("t")];
        let response = adapter.send_message(&[ChatMessage::user("Hi")], Some(&tools)).await.unwrap();

        assert_eq!(response.reply_text(), "Hi there");
        assert_eq!(response.usage.unwrap().total_tokens, 11);
        let request = stub.last_request();
        assert_eq!(request.body["model"], "llama3.2");
        assert_eq!(request.body["tools"][0]["function"]["name"], "t");
        assert!(request.header("authorization").is_none());
    }

    #[tokio::test]
    async fn test_connection_lists_tags() {
        let stub = StubServer::start().await;
        stub.respond(
            "/api/tags",
            StatusCode::OK,
            json!({"models": [{"name": "llama3.2:latest"}, {"name": "qwen2.5:7b"}]}),
        );
        let adapter = OllamaAdapter::new(stub.base_url.clone(), "llama3.2");
        let result = adapter.test_connection().await;
        assert!(result.connected);
        assert_eq!(result.models.unwrap(), vec!["llama3.2:latest", "qwen2.5:7b"]);
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let adapter = OllamaAdapter::new(format!("http://{addr}"), "llama3.2");
        let result = adapter.test_connection().await;
        assert!(!result.connected);
        assert!(result.error.unwrap().starts_with("Connection failed"));
    }
}
