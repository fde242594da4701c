//! Google Gemini `generateContent` adapter.
//!
//! Gemini differs from the chat-completions shape in three ways that
//! matter here: roles are `user`/`model`/`function`, function responses
//! are matched by name instead of call id, and tool schemas reject a
//! number of JSON Schema meta keywords.

use async_trait::async_trait;
use convoy_core::{
    ChatChoice, ChatMessage, ChatResponse, ConnectionTest, MessageRole, ProviderAdapter,
    ProviderError, ProviderType, Tool, ToolCall, Usage,
};
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::http::{probe, send_json};

/// Name used for a function response whose originating call cannot be found.
pub const UNKNOWN_FUNCTION: &str = "unknown_function";

/// Schema keywords Gemini rejects in function declarations.
const STRIPPED_SCHEMA_KEYS: [&str; 6] = [
    "$schema",
    "$id",
    "$ref",
    "definitions",
    "$defs",
    "additionalProperties",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTools>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTools {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

/// Strip schema keywords Gemini does not accept.
///
/// Applies at the root and recursively under `properties`, `items`,
/// `anyOf`, `oneOf` and `allOf`. Sanitizing twice yields the same value.
pub fn sanitize_schema(schema: &Value) -> Value {
    let Value::Object(map) = schema else {
        return schema.clone();
    };

    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        if STRIPPED_SCHEMA_KEYS.contains(&key.as_str()) {
            continue;
        }
        let value = match (key.as_str(), value) {
            ("properties", Value::Object(props)) => Value::Object(
                props
                    .iter()
                    .map(|(name, prop)| (name.clone(), sanitize_schema(prop)))
                    .collect(),
            ),
            ("items" | "anyOf" | "oneOf" | "allOf", Value::Array(items)) => {
                Value::Array(items.iter().map(sanitize_schema).collect())
            }
            ("items", item) => sanitize_schema(item),
            _ => value.clone(),
        };
        out.insert(key.clone(), value);
    }
    Value::Object(out)
}

/// Find the function name for a tool result by scanning earlier assistant
/// messages, nearest first, for the call with the same id.
fn function_name_for(history: &[ChatMessage], tool_call_id: Option<&str>) -> Option<String> {
    let id = tool_call_id?;
    history
        .iter()
        .rev()
        .filter(|m| m.role == MessageRole::Assistant)
        .flat_map(ChatMessage::tool_calls)
        .find(|call| call.id == id)
        .map(|call| call.function.name.clone())
}

fn function_response_body(content: &str) -> Value {
    match serde_json::from_str::<Value>(content) {
        Ok(value @ Value::Object(_)) => value,
        _ => json!({ "content": content }),
    }
}

fn to_content(history: &[ChatMessage], message: &ChatMessage) -> Content {
    match message.role {
        MessageRole::Assistant => {
            let mut parts = Vec::new();
            if !message.content_str().is_empty() {
                parts.push(Part::text(message.content_str()));
            }
            parts.extend(message.tool_calls().iter().map(|call| Part {
                function_call: Some(FunctionCall {
                    name: call.function.name.clone(),
                    args: serde_json::from_str(&call.function.arguments)
                        .unwrap_or_else(|_| Value::Object(Map::new())),
                }),
                ..Part::default()
            }));
            Content {
                role: Some("model".to_string()),
                parts,
            }
        }
        MessageRole::Tool => {
            let name = function_name_for(history, message.tool_call_id.as_deref())
                .unwrap_or_else(|| {
                    tracing::warn!(
                        tool_call_id = ?message.tool_call_id,
                        "No matching tool call for tool result, using placeholder name"
                    );
                    UNKNOWN_FUNCTION.to_string()
                });
            Content {
                role: Some("function".to_string()),
                parts: vec![Part {
                    function_response: Some(FunctionResponse {
                        name,
                        response: function_response_body(message.content_str()),
                    }),
                    ..Part::default()
                }],
            }
        }
        MessageRole::User | MessageRole::System => Content {
            role: Some("user".to_string()),
            parts: vec![Part::text(message.content_str())],
        },
    }
}

pub(crate) fn format_request(messages: &[ChatMessage], tools: Option<&[Tool]>) -> GenerateContentRequest {
    let mut system = Vec::new();
    let mut contents = Vec::with_capacity(messages.len());
    for (index, message) in messages.iter().enumerate() {
        if message.role == MessageRole::System {
            system.push(Part::text(message.content_str()));
        } else {
            contents.push(to_content(&messages[..index], message));
        }
    }

    let declarations: Vec<FunctionDeclaration> = tools
        .unwrap_or_default()
        .iter()
        .map(|tool| FunctionDeclaration {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            parameters: sanitize_schema(&tool.function.parameters),
        })
        .collect();

    GenerateContentRequest {
        contents,
        system_instruction: (!system.is_empty()).then(|| Content {
            role: None,
            parts: system,
        }),
        tools: if declarations.is_empty() {
            Vec::new()
        } else {
            vec![GeminiTools {
                function_declarations: declarations,
            }]
        },
    }
}

pub(crate) fn parse_response(response: GenerateContentResponse) -> Result<ChatResponse, ProviderError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(ProviderError::invalid_response(
            ProviderType::Gemini,
            "response contained no candidates",
        ));
    };

    let mut text = String::new();
    let mut calls = Vec::new();
    for part in candidate.content.parts {
        if let Some(part_text) = part.text {
            text.push_str(&part_text);
        }
        if let Some(call) = part.function_call {
            let id = format!("call_{}", uuid::Uuid::new_v4());
            calls.push(ToolCall::new(id, call.name, call.args.to_string()));
        }
    }

    let message = if calls.is_empty() {
        ChatMessage::assistant(text)
    } else {
        if !text.is_empty() {
            tracing::debug!(
                dropped_chars = text.len(),
                call_count = calls.len(),
                "Discarding text parts sent alongside function calls"
            );
        }
        ChatMessage::assistant_tool_calls(calls)
    };

    Ok(ChatResponse {
        choices: vec![ChatChoice {
            index: 0,
            message,
            finish_reason: candidate.finish_reason.map(|r| r.to_ascii_lowercase()),
        }],
        usage: response
            .usage_metadata
            .map(|u| Usage::new(u.prompt_token_count, u.candidates_token_count)),
        provider_tool_calls: Vec::new(),
    })
}

/// Model names from `GET /models`, without the `models/` prefix.
fn model_names(body: &Value) -> Option<Vec<String>> {
    let models = body.get("models")?.as_array()?;
    Some(
        models
            .iter()
            .filter_map(|m| m.get("name").and_then(Value::as_str))
            .map(|name| name.trim_start_matches("models/").to_string())
            .collect(),
    )
}

pub struct GeminiAdapter {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiAdapter {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn headers(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("x-goog-api-key", &self.api_key)
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn send_message(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[Tool]>,
    ) -> Result<ChatResponse, ProviderError> {
        let body = format_request(messages, tools);
        tracing::debug!(model = %self.model, content_count = body.contents.len(), "Sending Gemini request");

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = self.headers(self.http.post(url)).json(&body);
        let response = send_json(ProviderType::Gemini, request).await?;
        parse_response(response)
    }

    async fn test_connection(&self) -> ConnectionTest {
        let request = self.headers(self.http.get(format!("{}/models", self.base_url)));
        probe(request, model_names).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubServer;
    use axum::http::StatusCode;

    fn request_json(messages: &[ChatMessage], tools: Option<&[Tool]>) -> Value {
        serde_json::to_value(format_request(messages, tools)).unwrap()
    }

    #[test]
    fn test_roles_and_system_instruction() {
        let body = request_json(
            &[
                ChatMessage::system("You are terse."),
                ChatMessage::user("Hi"),
                ChatMessage::assistant("Hello"),
            ],
            None,
        );
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are terse.");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"].as_array().unwrap().len(), 2);
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_tool_result_matched_by_id() {
        let body = request_json(
            &[
                ChatMessage::user("weather in Oslo and time?"),
                ChatMessage::assistant_tool_calls(vec![ToolCall::new("a", "weather", r#"{"city":"Oslo"}"#)]),
                ChatMessage::tool_result("a", "rain"),
                ChatMessage::assistant_tool_calls(vec![ToolCall::new("b", "clock", "{}")]),
                ChatMessage::tool_result("b", r#"{"time":"12:00"}"#),
            ],
            None,
        );
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents[1]["parts"][0]["functionCall"]["args"], json!({"city": "Oslo"}));
        assert_eq!(contents[2]["role"], "function");
        assert_eq!(
            contents[2]["parts"][0]["functionResponse"],
            json!({"name": "weather", "response": {"content": "rain"}})
        );
        assert_eq!(contents[4]["parts"][0]["functionResponse"]["name"], "clock");
        assert_eq!(contents[4]["parts"][0]["functionResponse"]["response"], json!({"time": "12:00"}));
    }

    #[test]
    fn test_nearest_assistant_wins_on_reused_id() {
        let body = request_json(
            &[
                ChatMessage::assistant_tool_calls(vec![ToolCall::new("x", "first", "{}")]),
                ChatMessage::tool_result("x", "1"),
                ChatMessage::assistant_tool_calls(vec![ToolCall::new("x", "second", "{}")]),
                ChatMessage::tool_result("x", "2"),
            ],
            None,
        );
        assert_eq!(body["contents"][1]["parts"][0]["functionResponse"]["name"], "first");
        assert_eq!(body["contents"][3]["parts"][0]["functionResponse"]["name"], "second");
    }

    #[test]
    fn test_unmatched_tool_result_uses_placeholder() {
        let body = request_json(&[ChatMessage::tool_result("missing", "x")], None);
        assert_eq!(
            body["contents"][0]["parts"][0]["functionResponse"]["name"],
            UNKNOWN_FUNCTION
        );
    }

    #[test]
    fn test_sanitize_schema_strips_nested_meta_keys() {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "additionalProperties": false,
            "definitions": {"x": {}},
            "properties": {
                "$ref": {"type": "string", "$id": "inner"},
                "tags": {"type": "array", "items": {"type": "string", "additionalProperties": true}},
                "mode": {"anyOf": [{"type": "string", "$ref": "#/x"}, {"type": "null"}]}
            }
        });
        let clean = sanitize_schema(&schema);
        assert_eq!(
            clean,
            json!({
                "type": "object",
                "properties": {
                    "$ref": {"type": "string"},
                    "tags": {"type": "array", "items": {"type": "string"}},
                    "mode": {"anyOf": [{"type": "string"}, {"type": "null"}]}
                }
            })
        );
        assert_eq!(sanitize_schema(&clean), clean);
    }

    #[test]
    fn test_tools_sent_as_function_declarations() {
        let tool = Tool::new("lookup")
            .with_description("Look up")
            .with_parameters(json!({"type": "object", "$defs": {}, "properties": {}}));
        let body = request_json(&[ChatMessage::user("q")], Some(&[tool]));
        let decl = &body["tools"][0]["functionDeclarations"][0];
        assert_eq!(decl["name"], "lookup");
        assert_eq!(decl["description"], "Look up");
        assert!(decl["parameters"].get("$defs").is_none());
    }

    #[tokio::test]
    async fn test_function_call_round_trip() {
        let stub = StubServer::start().await;
        stub.respond(
            "/v1beta/models/gemini-2.0-flash:generateContent",
            StatusCode::OK,
            json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"functionCall": {"name": "weather", "args": {"city": "Oslo"}}}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 4}
            }),
        );
        let adapter = GeminiAdapter::new(format!("{}/v1beta", stub.base_url), "g-key", "gemini-2.0-flash");
        let response = adapter.send_message(&[ChatMessage::user("weather?")], None).await.unwrap();

        let call = &response.tool_calls()[0];
        assert!(call.id.starts_with("call_"));
        assert_eq!(call.name(), "weather");
        assert_eq!(call.function.arguments, r#"{"city":"Oslo"}"#);
        assert_eq!(response.usage.unwrap().total_tokens, 14);
        assert_eq!(stub.last_request().header("x-goog-api-key"), Some("g-key"));
    }

    #[test]
    fn test_text_beside_function_call_is_dropped() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "Checking the weather."},
                    {"functionCall": {"name": "weather", "args": {}}}
                ]}
            }]
        }))
        .unwrap();
        let parsed = parse_response(response).unwrap();

        let message = parsed.message().unwrap();
        assert!(message.content.is_none());
        assert_eq!(parsed.tool_calls().len(), 1);
        assert_eq!(parsed.tool_calls()[0].function.arguments, "{}");
    }

    #[tokio::test]
    async fn test_empty_candidates_is_invalid() {
        let stub = StubServer::start().await;
        stub.respond("/models/m:generateContent", StatusCode::OK, json!({"candidates": []}));
        let adapter = GeminiAdapter::new(stub.base_url.clone(), "k", "m");
        let err = adapter.send_message(&[ChatMessage::user("hi")], None).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_connection_strips_model_prefix() {
        let stub = StubServer::start().await;
        stub.respond(
            "/models",
            StatusCode::OK,
            json!({"models": [{"name": "models/gemini-2.0-flash"}, {"name": "models/gemini-1.5-pro"}]}),
        );
        let adapter = GeminiAdapter::new(stub.base_url.clone(), "k", "gemini-2.0-flash");
        let result = adapter.test_connection().await;
        assert_eq!(result.models.unwrap(), vec!["gemini-2.0-flash", "gemini-1.5-pro"]);
    }
}
