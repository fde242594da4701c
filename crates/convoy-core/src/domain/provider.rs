//! LLM provider configuration and health types.

use serde::{Deserialize, Serialize};

/// Closed set of supported provider backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderType {
    /// OpenAI or any OpenAI-compatible chat-completions endpoint
    #[serde(rename = "openai")]
    OpenAi,
    Claude,
    Gemini,
    Ollama,
    #[serde(rename = "litellm")]
    LiteLlm,
    /// OpenAI Responses API with provider-side MCP tool execution
    #[serde(rename = "openai-responses")]
    OpenAiResponses,
}

impl ProviderType {
    /// All supported provider types.
    pub const ALL: [Self; 6] = [
        Self::OpenAi,
        Self::Claude,
        Self::Gemini,
        Self::Ollama,
        Self::LiteLlm,
        Self::OpenAiResponses,
    ];

    /// Parse a provider type from its configuration string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "claude" | "anthropic" => Some(Self::Claude),
            "gemini" => Some(Self::Gemini),
            "ollama" => Some(Self::Ollama),
            "litellm" => Some(Self::LiteLlm),
            "openai-responses" => Some(Self::OpenAiResponses),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Claude => "claude",
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
            Self::LiteLlm => "litellm",
            Self::OpenAiResponses => "openai-responses",
        }
    }

    /// Base URL used when the configuration omits one.
    #[must_use]
    pub const fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi | Self::OpenAiResponses => "https://api.openai.com/v1",
            Self::Claude => "https://api.anthropic.com/v1",
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Self::Ollama => "http://localhost:11434",
            Self::LiteLlm => "http://localhost:4000",
        }
    }

    /// Whether an API key is mandatory. Local/proxy backends accept anonymous access.
    #[must_use]
    pub const fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama | Self::LiteLlm)
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw provider configuration as loaded from the config file.
///
/// `provider_type` is kept as a string so that unknown values surface
/// as an `UnsupportedProvider` error from the factory rather than a
/// deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(rename = "type")]
    pub provider_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: String,
}

impl ProviderConfig {
    pub fn new(provider_type: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider_type: provider_type.into(),
            api_key: None,
            base_url: None,
            model: model.into(),
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
}

/// Outcome of a provider connectivity test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTest {
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionTest {
    #[must_use]
    pub const fn ok(models: Option<Vec<String>>) -> Self {
        Self {
            connected: true,
            models,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            connected: false,
            models: None,
            error: Some(error.into()),
        }
    }
}

/// Provider health snapshot for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub provider: ProviderType,
    pub model: String,
    #[serde(flatten)]
    pub connection: ConnectionTest,
}
