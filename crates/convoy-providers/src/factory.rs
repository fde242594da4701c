//! Build a provider adapter from configuration.

use async_trait::async_trait;
use convoy_core::{
    ChatMessage, ChatResponse, ConfigurationError, ConnectionTest, ProviderAdapter,
    ProviderConfig, ProviderError, ProviderType, ServerConfig, Tool,
};

use crate::claude::ClaudeAdapter;
use crate::gemini::GeminiAdapter;
use crate::http::trim_base_url;
use crate::litellm::LiteLlmAdapter;
use crate::ollama::OllamaAdapter;
use crate::openai::OpenAiAdapter;
use crate::responses::ResponsesAdapter;

/// Closed set of provider adapters.
pub enum Provider {
    OpenAi(OpenAiAdapter),
    LiteLlm(LiteLlmAdapter),
    Claude(ClaudeAdapter),
    Gemini(GeminiAdapter),
    Ollama(OllamaAdapter),
    Responses(ResponsesAdapter),
}

impl Provider {
    fn adapter(&self) -> &dyn ProviderAdapter {
        match self {
            Self::OpenAi(a) => a,
            Self::LiteLlm(a) => a,
            Self::Claude(a) => a,
            Self::Gemini(a) => a,
            Self::Ollama(a) => a,
            Self::Responses(a) => a,
        }
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("type", &self.provider_type())
            .field("model", &self.model())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProviderAdapter for Provider {
    fn provider_type(&self) -> ProviderType {
        self.adapter().provider_type()
    }

    fn model(&self) -> &str {
        self.adapter().model()
    }

    async fn send_message(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[Tool]>,
    ) -> Result<ChatResponse, ProviderError> {
        self.adapter().send_message(messages, tools).await
    }

    async fn send_message_with_servers(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[Tool]>,
        enabled_server_ids: Option<&[String]>,
    ) -> Result<ChatResponse, ProviderError> {
        self.adapter()
            .send_message_with_servers(messages, tools, enabled_server_ids)
            .await
    }

    async fn test_connection(&self) -> ConnectionTest {
        self.adapter().test_connection().await
    }
}

/// Validates provider configuration and constructs the matching adapter.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create the adapter for `config`.
    ///
    /// `servers` is only consulted by the Responses adapter, which hands
    /// URL-based tool servers to the provider.
    pub fn create(
        config: &ProviderConfig,
        servers: &[ServerConfig],
    ) -> Result<Provider, ConfigurationError> {
        let provider_type = ProviderType::parse(&config.provider_type)
            .ok_or_else(|| ConfigurationError::UnsupportedProvider(config.provider_type.clone()))?;

        let model = config.model.trim();
        if model.is_empty() {
            return Err(ConfigurationError::MissingModel(provider_type));
        }

        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty());
        if provider_type.requires_api_key() && api_key.is_none() {
            return Err(ConfigurationError::MissingApiKey(provider_type));
        }

        let base_url = Self::base_url(provider_type, config.base_url.as_deref())?;
        let key = api_key.unwrap_or_default();

        tracing::info!(provider = %provider_type, model = %model, base_url = %base_url, "Creating provider adapter");

        Ok(match provider_type {
            ProviderType::OpenAi => Provider::OpenAi(OpenAiAdapter::new(base_url, key, model)),
            ProviderType::LiteLlm => {
                Provider::LiteLlm(LiteLlmAdapter::new(base_url, api_key.map(String::from), model))
            }
            ProviderType::Claude => Provider::Claude(ClaudeAdapter::new(base_url, key, model)),
            ProviderType::Gemini => Provider::Gemini(GeminiAdapter::new(base_url, key, model)),
            ProviderType::Ollama => Provider::Ollama(OllamaAdapter::new(base_url, model)),
            ProviderType::OpenAiResponses => {
                Provider::Responses(ResponsesAdapter::new(base_url, key, model, servers))
            }
        })
    }

    fn base_url(provider: ProviderType, configured: Option<&str>) -> Result<String, ConfigurationError> {
        let url = match configured.map(trim_base_url) {
            Some(url) if !url.is_empty() => url,
            _ => return Ok(trim_base_url(provider.default_base_url())),
        };

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigurationError::InvalidBaseUrl {
                provider,
                reason: format!("'{url}' must start with http:// or https://"),
            });
        }
        Ok(url)
    }
}
