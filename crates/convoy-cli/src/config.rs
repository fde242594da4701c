//! Application configuration file.
//!
//! ```json
//! {
//!   "provider": { "type": "openai", "apiKey": "...", "model": "gpt-4o" },
//!   "servers": [
//!     { "id": "files", "npxCommand": "@modelcontextprotocol/server-filesystem", "args": ["."] },
//!     { "id": "wiki", "url": "https://mcp.deepwiki.com/mcp" }
//!   ],
//!   "systemPrompt": "You are a helpful assistant."
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use convoy_core::{ConfigurationError, ProviderConfig, ServerConfig};
use serde::{Deserialize, Serialize};

use crate::error::CliError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub provider: ProviderConfig,
    #[serde(default)]
    pub servers: Vec<ServerConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl AppConfig {
    /// Environment variable that supplies the API key when the file has none.
    pub const API_KEY_ENV: &'static str = "CONVOY_API_KEY";

    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = serde_json::from_str(&text).map_err(|source| CliError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.apply_api_key_override(std::env::var(Self::API_KEY_ENV).ok());
        config.validate()?;
        tracing::debug!(
            path = %path.display(),
            provider = %config.provider.provider_type,
            server_count = config.servers.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Use `key` only when the file leaves the API key empty.
    pub fn apply_api_key_override(&mut self, key: Option<String>) {
        let configured = self
            .provider
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if configured {
            return;
        }
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.provider.api_key = Some(key);
        }
    }

    /// Reject duplicate server ids. Per-server problems are left to the
    /// connection manager, which records them against that server.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let mut seen = HashSet::new();
        for server in &self.servers {
            if !seen.insert(server.id.as_str()) {
                return Err(ConfigurationError::DuplicateServerId(server.id.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convoy_core::ServerType;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "provider": {"type": "claude", "model": "claude-3-5-sonnet-latest"},
        "servers": [
            {"id": "files", "npxCommand": "@modelcontextprotocol/server-filesystem", "args": ["/tmp"]},
            {"id": "wiki", "url": "https://mcp.deepwiki.com/sse", "type": "sse"}
        ],
        "systemPrompt": "Be precise."
    }"#;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.provider.provider_type, "claude");
        assert_eq!(config.servers.len(), 2);
        assert_eq!(config.servers[1].effective_type(), ServerType::Sse);
        assert_eq!(config.system_prompt.as_deref(), Some("Be precise."));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"provider\": ").unwrap();
        let err = AppConfig::load(file.path()).unwrap_err();
        assert_eq!(err.exit_code(), 65);
    }

    #[test]
    fn test_duplicate_server_ids_rejected() {
        let config: AppConfig = serde_json::from_str(
            r#"{"provider": {"type": "ollama", "model": "llama3.2"},
                "servers": [{"id": "a", "url": "http://x"}, {"id": "a", "url": "http://y"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::DuplicateServerId(id)) if id == "a"
        ));
    }

    #[test]
    fn test_api_key_override_only_when_empty() {
        let mut config: AppConfig = serde_json::from_str(SAMPLE).unwrap();
        config.apply_api_key_override(Some("from-env".into()));
        assert_eq!(config.provider.api_key.as_deref(), Some("from-env"));

        config.provider.api_key = Some("from-file".into());
        config.apply_api_key_override(Some("from-env".into()));
        assert_eq!(config.provider.api_key.as_deref(), Some("from-file"));

        config.provider.api_key = Some(String::new());
        config.apply_api_key_override(None);
        assert_eq!(config.provider.api_key.as_deref(), Some(""));
    }
}
