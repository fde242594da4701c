//! Provider adapter port.
//!
//! Every LLM backend is reached through this trait. Implementations own
//! all wire-format translation; callers only ever see the internal chat
//! contract from [`crate::domain::chat`].

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ChatMessage, ChatResponse, ConnectionTest, ProviderType, Tool};

/// Maximum number of characters of an error body kept in a [`ProviderError`].
pub const ERROR_BODY_LIMIT: usize = 500;

/// Errors raised by a provider request.
///
/// These are fatal to the query that triggered them.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The backend answered with a non-2xx status.
    #[error("{provider} request failed with status {status}: {body}")]
    Status {
        provider: ProviderType,
        status: u16,
        /// Response body, truncated to [`ERROR_BODY_LIMIT`] characters.
        body: String,
    },

    /// The request never produced a response (DNS, TLS, connection reset...).
    #[error("{provider} request failed: {message}")]
    Transport {
        provider: ProviderType,
        message: String,
    },

    /// The backend answered 2xx but the body did not match its wire format.
    #[error("{provider} returned an invalid response: {message}")]
    InvalidResponse {
        provider: ProviderType,
        message: String,
    },
}

impl ProviderError {
    /// Build a status error, truncating the body.
    pub fn status(provider: ProviderType, status: u16, body: &str) -> Self {
        Self::Status {
            provider,
            status,
            body: truncate_body(body),
        }
    }

    pub fn transport(provider: ProviderType, message: impl Into<String>) -> Self {
        Self::Transport {
            provider,
            message: message.into(),
        }
    }

    pub fn invalid_response(provider: ProviderType, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider,
            message: message.into(),
        }
    }
}

/// Truncate a response body to [`ERROR_BODY_LIMIT`] characters.
pub fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// Port for one LLM backend.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Backend kind, used for logging and status reports.
    fn provider_type(&self) -> ProviderType;

    /// Configured model name.
    fn model(&self) -> &str;

    /// Send a conversation and return the normalized response.
    ///
    /// `tools` is `None` (or empty) when no tools should be offered.
    async fn send_message(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[Tool]>,
    ) -> Result<ChatResponse, ProviderError>;

    /// [`send_message`](Self::send_message) scoped to the enabled tool servers.
    ///
    /// `enabled_server_ids` follows the orchestrator's filter: `None` means
    /// every server, `Some(&[])` none. Only adapters that hand tool servers
    /// to the backend directly need to honour it.
    async fn send_message_with_servers(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[Tool]>,
        enabled_server_ids: Option<&[String]>,
    ) -> Result<ChatResponse, ProviderError> {
        let _ = enabled_server_ids;
        self.send_message(messages, tools).await
    }

    /// Probe the backend. Failures are reported in the result, never as `Err`.
    async fn test_connection(&self) -> ConnectionTest;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_body_short() {
        assert_eq!(truncate_body("oops"), "oops");
    }

    #[test]
    fn test_truncate_body_long() {
        let body = "x".repeat(ERROR_BODY_LIMIT + 20);
        let truncated = truncate_body(&body);
        assert_eq!(truncated.len(), ERROR_BODY_LIMIT + 3);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncate_body_multibyte() {
        let body = "é".repeat(ERROR_BODY_LIMIT + 1);
        let truncated = truncate_body(&body);
        assert_eq!(truncated.chars().count(), ERROR_BODY_LIMIT + 3);
    }

    #[test]
    fn test_status_error_message() {
        let err = ProviderError::status(ProviderType::Claude, 500, "overloaded");
        assert_eq!(
            err.to_string(),
            "claude request failed with status 500: overloaded"
        );
    }
}
