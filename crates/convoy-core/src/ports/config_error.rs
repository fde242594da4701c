//! Configuration error types.

use thiserror::Error;

use crate::domain::ProviderType;

/// Bad or missing provider/server configuration.
///
/// Provider configuration errors are fatal at startup. An invalid server
/// entry is not an error here: it is recorded against that server only
/// (`ServerStatus::valid`).
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Unsupported provider type: {0}")]
    UnsupportedProvider(String),

    #[error("Provider {0} requires a model")]
    MissingModel(ProviderType),

    #[error("Provider {0} requires an API key")]
    MissingApiKey(ProviderType),

    #[error("Invalid base URL for provider {provider}: {reason}")]
    InvalidBaseUrl {
        provider: ProviderType,
        reason: String,
    },

    #[error("Duplicate server id: {0}")]
    DuplicateServerId(String),
}
