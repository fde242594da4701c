//! CLI-specific error types and exit codes.

use std::path::PathBuf;

use convoy_core::ConfigurationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// The config file could not be read.
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for [`crate::config::AppConfig`].
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigurationError),
}

impl CliError {
    /// Map error to an exit code (sysexits.h conventions).
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Io { .. } => 66,     // EX_NOINPUT
            Self::Parse { .. } => 65,  // EX_DATAERR
            Self::Config(_) => 78,     // EX_CONFIG
        }
    }
}
