//! Tool server configuration and runtime status types.
//!
//! # Design
//!
//! - `ServerConfig` - Static configuration loaded once at startup
//! - `ServerType` - Transport (stdio, SSE, streamable HTTP)
//! - `ServerStatus` - Serializable snapshot of a connection record

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Transport used to reach a tool server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServerType {
    /// Child process speaking newline-delimited JSON-RPC on stdin/stdout
    #[default]
    Stdio,
    /// Legacy HTTP+SSE transport (GET event stream, POST to announced endpoint)
    Sse,
    /// Streamable HTTP transport (POST, JSON or SSE response body)
    StreamableHttp,
}

impl ServerType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Sse => "sse",
            Self::StreamableHttp => "streamable-http",
        }
    }
}

impl std::fmt::Display for ServerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for one tool server.
///
/// For stdio servers either `npx_command` (an npm package run through
/// `npx -y`) or `script_path` (dispatched by extension) is required.
/// For SSE and streamable HTTP servers `url` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Stable identifier used to tag tools and filter by enabled servers.
    pub id: String,

    /// User-friendly name for the server.
    #[serde(default)]
    pub name: String,

    /// Explicit transport. When omitted, a present `url` selects
    /// streamable HTTP and anything else selects stdio.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub server_type: Option<ServerType>,

    // --- Stdio server fields ---
    /// Path to a script to run with the interpreter implied by its extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_path: Option<String>,

    /// npm package to run through `npx -y`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npx_command: Option<String>,

    /// Extra arguments appended after the script or package.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    // --- HTTP server fields ---
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Custom request headers for SSE / streamable HTTP.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// Server-specific environment variables (stdio only).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl ServerConfig {
    /// Create a stdio server that runs an npm package through npx.
    pub fn npx(id: impl Into<String>, package: impl Into<String>, args: Vec<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            server_type: Some(ServerType::Stdio),
            npx_command: Some(package.into()),
            args,
            ..Self::default()
        }
    }

    /// Create a stdio server that runs a local script.
    pub fn script(id: impl Into<String>, script_path: impl Into<String>, args: Vec<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            server_type: Some(ServerType::Stdio),
            script_path: Some(script_path.into()),
            args,
            ..Self::default()
        }
    }

    /// Create a URL-based server. The transport is inferred unless set later.
    pub fn remote(id: impl Into<String>, url: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Set an explicit transport.
    #[must_use]
    pub const fn with_type(mut self, server_type: ServerType) -> Self {
        self.server_type = Some(server_type);
        self
    }

    /// Add an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Add a request header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// The transport actually used: explicit `type`, else inferred from `url`.
    pub fn effective_type(&self) -> ServerType {
        self.server_type.unwrap_or_else(|| {
            if self.url.is_some() {
                ServerType::StreamableHttp
            } else {
                ServerType::Stdio
            }
        })
    }

    /// Display name, falling back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Validate configuration based on the effective transport.
    ///
    /// Returns an error if required fields are missing for the transport.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Server id cannot be empty".to_string());
        }

        match self.effective_type() {
            ServerType::Stdio => {
                let has_npx = self.npx_command.as_deref().is_some_and(|c| !c.is_empty());
                let has_script = self.script_path.as_deref().is_some_and(|p| !p.is_empty());

                if !has_npx && !has_script {
                    return Err(
                        "Stdio server requires either npxCommand or scriptPath".to_string()
                    );
                }

                Ok(())
            }
            ServerType::Sse | ServerType::StreamableHttp => {
                let url = self
                    .url
                    .as_ref()
                    .ok_or_else(|| format!("{} server requires url", self.effective_type()))?;

                if url.is_empty() {
                    return Err(format!("{} server url cannot be empty", self.effective_type()));
                }

                Ok(())
            }
        }
    }
}

/// Snapshot of one connection record, as reported to status consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub server_type: ServerType,
    pub connected: bool,
    /// Whether the configuration passed validation.
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub tool_count: usize,
}
