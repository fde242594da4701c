//! Tool server connection management.
//!
//! One connection attempt per configured server, made once, in
//! configuration order. The whole pass is memoized: the first caller of
//! [`ServerConnectionManager::initialize`] drives it, concurrent callers
//! await the same in-flight future, and later callers get the finished
//! snapshot. Failures are recorded on the affected server and never retried.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use convoy_core::{
    ServerConfig, ServerStatus, ServerTool, ToolServerClient, ToolServerConnector,
};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};

/// Runtime record for one configured server.
pub struct ServerConnection {
    pub config: ServerConfig,
    client: Option<Arc<dyn ToolServerClient>>,
    pub connected: bool,
    /// Whether the configuration passed validation.
    pub valid: bool,
    pub error: Option<String>,
    /// Tools this server contributed to the catalog.
    pub tool_count: usize,
}

impl ServerConnection {
    fn connected(config: ServerConfig, client: Arc<dyn ToolServerClient>, tool_count: usize) -> Self {
        Self {
            config,
            client: Some(client),
            connected: true,
            valid: true,
            error: None,
            tool_count,
        }
    }

    fn failed(config: ServerConfig, valid: bool, error: String) -> Self {
        Self {
            config,
            client: None,
            connected: false,
            valid,
            error: Some(error),
            tool_count: 0,
        }
    }

    /// Client handle, present only for connected servers.
    pub fn client(&self) -> Option<&Arc<dyn ToolServerClient>> {
        self.client.as_ref().filter(|_| self.connected)
    }

    pub fn status(&self) -> ServerStatus {
        ServerStatus {
            id: self.config.id.clone(),
            name: self.config.display_name().to_string(),
            server_type: self.config.effective_type(),
            connected: self.connected,
            valid: self.valid,
            error: self.error.clone(),
            tool_count: self.tool_count,
        }
    }
}

impl std::fmt::Debug for ServerConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConnection")
            .field("id", &self.config.id)
            .field("connected", &self.connected)
            .field("valid", &self.valid)
            .field("error", &self.error)
            .field("tool_count", &self.tool_count)
            .finish_non_exhaustive()
    }
}

/// Immutable result of the initialization pass.
#[derive(Debug, Default)]
pub struct ConnectionSnapshot {
    connections: Vec<ServerConnection>,
    catalog: Vec<ServerTool>,
    by_name: HashMap<String, usize>,
}

impl ConnectionSnapshot {
    /// Connection records in configuration order.
    pub fn connections(&self) -> &[ServerConnection] {
        &self.connections
    }

    pub fn connection(&self, server_id: &str) -> Option<&ServerConnection> {
        self.connections.iter().find(|c| c.config.id == server_id)
    }

    /// Server-tagged tool catalog, unique by tool name.
    pub fn catalog(&self) -> &[ServerTool] {
        &self.catalog
    }

    pub fn tool(&self, name: &str) -> Option<&ServerTool> {
        self.by_name.get(name).map(|&idx| &self.catalog[idx])
    }

    pub fn statuses(&self) -> Vec<ServerStatus> {
        self.connections.iter().map(ServerConnection::status).collect()
    }

    fn push(&mut self, connection: ServerConnection) {
        self.connections.push(connection);
    }
}

type SharedInit = Shared<BoxFuture<'static, Arc<ConnectionSnapshot>>>;

enum InitState {
    Uninitialized,
    Initializing(SharedInit),
    Ready(Arc<ConnectionSnapshot>),
}

/// Owns the tool server fleet for the lifetime of the process.
pub struct ServerConnectionManager {
    configs: Vec<ServerConfig>,
    connector: Arc<dyn ToolServerConnector>,
    state: Mutex<InitState>,
}

impl ServerConnectionManager {
    pub fn new(configs: Vec<ServerConfig>, connector: Arc<dyn ToolServerConnector>) -> Self {
        Self {
            configs,
            connector,
            state: Mutex::new(InitState::Uninitialized),
        }
    }

    pub fn configs(&self) -> &[ServerConfig] {
        &self.configs
    }

    /// Connect every configured server once and return the shared snapshot.
    pub async fn initialize(&self) -> Arc<ConnectionSnapshot> {
        let pending = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let in_flight = match &*state {
                InitState::Ready(snapshot) => return Arc::clone(snapshot),
                InitState::Initializing(pending) => Some(pending.clone()),
                InitState::Uninitialized => None,
            };
            if let Some(pending) = in_flight {
                pending
            } else {
                let configs = self.configs.clone();
                let connector = Arc::clone(&self.connector);
                let pending: SharedInit =
                    async move { Arc::new(connect_all(configs, connector).await) }
                        .boxed()
                        .shared();
                *state = InitState::Initializing(pending.clone());
                pending
            }
        };

        let snapshot = pending.await;

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !matches!(*state, InitState::Ready(_)) {
            *state = InitState::Ready(Arc::clone(&snapshot));
        }
        snapshot
    }

    /// Whether the initialization pass has completed.
    pub fn is_ready(&self) -> bool {
        matches!(
            *self.state.lock().unwrap_or_else(PoisonError::into_inner),
            InitState::Ready(_)
        )
    }

    /// Disconnect every client. Stdio children are killed.
    pub async fn shutdown(&self) {
        let snapshot = {
            let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            match &*state {
                InitState::Uninitialized => return,
                InitState::Initializing(pending) => Err(pending.clone()),
                InitState::Ready(snapshot) => Ok(Arc::clone(snapshot)),
            }
        };
        let snapshot = match snapshot {
            Ok(snapshot) => snapshot,
            Err(pending) => pending.await,
        };

        for connection in snapshot.connections() {
            if let Some(client) = connection.client() {
                client.disconnect().await;
                tracing::info!(server_id = %connection.config.id, "Tool server disconnected");
            }
        }
    }
}

async fn connect_all(
    configs: Vec<ServerConfig>,
    connector: Arc<dyn ToolServerConnector>,
) -> ConnectionSnapshot {
    let mut snapshot = ConnectionSnapshot::default();
    let mut seen_ids = HashSet::new();

    for config in configs {
        let server_name = config.display_name().to_string();

        if !seen_ids.insert(config.id.clone()) {
            tracing::warn!(server_id = %config.id, "Duplicate server id, skipping");
            let error = format!("Duplicate server id: {}", config.id);
            snapshot.push(ServerConnection::failed(config, false, error));
            continue;
        }

        if let Err(reason) = config.validate() {
            tracing::warn!(server_name = %server_name, error = %reason, "Invalid tool server configuration");
            snapshot.push(ServerConnection::failed(config, false, reason));
            continue;
        }

        let client = match connector.connect(&config).await {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(server_name = %server_name, error = %e, "Failed to connect tool server");
                snapshot.push(ServerConnection::failed(config, true, e.to_string()));
                continue;
            }
        };

        let tools = match client.list_tools().await {
            Ok(tools) => tools,
            Err(e) => {
                tracing::warn!(server_name = %server_name, error = %e, "Failed to list tools");
                client.disconnect().await;
                snapshot.push(ServerConnection::failed(
                    config,
                    true,
                    format!("Failed to list tools: {e}"),
                ));
                continue;
            }
        };

        let mut contributed = 0;
        for tool in tools {
            if let Some(&owner) = snapshot.by_name.get(&tool.name) {
                tracing::warn!(
                    tool = %tool.name,
                    server_name = %server_name,
                    owner = %snapshot.catalog[owner].server_id,
                    "Duplicate tool name, keeping the first server's tool"
                );
                continue;
            }
            snapshot
                .by_name
                .insert(tool.name.clone(), snapshot.catalog.len());
            snapshot
                .catalog
                .push(ServerTool::new(config.id.clone(), tool.into_tool()));
            contributed += 1;
        }

        tracing::info!(server_name = %server_name, tool_count = contributed, "Tool server connected");
        snapshot.push(ServerConnection::connected(config, client, contributed));
    }

    snapshot
}
