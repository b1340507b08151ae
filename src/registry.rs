//! Server registry — the single shared piece of mutable state in the gateway.
//!
//! Maps server name to its entry. Membership is fixed at startup; only the
//! per-entry `status` and `capabilities` fields change afterwards, written
//! exclusively by the prober (or the manual refresh endpoint). The map itself
//! is therefore read lock-free; each entry guards its mutable fields behind
//! its own `RwLock`, so a probe writing one server never blocks a proxy
//! request reading another.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::GatewayError;

/// Probe-derived health of an upstream server.
///
/// Advisory only — the proxy path never consults it (no implicit circuit
/// breaker). Written only by the prober.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Never successfully probed yet
    #[default]
    Unknown,
    /// Last health probe returned HTTP 200
    Healthy,
    /// Last health probe returned non-200, timed out, or failed to connect
    Unhealthy,
}

/// Mutable per-entry state, replaced field-at-a-time by the prober.
#[derive(Debug, Default)]
struct EntryState {
    status: HealthStatus,
    capabilities: Vec<String>,
}

/// One registered upstream tool server.
///
/// `name` and `base_url` are immutable; `status` and `capabilities` are
/// eventually-consistent snapshots refreshed by the prober.
#[derive(Debug)]
pub struct ServerEntry {
    name: String,
    base_url: String,
    state: RwLock<EntryState>,
}

impl ServerEntry {
    /// Unique registry key for this server.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Network address of the upstream (scheme + host + port).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current probe-derived status.
    pub async fn status(&self) -> HealthStatus {
        self.state.read().await.status
    }

    /// Snapshot of the most recently discovered capability list.
    pub async fn capabilities(&self) -> Vec<String> {
        self.state.read().await.capabilities.clone()
    }

    /// Atomically replace the status field. Prober-only.
    pub async fn set_status(&self, status: HealthStatus) {
        self.state.write().await.status = status;
    }

    /// Atomically replace the capability list wholesale. Prober-only.
    pub async fn set_capabilities(&self, capabilities: Vec<String>) {
        self.state.write().await.capabilities = capabilities;
    }

    /// Serializable snapshot of the whole entry.
    pub async fn info(&self) -> ServerInfo {
        let state = self.state.read().await;
        ServerInfo {
            name: self.name.clone(),
            base_url: self.base_url.clone(),
            status: state.status,
            capabilities: state.capabilities.clone(),
        }
    }
}

/// Point-in-time snapshot of a server entry, as returned by the HTTP surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub base_url: String,
    pub status: HealthStatus,
    pub capabilities: Vec<String>,
}

/// Authoritative name → entry mapping, immutable in membership after startup.
#[derive(Debug, Default)]
pub struct Registry {
    servers: HashMap<String, Arc<ServerEntry>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new entry with status Unknown and no capabilities.
    ///
    /// Rejects empty names, empty addresses, addresses without a URL scheme,
    /// and names already registered (first registration wins). Callers are
    /// expected to log and skip rejected entries rather than abort startup.
    pub fn register(&mut self, name: &str, base_url: &str) -> crate::Result<()> {
        if name.is_empty() {
            return Err(GatewayError::InvalidServerSpec(
                "server name is empty".to_string(),
            ));
        }
        if base_url.is_empty() {
            return Err(GatewayError::InvalidServerSpec(format!(
                "server '{}' has no address",
                name
            )));
        }
        if !base_url.contains("://") {
            return Err(GatewayError::InvalidServerSpec(format!(
                "address '{}' for server '{}' has no scheme",
                base_url, name
            )));
        }
        if self.servers.contains_key(name) {
            return Err(GatewayError::InvalidServerSpec(format!(
                "server '{}' is already registered",
                name
            )));
        }

        self.servers.insert(
            name.to_string(),
            Arc::new(ServerEntry {
                name: name.to_string(),
                base_url: base_url.trim_end_matches('/').to_string(),
                state: RwLock::new(EntryState::default()),
            }),
        );
        tracing::info!(server = %name, url = %base_url, "registered MCP server");
        Ok(())
    }

    /// Look up an entry by name. Safe to call concurrently with prober writes.
    pub fn get(&self, name: &str) -> Option<Arc<ServerEntry>> {
        self.servers.get(name).cloned()
    }

    /// Iterate over all entries, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = &Arc<ServerEntry>> {
        self.servers.values()
    }

    /// Number of registered servers.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Whether the registry has no servers.
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Snapshot every entry, keyed by name. Used by the listing endpoint.
    pub async fn snapshot(&self) -> HashMap<String, ServerInfo> {
        let mut out = HashMap::with_capacity(self.servers.len());
        for (name, entry) in &self.servers {
            out.insert(name.clone(), entry.info().await);
        }
        out
    }
}
