//! Gateway — the single long-lived service object tying everything together.
//!
//! Owns the registry, the shared outbound `reqwest::Client` (the process-wide
//! connection pool), and the root cancellation token. Constructed once at
//! startup from `GatewayConfig`; dropped at process exit, which releases the
//! pool on every shutdown path.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::probe;
use crate::proxy::{self, ProxyRequest, UpstreamPayload};
use crate::registry::{Registry, ServerInfo};

/// Central gateway service: registry + shared outbound client + lifecycle.
pub struct Gateway {
    registry: Registry,
    client: reqwest::Client,
    /// Root cancellation token — cancelling this stops the probe loop and
    /// drains the HTTP listener.
    cancel: CancellationToken,
    probe_interval: Duration,
    health_timeout: Duration,
}

impl Gateway {
    /// Build a gateway from config, registering all configured servers.
    ///
    /// Malformed entries are logged and skipped — a misconfigured server
    /// never prevents startup. Registration order does not matter.
    pub fn from_config(config: GatewayConfig) -> crate::Result<Self> {
        let mut registry = Registry::new();
        let mut names: Vec<&String> = config.servers.keys().collect();
        names.sort();
        for name in names {
            let spec = &config.servers[name];
            if let Err(e) = registry.register(name, &spec.url) {
                tracing::warn!(server = %name, error = %e, "skipping server registration");
            }
        }
        if registry.is_empty() {
            tracing::warn!("no servers registered — gateway will serve an empty registry");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            // A proxy must hand 3xx back to the caller, not chase them.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| GatewayError::ClientInit(e.to_string()))?;

        Ok(Self {
            registry,
            client,
            cancel: CancellationToken::new(),
            probe_interval: Duration::from_secs(config.probe_interval_secs),
            health_timeout: Duration::from_secs(config.health_timeout_secs),
        })
    }

    /// Read access to the registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Number of registered servers.
    pub fn server_count(&self) -> usize {
        self.registry.len()
    }

    /// Delay between background refresh cycles.
    pub fn probe_interval(&self) -> Duration {
        self.probe_interval
    }

    /// A child of the root cancellation token, for wiring graceful shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Run one full refresh cycle across all registered servers.
    ///
    /// Called synchronously once at startup (so the first `/servers` listing
    /// reflects real status) and from the background probe loop thereafter.
    pub async fn refresh_all(&self) {
        probe::refresh_all(&self.client, &self.registry, self.health_timeout).await;
    }

    /// Synchronously probe a single named server and return its updated entry.
    pub async fn refresh_server(&self, name: &str) -> crate::Result<ServerInfo> {
        let entry = self
            .registry
            .get(name)
            .ok_or_else(|| GatewayError::ServerNotFound(name.to_string()))?;
        Ok(probe::refresh_entry(&self.client, &entry, self.health_timeout).await)
    }

    /// Proxy one inbound request to the named server. Never mutates registry
    /// state — a failed proxy call does not mark the server unhealthy.
    pub async fn route(&self, name: &str, request: ProxyRequest) -> crate::Result<UpstreamPayload> {
        proxy::route(&self.client, &self.registry, name, request).await
    }

    /// Spawn the periodic probe loop, tied to the root cancellation token.
    pub fn spawn_probe_loop(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(probe::run_probe_loop(
            Arc::clone(self),
            self.cancel.child_token(),
        ))
    }

    /// Initiate a clean shutdown: the probe loop exits and the HTTP listener
    /// (wired to `cancel_token`) drains.
    pub fn shutdown(&self) {
        tracing::info!("gateway shutting down");
        self.cancel.cancel();
    }
}
