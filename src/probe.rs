//! Health and capability probing for registered servers.
//!
//! Two independent outbound calls per server: `GET /health` (5s timeout,
//! 200 → Healthy, anything else → Unhealthy) and `GET /capabilities`
//! (client-default timeout; on success the capability list is replaced
//! wholesale, on any failure the previous list is kept). Probe failures are
//! expected steady-state events — the backend may simply be down — so they
//! are logged at warning level and recorded as a status value, never raised
//! to a caller.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::gateway::Gateway;
use crate::registry::{HealthStatus, Registry, ServerEntry, ServerInfo};

/// Expected shape of a `GET /capabilities` response body.
#[derive(Debug, Deserialize)]
struct CapabilitiesBody {
    capabilities: Vec<String>,
}

/// Probe `{base_url}/health` and record the result on the entry.
async fn probe_health(client: &reqwest::Client, entry: &ServerEntry, timeout: Duration) {
    let url = format!("{}/health", entry.base_url());
    let status = match client.get(&url).timeout(timeout).send().await {
        Ok(resp) if resp.status() == reqwest::StatusCode::OK => HealthStatus::Healthy,
        Ok(resp) => {
            tracing::warn!(
                server = %entry.name(),
                status = %resp.status(),
                "health probe returned non-200"
            );
            HealthStatus::Unhealthy
        }
        Err(e) => {
            tracing::warn!(server = %entry.name(), error = %e, "health probe failed");
            HealthStatus::Unhealthy
        }
    };
    entry.set_status(status).await;
}

/// Probe `{base_url}/capabilities` and replace the entry's capability list.
///
/// Any failure — transport, non-200, unparseable body, missing field —
/// leaves the previous list untouched: stale-but-present beats erased.
async fn probe_capabilities(client: &reqwest::Client, entry: &ServerEntry) {
    let url = format!("{}/capabilities", entry.base_url());
    let resp = match client.get(&url).send().await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::warn!(server = %entry.name(), error = %e, "capability probe failed");
            return;
        }
    };
    if resp.status() != reqwest::StatusCode::OK {
        tracing::warn!(
            server = %entry.name(),
            status = %resp.status(),
            "capability probe returned non-200"
        );
        return;
    }
    match resp.json::<CapabilitiesBody>().await {
        Ok(body) => entry.set_capabilities(body.capabilities).await,
        Err(e) => {
            tracing::warn!(
                server = %entry.name(),
                error = %e,
                "capability response not JSON or missing 'capabilities' field"
            );
        }
    }
}

/// Run both probes for a single entry and return its updated snapshot.
///
/// Used for the synchronous single-server refresh endpoint, and as the
/// per-server unit of work in a full refresh cycle.
pub async fn refresh_entry(
    client: &reqwest::Client,
    entry: &ServerEntry,
    health_timeout: Duration,
) -> ServerInfo {
    tokio::join!(
        probe_health(client, entry, health_timeout),
        probe_capabilities(client, entry),
    );
    entry.info().await
}

/// Run a full refresh cycle: both probes for every entry, concurrently
/// across servers.
///
/// One server hanging or failing never delays or fails another — all probe
/// futures are fired together and the cycle completes when the last one
/// settles, updating whichever servers responded.
pub async fn refresh_all(client: &reqwest::Client, registry: &Registry, health_timeout: Duration) {
    let probes = registry
        .entries()
        .map(|entry| refresh_entry(client, entry, health_timeout));
    join_all(probes).await;
}

/// Periodic probe loop, spawned as a background task.
///
/// The caller is expected to have run one synchronous `refresh_all` at
/// startup; this loop waits a full period before its first cycle. Exits
/// promptly when the cancellation token fires — a cycle in flight at
/// shutdown is abandoned, not awaited.
pub async fn run_probe_loop(gateway: Arc<Gateway>, cancel: CancellationToken) {
    let period = gateway.probe_interval();
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // interval's first tick completes immediately; consume it so the loop
    // doesn't duplicate the startup refresh.
    interval.tick().await;

    tracing::info!(period_secs = period.as_secs(), "probe loop started");
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = cancel.cancelled() => {
                tracing::info!("probe loop cancelled");
                return;
            }
        }
        // Racing the cycle against cancellation bounds shutdown latency:
        // probes in flight are dropped, not awaited to completion.
        tokio::select! {
            _ = gateway.refresh_all() => {}
            _ = cancel.cancelled() => {
                tracing::info!("probe loop cancelled mid-cycle");
                return;
            }
        }
    }
}
