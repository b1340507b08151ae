//! Gateway configuration — TOML deserialization plus the env-style server list.
//!
//! Servers come from two sources, merged at startup: an optional `wharf.toml`
//! with `[servers.<name>]` tables, and a delimited `name:address` list
//! (`MCP_SERVERS` env var or `--servers` flag). Malformed entries in either
//! source are logged and skipped — a misconfigured server must never prevent
//! the gateway from serving the rest.

use std::collections::HashMap;

use serde::Deserialize;

/// Top-level gateway configuration, parsed from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub servers: HashMap<String, ServerSpec>,
    /// Seconds between background refresh cycles.
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
    /// Health probe timeout in seconds.
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,
    /// Default timeout for capability probes and proxied requests, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Address of a single upstream tool server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSpec {
    pub url: String,
}

fn default_probe_interval_secs() -> u64 {
    60
}

fn default_health_timeout_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            servers: HashMap::new(),
            probe_interval_secs: default_probe_interval_secs(),
            health_timeout_secs: default_health_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl GatewayConfig {
    /// Merge an env-style `name:address` list into the server map.
    ///
    /// Entries already present (from the config file) win; duplicates in the
    /// list are logged and skipped.
    pub fn merge_specs(&mut self, spec_list: &str) {
        for (name, url) in parse_server_specs(spec_list) {
            if self.servers.contains_key(&name) {
                tracing::warn!(server = %name, "duplicate server in spec list, keeping existing entry");
                continue;
            }
            self.servers.insert(name, ServerSpec { url });
        }
    }
}

/// Parse a delimited `name:address` list, e.g. `"a:http://x,b:http://y"`.
///
/// Each comma-separated pair is split on its FIRST colon, so addresses keep
/// their `scheme://host:port` form intact. Pairs without a colon, or with an
/// empty name or address, are logged at warning level and skipped.
pub fn parse_server_specs(spec_list: &str) -> Vec<(String, String)> {
    let mut specs = Vec::new();
    for pair in spec_list.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let Some((name, url)) = pair.split_once(':') else {
            tracing::warn!(entry = %pair, "skipping malformed server spec (expected name:address)");
            continue;
        };
        if name.is_empty() || url.is_empty() {
            tracing::warn!(entry = %pair, "skipping server spec with empty name or address");
            continue;
        }
        specs.push((name.to_string(), url.to_string()));
    }
    specs
}
