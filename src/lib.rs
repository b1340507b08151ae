//! Wharf — HTTP gateway for MCP tool servers.
//! Holds a registry of named upstream servers, probes their health and
//! capabilities in the background, and proxies inbound requests to them
//! with well-defined error translation.

pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod probe;
pub mod proxy;
pub mod registry;

pub use config::{GatewayConfig, ServerSpec, parse_server_specs};
pub use error::{GatewayError, Result};
pub use gateway::Gateway;
pub use http::router;
pub use probe::{refresh_all, refresh_entry, run_probe_loop};
pub use proxy::{ProxyRequest, UpstreamPayload, join_url, strip_hop_by_hop};
pub use registry::{HealthStatus, Registry, ServerEntry, ServerInfo};
