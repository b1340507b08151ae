//! The gateway's own HTTP surface — axum router and handlers.
//!
//! Every error path yields a structured `{"error": ...}` JSON body with a
//! mapped status; no inbound request is ever left unanswered and no raw,
//! unstructured failure ever reaches a client.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::proxy::{ProxyRequest, UpstreamPayload};
use crate::registry::ServerInfo;

/// Build the gateway router over a shared `Gateway`.
pub fn router(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/servers", get(list_servers))
        .route("/servers/:name", get(get_server))
        .route("/servers/:name/refresh", post(refresh_server))
        .route(
            "/mcp/:name/*path",
            get(proxy)
                .post(proxy)
                .put(proxy)
                .delete(proxy)
                .patch(proxy),
        )
        .with_state(gateway)
}

impl IntoResponse for GatewayError {
    /// Map the error taxonomy onto HTTP responses.
    ///
    /// Upstream status errors pass the code through unchanged; transport
    /// faults and internal failures collapse to a generic 500 so upstream
    /// addresses and implementation detail never leak to the client.
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            GatewayError::ServerNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            GatewayError::UpstreamStatus { status, .. } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                self.to_string(),
            ),
            GatewayError::UpstreamUnavailable { .. }
            | GatewayError::MalformedResponse { .. }
            | GatewayError::InvalidServerSpec(_)
            | GatewayError::ClientInit(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            ),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// `GET /` — static service description.
async fn root(State(gateway): State<Arc<Gateway>>) -> Json<serde_json::Value> {
    Json(json!({
        "service": "wharf",
        "version": env!("CARGO_PKG_VERSION"),
        "servers": gateway.server_count(),
        "endpoints": {
            "health": "/health",
            "servers": "/servers",
            "proxy": "/mcp/{server_name}/{path}",
        },
    }))
}

/// `GET /health` — liveness for the gateway itself, not a proxy.
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "gateway": "wharf",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /servers` — full registry listing plus a count.
async fn list_servers(State(gateway): State<Arc<Gateway>>) -> Json<serde_json::Value> {
    let servers = gateway.registry().snapshot().await;
    let total = servers.len();
    Json(json!({ "servers": servers, "total": total }))
}

/// `GET /servers/:name` — single entry lookup; 404 if unknown.
async fn get_server(
    State(gateway): State<Arc<Gateway>>,
    Path(name): Path<String>,
) -> crate::Result<Json<ServerInfo>> {
    let entry = gateway
        .registry()
        .get(&name)
        .ok_or(GatewayError::ServerNotFound(name))?;
    Ok(Json(entry.info().await))
}

/// `POST /servers/:name/refresh` — synchronous single-server probe.
async fn refresh_server(
    State(gateway): State<Arc<Gateway>>,
    Path(name): Path<String>,
) -> crate::Result<Json<ServerInfo>> {
    gateway.refresh_server(&name).await.map(Json)
}

/// `{GET,POST,PUT,DELETE,PATCH} /mcp/:name/*path` — the proxy entry point.
async fn proxy(
    State(gateway): State<Arc<Gateway>>,
    Path((name, path)): Path<(String, String)>,
    method: Method,
    headers: HeaderMap,
    RawQuery(raw_query): RawQuery,
    body: Bytes,
) -> crate::Result<Json<UpstreamPayload>> {
    let request = ProxyRequest {
        method,
        path,
        headers,
        raw_query,
        body,
    };
    gateway.route(&name, request).await.map(Json)
}
