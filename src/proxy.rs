//! Request router/proxy — one inbound request becomes exactly one outbound
//! call to a named upstream, single attempt, no retry.
//!
//! The proxy path is fully decoupled from the prober: it reads only the
//! entry's `base_url`, never `status`, and never mutates registry state. A
//! server currently marked unhealthy is still proxied to — health is
//! advisory observability data, not a circuit breaker.

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, header};
use serde::Serialize;

use crate::error::GatewayError;
use crate::registry::Registry;

/// Headers scoped to the client↔gateway hop, stripped before forwarding.
///
/// `host` and `connection` plus the standard per-connection set, and
/// `content-length` (the outbound client recomputes it from the body).
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "host",
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

/// An inbound request, reduced to the parts forwarded upstream.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    /// Remainder path appended to the server's base URL.
    pub path: String,
    pub headers: HeaderMap,
    /// Raw query string, forwarded verbatim (caller's encoding preserved).
    pub raw_query: Option<String>,
    pub body: Bytes,
}

/// Translated upstream response body.
///
/// Callers can always distinguish a structured JSON payload from an opaque
/// text one — the two are never silently coerced into each other.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UpstreamPayload {
    /// Upstream declared `application/json`; the parsed value is returned
    /// as the result body directly.
    Structured(serde_json::Value),
    /// Any other content type; the raw text is wrapped with its original
    /// content type.
    Opaque {
        content: String,
        content_type: Option<String>,
    },
}

/// Join a base URL and a remainder path with exactly one separating slash,
/// regardless of leading/trailing slashes on either side.
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Copy a header map, dropping hop-by-hop headers.
pub fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if HOP_BY_HOP_HEADERS.contains(&name.as_str()) {
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }
    forwarded
}

/// Route one inbound request to the named upstream and translate the outcome.
///
/// Unknown names fail immediately with `ServerNotFound` — no network call is
/// made. Upstream non-2xx statuses become `UpstreamStatus` (same code);
/// transport faults and timeouts become `UpstreamUnavailable` with the
/// detail logged, not echoed.
pub async fn route(
    client: &reqwest::Client,
    registry: &Registry,
    name: &str,
    request: ProxyRequest,
) -> crate::Result<UpstreamPayload> {
    let entry = registry
        .get(name)
        .ok_or_else(|| GatewayError::ServerNotFound(name.to_string()))?;

    let mut url = join_url(entry.base_url(), &request.path);
    if let Some(query) = request.raw_query.as_deref() {
        if !query.is_empty() {
            url.push('?');
            url.push_str(query);
        }
    }

    let mut builder = client
        .request(request.method.clone(), &url)
        .headers(strip_hop_by_hop(&request.headers));

    let has_body = request.method == Method::POST
        || request.method == Method::PUT
        || request.method == Method::PATCH;
    if has_body && !request.body.is_empty() {
        // Raw pass-through: content-type agnostic, never parsed here.
        builder = builder.body(request.body);
    }

    tracing::debug!(server = %name, method = %request.method, url = %url, "proxying request");

    let resp = builder.send().await.map_err(|e| {
        tracing::error!(server = %name, error = %e, "proxied request failed");
        GatewayError::UpstreamUnavailable {
            name: name.to_string(),
            detail: e.to_string(),
        }
    })?;

    let status = resp.status();
    if !status.is_success() {
        let detail = resp.text().await.unwrap_or_default();
        tracing::warn!(server = %name, status = %status, "upstream returned error status");
        return Err(GatewayError::UpstreamStatus {
            name: name.to_string(),
            status: status.as_u16(),
            detail,
        });
    }

    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("application/json"))
    {
        let value = resp.json::<serde_json::Value>().await.map_err(|e| {
            tracing::error!(server = %name, error = %e, "upstream declared JSON but body did not parse");
            GatewayError::MalformedResponse {
                name: name.to_string(),
                detail: e.to_string(),
            }
        })?;
        Ok(UpstreamPayload::Structured(value))
    } else {
        let content = resp.text().await.map_err(|e| {
            tracing::error!(server = %name, error = %e, "failed reading upstream response body");
            GatewayError::UpstreamUnavailable {
                name: name.to_string(),
                detail: e.to_string(),
            }
        })?;
        Ok(UpstreamPayload::Opaque {
            content,
            content_type,
        })
    }
}
