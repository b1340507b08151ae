//! Error types for Wharf gateway operations.

use thiserror::Error;

/// Main error type for Wharf operations
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Referenced server name is not in the registry
    #[error("server '{0}' not found")]
    ServerNotFound(String),

    /// Upstream responded with a non-2xx status — passed through to the caller
    #[error("upstream '{name}' responded with status {status}")]
    UpstreamStatus {
        name: String,
        status: u16,
        detail: String,
    },

    /// Connection refused, timeout, DNS failure, or any transport-level fault
    #[error("upstream '{name}' unreachable")]
    UpstreamUnavailable { name: String, detail: String },

    /// Upstream declared JSON but the body did not parse, or a discovery
    /// response was missing the expected field
    #[error("malformed response from upstream '{name}': {detail}")]
    MalformedResponse { name: String, detail: String },

    /// Malformed registration entry at startup — logged and skipped, never fatal
    #[error("invalid server spec: {0}")]
    InvalidServerSpec(String),

    /// Failed to build the shared outbound HTTP client at startup
    #[error("failed to build outbound HTTP client: {0}")]
    ClientInit(String),
}

/// Result type alias for Wharf operations
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_not_found_display() {
        let err = GatewayError::ServerNotFound("postgres".to_string());
        assert_eq!(err.to_string(), "server 'postgres' not found");
    }

    #[test]
    fn test_upstream_status_display() {
        let err = GatewayError::UpstreamStatus {
            name: "github".to_string(),
            status: 503,
            detail: "service unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "upstream 'github' responded with status 503"
        );
    }

    #[test]
    fn test_unavailable_display_hides_detail() {
        // Transport detail (which may contain internal addresses) must not
        // appear in the Display string shown to callers.
        let err = GatewayError::UpstreamUnavailable {
            name: "github".to_string(),
            detail: "tcp connect error: 10.0.0.7:9001".to_string(),
        };
        assert_eq!(err.to_string(), "upstream 'github' unreachable");
        assert!(!err.to_string().contains("10.0.0.7"));
    }

    #[test]
    fn test_invalid_server_spec_display() {
        let err = GatewayError::InvalidServerSpec("missing address".to_string());
        assert_eq!(err.to_string(), "invalid server spec: missing address");
    }
}
