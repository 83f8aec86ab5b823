//! Proxy error types and their HTTP mappings.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Errors produced by the proxy routes themselves (not by the backends).
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The backend could not be reached.
    #[error("Upstream {service} unreachable: {reason}")]
    Upstream { service: String, reason: String },

    /// The backend answered but its body could not be read.
    #[error("Failed to read response from {service}: {reason}")]
    UpstreamBody { service: String, reason: String },

    /// The caller lacks the required identity.
    #[error("Unauthorized")]
    Unauthorized,

    /// Failed to build the HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Upstream { .. } | Self::UpstreamBody { .. } => StatusCode::BAD_GATEWAY,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Client(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            status: "failure",
            message: self.to_string(),
        };

        let mut response = (status, axum::Json(body)).into_response();
        if matches!(self, Self::Unauthorized) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let upstream = ProxyError::Upstream {
            service: "stac".to_string(),
            reason: "connection refused".to_string(),
        };
        assert_eq!(upstream.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(ProxyError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_unauthorized_sets_www_authenticate() {
        let response = ProxyError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
}
