//! Bearer-token authorizer.
//!
//! Recognizes a single admin API token passed as
//! `Authorization: Bearer <token>`. Anything else is anonymous.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, request::Parts};
use tracing::info;

use mmgis_core::{Authorizer, Credential, Identity};

/// Environment variable holding the admin API token.
pub const ADMIN_TOKEN_VAR: &str = "ADMIN_TOKEN";

/// Authorizer backed by one long-term admin token.
#[derive(Debug, Clone)]
pub struct TokenAuthorizer {
    /// Full "Bearer <token>" string, so the check is a direct comparison.
    expected_header: Option<Arc<str>>,
}

impl TokenAuthorizer {
    /// `None` or an empty token means no request is ever admin.
    pub fn new(token: Option<String>) -> Self {
        let expected_header = token
            .filter(|t| !t.trim().is_empty())
            .map(|t| Arc::from(format!("Bearer {}", t.trim())));
        Self { expected_header }
    }

    pub fn from_env() -> Self {
        let authorizer = Self::new(std::env::var(ADMIN_TOKEN_VAR).ok());
        info!(
            target: "adjacent-proxy",
            admin_token_configured = authorizer.expected_header.is_some(),
            "Admin token authorizer ready"
        );
        authorizer
    }
}

#[async_trait]
impl Authorizer for TokenAuthorizer {
    async fn identify(&self, parts: &Parts) -> Identity {
        let Some(expected) = self.expected_header.as_deref() else {
            return Identity::Anonymous;
        };

        let auth = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        match auth {
            Some(h) if h == expected => Identity::Admin {
                credential: Credential::LongTermToken,
            },
            _ => Identity::Anonymous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/stac/collections");
        if let Some(v) = value {
            builder = builder.header(header::AUTHORIZATION, v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_matching_token_is_admin() {
        let auth = TokenAuthorizer::new(Some("s3cret".to_string()));
        assert_eq!(
            auth.identify(&parts_with_auth(Some("Bearer s3cret"))).await,
            Identity::Admin {
                credential: Credential::LongTermToken
            }
        );
    }

    #[tokio::test]
    async fn test_wrong_or_missing_token_is_anonymous() {
        let auth = TokenAuthorizer::new(Some("s3cret".to_string()));
        assert_eq!(
            auth.identify(&parts_with_auth(Some("Bearer nope"))).await,
            Identity::Anonymous
        );
        assert_eq!(auth.identify(&parts_with_auth(None)).await, Identity::Anonymous);
    }

    #[tokio::test]
    async fn test_unconfigured_token_never_admits() {
        let auth = TokenAuthorizer::new(Some("  ".to_string()));
        assert_eq!(
            auth.identify(&parts_with_auth(Some("Bearer "))).await,
            Identity::Anonymous
        );
    }
}
