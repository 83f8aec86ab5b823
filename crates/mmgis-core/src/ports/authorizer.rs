//! Authorization port used by the proxy gate.
//!
//! The proxy never authenticates anyone itself. It asks an [`Authorizer`]
//! who the caller is and applies its own access policy on top.

use async_trait::async_trait;
use axum::http::request::Parts;

/// How an admin identity was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    /// Interactive login session.
    Session,
    /// Long-lived API token.
    LongTermToken,
}

/// The caller as seen by the authorization collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Admin { credential: Credential },
}

impl Identity {
    /// Whether this identity satisfies an admin requirement.
    pub fn is_admin(self, deny_long_term_tokens: bool) -> bool {
        match self {
            Self::Anonymous => false,
            Self::Admin {
                credential: Credential::LongTermToken,
            } => !deny_long_term_tokens,
            Self::Admin {
                credential: Credential::Session,
            } => true,
        }
    }
}

/// Port for resolving the identity behind an incoming request.
///
/// Implementations must be cheap to call per request and must not consume
/// the request body.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn identify(&self, parts: &Parts) -> Identity;
}

/// Authorizer that treats every caller as anonymous.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnonymousOnly;

#[async_trait]
impl Authorizer for AnonymousOnly {
    async fn identify(&self, _parts: &Parts) -> Identity {
        Identity::Anonymous
    }
}
