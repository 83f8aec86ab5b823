//! Admin gate placed in front of every adjacent-server route.
//!
//! Policy: non-GET methods always need an admin identity. GET requests are
//! open to anyone when `allow_anonymous_get` is set, unless the request path
//! ends with one of the policy's exception suffixes.
//!
//! Suffixes are matched against the path the backend will route on: percent
//! decoded, with empty and dot segments resolved. `/cog/%73tac` and
//! `/cog%2Fstac` both reach TiTiler as `/cog/stac`.

use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::warn;

use mmgis_core::Authorizer;

use crate::error::ProxyError;

/// Access policy for one route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatePolicy {
    /// Redirect rejected callers to the login page instead of answering 401.
    pub redirect_to_login: bool,
    /// Refuse admin identities that come from long-term API tokens.
    pub deny_long_term_tokens: bool,
    /// Let anyone through on GET.
    pub allow_anonymous_get: bool,
    /// GET path suffixes that still require admin.
    pub get_exceptions: Vec<String>,
}

impl GatePolicy {
    pub fn new<S: AsRef<str>>(
        redirect_to_login: bool,
        deny_long_term_tokens: bool,
        allow_anonymous_get: bool,
        get_exceptions: &[S],
    ) -> Self {
        Self {
            redirect_to_login,
            deny_long_term_tokens,
            allow_anonymous_get,
            get_exceptions: get_exceptions
                .iter()
                .map(|s| s.as_ref().to_string())
                .collect(),
        }
    }

    /// Whether a request with this method and path must come from an admin.
    pub fn requires_admin(&self, method: &Method, path: &str) -> bool {
        if *method != Method::GET || !self.allow_anonymous_get {
            return true;
        }
        self.get_exceptions
            .iter()
            .any(|suffix| path.ends_with(suffix.as_str()))
    }
}

/// Path as a backend router sees it.
///
/// Percent escapes are decoded (lossy UTF-8), a backslash counts as a separator,
/// empty and `.` segments are dropped and `..` pops a segment.
pub fn normalize_path(raw: &str) -> String {
    let bytes = urlencoding::decode_binary(raw.as_bytes());
    let decoded = String::from_utf8_lossy(&bytes);

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Factory for per-route gate middleware state.
#[derive(Clone)]
pub struct AccessGate {
    authorizer: Arc<dyn Authorizer>,
    login_path: Arc<str>,
}

impl AccessGate {
    /// `login_path` is where rejected callers go when a policy redirects.
    pub fn new(authorizer: Arc<dyn Authorizer>, login_path: impl Into<String>) -> Self {
        Self {
            authorizer,
            login_path: Arc::from(login_path.into()),
        }
    }

    /// Bind the gate to a policy, ready for `middleware::from_fn_with_state`.
    pub fn ensure_admin(&self, policy: GatePolicy) -> GateState {
        GateState {
            authorizer: Arc::clone(&self.authorizer),
            login_path: Arc::clone(&self.login_path),
            policy: Arc::new(policy),
        }
    }
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("login_path", &self.login_path)
            .finish_non_exhaustive()
    }
}

/// Gate bound to one route's policy.
#[derive(Clone)]
pub struct GateState {
    authorizer: Arc<dyn Authorizer>,
    login_path: Arc<str>,
    policy: Arc<GatePolicy>,
}

impl GateState {
    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }
}

/// Gate middleware: let the request through or reject it before it is
/// forwarded anywhere.
pub async fn enforce(State(gate): State<GateState>, req: Request, next: Next) -> Response {
    let path = normalize_path(
        req.extensions()
            .get::<OriginalUri>()
            .map_or_else(|| req.uri().path(), |original| original.0.path()),
    );

    if !gate.policy.requires_admin(req.method(), &path) {
        return next.run(req).await;
    }

    let (parts, body) = req.into_parts();
    let identity = gate.authorizer.identify(&parts).await;
    if identity.is_admin(gate.policy.deny_long_term_tokens) {
        return next.run(Request::from_parts(parts, body)).await;
    }

    warn!(
        target: "adjacent-proxy",
        method = %parts.method,
        %path,
        "Unauthorized adjacent server request"
    );

    if gate.policy.redirect_to_login {
        Redirect::to(&gate.login_path).into_response()
    } else {
        ProxyError::Unauthorized.into_response()
    }
}
