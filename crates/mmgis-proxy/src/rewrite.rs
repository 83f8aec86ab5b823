//! Response rewriting for proxied API documentation.
//!
//! Backends such as stac-fastapi and TiTiler publish OpenAPI documents and
//! Swagger UI pages that embed their own internal base URL. Served through
//! the proxy those links would point at `http://localhost:8881` (or a
//! container hostname), so selected bodies are rewritten to the public path.
//!
//! Everything here is a pure function of its inputs: no I/O, no clocks.

use axum::http::{HeaderMap, Uri, header};
use bytes::Bytes;
use serde_json::{Value, json};
use tracing::warn;

/// Request-side facts the rewrite needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// `http` or `https` as seen by the client.
    pub protocol: String,
    /// Host header of the incoming request.
    pub host: String,
}

impl RequestContext {
    /// Derive the client-facing protocol and host.
    ///
    /// `X-Forwarded-Proto` wins over the default `http`; the `Host` header
    /// wins over the URI authority.
    pub fn from_request(headers: &HeaderMap, uri: &Uri) -> Self {
        let protocol = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or("http")
            .to_string();

        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| uri.authority().map(ToString::to_string))
            .unwrap_or_default();

        Self { protocol, host }
    }
}

/// Per-route rewrite configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRules {
    /// Public path segment of the service, e.g. `stac` or `titilerpgstac`.
    path: String,
    /// Internal backend base URL that backends embed in their output.
    target: String,
    /// `<EXTERNAL_ROOT_PATH><ROOT_PATH>`.
    external_base: String,
}

impl RewriteRules {
    pub fn new(
        path: impl Into<String>,
        target: impl Into<String>,
        external_base: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            target: target.into(),
            external_base: external_base.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn is_api_document(&self, original_url: &str) -> bool {
        original_url.ends_with(&format!("/{}/api", self.path))
    }

    fn is_api_page(&self, original_url: &str) -> bool {
        original_url.ends_with(&format!("/{}/api.html", self.path))
    }

    /// Whether the response must be buffered so [`Self::rewrite`] can run.
    ///
    /// Everything else is streamed through untouched.
    pub fn should_intercept(&self, original_url: &str, content_type: Option<&str>) -> bool {
        is_textual(content_type) || self.is_api_document(original_url) || self.is_api_page(original_url)
    }

    /// Rewrite a buffered response body.
    ///
    /// `original_url` is the request path and query as the client sent it,
    /// including `ROOT_PATH`. Bodies that match no rule come back as the
    /// same bytes.
    pub fn rewrite(
        &self,
        body: Bytes,
        content_type: Option<&str>,
        original_url: &str,
        ctx: &RequestContext,
    ) -> Bytes {
        let mut rewritten: Option<String> = None;
        let public_root = format!("{}/{}", self.external_base, self.path);

        if self.is_api_document(original_url) {
            let text = String::from_utf8_lossy(&body);
            rewritten = Some(match serde_json::from_str::<Value>(&text) {
                Ok(mut doc) => {
                    if let Some(obj) = doc.as_object_mut() {
                        obj.insert("servers".to_string(), json!([{ "url": public_root }]));
                    }
                    serde_json::to_string(&doc).unwrap_or_else(|_| text.into_owned())
                }
                Err(e) => {
                    warn!(
                        target: "adjacent-proxy",
                        service = %self.path,
                        error = %e,
                        "API document is not valid JSON, passing it through"
                    );
                    text.into_owned()
                }
            });
        } else if self.is_api_page(original_url) {
            let text = String::from_utf8_lossy(&body);
            rewritten = Some(
                text.replace("'/api'", &format!("'{public_root}/api'"))
                    .replace(
                        "'/docs/oauth2-redirect'",
                        &format!("'{public_root}/docs/oauth2-redirect'"),
                    ),
            );
        }

        if is_textual(content_type) {
            let text = rewritten.unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned());
            let external = format!("{}://{}/{}", ctx.protocol, ctx.host, self.path);
            rewritten = Some(text.replace(&self.target, &external));
        }

        rewritten.map_or(body, Bytes::from)
    }
}

/// JSON or HTML content, the only types worth decoding.
fn is_textual(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.contains("json") || ct.contains("html"))
}
