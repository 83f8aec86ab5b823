//! Request forwarding to an adjacent service.
//!
//! Request bodies are streamed to the backend. Responses that need
//! rewriting are buffered in full before a single byte goes back to the
//! client; everything else is streamed straight through.

use axum::{
    body::{Body, HttpBody},
    extract::{OriginalUri, Request},
    http::{HeaderMap, HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures_util::TryStreamExt;
use reqwest::Client;
use tracing::{debug, error};

use crate::error::ProxyError;
use crate::rewrite::RequestContext;
use crate::router::ProxyRoute;

/// Headers that should NOT be forwarded (hop-by-hop headers).
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Check if a request header should be forwarded to the backend.
///
/// `host` is dropped so the client sets it from the target (change-origin).
/// `content-length` is kept so a streamed body is not re-chunked.
fn should_forward_request_header(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower != "host" && !HOP_BY_HOP_HEADERS.contains(&lower.as_str())
}

/// Check if a backend response header should be relayed to the client.
fn should_forward_response_header(name: &str) -> bool {
    !HOP_BY_HOP_HEADERS.contains(&name.to_lowercase().as_str())
}

/// Path and query the client originally requested, before prefix stripping.
fn original_url(req: &Request) -> String {
    let uri = req
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| req.uri(), |original| &original.0);
    uri.path_and_query()
        .map_or_else(|| uri.path().to_string(), ToString::to_string)
}

/// Path and query relative to the service mount point.
fn upstream_path(req: &Request) -> String {
    let path_and_query = req
        .uri()
        .path_and_query()
        .map_or("/", |pq| pq.as_str());
    if path_and_query.starts_with('/') {
        path_and_query.to_string()
    } else {
        format!("/{path_and_query}")
    }
}

/// Forward one request to the route's backend.
pub async fn forward_request(client: &Client, route: &ProxyRoute, req: Request) -> Response {
    match try_forward(client, route, req).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn try_forward(
    client: &Client,
    route: &ProxyRoute,
    req: Request,
) -> Result<Response, ProxyError> {
    let original_url = original_url(&req);
    let upstream_url = format!("{}{}", route.target, upstream_path(&req));
    let ctx = RequestContext::from_request(req.headers(), req.uri());
    let service = route.service.name();

    debug!(
        target: "adjacent-proxy",
        %service,
        method = %req.method(),
        %original_url,
        upstream = %upstream_url,
        "Forwarding request"
    );

    let (parts, body) = req.into_parts();

    let mut req_builder = client.request(parts.method, &upstream_url);
    for (name, value) in &parts.headers {
        if !should_forward_request_header(name.as_str()) {
            continue;
        }
        // Rewritable bodies must come back uncompressed.
        if route.rewrite.is_some() && name == header::ACCEPT_ENCODING {
            continue;
        }
        req_builder = req_builder.header(name, value);
    }
    if body.size_hint().exact() != Some(0) {
        req_builder = req_builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }

    let response = req_builder.send().await.map_err(|e| {
        error!(
            target: "adjacent-proxy",
            %service,
            upstream = %upstream_url,
            error = %e,
            "Failed to reach adjacent server"
        );
        ProxyError::Upstream {
            service: service.to_string(),
            reason: e.to_string(),
        }
    })?;

    let status = response.status();
    let headers = response.headers().clone();
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let encoded = headers
        .get(header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| !v.eq_ignore_ascii_case("identity"));

    let rules = route
        .rewrite
        .as_ref()
        .filter(|rules| !encoded && rules.should_intercept(&original_url, content_type.as_deref()));

    let Some(rules) = rules else {
        let stream = response.bytes_stream().map_err(std::io::Error::other);
        return Ok(build_response(status, &headers, Body::from_stream(stream), false));
    };

    let bytes = response.bytes().await.map_err(|e| {
        error!(
            target: "adjacent-proxy",
            %service,
            error = %e,
            "Failed to read adjacent server response"
        );
        ProxyError::UpstreamBody {
            service: service.to_string(),
            reason: e.to_string(),
        }
    })?;

    let rewritten = rules.rewrite(bytes, content_type.as_deref(), &original_url, &ctx);
    Ok(build_response(status, &headers, Body::from(rewritten), true))
}

/// Build the client response from backend status and headers.
///
/// A rewritten body has a new length, so the backend's `content-length`
/// is dropped and recomputed by the server.
fn build_response(status: StatusCode, headers: &HeaderMap, body: Body, rewritten: bool) -> Response {
    let mut builder = Response::builder().status(status);
    if let Some(out) = builder.headers_mut() {
        for (name, value) in headers {
            if !should_forward_response_header(name.as_str()) {
                continue;
            }
            if rewritten && name == header::CONTENT_LENGTH {
                continue;
            }
            out.append(HeaderName::clone(name), value.clone());
        }
    }
    builder
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
