//! Composition root: wires configuration, authorization and the proxy
//! router into one HTTP application.

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::routing::get;
use mmgis_core::{AdjacentConfig, Authorizer};
use mmgis_proxy::{AccessGate, ProxyRoute, build_client, init_adjacent_servers_proxy};
use tower_http::trace::TraceLayer;

/// Where unauthorized browser requests are sent when a route redirects.
pub const LOGIN_PATH: &str = "/login";

/// The assembled HTTP application and the routes it registered.
pub struct AdjacentApp {
    pub router: Router,
    pub routes: Vec<ProxyRoute>,
}

/// Build the HTTP application for `config`.
///
/// Registers `GET /health` plus one proxy route per enabled service.
pub fn build_app(
    config: &AdjacentConfig,
    docker: bool,
    authorizer: Arc<dyn Authorizer>,
) -> Result<AdjacentApp> {
    let gate = AccessGate::new(authorizer, LOGIN_PATH);
    let client = build_client()?;

    let base = Router::new().route("/health", get(health_check));
    let (router, routes) = init_adjacent_servers_proxy(base, config, docker, &gate, &client);

    Ok(AdjacentApp {
        router: router.layer(TraceLayer::new_for_http()),
        routes,
    })
}

async fn health_check() -> &'static str {
    "OK"
}
