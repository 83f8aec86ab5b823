//! Route registration for the adjacent servers.
//!
//! [`init_adjacent_servers_proxy`] mounts one gated, forwarding service per
//! enabled adjacent server and hands the registered routes back to the
//! caller. Routes are fixed once built.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{Request, State},
    middleware,
    response::Response,
};
use reqwest::Client;
use tracing::info;

use mmgis_core::{AdjacentConfig, AdjacentService, ServiceDescriptor};

use crate::error::ProxyError;
use crate::forward::forward_request;
use crate::gate::{AccessGate, GatePolicy, enforce};
use crate::rewrite::RewriteRules;

/// One registered adjacent-server route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRoute {
    pub service: AdjacentService,
    /// `<ROOT_PATH>/<prefix>`.
    pub mount_path: String,
    /// Internal backend base URL.
    pub target: String,
    pub policy: GatePolicy,
    /// `None` for services whose responses are relayed verbatim.
    pub rewrite: Option<RewriteRules>,
}

impl ProxyRoute {
    pub fn new(descriptor: &ServiceDescriptor, config: &AdjacentConfig, docker: bool) -> Self {
        let target = descriptor.target(docker);
        let rewrite = descriptor.service.rewrites_responses().then(|| {
            RewriteRules::new(
                descriptor.path_prefix.clone(),
                target.clone(),
                config.external_base(),
            )
        });

        Self {
            service: descriptor.service,
            mount_path: descriptor.mount_path(&config.root_path),
            target,
            // GETs are open, everything else needs admin.
            policy: GatePolicy::new(false, false, true, descriptor.get_exceptions.as_slice()),
            rewrite,
        }
    }
}

#[derive(Clone)]
struct ForwardState {
    client: Client,
    route: Arc<ProxyRoute>,
}

async fn proxy_request(State(state): State<ForwardState>, req: Request) -> Response {
    forward_request(&state.client, &state.route, req).await
}

/// Build the HTTP client used for every backend.
///
/// Redirects are relayed to the client, never followed.
pub fn build_client() -> Result<Client, ProxyError> {
    Ok(Client::builder()
        .pool_max_idle_per_host(10)
        .connect_timeout(Duration::from_secs(10))
        .redirect(reqwest::redirect::Policy::none())
        .build()?)
}

/// Mount a proxy route for every enabled adjacent server onto `app`.
///
/// Returns the extended router together with the routes that were
/// registered, in [`AdjacentService::ALL`] order. Disabled services get no
/// route at all, so their paths fall through to the app's 404.
pub fn init_adjacent_servers_proxy<S>(
    mut app: Router<S>,
    config: &AdjacentConfig,
    docker: bool,
    gate: &AccessGate,
    client: &Client,
) -> (Router<S>, Vec<ProxyRoute>)
where
    S: Clone + Send + Sync + 'static,
{
    let mut routes = Vec::new();

    for descriptor in config.enabled() {
        let route = ProxyRoute::new(descriptor, config, docker);
        info!(
            target: "adjacent-proxy",
            service = %route.service,
            mount_path = %route.mount_path,
            target_url = %route.target,
            rewrite = route.rewrite.is_some(),
            "Registering adjacent server proxy"
        );

        let service = Router::new()
            .fallback(proxy_request)
            .with_state(ForwardState {
                client: client.clone(),
                route: Arc::new(route.clone()),
            })
            .layer(middleware::from_fn_with_state(
                gate.ensure_admin(route.policy.clone()),
                enforce,
            ));

        app = app.nest_service(&route.mount_path, service);
        routes.push(route);
    }

    (app, routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmgis_core::AnonymousOnly;

    fn config(pairs: &[(&str, &str)]) -> AdjacentConfig {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AdjacentConfig::from_lookup(|key| {
            pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    fn gate() -> AccessGate {
        AccessGate::new(Arc::new(AnonymousOnly), "/login")
    }

    #[test]
    fn test_one_route_per_enabled_service() {
        let config = config(&[
            ("WITH_STAC", "true"),
            ("WITH_TITILER", "true"),
            ("WITH_VELOSERVER", "true"),
            ("WITH_TIPG", "false"),
        ]);
        let client = build_client().unwrap();
        let (_app, routes) =
            init_adjacent_servers_proxy(Router::<()>::new(), &config, false, &gate(), &client);

        let services: Vec<AdjacentService> = routes.iter().map(|r| r.service).collect();
        assert_eq!(
            services,
            vec![
                AdjacentService::Stac,
                AdjacentService::Titiler,
                AdjacentService::Veloserver
            ]
        );
    }

    #[test]
    fn test_no_routes_when_nothing_enabled() {
        let client = build_client().unwrap();
        let (_app, routes) =
            init_adjacent_servers_proxy(Router::<()>::new(), &config(&[]), true, &gate(), &client);
        assert!(routes.is_empty());
    }

    #[test]
    fn test_route_shape() {
        let config = config(&[
            ("WITH_STAC", "true"),
            ("STAC_PORT", "9999"),
            ("ROOT_PATH", "/app"),
        ]);
        let stac = config.descriptor(AdjacentService::Stac).unwrap();

        let docker = ProxyRoute::new(stac, &config, true);
        assert_eq!(docker.target, "http://stac-fastapi:9999");
        assert_eq!(docker.mount_path, "/app/stac");

        let local = ProxyRoute::new(stac, &config, false);
        assert_eq!(local.target, "http://localhost:9999");
        assert_eq!(local.rewrite.as_ref().unwrap().target(), "http://localhost:9999");
    }

    #[test]
    fn test_titiler_policy_carries_cog_stac_exception() {
        let config = config(&[("WITH_TITILER", "true")]);
        let titiler = config.descriptor(AdjacentService::Titiler).unwrap();
        let route = ProxyRoute::new(titiler, &config, false);

        assert!(route.policy.allow_anonymous_get);
        assert!(!route.policy.redirect_to_login);
        assert!(!route.policy.deny_long_term_tokens);
        assert_eq!(route.policy.get_exceptions, vec!["/cog/stac".to_string()]);
    }

    #[test]
    fn test_veloserver_has_no_rewrite() {
        let config = config(&[("WITH_VELOSERVER", "true")]);
        let velo = config.descriptor(AdjacentService::Veloserver).unwrap();
        let route = ProxyRoute::new(velo, &config, true);
        assert!(route.rewrite.is_none());
        assert_eq!(route.target, "http://veloserver:8104");
    }
}
