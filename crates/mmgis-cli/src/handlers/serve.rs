//! Serve command handler.
//!
//! Starts the supervised adjacent servers, mounts their proxy routes and
//! serves HTTP until Ctrl-C, then stops every child.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use mmgis_core::{AdjacentConfig, Authorizer, ProcessOutputSink, StdoutSink};
use mmgis_proxy::TokenAuthorizer;
use mmgis_runtime::{ChildProcessHandle, Supervisor, wait_for_port};

use crate::bootstrap::build_app;

/// Options for `serve` beyond the configuration itself.
#[derive(Debug, Clone)]
pub struct ServeOptions<'a> {
    pub host: &'a str,
    pub port: u16,
    pub docker: bool,
    pub servers_dir: &'a Path,
    /// Probe each child's port when set.
    pub ready_timeout: Option<Duration>,
}

/// Execute the serve command.
pub async fn execute(config: &AdjacentConfig, options: ServeOptions<'_>) -> Result<()> {
    let sink: Arc<dyn ProcessOutputSink> = Arc::new(StdoutSink);
    let supervisor = Supervisor::new(sink).with_base_dir(options.servers_dir);
    let children = supervisor.start_adjacent_servers(config);

    if let Some(limit) = options.ready_timeout {
        spawn_readiness_probes(&children, limit);
    }

    let authorizer: Arc<dyn Authorizer> = Arc::new(TokenAuthorizer::from_env());
    let app = build_app(config, options.docker, authorizer)?;

    let addr = format!("{}:{}", options.host, options.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!(
        routes = app.routes.len(),
        children = children.len(),
        docker = options.docker,
        "MMGIS adjacent servers listening on http://{addr}"
    );

    let served = axum::serve(listener, app.router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("Stopping adjacent servers");
    for (name, state) in Supervisor::shutdown_all(children).await {
        info!(target: "adjacent-servers", %name, %state, "stopped");
    }

    served.context("HTTP server failed")
}

fn spawn_readiness_probes(children: &[ChildProcessHandle], limit: Duration) {
    for child in children {
        let name = child.name().to_string();
        let port = child.port();
        tokio::spawn(async move {
            match wait_for_port("127.0.0.1", port, limit).await {
                Ok(()) => info!(target: "adjacent-servers", "{name} server is ready on port {port}"),
                Err(e) => warn!(target: "adjacent-servers", "{name} server not ready: {e}"),
            }
        });
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
