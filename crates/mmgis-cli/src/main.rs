//! CLI entry point.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mmgis_cli::handlers::{serve, status};
use mmgis_cli::{Cli, Commands};
use mmgis_core::AdjacentConfig;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).compact().init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap reads env-backed args.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = AdjacentConfig::from_env().context("Invalid adjacent server configuration")?;
    let docker = cli.docker_mode();

    match cli.subcommand() {
        Commands::Serve => {
            let options = serve::ServeOptions {
                host: &cli.host,
                port: cli.port,
                docker,
                servers_dir: &cli.servers_dir,
                ready_timeout: cli
                    .wait_ready
                    .then(|| Duration::from_secs(cli.ready_timeout)),
            };
            serve::execute(&config, options).await
        }
        Commands::Status => {
            status::execute(&config, docker, &cli.servers_dir);
            Ok(())
        }
    }
}
