//! Main CLI parser and top-level argument handling.

use std::path::{Path, PathBuf};

use clap::builder::BoolishValueParser;
use clap::{Parser, Subcommand};

/// File Docker creates at the root of every container.
const DOCKER_MARKER: &str = "/.dockerenv";

/// Command-line interface for the adjacent-servers host.
#[derive(Parser, Debug)]
#[command(name = "mmgis-adjacent")]
#[command(about = "Proxy and supervise the MMGIS adjacent servers")]
#[command(version)]
pub struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, env = "HOST", default_value = "0.0.0.0", global = true)]
    pub host: String,

    /// Port to bind the HTTP server to
    #[arg(long, env = "PORT", default_value_t = 8888, global = true)]
    pub port: u16,

    /// Route to backend containers by service hostname instead of localhost.
    /// Detected from /.dockerenv when not given.
    #[arg(
        long,
        env = "IS_DOCKER",
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        default_missing_value = "true",
        global = true
    )]
    pub docker: Option<bool>,

    /// Directory holding the adjacent server start scripts
    #[arg(long, env = "ADJACENT_SERVERS_DIR", default_value = "adjacent-servers", global = true)]
    pub servers_dir: PathBuf,

    /// Log each server once it accepts TCP connections
    #[arg(long, global = true)]
    pub wait_ready: bool,

    /// Seconds to wait for each server when --wait-ready is set
    #[arg(long, default_value_t = 120, global = true)]
    pub ready_timeout: u64,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Start the adjacent servers and proxy them (default)
    Serve,
    /// Print which adjacent servers are enabled and where they route
    Status,
}

impl Cli {
    pub fn subcommand(&self) -> Commands {
        self.command.unwrap_or(Commands::Serve)
    }

    /// Docker mode: the explicit flag, else presence of the Docker marker file.
    pub fn docker_mode(&self) -> bool {
        self.docker
            .unwrap_or_else(|| Path::new(DOCKER_MARKER).exists())
    }
}
