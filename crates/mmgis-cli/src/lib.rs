//! Server binary for the MMGIS adjacent servers.
//!
//! Wires the configuration, the proxy router and the process supervisor
//! together behind a small CLI.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Silence unused dev-dependency warnings
#[cfg(test)]
use http_body_util as _;
#[cfg(test)]
use tokio_test as _;
#[cfg(test)]
use tower as _;

// Used by the binary only
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod handlers;
pub mod parser;

pub use bootstrap::{AdjacentApp, LOGIN_PATH, build_app};
pub use parser::{Cli, Commands};
