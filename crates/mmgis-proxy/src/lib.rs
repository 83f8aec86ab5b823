//! Reverse proxy for the MMGIS adjacent servers.
//!
//! Each enabled adjacent service (STAC, tipg, TiTiler, TiTiler-pgSTAC,
//! Veloserver) is mounted at `<ROOT_PATH>/<prefix>`, guarded by an admin
//! gate, forwarded to its backend, and has its API documentation rewritten
//! so embedded links resolve through the proxy.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Silence unused dev-dependency warnings
#[cfg(test)]
use http_body_util as _;

pub mod auth;
pub mod error;
pub mod forward;
pub mod gate;
pub mod rewrite;
pub mod router;

pub use auth::{ADMIN_TOKEN_VAR, TokenAuthorizer};
pub use error::ProxyError;
pub use gate::{AccessGate, GatePolicy, GateState};
pub use rewrite::{RequestContext, RewriteRules};
pub use router::{ProxyRoute, build_client, init_adjacent_servers_proxy};
