//! Runtime for the MMGIS adjacent servers.
//!
//! Spawns the STAC, TiPG, TiTiler and TiTiler-PgSTAC servers as shell
//! children, echoes their readiness lines, and stops them on shutdown.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_test as _;
#[cfg(test)]
use tracing_subscriber as _;

mod error;
pub mod process;
mod supervisor;

pub use error::SupervisorError;
pub use process::{
    ChildProcessHandle, DEFAULT_BASE_DIR, ProcessState, SupervisedService, wait_for_port,
};
pub use supervisor::{SHUTDOWN_LIMIT, Supervisor};
