//! Graceful process shutdown for adjacent servers.

mod child;

pub use child::{DEFAULT_GRACE, shutdown_child};
