//! Supervisor errors.

use thiserror::Error;

/// Errors from launching or probing adjacent servers.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The shell could not be spawned at all.
    #[error("Failed to start {name}: {reason}")]
    SpawnFailed { name: String, reason: String },

    /// The readiness probe gave up.
    #[error("{host}:{port} did not accept connections within {waited_secs}s")]
    NotReady {
        host: String,
        port: u16,
        waited_secs: u64,
    },
}
