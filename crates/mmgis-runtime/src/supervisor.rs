//! Supervisor for the adjacent-server child processes.
//!
//! Launches every enabled, supervised service as a shell child of this
//! process and hands back one handle per child. There is no restart
//! policy; an exited child stays exited.
//!
//! Key design decisions:
//! - **Fire and forget spawns**: `start` never awaits a child
//! - **Failures are isolated**: one service failing to spawn does not stop its siblings
//! - **Explicit handles**: callers keep the handles and pass them back to `shutdown_all`

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mmgis_core::{AdjacentConfig, ProcessOutputSink};
use tracing::debug;

use crate::process::{
    ChildProcessHandle, DEFAULT_BASE_DIR, ProcessState, SupervisedService, spawn_service,
};

/// How long `shutdown_all` waits for each watcher before aborting it.
pub const SHUTDOWN_LIMIT: Duration = Duration::from_secs(10);

/// Launches adjacent servers and collects their handles.
pub struct Supervisor {
    sink: Arc<dyn ProcessOutputSink>,
    base_dir: PathBuf,
}

impl Supervisor {
    /// Create a supervisor that echoes child output to `sink`.
    pub fn new(sink: Arc<dyn ProcessOutputSink>) -> Self {
        Self {
            sink,
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
        }
    }

    /// Look for the start scripts under `base_dir` instead of `adjacent-servers`.
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Launch tuples for every supervised service, enabled or not, in fixed order.
    pub fn plan(&self, config: &AdjacentConfig) -> Vec<SupervisedService> {
        let base_dir = self.base_dir.to_string_lossy();
        config
            .services
            .iter()
            .filter(|d| d.service.is_supervised())
            .map(|d| SupervisedService::from_descriptor(d, &base_dir))
            .collect()
    }

    /// Start every enabled service in the configuration.
    pub fn start_adjacent_servers(&self, config: &AdjacentConfig) -> Vec<ChildProcessHandle> {
        self.start(&self.plan(config))
    }

    /// Start every enabled service in `services`.
    ///
    /// Must be called from within a Tokio runtime. Spawn failures are
    /// reported to the sink and the error log and the service is skipped.
    pub fn start(&self, services: &[SupervisedService]) -> Vec<ChildProcessHandle> {
        services
            .iter()
            .filter(|s| s.enabled)
            .filter_map(|s| spawn_service(s, &self.sink).ok())
            .collect()
    }

    /// Initial state of each planned service, before anything is spawned.
    pub fn planned_states(services: &[SupervisedService]) -> Vec<(String, ProcessState)> {
        services
            .iter()
            .map(|s| {
                let state = if s.enabled {
                    ProcessState::Starting
                } else {
                    ProcessState::Disabled
                };
                (s.name.clone(), state)
            })
            .collect()
    }

    /// Stop every child and wait for each to be reaped.
    pub async fn shutdown_all(handles: Vec<ChildProcessHandle>) -> Vec<(String, ProcessState)> {
        let stops = handles.into_iter().map(|handle| async move {
            let name = handle.name().to_string();
            let state = handle.shutdown(SHUTDOWN_LIMIT).await;
            debug!(target: "adjacent-servers", %name, %state, "adjacent server stopped");
            (name, state)
        });

        let mut stopped = Vec::new();
        for task in stops.map(tokio::spawn).collect::<Vec<_>>() {
            if let Ok(entry) = task.await {
                stopped.push(entry);
            }
        }
        stopped
    }
}
