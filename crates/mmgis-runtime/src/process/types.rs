//! Lifecycle state of a supervised adjacent server.

use std::fmt;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Where a supervised server is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessState {
    /// The enable flag is not `true`; nothing was launched.
    Disabled,
    /// Spawn requested, shell not yet confirmed.
    Starting,
    /// Shell is alive.
    Running,
    /// Spawning or waiting on the child failed.
    Errored { message: String },
    /// The shell exited. `code` is `None` when killed by a signal.
    Exited { code: Option<i32> },
}

impl ProcessState {
    /// True once no further transitions can happen.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Disabled | Self::Errored { .. } | Self::Exited { .. })
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::Errored { message } => write!(f, "errored ({message})"),
            Self::Exited { code: Some(code) } => write!(f, "exited ({code})"),
            Self::Exited { code: None } => write!(f, "exited (signal)"),
        }
    }
}

/// Handle to one launched adjacent server.
///
/// The child itself is owned by a watcher task; the handle observes its
/// state and can ask it to stop.
#[derive(Debug)]
pub struct ChildProcessHandle {
    name: String,
    port: u16,
    pid: Option<u32>,
    state: watch::Receiver<ProcessState>,
    cancel: CancellationToken,
    watcher: JoinHandle<()>,
}

impl ChildProcessHandle {
    pub(crate) const fn new(
        name: String,
        port: u16,
        pid: Option<u32>,
        state: watch::Receiver<ProcessState>,
        cancel: CancellationToken,
        watcher: JoinHandle<()>,
    ) -> Self {
        Self {
            name,
            port,
            pid,
            state,
            cancel,
            watcher,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Current state snapshot.
    pub fn state(&self) -> ProcessState {
        self.state.borrow().clone()
    }

    /// A receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<ProcessState> {
        self.state.clone()
    }

    /// Wait until the server reaches a terminal state.
    pub async fn wait_exit(&mut self) -> ProcessState {
        let reached = self
            .state
            .wait_for(ProcessState::is_terminal)
            .await
            .map(|state| state.clone());
        // On error the watcher dropped its sender; report the last value seen.
        reached.unwrap_or_else(|_| self.state())
    }

    /// Stop the server and wait for the watcher to reap it.
    ///
    /// If the watcher does not finish within `limit` it is aborted; the
    /// child is then killed on drop. Dropping the handle without calling
    /// this also stops the server.
    pub async fn shutdown(mut self, limit: Duration) -> ProcessState {
        self.cancel.cancel();

        if timeout(limit, &mut self.watcher).await.is_err() {
            warn!(target: "adjacent-servers", name = %self.name, "watcher did not stop in time, aborting");
            self.watcher.abort();
        }

        self.state()
    }
}

impl Drop for ChildProcessHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
