//! Spawning a single adjacent server.
//!
//! Each server is launched through the platform shell with its start
//! script and listening port. The shell is watched by a background task
//! that publishes state changes and handles shutdown on cancellation.

use std::process::Stdio;
use std::sync::Arc;

use mmgis_core::{ProcessOutputSink, ServiceDescriptor};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::shutdown::{DEFAULT_GRACE, shutdown_child};
use super::stream::spawn_stream_reader;
use super::types::{ChildProcessHandle, ProcessState};
use crate::SupervisorError;

/// Directory holding one sub-directory per supervised server.
pub const DEFAULT_BASE_DIR: &str = "adjacent-servers";

/// Shell command that starts `name` from its sub-directory of `base_dir`.
///
/// The listening port is appended as the last argument at spawn time.
pub fn start_command(base_dir: &str, name: &str) -> String {
    if cfg!(windows) {
        format!("cd {base_dir}/{name}/ && start-{name}.bat")
    } else {
        format!("cd {base_dir}/{name}/ && sh start-{name}.sh")
    }
}

/// One adjacent server the supervisor may launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisedService {
    pub name: String,
    /// Shell command line, without the port.
    pub command: String,
    pub port: u16,
    pub enabled: bool,
}

impl SupervisedService {
    /// Derive the launch tuple for a configured service.
    pub fn from_descriptor(descriptor: &ServiceDescriptor, base_dir: &str) -> Self {
        Self {
            name: descriptor.name().to_string(),
            command: start_command(base_dir, descriptor.name()),
            port: descriptor.port,
            enabled: descriptor.enabled,
        }
    }

    /// A service with an arbitrary command line.
    pub fn with_command(
        name: impl Into<String>,
        command: impl Into<String>,
        port: u16,
        enabled: bool,
    ) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            port,
            enabled,
        }
    }

    /// Full command line handed to the shell.
    pub fn shell_line(&self) -> String {
        format!("{} {}", self.command, self.port)
    }
}

fn shell_command(line: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(line);
        cmd
    }

    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(line);
        cmd
    }
}

/// Report a failure the way the supervisor always does: one line on the
/// output sink and one error log.
fn report_error(sink: &dyn ProcessOutputSink, name: &str, err: &dyn std::fmt::Display) {
    sink.write_line(&format!("{name} ERROR - {err}"));
    error!(target: "adjacent-servers", "[{name}] {err}");
}

/// Launch one server without waiting on it.
pub fn spawn_service(
    service: &SupervisedService,
    sink: &Arc<dyn ProcessOutputSink>,
) -> Result<ChildProcessHandle, SupervisorError> {
    info!(
        target: "adjacent-servers",
        "Starting {} server on port {}...", service.name, service.port
    );

    let mut cmd = shell_command(&service.shell_line());
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd.spawn().map_err(|e| {
        report_error(sink.as_ref(), &service.name, &e);
        SupervisorError::SpawnFailed {
            name: service.name.clone(),
            reason: e.to_string(),
        }
    })?;

    if let Some(stdout) = child.stdout.take() {
        spawn_stream_reader(stdout, service.name.clone(), "stdout", Arc::clone(sink));
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_stream_reader(stderr, service.name.clone(), "stderr", Arc::clone(sink));
    }

    let pid = child.id();
    let (state_tx, state_rx) = watch::channel(ProcessState::Starting);
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(watch_child(
        child,
        service.name.clone(),
        state_tx,
        cancel.clone(),
        Arc::clone(sink),
    ));

    Ok(ChildProcessHandle::new(
        service.name.clone(),
        service.port,
        pid,
        state_rx,
        cancel,
        watcher,
    ))
}

async fn watch_child(
    mut child: Child,
    name: String,
    state: watch::Sender<ProcessState>,
    cancel: CancellationToken,
    sink: Arc<dyn ProcessOutputSink>,
) {
    state.send_replace(ProcessState::Running);

    let outcome = tokio::select! {
        status = child.wait() => {
            if let Ok(status) = &status {
                if status.success() {
                    info!(target: "adjacent-servers", %name, "adjacent server exited");
                } else {
                    warn!(target: "adjacent-servers", %name, code = ?status.code(), "adjacent server exited");
                }
            }
            status
        }
        () = cancel.cancelled() => {
            info!(target: "adjacent-servers", %name, "stopping adjacent server");
            shutdown_child(child, DEFAULT_GRACE).await
        }
    };

    let next = match outcome {
        Ok(status) => ProcessState::Exited {
            code: status.code(),
        },
        Err(e) => {
            report_error(sink.as_ref(), &name, &e);
            ProcessState::Errored {
                message: e.to_string(),
            }
        }
    };
    state.send_replace(next);
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmgis_core::AdjacentService;

    #[test]
    #[cfg(unix)]
    fn test_start_command_shape() {
        assert_eq!(
            start_command(DEFAULT_BASE_DIR, "titiler-pgstac"),
            "cd adjacent-servers/titiler-pgstac/ && sh start-titiler-pgstac.sh"
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_from_descriptor_appends_port() {
        let descriptor = ServiceDescriptor::new(AdjacentService::Stac, true, 8881);
        let service = SupervisedService::from_descriptor(&descriptor, "/opt/mmgis/adjacent-servers");

        assert_eq!(service.name, "stac");
        assert!(service.enabled);
        assert_eq!(
            service.shell_line(),
            "cd /opt/mmgis/adjacent-servers/stac/ && sh start-stac.sh 8881"
        );
    }
}
