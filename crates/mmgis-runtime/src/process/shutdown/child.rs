//! Graceful shutdown of a supervised shell and everything it started.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;

#[cfg(unix)]
use tokio::time::timeout;

#[cfg(unix)]
use nix::sys::signal::{Signal, killpg};
#[cfg(unix)]
use nix::unistd::Pid;

/// Grace period between SIGTERM and SIGKILL.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);

/// Shut down a supervised child with SIGTERM, escalating to SIGKILL.
///
/// Children are spawned as the leader of their own process group, so the
/// signals go to the whole group: the `sh` wrapper, the start script and
/// the Python server it launches.
///
/// # Strategy
/// 1. SIGTERM the process group and wait up to `grace`
/// 2. If still running, SIGKILL the group
/// 3. Wait for reaping
///
/// On Windows the shell is killed immediately.
pub async fn shutdown_child(mut child: Child, grace: Duration) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        shutdown_unix(&mut child, grace).await
    }

    #[cfg(not(unix))]
    {
        let _ = grace;
        child.kill().await?;
        child.wait().await
    }
}

#[cfg(unix)]
async fn shutdown_unix(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    let Some(pid) = child.id() else {
        // Already reaped
        return child.wait().await;
    };
    let pgid = i32::try_from(pid)
        .map(Pid::from_raw)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;

    if let Err(e) = killpg(pgid, Signal::SIGTERM) {
        if e == nix::errno::Errno::ESRCH {
            return child.wait().await;
        }
        return Err(io::Error::other(e));
    }

    if let Ok(result) = timeout(grace, child.wait()).await {
        return result;
    }

    tracing::warn!(target: "adjacent-servers", pid, "adjacent server ignored SIGTERM, sending SIGKILL");
    match killpg(pgid, Signal::SIGKILL) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
        Err(e) => return Err(io::Error::other(e)),
    }

    child.wait().await
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Stdio;
    use tokio::process::Command;

    fn spawn_group(script: &str) -> Child {
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(script)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0)
            .kill_on_drop(true);
        cmd.spawn().unwrap()
    }

    #[tokio::test]
    async fn test_sigterm_stops_sleeping_child() {
        let child = spawn_group("sleep 30");
        let status = shutdown_child(child, DEFAULT_GRACE).await.unwrap();
        assert!(!status.success());
    }

    #[tokio::test]
    async fn test_escalates_to_sigkill() {
        let child = spawn_group("trap '' TERM; while true; do sleep 1; done");
        // Let the trap install before signalling.
        tokio::time::sleep(Duration::from_millis(200)).await;

        let status = shutdown_child(child, Duration::from_millis(300))
            .await
            .unwrap();
        assert!(!status.success());
    }

    #[tokio::test]
    async fn test_already_exited_child() {
        let mut child = spawn_group("exit 0");
        let _ = child.wait().await.unwrap();
        let status = shutdown_child(child, DEFAULT_GRACE).await.unwrap();
        assert!(status.success());
    }
}
