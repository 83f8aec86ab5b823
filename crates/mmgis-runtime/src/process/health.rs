//! Readiness probe for adjacent servers.

use tokio::net::TcpStream;
use tokio::time::{Duration, Instant, sleep, timeout};
use tracing::{debug, info};

use crate::SupervisorError;

const POLL_INTERVAL: Duration = Duration::from_millis(500);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Wait until something accepts TCP connections on `host:port`.
///
/// Polls every half second until a connect succeeds or `limit` elapses.
pub async fn wait_for_port(host: &str, port: u16, limit: Duration) -> Result<(), SupervisorError> {
    let deadline = Instant::now() + limit;
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        match timeout(CONNECT_TIMEOUT, TcpStream::connect((host, port))).await {
            Ok(Ok(_)) => {
                info!(target: "adjacent-servers", "{host}:{port} is accepting connections");
                return Ok(());
            }
            Ok(Err(e)) => debug!(target: "adjacent-servers", attempt, error = %e, "{host}:{port} not ready yet"),
            Err(_) => debug!(target: "adjacent-servers", attempt, "{host}:{port} connect timed out"),
        }

        if Instant::now() + POLL_INTERVAL > deadline {
            return Err(SupervisorError::NotReady {
                host: host.to_string(),
                port,
                waited_secs: limit.as_secs(),
            });
        }
        sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_ready_when_listening() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        wait_for_port("127.0.0.1", port, Duration::from_secs(2))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_times_out_on_closed_port() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let err = wait_for_port("127.0.0.1", port, Duration::from_millis(600))
            .await
            .unwrap_err();
        assert!(matches!(err, SupervisorError::NotReady { port: p, .. } if p == port));
    }
}
