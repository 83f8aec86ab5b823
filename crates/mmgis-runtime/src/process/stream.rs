//! Async stream log readers (non-UTF8-safe).
//!
//! The adjacent servers are Python services started through shell scripts
//! and can emit arbitrary bytes. `BufReader::lines()` would stop the reader
//! on invalid UTF-8, so lines are read as bytes and decoded lossily.

use std::sync::Arc;

use mmgis_core::ProcessOutputSink;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::debug;

/// Substring treated as a readiness hint in child output.
pub const READY_MARKER: &str = "running";

/// Format a child output line for the parent's stdout.
pub fn echo_line(name: &str, line: &str) -> Option<String> {
    line.contains(READY_MARKER)
        .then(|| format!("{name} - {line}"))
}

pub fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    name: String,
    stream_type: &'static str,
    sink: Arc<dyn ProcessOutputSink>,
) {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    // Trim trailing newline(s)
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                        if buf.last() == Some(&b'\r') {
                            buf.pop();
                        }
                    }

                    let line = String::from_utf8_lossy(&buf);
                    debug!(target: "adjacent-servers", %name, %stream_type, "{}", line);
                    if let Some(echo) = echo_line(&name, &line) {
                        sink.write_line(&echo);
                    }
                }
                Err(e) => {
                    debug!(target: "adjacent-servers", %name, %stream_type, error = %e, "output reader exiting due to read error");
                    break;
                }
            }
        }

        debug!(target: "adjacent-servers", %name, %stream_type, "output reader task exiting");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmgis_core::MemorySink;

    #[test]
    fn test_echo_only_running_lines() {
        assert_eq!(
            echo_line("stac", "Server running on 8881").as_deref(),
            Some("stac - Server running on 8881")
        );
        assert_eq!(
            echo_line("tipg", "INFO: Uvicorn running on http://0.0.0.0:8882").as_deref(),
            Some("tipg - INFO: Uvicorn running on http://0.0.0.0:8882")
        );
        assert!(echo_line("stac", "Installing dependencies").is_none());
        assert!(echo_line("stac", "Server RUNNING").is_none());
    }

    #[tokio::test]
    async fn test_reader_handles_invalid_utf8_and_crlf() {
        let sink = Arc::new(MemorySink::new());
        let input: &[u8] = b"boot\r\n\xffrunning fine\r\nlast running";

        spawn_stream_reader(input, "titiler".to_string(), "stdout", sink.clone());

        for _ in 0..50 {
            if sink.lines().len() == 2 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(
            sink.lines(),
            vec!["titiler - \u{fffd}running fine", "titiler - last running"]
        );
    }
}
