//! Process output sink port.
//!
//! This port abstracts where the supervisor echoes child-process output,
//! so the parent's stdout can be swapped for a buffer in tests.

use std::io::Write;
use std::sync::Mutex;

/// Port for echoing child-process output lines.
///
/// Implementations should be thread-safe and non-blocking where possible.
pub trait ProcessOutputSink: Send + Sync {
    /// Write one already-formatted line (without trailing newline).
    fn write_line(&self, line: &str);
}

/// Sink that writes to the parent process's stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl ProcessOutputSink for StdoutSink {
    fn write_line(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        // Nothing useful to do if stdout is gone.
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }
}

/// Sink that keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

impl ProcessOutputSink for MemorySink {
    fn write_line(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.write_line("stac - first");
        sink.write_line("tipg - second");
        assert_eq!(sink.lines(), vec!["stac - first", "tipg - second"]);
    }
}
