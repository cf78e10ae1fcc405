use std::sync::{Arc, Mutex};

use crate::constants::{FAILURE_LOG_TAIL, LOG_BUFFER_BYTES};

/// Output of a container, captured while it runs
///
/// The buffer outlives the container, so the tail is still available after a
/// crashed container has been removed.
#[derive(Debug, Clone, Default)]
pub struct LogTail {
    buffer: Arc<Mutex<String>>,
}

impl LogTail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, chunk: &[u8]) {
        let Ok(mut buffer) = self.buffer.lock() else {
            return;
        };
        buffer.push_str(&String::from_utf8_lossy(chunk));

        if buffer.len() > LOG_BUFFER_BYTES {
            // Drop whole lines from the front
            let excess = buffer.len() - LOG_BUFFER_BYTES;
            let cut = buffer.as_bytes()[excess..]
                .iter()
                .position(|byte| *byte == b'\n')
                .map(|pos| excess + pos + 1)
                .unwrap_or(buffer.len());
            buffer.drain(..cut);
        }
    }

    /// The last `FAILURE_LOG_TAIL` lines, or a placeholder when nothing was logged
    pub fn tail(&self) -> String {
        let buffer = match self.buffer.lock() {
            Ok(buffer) => buffer,
            Err(_) => return "(no logs available)".to_string(),
        };

        let lines: Vec<&str> = buffer.lines().collect();
        if lines.is_empty() {
            return "(no logs available)".to_string();
        }
        lines[lines.len().saturating_sub(FAILURE_LOG_TAIL)..].join("\n")
    }
}
