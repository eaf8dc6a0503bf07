//! Session audit log
//!
//! Append-only text file, one `[timestamp] message` line per record, with
//! RFC 3339 UTC timestamps at millisecond precision. Every record is also
//! emitted as a tracing event with target `audit`.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use rd_core::time::iso8601_now;

type Sink = Box<dyn Write + Send>;

/// Shared handle to the audit sink
#[derive(Clone)]
pub struct AuditLog {
    sink: Arc<Mutex<Sink>>,
}

impl AuditLog {
    /// Open (or create) the log file at `path` for appending
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::from_writer(file))
    }

    /// Log into an arbitrary writer
    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Log that discards file output; records still reach tracing
    pub fn disabled() -> Self {
        Self::from_writer(io::sink())
    }

    /// Append one record
    pub fn record(&self, message: impl fmt::Display) {
        let message = message.to_string();
        tracing::info!(target: "audit", "{}", message);

        let line = format!("[{}] {}\n", iso8601_now(), message);
        let mut sink = match self.sink.lock() {
            Ok(sink) => sink,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Err(e) = sink.write_all(line.as_bytes()).and_then(|_| sink.flush()) {
            tracing::warn!("Failed to write audit record: {}", e);
        }
    }

    /// Record that does not go to the file, only to tracing at trace level
    pub fn trace(&self, message: impl fmt::Display) {
        tracing::trace!(target: "audit", "{}", message);
    }
}

impl fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditLog").finish_non_exhaustive()
    }
}

/// In-memory writer that can be inspected after being handed to an
/// [`AuditLog`]
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer contents as lines
    pub fn lines(&self) -> Vec<String> {
        let bytes = match self.0.lock() {
            Ok(bytes) => bytes.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.0.lock() {
            Ok(mut inner) => inner.extend_from_slice(buf),
            Err(poisoned) => poisoned.into_inner().extend_from_slice(buf),
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Split an audit line into its timestamp and message
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix('[')?;
    let (stamp, message) = rest.split_once("] ")?;
    Some((stamp, message))
}
