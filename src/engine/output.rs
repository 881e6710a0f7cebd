//! Output sinks receiving protocol lines.

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{trace, warn};

/// Destination for protocol lines, such as a serial port or a socket.
///
/// Every line already ends with `\n`.
pub trait Writer: Send {
    /// Write one complete line.
    fn write(&mut self, line: &str) -> io::Result<()>;
}

/// Adapts any byte stream into a [`Writer`], flushing after every line.
#[derive(Debug)]
pub struct IoWriter<W> {
    inner: W,
}

impl<W: io::Write + Send> IoWriter<W> {
    /// Wrap a byte stream.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Unwrap the byte stream.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write + Send> Writer for IoWriter<W> {
    fn write(&mut self, line: &str) -> io::Result<()> {
        self.inner.write_all(line.as_bytes())?;
        self.inner.flush()
    }
}

/// Records every line in memory. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryWriter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Forget every recorded line.
    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl Writer for MemoryWriter {
    fn write(&mut self, line: &str) -> io::Result<()> {
        self.lines.lock().push(line.to_owned());
        Ok(())
    }
}

/// The set of registered writers. Every writer receives identical lines.
#[derive(Default)]
pub struct OutputSet {
    writers: Vec<Box<dyn Writer>>,
}

impl OutputSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a writer.
    pub fn push(&mut self, writer: Box<dyn Writer>) {
        self.writers.push(writer);
    }

    /// Remove every writer.
    pub fn clear(&mut self) {
        self.writers.clear();
    }

    /// Number of registered writers.
    pub fn len(&self) -> usize {
        self.writers.len()
    }

    /// Check if no writer is registered.
    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }

    /// Send a line to every writer.
    ///
    /// A failing writer is reported and skipped; the others still get the line.
    pub fn broadcast(&mut self, line: &str) {
        trace!(line = line.trim_end(), "tcode");
        for (index, writer) in self.writers.iter_mut().enumerate() {
            if let Err(e) = writer.write(line) {
                warn!(output = index, error = %e, "output write failed");
            }
        }
    }
}

impl core::fmt::Debug for OutputSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OutputSet")
            .field("writers", &self.writers.len())
            .finish()
    }
}
