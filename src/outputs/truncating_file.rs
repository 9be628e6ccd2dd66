//! File writer that empties its file on a time window
//!
//! The writer never opens or closes the file: the caller hands over an
//! already-open handle and keeps ownership of its lifetime. Open the file in
//! append mode so that concurrent writes land at the end.

use crate::core::{Clock, LoggerError, Result, SystemClock};
use parking_lot::RwLock;
use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Wraps an appendable file and truncates it once per `interval`
///
/// The truncation check runs before every write, so the bytes of the write
/// that triggers it land in the emptied file. A zero interval disables
/// automatic truncation. [`truncate`](Self::truncate) empties the file on
/// demand without moving the automatic window.
///
/// Clones share the file and the truncation window.
///
/// # Example
///
/// ```no_run
/// use scribe::prelude::*;
/// use std::fs::OpenOptions;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let file = OpenOptions::new().create(true).append(true).open("/tmp/app.log")?;
/// let writer = TruncatingFileWriter::new(Arc::new(file), Duration::from_secs(3600));
/// let logger = Logger::builder()
///     .output(FormattingOutput::new(writer.clone(), JsonFormatter::new()))
///     .build();
/// logger.info("hello", vec![]);
/// writer.truncate()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct TruncatingFileWriter {
    inner: Arc<Inner>,
}

struct Inner {
    file: Arc<File>,
    interval: Duration,
    clock: Arc<dyn Clock>,
    last_truncated: RwLock<Instant>,
}

impl TruncatingFileWriter {
    pub fn new(file: Arc<File>, interval: Duration) -> Self {
        Self::with_clock(file, interval, Arc::new(SystemClock))
    }

    /// Use `clock` to measure the truncation window
    pub fn with_clock(file: Arc<File>, interval: Duration, clock: Arc<dyn Clock>) -> Self {
        let created = clock.now();
        Self {
            inner: Arc::new(Inner {
                file,
                interval,
                clock,
                last_truncated: RwLock::new(created),
            }),
        }
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Empty the file and move its position to the start
    ///
    /// Does not reset the automatic truncation window.
    pub fn truncate(&self) -> Result<()> {
        let _guard = self.inner.last_truncated.write();
        self.inner.reset_file()
    }

    fn truncate_if_due(&self) {
        let inner = &self.inner;
        if inner.interval.is_zero() {
            return;
        }

        if !inner.is_due(*inner.last_truncated.read()) {
            return;
        }

        let mut last_truncated = inner.last_truncated.write();
        // another writer may have truncated while we waited for the lock
        if !inner.is_due(*last_truncated) {
            return;
        }

        match inner.reset_file() {
            Ok(()) => *last_truncated = inner.clock.now(),
            Err(e) => eprintln!("[LOGGER ERROR] Failed to truncate log file: {}", e),
        }
    }
}

impl Inner {
    fn is_due(&self, last_truncated: Instant) -> bool {
        self.clock.now().saturating_duration_since(last_truncated) >= self.interval
    }

    fn reset_file(&self) -> Result<()> {
        let mut file = &*self.file;
        file.set_len(0)
            .map_err(|e| LoggerError::io_operation("truncating log file", e.to_string(), e))?;
        file.seek(SeekFrom::Start(0))
            .map_err(|e| LoggerError::io_operation("rewinding log file", e.to_string(), e))?;
        Ok(())
    }
}

impl Write for TruncatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.truncate_if_due();
        (&*self.inner.file).write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.truncate_if_due();
        (&*self.inner.file).write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self.inner.file).flush()
    }
}
