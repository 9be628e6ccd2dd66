//! Batching output with background delivery
//!
//! Records accumulate in memory until `bulk_size` of them are pending. The
//! full batch is then detached and handed to a worker thread, which formats
//! every record, joins the lines and delivers them with a single
//! [`BatchWriter::write_batch`] call. Callers only ever block for the short
//! lock that guards the pending batch.

use crate::core::error::panic_message;
use crate::core::{
    ErrorHandler, Filter, FilterChain, Formatter, LoggerError, Output, Record, Result,
};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::io::Write;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Largest accepted batch size
pub const MAX_BULK_SIZE: usize = 1000;

/// How long dropping a [`BulkOutput`] waits for detached batches
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Destination of whole batches
///
/// One call per flushed batch; the payload is newline-terminated lines.
pub trait BatchWriter: Send + Sync {
    fn write_batch(&self, batch: &[u8]) -> Result<usize>;

    fn name(&self) -> &str {
        "batch writer"
    }
}

impl<W: Write + Send> BatchWriter for Mutex<W> {
    fn write_batch(&self, batch: &[u8]) -> Result<usize> {
        let mut writer = self.lock();
        writer
            .write_all(batch)
            .map_err(|e| LoggerError::io_operation("writing log batch", e.to_string(), e))?;
        writer
            .flush()
            .map_err(|e| LoggerError::io_operation("flushing log batch", e.to_string(), e))?;
        Ok(batch.len())
    }
}

impl<T: BatchWriter + ?Sized> BatchWriter for Arc<T> {
    fn write_batch(&self, batch: &[u8]) -> Result<usize> {
        (**self).write_batch(batch)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

struct Batch {
    records: Vec<Record>,
    on_error: ErrorHandler,
}

/// Output that delivers records in batches from a background thread
///
/// Records within one batch keep their append order. Batches are queued to
/// a single worker in the order they were detached, so they are also
/// delivered in order; a failed batch is reported and not retried.
///
/// # Example
///
/// ```
/// use scribe::prelude::*;
/// use parking_lot::Mutex;
///
/// let output = BulkOutput::new(Mutex::new(Vec::<u8>::new()), JsonFormatter::new(), 100)?;
/// let logger = Logger::builder().output(output).build();
/// logger.info("buffered", vec![]);
/// # Ok::<(), scribe::LoggerError>(())
/// ```
pub struct BulkOutput {
    pending: Mutex<Vec<Record>>,
    bulk_size: usize,
    filters: RwLock<FilterChain>,
    sender: Option<Sender<Batch>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl BulkOutput {
    /// Start a bulk output and its worker thread
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` when `bulk_size` is zero or above
    /// [`MAX_BULK_SIZE`]; an I/O error if the worker cannot be spawned.
    pub fn new<W, F>(writer: W, formatter: F, bulk_size: usize) -> Result<Self>
    where
        W: BatchWriter + 'static,
        F: Formatter + 'static,
    {
        if bulk_size == 0 || bulk_size > MAX_BULK_SIZE {
            return Err(LoggerError::config(
                "BulkOutput",
                format!(
                    "bulk size must be between 1 and {}, got {}",
                    MAX_BULK_SIZE, bulk_size
                ),
            ));
        }

        let (sender, receiver) = unbounded();
        let writer: Arc<dyn BatchWriter> = Arc::new(writer);
        let formatter: Arc<dyn Formatter> = Arc::new(formatter);

        let worker = thread::Builder::new()
            .name("scribe-bulk".to_string())
            .spawn(move || run_worker(receiver, writer, formatter))
            .map_err(|e| LoggerError::io_operation("spawning bulk worker", e.to_string(), e))?;

        Ok(Self {
            pending: Mutex::new(Vec::with_capacity(bulk_size)),
            bulk_size,
            filters: RwLock::new(FilterChain::default()),
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    #[must_use]
    pub fn with_filters(self, filters: Vec<Arc<dyn Filter>>) -> Self {
        *self.filters.write() = FilterChain::new(filters);
        self
    }

    pub fn bulk_size(&self) -> usize {
        self.bulk_size
    }

    /// Records waiting for the batch to fill up
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Hand the pending partial batch to the worker now
    pub fn flush(&self, on_error: &ErrorHandler) {
        let queued = {
            let mut pending = self.pending.lock();
            if pending.is_empty() {
                return;
            }
            let records = mem::replace(&mut *pending, Vec::with_capacity(self.bulk_size));
            self.enqueue(records, on_error)
        };

        if let Err(e) = queued {
            on_error(e);
        }
    }

    /// Must be called with the pending lock held so batches queue in order
    fn enqueue(&self, records: Vec<Record>, on_error: &ErrorHandler) -> Result<()> {
        let count = records.len();
        let batch = Batch {
            records,
            on_error: Arc::clone(on_error),
        };
        match &self.sender {
            Some(sender) => sender.send(batch).map_err(|_| {
                LoggerError::writer(format!("bulk worker stopped, {} records lost", count))
            }),
            None => Err(LoggerError::writer("bulk output is shutting down")),
        }
    }
}

impl Output for BulkOutput {
    fn append(&self, on_error: &ErrorHandler, record: &Record) {
        if !self
            .filters
            .read()
            .allows(record.level, &record.message, &record.fields)
        {
            return;
        }

        let queued = {
            let mut pending = self.pending.lock();
            pending.push(record.clone());
            if pending.len() < self.bulk_size {
                return;
            }
            let records = mem::replace(&mut *pending, Vec::with_capacity(self.bulk_size));
            self.enqueue(records, on_error)
        };

        if let Err(e) = queued {
            on_error(e);
        }
    }

    fn set_filters(&self, filters: Vec<Arc<dyn Filter>>) {
        *self.filters.write() = FilterChain::new(filters);
    }

    fn name(&self) -> &str {
        "bulk"
    }
}

impl Drop for BulkOutput {
    fn drop(&mut self) {
        let remaining = mem::take(self.pending.get_mut());

        if let Some(sender) = self.sender.take() {
            if !remaining.is_empty() {
                let count = remaining.len();
                let final_batch = Batch {
                    records: remaining,
                    on_error: Arc::new(|e| {
                        eprintln!("[LOGGER ERROR] Failed to deliver final log batch: {}", e)
                    }),
                };
                if sender.send(final_batch).is_err() {
                    eprintln!(
                        "[LOGGER WARNING] Bulk worker stopped, {} pending records lost",
                        count
                    );
                }
            }
            // closing the channel lets the worker drain and exit
            drop(sender);
        }

        if let Some(handle) = self.worker.take() {
            // the last handle can be released by the worker itself, through a
            // batch's error callback; it exits on its own once drained
            if handle.thread().id() == thread::current().id() {
                return;
            }

            let start = Instant::now();
            let timeout = DEFAULT_SHUTDOWN_TIMEOUT;

            loop {
                if handle.is_finished() {
                    if let Err(e) = handle.join() {
                        eprintln!(
                            "[LOGGER ERROR] Bulk worker thread panicked during shutdown: {}",
                            panic_message(e.as_ref())
                        );
                    }
                    break;
                }

                if start.elapsed() >= timeout {
                    eprintln!(
                        "[LOGGER WARNING] Bulk worker thread did not finish within {:?} timeout. \
                         Some logs may be lost.",
                        timeout
                    );
                    break;
                }

                thread::sleep(Duration::from_millis(10));
            }
        }
    }
}

fn run_worker(
    receiver: Receiver<Batch>,
    writer: Arc<dyn BatchWriter>,
    formatter: Arc<dyn Formatter>,
) {
    for batch in receiver.iter() {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            deliver(writer.as_ref(), formatter.as_ref(), &batch)
        }));

        if let Err(payload) = result {
            let message = panic_message(payload.as_ref());
            eprintln!(
                "[LOGGER CRITICAL] Bulk delivery panicked: {}. Batch of {} records lost.",
                message,
                batch.records.len()
            );
            (batch.on_error)(LoggerError::output_panicked("bulk", message));
        }
    }
}

fn deliver(writer: &dyn BatchWriter, formatter: &dyn Formatter, batch: &Batch) {
    let mut payload = String::new();
    for record in &batch.records {
        match formatter.format_record(record) {
            Ok(line) => {
                payload.push_str(&line);
                payload.push('\n');
            }
            Err(e) => (batch.on_error)(e),
        }
    }

    if payload.is_empty() {
        return;
    }

    if let Err(e) = writer.write_batch(payload.as_bytes()) {
        eprintln!(
            "[LOGGER ERROR] Failed to send logs via {}, {} bytes lost",
            writer.name(),
            payload.len()
        );
        (batch.on_error)(e);
    }
}
