//! Stream output: one formatted line per record to any `Write`

use crate::core::{
    ErrorHandler, Filter, FilterChain, Formatter, HumanReadableFormatter, LoggerError, Output,
    Record, Result,
};
use parking_lot::{Mutex, RwLock};
use std::io::{self, Write};
use std::sync::Arc;

/// Formats each record and writes it synchronously, followed by `\n`
///
/// The line and its newline go out in a single `write_all`, so concurrent
/// appends never interleave within a line. Wrap a
/// [`TruncatingFileWriter`](super::TruncatingFileWriter) to get a file that
/// is periodically cleared.
///
/// # Example
///
/// ```
/// use scribe::prelude::*;
///
/// let output = FormattingOutput::new(Vec::new(), JsonFormatter::new());
/// let logger = Logger::builder().output(output).build();
/// logger.info("ready", vec![Field::int("port", 8080)]);
/// ```
pub struct FormattingOutput<W: Write + Send> {
    writer: Mutex<W>,
    formatter: Arc<dyn Formatter>,
    filters: RwLock<FilterChain>,
    name: String,
}

impl<W: Write + Send> FormattingOutput<W> {
    pub fn new<F: Formatter + 'static>(writer: W, formatter: F) -> Self {
        Self::with_shared_formatter(writer, Arc::new(formatter))
    }

    pub fn with_shared_formatter(writer: W, formatter: Arc<dyn Formatter>) -> Self {
        Self {
            writer: Mutex::new(writer),
            formatter,
            filters: RwLock::new(FilterChain::default()),
            name: "stream".to_string(),
        }
    }

    /// Name used in failure reports
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_filters(self, filters: Vec<Arc<dyn Filter>>) -> Self {
        *self.filters.write() = FilterChain::new(filters);
        self
    }

    /// Run `f` against the underlying writer, e.g. to inspect a buffer
    pub fn with_writer<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        f(&mut self.writer.lock())
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_record(&self, record: &Record) -> Result<()> {
        let mut line = self.formatter.format_record(record)?;
        line.push('\n');

        let mut writer = self.writer.lock();
        writer
            .write_all(line.as_bytes())
            .map_err(|e| LoggerError::io_operation("writing log line", e.to_string(), e))?;
        writer
            .flush()
            .map_err(|e| LoggerError::io_operation("flushing log line", e.to_string(), e))?;
        Ok(())
    }
}

impl FormattingOutput<io::Stdout> {
    /// Human-readable lines on stdout
    pub fn stdout() -> Self {
        Self::new(io::stdout(), HumanReadableFormatter::new()).with_name("stdout")
    }
}

impl FormattingOutput<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr(), HumanReadableFormatter::new()).with_name("stderr")
    }
}

impl<W: Write + Send> Output for FormattingOutput<W> {
    fn append(&self, on_error: &ErrorHandler, record: &Record) {
        if !self
            .filters
            .read()
            .allows(record.level, &record.message, &record.fields)
        {
            return;
        }

        // writer lock is released before the callback, which may log again
        if let Err(e) = self.write_record(record) {
            on_error(e);
        }
    }

    fn set_filters(&self, filters: Vec<Arc<dyn Filter>>) {
        *self.filters.write() = FilterChain::new(filters);
    }

    fn name(&self) -> &str {
        &self.name
    }
}
