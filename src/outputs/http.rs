//! HTTP batch writer
//!
//! Sends each batch as one blocking POST. Timeouts are enforced by the
//! client; failures are returned to the caller and never retried.

use super::bulk::BatchWriter;
use crate::core::{LoggerError, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use std::io::Write;
use std::time::Duration;

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// # Example
///
/// ```no_run
/// use scribe::prelude::*;
/// use std::time::Duration;
///
/// let writer = HttpWriter::with_timeout("http://logs.internal:9200/_bulk", Duration::from_secs(5))?
///     .with_compression(true);
/// let output = BulkOutput::new(writer, JsonFormatter::new(), 500)?;
/// let logger = Logger::builder().output(output).build();
/// # Ok::<(), scribe::LoggerError>(())
/// ```
#[derive(Debug, Clone)]
pub struct HttpWriter {
    client: Client,
    url: String,
    compress: bool,
}

impl HttpWriter {
    /// Writer with the default 60 second timeout
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_HTTP_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LoggerError::config("HttpWriter", e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            compress: false,
        })
    }

    /// Gzip request bodies and send `Content-Encoding: gzip`
    #[must_use]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn gzip(batch: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::with_capacity(batch.len() / 2), Compression::default());
        encoder
            .write_all(batch)
            .map_err(|e| LoggerError::io_operation("compressing log batch", e.to_string(), e))?;
        encoder
            .finish()
            .map_err(|e| LoggerError::io_operation("compressing log batch", e.to_string(), e))
    }
}

impl BatchWriter for HttpWriter {
    fn write_batch(&self, batch: &[u8]) -> Result<usize> {
        let mut request = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json");

        let body = if self.compress {
            request = request.header(CONTENT_ENCODING, "gzip");
            Self::gzip(batch)?
        } else {
            batch.to_vec()
        };

        let response = request
            .body(body)
            .send()
            .map_err(|e| LoggerError::transport(&self.url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoggerError::http_status(&self.url, status.as_u16()));
        }

        Ok(batch.len())
    }

    fn name(&self) -> &str {
        "http"
    }
}
