//! Output that collects unexpected error records for later assertions
//!
//! Unlike [`TestOutput`](super::TestOutput) it never talks to a test
//! harness: it only remembers error-level records whose message matches
//! none of the allowed patterns.

use crate::core::{ErrorHandler, FieldValue, LoggerError, Output, Record, Result, KEY_ERROR};
use parking_lot::RwLock;
use regex::Regex;

/// # Example
///
/// ```
/// use scribe::prelude::*;
/// use std::sync::Arc;
///
/// let output = Arc::new(ErrorRecordingOutput::new(["retrying"])?);
/// let logger = Logger::builder().shared_output(output.clone()).build();
///
/// logger.error("retrying request", vec![]);
/// logger.error("giving up", vec![]);
///
/// assert_eq!(output.unexpected_errors(), vec!["giving up"]);
/// # Ok::<(), scribe::LoggerError>(())
/// ```
#[derive(Debug)]
pub struct ErrorRecordingOutput {
    allowed: Vec<Regex>,
    unexpected: RwLock<Vec<String>>,
}

impl ErrorRecordingOutput {
    /// Error messages matching any of `allowed_patterns` are ignored
    pub fn new<I, S>(allowed_patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = allowed_patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(pattern).map_err(|source| LoggerError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            allowed,
            unexpected: RwLock::new(Vec::new()),
        })
    }

    pub fn has_errors(&self) -> bool {
        !self.unexpected.read().is_empty()
    }

    /// Messages of the unexpected errors, in the order they were logged
    pub fn unexpected_errors(&self) -> Vec<String> {
        self.unexpected.read().clone()
    }

    fn describe(record: &Record) -> String {
        let attached = record.fields.iter().find_map(|f| match &f.value {
            FieldValue::Error(Some(err)) if f.key == KEY_ERROR => Some(err),
            _ => None,
        });

        match attached {
            Some(err) => format!("{} (passed Error object: {})", record.message, err),
            None => record.message.clone(),
        }
    }
}

impl Output for ErrorRecordingOutput {
    fn append(&self, _on_error: &ErrorHandler, record: &Record) {
        if !record.level.is_error() {
            return;
        }
        if self.allowed.iter().any(|p| p.is_match(&record.message)) {
            return;
        }

        let line = Self::describe(record);
        self.unexpected.write().push(line);
    }

    fn name(&self) -> &str {
        "error recording"
    }
}
