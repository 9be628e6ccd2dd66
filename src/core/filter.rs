//! Record filters and their conjunction
//!
//! A filter is a pure predicate over `(level, message, fields)`. A record is
//! delivered only when every filter of the chain allows it.

use super::error::{LoggerError, Result};
use super::field::{Field, KEY_ERROR};
use super::log_level::LogLevel;
use rand::Rng;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

pub trait Filter: Send + Sync {
    fn allows(&self, level: LogLevel, message: &str, fields: &[Field]) -> bool;
}

impl<F> Filter for F
where
    F: Fn(LogLevel, &str, &[Field]) -> bool + Send + Sync,
{
    fn allows(&self, level: LogLevel, message: &str, fields: &[Field]) -> bool {
        self(level, message, fields)
    }
}

/// Conjunction of filters; an empty chain allows everything
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterChain {
    pub fn new(filters: Vec<Arc<dyn Filter>>) -> Self {
        Self { filters }
    }

    pub fn allows(&self, level: LogLevel, message: &str, fields: &[Field]) -> bool {
        self.filters
            .iter()
            .all(|filter| filter.allows(level, message, fields))
    }

    pub fn filters(&self) -> &[Arc<dyn Filter>] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// New chain holding this chain's filters followed by `more`
    #[must_use]
    pub fn extended(&self, more: impl IntoIterator<Item = Arc<dyn Filter>>) -> Self {
        let mut filters = self.filters.clone();
        filters.extend(more);
        Self { filters }
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("len", &self.filters.len())
            .finish()
    }
}

/// Keeps only error-level records
#[derive(Debug, Clone, Copy, Default)]
pub struct OnlyErrors;

impl Filter for OnlyErrors {
    fn allows(&self, level: LogLevel, _message: &str, _fields: &[Field]) -> bool {
        level.is_error()
    }
}

/// Keeps only metric-level records
#[derive(Debug, Clone, Copy, Default)]
pub struct OnlyMetrics;

impl Filter for OnlyMetrics {
    fn allows(&self, level: LogLevel, _message: &str, _fields: &[Field]) -> bool {
        level == LogLevel::Metric
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardAll;

impl Filter for DiscardAll {
    fn allows(&self, _level: LogLevel, _message: &str, _fields: &[Field]) -> bool {
        false
    }
}

/// Drops records whose message matches the pattern
#[derive(Debug, Clone)]
pub struct IgnoreMessagesMatching {
    pattern: Regex,
}

impl IgnoreMessagesMatching {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: compile(pattern)?,
        })
    }
}

impl Filter for IgnoreMessagesMatching {
    fn allows(&self, _level: LogLevel, message: &str, _fields: &[Field]) -> bool {
        !self.pattern.is_match(message)
    }
}

/// Drops error-level records whose message or error field matches the pattern
#[derive(Debug, Clone)]
pub struct IgnoreErrorsAndMessagesMatching {
    pattern: Regex,
}

impl IgnoreErrorsAndMessagesMatching {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: compile(pattern)?,
        })
    }
}

impl Filter for IgnoreErrorsAndMessagesMatching {
    fn allows(&self, level: LogLevel, message: &str, fields: &[Field]) -> bool {
        if !level.is_error() {
            return true;
        }
        !(self.pattern.is_match(message)
            || fields
                .iter()
                .filter(|f| f.key == KEY_ERROR)
                .any(|f| self.pattern.is_match(&f.value.to_string())))
    }
}

/// Keeps only records carrying a field equal to the given one
#[derive(Debug, Clone)]
pub struct MatchField {
    field: Field,
}

impl MatchField {
    pub fn new(field: Field) -> Self {
        Self { field }
    }
}

impl Filter for MatchField {
    fn allows(&self, _level: LogLevel, _message: &str, fields: &[Field]) -> bool {
        fields.iter().any(|f| *f == self.field)
    }
}

/// Drops records carrying a field equal to the given one
#[derive(Debug, Clone)]
pub struct ExcludeField {
    field: Field,
}

impl ExcludeField {
    pub fn new(field: Field) -> Self {
        Self { field }
    }
}

impl Filter for ExcludeField {
    fn allows(&self, _level: LogLevel, _message: &str, fields: &[Field]) -> bool {
        !fields.iter().any(|f| *f == self.field)
    }
}

/// Keeps a random fraction of records
///
/// Error-level records are kept regardless of the rate unless
/// [`Sample::including_errors`] is used.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    rate: f64,
    keep_errors: bool,
}

impl Sample {
    /// `rate` is clamped to `0.0..=1.0`
    pub fn new(rate: f64) -> Self {
        Self {
            rate: rate.clamp(0.0, 1.0),
            keep_errors: true,
        }
    }

    /// Sample error-level records at the same rate as everything else
    #[must_use]
    pub fn including_errors(mut self) -> Self {
        self.keep_errors = false;
        self
    }
}

impl Filter for Sample {
    fn allows(&self, level: LogLevel, _message: &str, _fields: &[Field]) -> bool {
        if self.keep_errors && level.is_error() {
            return true;
        }
        if self.rate >= 1.0 {
            return true;
        }
        if self.rate <= 0.0 {
            return false;
        }
        rand::thread_rng().gen::<f64>() < self.rate
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| LoggerError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}
