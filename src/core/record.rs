//! Log record structure

use super::field::Field;
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};

/// One log event, created once per log call and never mutated afterwards
///
/// Outputs receive a shared reference; an output that needs to keep the
/// record past the call (the bulk output) clones it.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub fields: Vec<Field>,
}

impl Record {
    pub fn new(level: LogLevel, message: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            message: message.into(),
            fields,
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// First field with the given key
    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }
}
