//! Timestamp formatting utilities
//!
//! Formatters render record timestamps through a [`TimestampFormat`], so the
//! same record can carry nanosecond precision in the structured encoding and
//! a shorter form in the human-oriented one.

use super::error::{LoggerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Standardized timestamp format options
///
/// # Examples
///
/// ```
/// use scribe::core::TimestampFormat;
/// use chrono::Utc;
///
/// let timestamp = TimestampFormat::Iso8601Nanos.format(&Utc::now());
/// assert!(timestamp.ends_with('Z'));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,

    /// ISO 8601 with microseconds: `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,

    /// ISO 8601 with nanoseconds: `2025-01-08T10:30:45.123456789Z`
    Iso8601Nanos,

    /// RFC 3339 format: `2025-01-08T10:30:45+00:00`
    Rfc3339,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Custom strftime format
    Custom(String),
}

impl TimestampFormat {
    /// Render, falling back to RFC 3339 when a custom format string is invalid
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        self.try_format(datetime)
            .unwrap_or_else(|_| datetime.to_rfc3339())
    }

    /// Render; only a custom format string chrono cannot interpret fails
    pub fn try_format(&self, datetime: &DateTime<Utc>) -> Result<String> {
        let rendered = match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Iso8601Micros => datetime.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            TimestampFormat::Iso8601Nanos => datetime.format("%Y-%m-%dT%H:%M:%S%.9fZ").to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(format_str) => {
                let mut rendered = String::new();
                write!(rendered, "{}", datetime.format(format_str)).map_err(|_| {
                    LoggerError::formatter(
                        "timestamp",
                        format!("invalid format string '{}'", format_str),
                    )
                })?;
                rendered
            }
        };
        Ok(rendered)
    }

    /// Render as a JSON value; numeric formats stay numbers
    pub fn to_json_value(&self, datetime: &DateTime<Utc>) -> Result<serde_json::Value> {
        Ok(match self {
            TimestampFormat::UnixMillis => {
                serde_json::Value::Number(datetime.timestamp_millis().into())
            }
            _ => serde_json::Value::String(self.try_format(datetime)?),
        })
    }
}
