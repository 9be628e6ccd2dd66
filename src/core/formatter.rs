//! Record formatters
//!
//! A formatter renders one record into one line of text (no trailing newline).
//! Two encodings ship with the crate:
//! - [`JsonFormatter`]: one JSON object per line, field keys map to object keys
//! - [`HumanReadableFormatter`]: `level timestamp message key=value ...` with a
//!   fixed field order and an optional per-request colour

use super::error::Result;
use super::field::{Field, KEY_FUNCTION, KEY_NODE, KEY_SERVICE, KEY_SOURCE};
use super::log_level::LogLevel;
use super::record::Record;
use super::timestamp::TimestampFormat;
use chrono::{DateTime, Utc};

pub const DEFAULT_TIMESTAMP_COLUMN: &str = "timestamp";

/// Key whose value selects the colour of a human-readable line
pub const REQUEST_ID_KEY: &str = "request-id";

pub trait Formatter: Send + Sync {
    fn format_row(
        &self,
        timestamp: &DateTime<Utc>,
        level: LogLevel,
        message: &str,
        fields: &[Field],
    ) -> Result<String>;

    fn format_record(&self, record: &Record) -> Result<String> {
        self.format_row(
            &record.timestamp,
            record.level,
            &record.message,
            &record.fields,
        )
    }
}

/// Machine-readable encoding
///
/// # Example
///
/// ```
/// use scribe::core::{Field, Formatter, JsonFormatter, LogLevel};
/// use chrono::Utc;
///
/// let line = JsonFormatter::new()
///     .format_row(&Utc::now(), LogLevel::Info, "started", &[Field::int("port", 8080)])
///     .unwrap();
/// let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
/// assert_eq!(parsed["port"], 8080);
/// ```
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    timestamp_column: String,
    timestamp_format: TimestampFormat,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self {
            timestamp_column: DEFAULT_TIMESTAMP_COLUMN.to_string(),
            timestamp_format: TimestampFormat::Iso8601Nanos,
        }
    }

    /// Write the timestamp under a different key
    #[must_use]
    pub fn with_timestamp_column(mut self, column: impl Into<String>) -> Self {
        self.timestamp_column = column.into();
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for JsonFormatter {
    fn format_row(
        &self,
        timestamp: &DateTime<Utc>,
        level: LogLevel,
        message: &str,
        fields: &[Field],
    ) -> Result<String> {
        let mut json_obj = serde_json::Map::new();

        json_obj.insert(
            "level".to_string(),
            serde_json::Value::String(level.to_str().to_string()),
        );
        json_obj.insert(
            self.timestamp_column.clone(),
            self.timestamp_format.to_json_value(timestamp)?,
        );
        json_obj.insert(
            "message".to_string(),
            serde_json::Value::String(message.to_string()),
        );

        // later fields win on duplicate keys
        for field in fields {
            json_obj.insert(field.key.clone(), field.value.to_json_value());
        }

        Ok(serde_json::to_string(&serde_json::Value::Object(json_obj))?)
    }
}

/// Human-oriented single-line encoding
///
/// Field order: level, timestamp, message, `node`, `service`, remaining
/// fields in record order, `function`, `source`, then every key starting
/// with an underscore.
#[derive(Debug, Clone)]
pub struct HumanReadableFormatter {
    timestamp_format: TimestampFormat,
    use_colors: bool,
    level_colors: bool,
}

impl HumanReadableFormatter {
    pub fn new() -> Self {
        Self {
            timestamp_format: TimestampFormat::Iso8601Micros,
            use_colors: true,
            level_colors: false,
        }
    }

    /// Enable or disable the request-id colour prefix
    ///
    /// Default: enabled (only effective with the `console` feature)
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Colour the level tag by severity, for terminals
    #[must_use]
    pub fn with_level_colors(mut self, enabled: bool) -> Self {
        self.level_colors = enabled;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    #[cfg(feature = "console")]
    fn write_level(&self, line: &mut String, level: LogLevel) {
        use colored::Colorize;

        if self.level_colors {
            line.push_str(&level.to_str().color(level.color_code()).to_string());
        } else {
            line.push_str(level.to_str());
        }
    }

    #[cfg(not(feature = "console"))]
    fn write_level(&self, line: &mut String, level: LogLevel) {
        line.push_str(level.to_str());
    }

    fn write_param(line: &mut String, field: &Field) {
        line.push(' ');
        line.push_str(&field.key);
        line.push('=');
        line.push_str(&field.value.to_string());
    }
}

impl Default for HumanReadableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for HumanReadableFormatter {
    fn format_row(
        &self,
        timestamp: &DateTime<Utc>,
        level: LogLevel,
        message: &str,
        fields: &[Field],
    ) -> Result<String> {
        let color = if self.use_colors {
            request_color(fields)
        } else {
            None
        };

        let mut line = String::with_capacity(128);
        if let Some(prefix) = &color {
            line.push_str(prefix);
        }
        self.write_level(&mut line, level);
        line.push(' ');
        line.push_str(&self.timestamp_format.try_format(timestamp)?);
        line.push(' ');
        line.push_str(message);

        let position = |key: &str| fields.iter().position(|f| f.key == key);
        let node = position(KEY_NODE);
        let service = position(KEY_SERVICE);
        let function = position(KEY_FUNCTION);
        let source = position(KEY_SOURCE);
        let placed = [node, service, function, source];

        for idx in [node, service].into_iter().flatten() {
            Self::write_param(&mut line, &fields[idx]);
        }

        let mut underscored = Vec::new();
        for (idx, field) in fields.iter().enumerate() {
            if placed.contains(&Some(idx)) {
                continue;
            }
            if field.key.starts_with('_') {
                underscored.push(field);
            } else {
                Self::write_param(&mut line, field);
            }
        }

        for idx in [function, source].into_iter().flatten() {
            Self::write_param(&mut line, &fields[idx]);
        }
        for field in underscored {
            Self::write_param(&mut line, field);
        }

        if color.is_some() {
            line.push_str("\x1b[0m");
        }

        Ok(line)
    }
}

/// ANSI colour prefix derived from the request id, stable per id
#[cfg(feature = "console")]
fn request_color(fields: &[Field]) -> Option<String> {
    use super::field::FieldValue;
    use colored::Color;

    const PALETTE: [Color; 9] = [
        Color::Cyan,
        Color::Yellow,
        Color::BrightBlue,
        Color::Magenta,
        Color::BrightYellow,
        Color::BrightRed,
        Color::BrightGreen,
        Color::BrightMagenta,
        Color::Green,
    ];

    let id = fields.iter().find_map(|f| match &f.value {
        FieldValue::String(s) if f.key == REQUEST_ID_KEY => Some(s.as_bytes()),
        _ => None,
    })?;

    // the fourth byte from the end varies most across sequential ids
    let selector = if id.len() >= 4 {
        id[id.len() - 4]
    } else {
        *id.last()?
    };
    let color = PALETTE[selector as usize % PALETTE.len()];
    Some(format!("\x1b[{}m", color.to_fg_str()))
}

#[cfg(not(feature = "console"))]
fn request_color(_fields: &[Field]) -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_datetime() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
    }

    #[test]
    fn test_json_format_maps_fields_to_keys() {
        let fields = vec![
            Field::node("node1"),
            Field::int("vcid", 999),
            Field::bytes("payload", vec![1, 2, 3, 99, 250]),
            Field::nil_error(),
            Field::display_slice("receipts", ["hello", "darkness"]),
        ];
        let line = JsonFormatter::new()
            .format_row(&fixed_datetime(), LogLevel::Info, "Service initialized", &fields)
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["message"], "Service initialized");
        assert_eq!(parsed["timestamp"], "2025-01-08T10:30:45.000000000Z");
        assert_eq!(parsed["node"], "node1");
        assert_eq!(parsed["vcid"], 999);
        assert_eq!(parsed["payload"], "01020363fa");
        assert_eq!(parsed["error"], "<nil>");
        assert_eq!(parsed["receipts"], serde_json::json!(["hello", "darkness"]));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_json_custom_timestamp_column() {
        let line = JsonFormatter::new()
            .with_timestamp_column("@timestamp")
            .format_row(&fixed_datetime(), LogLevel::Warn, "m", &[])
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert!(parsed["@timestamp"].is_string());
        assert!(parsed.get("timestamp").is_none());
    }

    #[test]
    fn test_invalid_timestamp_format_is_a_formatter_error() {
        let format = TimestampFormat::Custom("%!".to_string());

        let json = JsonFormatter::new()
            .with_timestamp_format(format.clone())
            .format_row(&fixed_datetime(), LogLevel::Info, "m", &[]);
        let human = HumanReadableFormatter::new()
            .with_timestamp_format(format)
            .format_row(&fixed_datetime(), LogLevel::Info, "m", &[]);

        assert!(matches!(json, Err(crate::core::LoggerError::FormatterError { .. })));
        assert!(matches!(human, Err(crate::core::LoggerError::FormatterError { .. })));
    }

    #[test]
    fn test_human_readable_field_order() {
        let fields = vec![
            Field::function("scribe::tests::order"),
            Field::string("_test-id", "hello"),
            Field::source("src/lib.rs:10"),
            Field::int("block-height", 9999),
            Field::service("public-api"),
            Field::bytes("bytes", vec![2, 3, 99]),
            Field::node("node1"),
        ];
        let line = HumanReadableFormatter::new()
            .with_colors(false)
            .format_row(&fixed_datetime(), LogLevel::Info, "Service initialized", &fields)
            .unwrap();

        assert_eq!(
            line,
            "info 2025-01-08T10:30:45.000000Z Service initialized node=node1 \
             service=public-api block-height=9999 bytes=020363 \
             function=scribe::tests::order source=src/lib.rs:10 _test-id=hello"
        );
    }

    #[cfg(feature = "console")]
    #[test]
    fn test_request_id_colour_is_stable() {
        let formatter = HumanReadableFormatter::new();
        let fields = vec![Field::string(REQUEST_ID_KEY, "req-0042")];
        let first = formatter
            .format_row(&fixed_datetime(), LogLevel::Info, "a", &fields)
            .unwrap();
        let second = formatter
            .format_row(&fixed_datetime(), LogLevel::Error, "b", &fields)
            .unwrap();

        assert!(first.starts_with("\x1b["));
        let prefix = |s: &str| s[..s.find('m').unwrap() + 1].to_string();
        assert_eq!(prefix(&first), prefix(&second));
        assert!(first.ends_with("\x1b[0m"));
    }

    #[cfg(feature = "console")]
    #[test]
    fn test_level_colours() {
        colored::control::set_override(true);
        let line = HumanReadableFormatter::new()
            .with_level_colors(true)
            .format_row(&fixed_datetime(), LogLevel::Error, "red", &[])
            .unwrap();
        assert!(line.starts_with("\x1b["));
        assert!(line.contains("error"));
    }

    #[test]
    fn test_no_colour_without_request_id() {
        let line = HumanReadableFormatter::new()
            .format_row(&fixed_datetime(), LogLevel::Info, "plain", &[])
            .unwrap();
        assert!(line.starts_with("info "));
    }
}
