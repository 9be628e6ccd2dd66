//! Error types for the logger system

use std::sync::Arc;

pub type Result<T> = std::result::Result<T, LoggerError>;

/// Callback an output uses to report a delivery failure instead of raising it.
///
/// Outputs that deliver in the background keep a clone of the handler, so it
/// must be shareable across threads.
pub type ErrorHandler = Arc<dyn Fn(LoggerError) + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The remote endpoint could not be reached or did not answer in time
    #[error("Failed to send logs to '{url}': {message}")]
    Transport { url: String, message: String },

    /// The remote endpoint answered with a non-success status
    #[error("Failed to send logs to '{url}': HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Allowed-error or filter pattern failed to compile
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// A formatter could not render a record
    #[error("Formatter error ({format_type}): {message}")]
    FormatterError {
        format_type: String,
        message: String,
    },

    /// An output implementation panicked while handling a record
    #[error("Output '{output}' panicked: {message}")]
    OutputPanicked { output: String, message: String },
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a transport error for a remote endpoint
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a non-success status error for a remote endpoint
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        LoggerError::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a formatter error
    pub fn formatter(format_type: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FormatterError {
            format_type: format_type.into(),
            message: message.into(),
        }
    }

    /// Create an error for a panicking output
    pub fn output_panicked(output: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::OutputPanicked {
            output: output.into(),
            message: message.into(),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Whether this error is a caller contract violation rather than a delivery failure
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            LoggerError::InvalidConfiguration { .. } | LoggerError::InvalidPattern { .. }
        )
    }
}

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(e) = payload.downcast_ref::<LoggerError>() {
        e.to_string()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::config("BulkOutput", "bulk size too large");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
        assert!(err.is_contract_violation());

        let err = LoggerError::http_status("http://localhost/logs", 500);
        assert!(matches!(err, LoggerError::HttpStatus { status: 500, .. }));
        assert!(!err.is_contract_violation());
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::http_status("http://localhost/logs", 503);
        assert_eq!(
            err.to_string(),
            "Failed to send logs to 'http://localhost/logs': HTTP status 503"
        );

        let err = LoggerError::formatter("timestamp", "invalid format string '%!'");
        assert_eq!(
            err.to_string(),
            "Formatter error (timestamp): invalid format string '%!'"
        );

        let err = LoggerError::output_panicked("bulk", "boom");
        assert_eq!(err.to_string(), "Output 'bulk' panicked: boom");
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::io_operation("truncating log file", "cannot truncate", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("truncating log file"));
        assert!(err.to_string().contains("cannot truncate"));
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static str");
        assert_eq!(panic_message(payload.as_ref()), "static str");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn std::any::Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "Unknown panic");
    }
}
