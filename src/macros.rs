//! Logging macros for ergonomic log message formatting.
//!
//! Besides `format!`-style messages, the macros capture the path of the
//! enclosing function, which plain method calls cannot report.
//!
//! # Examples
//!
//! ```
//! use scribe::prelude::*;
//! use scribe::info;
//!
//! let logger = Logger::builder()
//!     .output(FormattingOutput::new(std::io::sink(), HumanReadableFormatter::new()))
//!     .build();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // With fields, given before the message
//! info!(logger, [Field::int("port", port), Field::service("api")], "listening");
//! ```

/// Log a message with automatic formatting.
///
/// # Examples
///
/// ```
/// # use scribe::prelude::*;
/// # let logger = Logger::builder().build();
/// use scribe::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// log!(logger, LogLevel::Warn, [Field::uint64("height", 7)], "slow block");
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, [$($field:expr),* $(,)?], $($arg:tt)+) => {
        $logger.log_from(
            $crate::__function_path!(),
            $level,
            format!($($arg)+),
            vec![$($field),*],
        )
    };
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_from(
            $crate::__function_path!(),
            $level,
            format!($($arg)+),
            ::std::vec::Vec::new(),
        )
    };
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use scribe::prelude::*;
/// # let logger = Logger::builder().build();
/// use scribe::debug;
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use scribe::prelude::*;
/// # let logger = Logger::builder().build();
/// use scribe::error;
/// let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
/// error!(logger, [Field::error(&err)], "Failed to persist block {}", 42);
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{
        ErrorHandler, Field, LogLevel, Logger, NoCallSite, Output, Record, KEY_FUNCTION,
        KEY_SOURCE,
    };
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct CapturingOutput {
        records: Mutex<Vec<Record>>,
    }

    impl Output for CapturingOutput {
        fn append(&self, _on_error: &ErrorHandler, record: &Record) {
            self.records.lock().push(record.clone());
        }

        fn name(&self) -> &str {
            "capturing"
        }
    }

    fn value(record: &Record, key: &str) -> String {
        record.field(key).map(|f| f.value.to_string()).unwrap_or_default()
    }

    #[test]
    fn test_macros_capture_function_and_source() {
        let capture = Arc::new(CapturingOutput::default());
        let logger = Logger::builder().shared_output(capture.clone()).build();

        let line = line!() + 1;
        crate::info!(logger, "count is {}", 3);
        crate::error!(logger, [Field::int("code", 500)], "request failed");

        let records = capture.records.lock();
        assert_eq!(records[0].message, "count is 3");
        assert_eq!(records[0].level, LogLevel::Info);
        assert_eq!(
            value(&records[0], KEY_FUNCTION),
            "scribe::macros::tests::test_macros_capture_function_and_source"
        );
        assert_eq!(value(&records[0], KEY_SOURCE), format!("{}:{}", file!(), line));
        assert_eq!(records[1].level, LogLevel::Error);
        assert_eq!(value(&records[1], "code"), "500");
    }

    #[test]
    fn test_macros_respect_resolver() {
        let capture = Arc::new(CapturingOutput::default());
        let logger = Logger::builder()
            .shared_output(capture.clone())
            .call_site_resolver(NoCallSite)
            .build();

        crate::warn!(logger, "hidden call site");

        let records = capture.records.lock();
        assert_eq!(value(&records[0], KEY_FUNCTION), "n/a");
    }
}
