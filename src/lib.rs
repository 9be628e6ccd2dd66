//! # Scribe
//!
//! Structured, pluggable logging with typed fields and background delivery.
//!
//! ## Features
//!
//! - **Typed fields**: strings, numbers, bytes, errors and nested aggregates
//! - **Filter chains**: per logger and per output, composable predicates
//! - **Multiple outputs**: stream, batching (e.g. over HTTP), a periodically
//!   truncated file, and a test-harness output that fails tests on
//!   unexpected errors
//! - **Isolation**: a failing or panicking output never disturbs the caller
//!   or the other outputs
//!
//! ## Example
//!
//! ```
//! use scribe::prelude::*;
//!
//! let logger = Logger::new().with_tags(vec![Field::node("node1"), Field::service("api")]);
//! logger.info("service started", vec![Field::int("port", 8080)]);
//! ```

pub mod core;
pub mod macros;
pub mod outputs;

pub mod prelude {
    #[cfg(feature = "network")]
    pub use crate::outputs::HttpWriter;
    pub use crate::outputs::{
        BatchWriter, BulkOutput, ErrorRecordingOutput, FormattingOutput, RecordingReporter,
        StdReporter, TestOutput, TestReporter, TruncatingFileWriter,
    };
    pub use crate::core::{
        AggregateField, ErrorHandler, Field, FieldValue, Filter, FilterChain, Formatter,
        HumanReadableFormatter, JsonFormatter, LogLevel, Logger, LoggerBuilder, LoggerError,
        LoggerMetrics, OnlyErrors, Output, Record, Result, TimestampFormat,
    };
}

#[cfg(feature = "network")]
pub use outputs::HttpWriter;
pub use outputs::{
    BatchWriter, BulkOutput, FormattingOutput, TestOutput, TestReporter, TruncatingFileWriter,
};
pub use core::{
    ErrorHandler, Field, FieldValue, Filter, Formatter, LogLevel, Logger, LoggerBuilder,
    LoggerError, LoggerMetrics, Output, Record, Result,
};
