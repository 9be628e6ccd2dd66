//! Output implementations

pub mod bulk;
pub mod error_recording;
#[cfg(feature = "network")]
pub mod http;
pub mod stream;
pub mod test_output;
pub mod truncating_file;

pub use bulk::{BatchWriter, BulkOutput, DEFAULT_SHUTDOWN_TIMEOUT, MAX_BULK_SIZE};
pub use error_recording::ErrorRecordingOutput;
#[cfg(feature = "network")]
pub use http::{HttpWriter, DEFAULT_HTTP_TIMEOUT};
pub use stream::FormattingOutput;
pub use test_output::{
    FallbackSink, RecordingReporter, ReporterCall, StdReporter, TestOutput, TestReporter,
    POST_TERMINATED_ERROR, TEST_FAILED_ERROR, TEST_RUNNER_PANIC_ERROR,
};
pub use truncating_file::TruncatingFileWriter;

pub use crate::core::Output;
