//! Core logger types and traits

pub mod call_site;
pub mod clock;
pub mod error;
pub mod field;
pub mod filter;
pub mod formatter;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod output;
pub mod record;
pub mod timestamp;

pub use call_site::{CallSite, CallSiteResolver, LocationResolver, NoCallSite};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ErrorHandler, LoggerError, Result};
pub use field::{
    AggregateField, Field, FieldValue, KEY_ERROR, KEY_FUNCTION, KEY_NODE, KEY_SERVICE, KEY_SOURCE,
    NIL_ERROR,
};
pub use filter::{
    DiscardAll, ExcludeField, Filter, FilterChain, IgnoreErrorsAndMessagesMatching,
    IgnoreMessagesMatching, MatchField, OnlyErrors, OnlyMetrics, Sample,
};
pub use formatter::{Formatter, HumanReadableFormatter, JsonFormatter};
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use output::Output;
pub use record::Record;
pub use timestamp::TimestampFormat;
