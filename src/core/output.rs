//! Output trait for log delivery destinations

use super::{error::ErrorHandler, filter::Filter, record::Record};
use std::sync::Arc;

/// A destination that renders and delivers records
///
/// `append` is called synchronously by the logger once per record. It must
/// not return delivery failures: they are handed to `on_error`, possibly
/// later and from another thread for outputs that deliver in the background.
pub trait Output: Send + Sync {
    fn append(&self, on_error: &ErrorHandler, record: &Record);

    /// Replace the output-local filter chain
    ///
    /// Outputs that always see every record ignore this.
    fn set_filters(&self, _filters: Vec<Arc<dyn Filter>>) {}

    fn name(&self) -> &str;
}
