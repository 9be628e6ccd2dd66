//! Main logger implementation
//!
//! The logger is the delivery orchestrator: it enriches each call with
//! call-site fields and inherited tags, flattens aggregate fields, runs its
//! filter chain once and hands the resulting record to every output. Output
//! failures, including panics, come back through an error callback and are
//! logged as a secondary warning that is itself never reported again.

use super::{
    call_site::{CallSite, CallSiteResolver, LocationResolver},
    error::{panic_message, ErrorHandler, LoggerError},
    field::{self, Field},
    filter::{Filter, FilterChain},
    log_level::LogLevel,
    metrics::LoggerMetrics,
    output::Output,
    record::Record,
};
use crate::outputs::FormattingOutput;
use std::fmt;
use std::panic::{self, AssertUnwindSafe, Location};
use std::sync::{Arc, Weak};

/// Prefix of the secondary event logged when an output fails
pub const OUTPUT_FAILURE_MESSAGE: &str = "failed to append log to output";

/// Message of records logged through [`Logger::metric`]
pub const METRIC_MESSAGE: &str = "Metric recorded";

/// Cheap to clone; derived loggers share outputs and metrics but never
/// mutate each other's tags or filters.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

#[derive(Clone)]
struct LoggerConfig {
    outputs: Arc<[Arc<dyn Output>]>,
    tags: Arc<[Field]>,
    filters: FilterChain,
    resolver: Arc<dyn CallSiteResolver>,
    source_prefix: Option<Arc<str>>,
    metrics: Arc<LoggerMetrics>,
}

struct LoggerInner {
    config: LoggerConfig,
    /// Logs a failure as a secondary warning
    report_failure: ErrorHandler,
    /// Only counts it; used while delivering that warning
    count_failure: ErrorHandler,
}

impl Logger {
    /// Logger writing human-readable lines to stdout
    #[must_use]
    pub fn new() -> Self {
        Self::builder().output(FormattingOutput::stdout()).build()
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use scribe::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .tag(Field::node("node1"))
    ///     .output(FormattingOutput::new(std::io::sink(), JsonFormatter::new()))
    ///     .filter(OnlyErrors)
    ///     .build();
    /// logger.error("disk failed", vec![]);
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    fn from_config(config: LoggerConfig) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<LoggerInner>| {
            let weak = weak.clone();
            let metrics = Arc::clone(&config.metrics);
            let report_failure: ErrorHandler = Arc::new(move |err| match weak.upgrade() {
                Some(inner) => Logger { inner }.report_output_failure(err),
                // background delivery can outlive every logger handle
                None => {
                    metrics.record_delivery_failure();
                    eprintln!("[LOGGER ERROR] {}: {}", OUTPUT_FAILURE_MESSAGE, err);
                }
            });

            let metrics = Arc::clone(&config.metrics);
            let count_failure: ErrorHandler = Arc::new(move |_| {
                metrics.record_delivery_failure();
            });

            LoggerInner {
                config,
                report_failure,
                count_failure,
            }
        });
        Self { inner }
    }

    fn derive(&self, change: impl FnOnce(&mut LoggerConfig)) -> Self {
        let mut config = self.config().clone();
        change(&mut config);
        Self::from_config(config)
    }

    fn config(&self) -> &LoggerConfig {
        &self.inner.config
    }

    /// New logger whose tags are this logger's tags followed by `tags`
    #[must_use]
    pub fn with_tags(&self, tags: Vec<Field>) -> Self {
        let mut merged = self.config().tags.to_vec();
        merged.extend(tags);
        self.derive(|config| config.tags = merged.into())
    }

    /// New logger delivering to `outputs` instead of this logger's outputs
    #[must_use]
    pub fn with_outputs(&self, outputs: Vec<Arc<dyn Output>>) -> Self {
        self.derive(|config| config.outputs = outputs.into())
    }

    /// New logger whose filter chain is extended with `filters`
    #[must_use]
    pub fn with_filters(&self, filters: Vec<Arc<dyn Filter>>) -> Self {
        self.derive(|config| config.filters = config.filters.extended(filters))
    }

    /// Trim reported source paths up to and including `prefix`
    #[must_use]
    pub fn with_source_prefix(&self, prefix: impl Into<String>) -> Self {
        let prefix: Arc<str> = Arc::from(prefix.into());
        self.derive(|config| config.source_prefix = Some(prefix))
    }

    #[must_use]
    pub fn with_call_site_resolver(&self, resolver: Arc<dyn CallSiteResolver>) -> Self {
        self.derive(|config| config.resolver = resolver)
    }

    pub fn tags(&self) -> &[Field] {
        &self.config().tags
    }

    pub fn filters(&self) -> &FilterChain {
        &self.config().filters
    }

    pub fn outputs(&self) -> &[Arc<dyn Output>] {
        &self.config().outputs
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.config().metrics
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl Into<String>, fields: Vec<Field>) {
        let call_site = self
            .config()
            .resolver
            .resolve(Location::caller())
            .unwrap_or_else(CallSite::unknown);
        self.dispatch(call_site, level, message.into(), fields, true);
    }

    /// Log with the enclosing function path supplied by the caller
    ///
    /// Used by the logging macros; the resolver still decides whether any
    /// call-site data is reported.
    #[doc(hidden)]
    #[track_caller]
    pub fn log_from(
        &self,
        function: &'static str,
        level: LogLevel,
        message: impl Into<String>,
        fields: Vec<Field>,
    ) {
        let call_site = match self.config().resolver.resolve(Location::caller()) {
            Some(mut site) => {
                site.function = function.to_string();
                site
            }
            None => CallSite::unknown(),
        };
        self.dispatch(call_site, level, message.into(), fields, true);
    }

    #[inline]
    #[track_caller]
    pub fn trace(&self, message: impl Into<String>, fields: Vec<Field>) {
        self.log(LogLevel::Trace, message, fields);
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, message: impl Into<String>, fields: Vec<Field>) {
        self.log(LogLevel::Debug, message, fields);
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, message: impl Into<String>, fields: Vec<Field>) {
        self.log(LogLevel::Info, message, fields);
    }

    #[inline]
    #[track_caller]
    pub fn warn(&self, message: impl Into<String>, fields: Vec<Field>) {
        self.log(LogLevel::Warn, message, fields);
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, message: impl Into<String>, fields: Vec<Field>) {
        self.log(LogLevel::Error, message, fields);
    }

    #[inline]
    #[track_caller]
    pub fn metric(&self, fields: Vec<Field>) {
        self.log(LogLevel::Metric, METRIC_MESSAGE, fields);
    }

    fn dispatch(
        &self,
        call_site: CallSite,
        level: LogLevel,
        message: String,
        fields: Vec<Field>,
        report_errors: bool,
    ) {
        let mut enriched = Vec::with_capacity(2 + self.config().tags.len() + fields.len());
        enriched.push(Field::function(call_site.function));
        enriched.push(Field::source(self.trim_source(call_site.source)));
        enriched.extend(self.config().tags.iter().cloned());
        enriched.extend(fields);
        let fields = field::flatten(enriched);

        if !self.config().filters.allows(level, &message, &fields) {
            self.config().metrics.record_filtered();
            return;
        }
        self.config().metrics.record_dispatched();

        let record = Record::new(level, message, fields);
        let on_error = self.error_handler(report_errors);
        for output in self.config().outputs.iter() {
            self.append_to(output, on_error, &record);
        }
    }

    fn error_handler(&self, report_errors: bool) -> &ErrorHandler {
        if report_errors {
            &self.inner.report_failure
        } else {
            &self.inner.count_failure
        }
    }

    /// Per-output panic isolation: a panicking output is reported through
    /// the same callback as a failing one and the remaining outputs still run.
    fn append_to(&self, output: &Arc<dyn Output>, on_error: &ErrorHandler, record: &Record) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| output.append(on_error, record)));

        if let Err(payload) = result {
            self.config().metrics.record_output_panic();
            on_error(LoggerError::output_panicked(
                output.name(),
                panic_message(payload.as_ref()),
            ));
        }
    }

    fn report_output_failure(&self, err: LoggerError) {
        self.config().metrics.record_delivery_failure();
        self.dispatch(
            CallSite::unknown(),
            LogLevel::Warn,
            format!("{}: {}", OUTPUT_FAILURE_MESSAGE, err),
            Vec::new(),
            false,
        );
    }

    fn trim_source(&self, source: String) -> String {
        match &self.config().source_prefix {
            Some(prefix) => match source.find(prefix.as_ref()) {
                Some(idx) => source[idx + prefix.len()..].to_string(),
                None => source,
            },
            None => source,
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field(
                "outputs",
                &self.config().outputs.iter().map(|o| o.name()).collect::<Vec<_>>(),
            )
            .field("tags", &self.config().tags)
            .field("filters", &self.config().filters)
            .field("source_prefix", &self.config().source_prefix)
            .finish()
    }
}

/// Builder for constructing Logger with a fluent API
///
/// Unlike [`Logger::new`], a built logger has no outputs unless some are added.
pub struct LoggerBuilder {
    tags: Vec<Field>,
    outputs: Vec<Arc<dyn Output>>,
    filters: Vec<Arc<dyn Filter>>,
    resolver: Arc<dyn CallSiteResolver>,
    source_prefix: Option<String>,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            tags: Vec::new(),
            outputs: Vec::new(),
            filters: Vec::new(),
            resolver: Arc::new(LocationResolver),
            source_prefix: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn tag(mut self, field: Field) -> Self {
        self.tags.push(field);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn tags(mut self, fields: Vec<Field>) -> Self {
        self.tags.extend(fields);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn output<O: Output + 'static>(mut self, output: O) -> Self {
        self.outputs.push(Arc::new(output));
        self
    }

    /// Add an output the caller keeps a handle to (e.g. to inspect it later)
    #[must_use = "builder methods return a new value"]
    pub fn shared_output(mut self, output: Arc<dyn Output>) -> Self {
        self.outputs.push(output);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn filter<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn call_site_resolver<R: CallSiteResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn source_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.source_prefix = Some(prefix.into());
        self
    }

    pub fn build(self) -> Logger {
        Logger::from_config(LoggerConfig {
            outputs: self.outputs.into(),
            tags: self.tags.into(),
            filters: FilterChain::new(self.filters),
            resolver: self.resolver,
            source_prefix: self.source_prefix.map(Arc::from),
            metrics: Arc::new(LoggerMetrics::new()),
        })
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
