//! Output that turns unexpected error logs into test failures
//!
//! Every record is forwarded to a [`TestReporter`] as an informational
//! line, except error-level records that match none of the allowed
//! patterns. The first such record fails the test and silences the output:
//! once a test has failed, the rest of its log is noise.
//!
//! Background threads may keep logging after the test body returned. Call
//! [`TestOutput::test_terminated`] when the test ends; later failures then
//! only flip the reporter's fail flag and are echoed to stdout, since the
//! per-line reporting of a finished test goes nowhere. The fallback
//! channel is stdout unless replaced through [`TestOutput::with_fallback`].

use crate::core::error::panic_message;
use crate::core::{
    ErrorHandler, Field, Formatter, HumanReadableFormatter, LoggerError, Output, Record, Result,
    KEY_ERROR,
};
use parking_lot::{Mutex, RwLock};
use regex::Regex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

pub const TEST_FAILED_ERROR: &str = "Test failed due to unexpected errors being logged. \
If the error above is expected, please add it to the list of allowed errors by invoking \
TestOutput::allow_errors_matching";

pub const POST_TERMINATED_ERROR: &str = "*** Logged error after TestOutput::test_terminated:";

pub const TEST_RUNNER_PANIC_ERROR: &str =
    "*** Test runner panic while trying to fail test (try using TestOutput::test_terminated):";

/// Channel for lines the reporter can no longer take
pub type FallbackSink = Arc<dyn Fn(&str) + Send + Sync>;

/// What a test harness offers for reporting
pub trait TestReporter: Send + Sync {
    /// Report a failing line; the test keeps running
    fn error(&self, line: &str);

    /// Report a failing line and stop the test
    fn fatal(&self, line: &str);

    fn log(&self, line: &str);

    /// Mark the test failed without a message
    fn fail(&self);

    fn name(&self) -> String;
}

#[derive(Debug, Default)]
struct State {
    allowed: Vec<Regex>,
    has_errors: bool,
    logging_disabled: bool,
    terminated: bool,
}

impl State {
    fn allows(&self, message: &str, fields: &[Field]) -> bool {
        self.allowed.iter().any(|pattern| {
            pattern.is_match(message)
                || fields
                    .iter()
                    .filter(|f| f.key == KEY_ERROR)
                    .any(|f| pattern.is_match(&f.value.to_string()))
        })
    }
}

/// # Example
///
/// ```
/// use scribe::prelude::*;
/// use std::sync::Arc;
///
/// let reporter = Arc::new(RecordingReporter::new("my_test"));
/// let output = Arc::new(TestOutput::new(reporter.clone()));
/// output.allow_errors_matching("connection refused")?;
///
/// let logger = Logger::builder().shared_output(output.clone()).build();
/// logger.error("dial failed: connection refused", vec![]);
///
/// assert!(!output.has_errors());
/// # Ok::<(), scribe::LoggerError>(())
/// ```
pub struct TestOutput {
    reporter: Arc<dyn TestReporter>,
    formatter: Arc<dyn Formatter>,
    fallback: FallbackSink,
    state: RwLock<State>,
}

impl TestOutput {
    /// Uses the human-readable formatter without colours
    pub fn new(reporter: Arc<dyn TestReporter>) -> Self {
        Self {
            reporter,
            formatter: Arc::new(HumanReadableFormatter::new().with_colors(false)),
            fallback: Arc::new(|line: &str| println!("{}", line)),
            state: RwLock::new(State::default()),
        }
    }

    #[must_use]
    pub fn with_formatter<F: Formatter + 'static>(mut self, formatter: F) -> Self {
        self.formatter = Arc::new(formatter);
        self
    }

    /// Send post-termination and runner-panic lines somewhere other than stdout
    #[must_use]
    pub fn with_fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.fallback = Arc::new(fallback);
        self
    }

    /// Treat error records whose message or error field matches `pattern`
    /// as expected
    pub fn allow_errors_matching(&self, pattern: &str) -> Result<()> {
        let compiled = Regex::new(pattern).map_err(|source| LoggerError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        self.state.write().allowed.push(compiled);
        Ok(())
    }

    pub fn has_errors(&self) -> bool {
        self.state.read().has_errors
    }

    pub fn is_terminated(&self) -> bool {
        self.state.read().terminated
    }

    /// Mark the end of the test body; there is no way back
    pub fn test_terminated(&self) {
        self.state.write().terminated = true;
    }

    /// Stop the test through the reporter if an unexpected error was logged
    ///
    /// Call from the test thread itself, typically as the last statement.
    pub fn assert_no_errors(&self) {
        if self.has_errors() {
            self.reporter.fatal(TEST_FAILED_ERROR);
        }
    }

    fn record_error(&self, state: &mut State, line: &str) {
        state.has_errors = true;
        let terminated = state.terminated;

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            if terminated {
                self.reporter.fail();
                (self.fallback)(&format!(
                    "{} {} : {}",
                    POST_TERMINATED_ERROR,
                    self.reporter.name(),
                    line
                ));
            } else {
                self.reporter.error(line);
                self.reporter.error(TEST_FAILED_ERROR);
            }
        }));

        if let Err(payload) = result {
            (self.fallback)(&format!(
                "{} {} : {} : {}",
                TEST_RUNNER_PANIC_ERROR,
                self.reporter.name(),
                panic_message(payload.as_ref()),
                line
            ));
        }
    }
}

impl Output for TestOutput {
    fn append(&self, on_error: &ErrorHandler, record: &Record) {
        let failure = {
            // write lock for the whole body, recording an error mutates state
            let mut state = self.state.write();
            if state.logging_disabled {
                return;
            }

            // an unrenderable record still counts, report the bare message
            let (line, failure) = match self.formatter.format_record(record) {
                Ok(line) => (line, None),
                Err(e) => (format!("{} {}", record.level, record.message), Some(e)),
            };

            if record.level.is_error() && !state.allows(&record.message, &record.fields) {
                state.logging_disabled = true;
                self.record_error(&mut state, &line);
            } else {
                self.reporter.log(&line);
            }
            failure
        };

        if let Some(e) = failure {
            on_error(e);
        }
    }

    fn name(&self) -> &str {
        "test"
    }
}

/// One call received by a [`RecordingReporter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReporterCall {
    Error(String),
    Fatal(String),
    Log(String),
    Fail,
}

/// Reporter that remembers every call, for asserting on what a test saw
#[derive(Debug, Default)]
pub struct RecordingReporter {
    name: String,
    calls: Mutex<Vec<ReporterCall>>,
    panic_on_error: bool,
}

impl RecordingReporter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Reporter whose `error` panics after recording, like a harness asked
    /// to fail a test that already finished
    #[must_use]
    pub fn panicking_on_error(mut self) -> Self {
        self.panic_on_error = true;
        self
    }

    pub fn calls(&self) -> Vec<ReporterCall> {
        self.calls.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                ReporterCall::Error(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn logs(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                ReporterCall::Log(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn fail_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| **call == ReporterCall::Fail)
            .count()
    }
}

impl TestReporter for RecordingReporter {
    fn error(&self, line: &str) {
        self.calls.lock().push(ReporterCall::Error(line.to_string()));
        if self.panic_on_error {
            panic!("test runner panic");
        }
    }

    fn fatal(&self, line: &str) {
        self.calls.lock().push(ReporterCall::Fatal(line.to_string()));
    }

    fn log(&self, line: &str) {
        self.calls.lock().push(ReporterCall::Log(line.to_string()));
    }

    fn fail(&self) {
        self.calls.lock().push(ReporterCall::Fail);
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Reporter for plain `#[test]` functions
///
/// Lines go to stdout (captured by the test harness), failures to stderr.
/// `fatal` panics, which fails the test when called on the test thread.
#[derive(Debug)]
pub struct StdReporter {
    name: String,
    failed: AtomicBool,
}

impl StdReporter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failed: AtomicBool::new(false),
        }
    }

    /// Named after the current thread, which the test harness names after the test
    pub fn for_current_test() -> Self {
        Self::new(thread::current().name().unwrap_or("unnamed"))
    }

    pub fn failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }
}

impl TestReporter for StdReporter {
    fn error(&self, line: &str) {
        self.failed.store(true, Ordering::Release);
        eprintln!("{}: {}", self.name, line);
    }

    fn fatal(&self, line: &str) {
        self.failed.store(true, Ordering::Release);
        panic!("{}: {}", self.name, line);
    }

    fn log(&self, line: &str) {
        println!("{}", line);
    }

    fn fail(&self) {
        self.failed.store(true, Ordering::Release);
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}
