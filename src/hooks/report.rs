//! # Operational error reporter.
//!
//! [`Report`] receives all [`OperationError`]s of one run in a single call,
//! and only if there is at least one.
//!
//! The default [`StderrReporter`] writes one line per error:
//! ```text
//! [scientist] error during "compare" for "users" experiment: connection reset
//! ```

use crate::error::OperationError;

/// Receives the operational errors of a run, once per run.
///
/// Implementations must not panic; a panicking reporter is caught by the
/// run's top-level barrier and logged.
pub trait Report: Send + Sync + 'static {
    /// Reports a non-empty batch of errors.
    fn report(&self, errors: &[OperationError]);
}

/// Writes each error as one line to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrReporter;

impl Report for StderrReporter {
    fn report(&self, errors: &[OperationError]) {
        for err in errors {
            eprintln!("[scientist] {}", err.as_message());
        }
    }
}

/// Closure-backed reporter.
pub struct ReportFn<F> {
    f: F,
}

impl<F> ReportFn<F> {
    /// Wraps a closure as a reporter.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Report for ReportFn<F>
where
    F: Fn(&[OperationError]) + Send + Sync + 'static,
{
    fn report(&self, errors: &[OperationError]) {
        (self.f)(errors)
    }
}
