//! # Result publisher.
//!
//! Provides [`Publish`] the extension point receiving every finalized
//! [`ExperimentResult`] exactly once per run.
//!
//! ## Rules
//! - Called after classification, before error reporting.
//! - An `Err` (or a panic) becomes an `OperationError{publish}`; the caller of
//!   `run` never sees it.
//! - In detached mode the publisher runs on the background task; it is the
//!   caller's only completion signal.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use scientist::{BoxError, ExperimentResult, Publish};
//!
//! struct Mismatches;
//!
//! #[async_trait]
//! impl Publish<u32> for Mismatches {
//!     async fn publish(&self, result: &ExperimentResult<u32>) -> Result<(), BoxError> {
//!         for obs in result.mismatched() {
//!             eprintln!("{} mismatched in {}", obs.name(), result.experiment());
//!         }
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &'static str { "mismatches" }
//! }
//! ```

use async_trait::async_trait;

use crate::error::BoxError;
use crate::results::ExperimentResult;

/// Receives the result of every run that dispatched candidates.
#[async_trait]
pub trait Publish<T: Send + Sync + 'static>: Send + Sync + 'static {
    /// Publishes one finalized result.
    async fn publish(&self, result: &ExperimentResult<T>) -> Result<(), BoxError>;

    /// Returns the publisher name used in logs.
    ///
    /// The default uses `type_name::<Self>()`; override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Publisher that discards results.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

#[async_trait]
impl<T: Send + Sync + 'static> Publish<T> for NoopPublisher {
    async fn publish(&self, _result: &ExperimentResult<T>) -> Result<(), BoxError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

/// Closure-backed publisher.
///
/// Wraps a synchronous `Fn(&ExperimentResult<T>) -> Result<(), BoxError>`.
pub struct PublishFn<F> {
    f: F,
}

impl<F> PublishFn<F> {
    /// Wraps a closure as a publisher.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<T, F> Publish<T> for PublishFn<F>
where
    T: Send + Sync + 'static,
    F: Fn(&ExperimentResult<T>) -> Result<(), BoxError> + Send + Sync + 'static,
{
    async fn publish(&self, result: &ExperimentResult<T>) -> Result<(), BoxError> {
        (self.f)(result)
    }

    fn name(&self) -> &'static str {
        "publish_fn"
    }
}
