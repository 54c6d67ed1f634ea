//! # Behavior trait.
//!
//! A [`Behavior`] is one code path of an experiment: the control or a candidate.
//! Each call to [`Behavior::spawn`] produces a fresh future; the engine never
//! polls the same future twice.
//!
//! The behavior receives a [`CancellationToken`]. The control gets the caller's
//! token unchanged; candidates get a token that is never cancelled.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::BehaviorError;

/// Boxed future returned by [`Behavior::spawn`].
pub type BoxBehaviorFuture<T> =
    Pin<Box<dyn Future<Output = Result<T, BehaviorError>> + Send + 'static>>;

/// Shared handle to a behavior.
pub type BehaviorRef<T> = Arc<dyn Behavior<T>>;

/// # Named async code path.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use scientist::{Behavior, BehaviorError, BoxBehaviorFuture};
///
/// struct Lookup;
///
/// impl Behavior<bool> for Lookup {
///     fn name(&self) -> &str { "lookup" }
///
///     fn spawn(&self, _ctx: CancellationToken) -> BoxBehaviorFuture<bool> {
///         Box::pin(async { Ok::<_, BehaviorError>(true) })
///     }
/// }
/// ```
pub trait Behavior<T>: Send + Sync + 'static {
    /// Returns the behavior name used in observations and reports.
    fn name(&self) -> &str;

    /// Creates a new future executing the behavior once.
    fn spawn(&self, ctx: CancellationToken) -> BoxBehaviorFuture<T>;
}
