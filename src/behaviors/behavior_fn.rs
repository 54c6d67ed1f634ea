//! # Closure-backed behavior (`BehaviorFn`)
//!
//! [`BehaviorFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`, producing a
//! fresh future per spawn. State shared between runs must be captured explicitly
//! (e.g. `Arc<...>`).
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use scientist::{BehaviorError, BehaviorFn, BehaviorRef};
//!
//! let b: BehaviorRef<u32> = BehaviorFn::arc("answer", |_ctx: CancellationToken| async {
//!     Ok::<_, BehaviorError>(42)
//! });
//!
//! assert_eq!(b.name(), "answer");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::behaviors::behavior::{Behavior, BoxBehaviorFuture};
use crate::error::BehaviorError;

/// Function-backed behavior implementation.
#[derive(Debug)]
pub struct BehaviorFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> BehaviorFn<F> {
    /// Creates a new function-backed behavior.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the behavior and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<T, F, Fut> Behavior<T> for BehaviorFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, BehaviorError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(&self, ctx: CancellationToken) -> BoxBehaviorFuture<T> {
        Box::pin((self.f)(ctx))
    }
}
