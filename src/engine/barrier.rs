//! # Panic containment.
//!
//! Three scopes of containment, innermost first:
//! - the observer converts a behavior panic into [`BehaviorError::Panicked`](crate::BehaviorError);
//! - [`contain`] converts a hook panic into a hook fault;
//! - [`guard`] is the last-resort barrier around a whole run phase: it logs the
//!   panic with a backtrace and never lets it reach the host.
//!
//! `AssertUnwindSafe` is used throughout. A hook that panics while holding a
//! lock on shared state can leave that state inconsistent.

use std::any::Any;
use std::backtrace::Backtrace;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use futures::FutureExt;

use crate::error::BoxError;

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs a synchronous hook, turning a panic into a hook fault.
pub(crate) fn contain<R>(hook: impl FnOnce() -> Result<R, BoxError>) -> Result<R, BoxError> {
    match panic::catch_unwind(AssertUnwindSafe(hook)) {
        Ok(res) => res,
        Err(payload) => Err(format!("hook panicked: {}", panic_message(&*payload)).into()),
    }
}

/// Polls `fut` to completion behind an unwind barrier.
///
/// On panic, writes the message and a backtrace to stderr, emits a
/// `tracing::error!` event and returns the panic message.
///
/// The backtrace is captured at the barrier, after unwinding; the panic site
/// itself is printed by the process panic hook.
pub(crate) async fn guard<F: Future>(experiment: &str, fut: F) -> Result<F::Output, String> {
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(out) => Ok(out),
        Err(payload) => {
            let message = panic_message(&*payload);
            let backtrace = Backtrace::force_capture();
            eprintln!(
                "[scientist] stacktrace from unhandled panic in {experiment:?} experiment: {message}"
            );
            eprintln!("Stacktrace:\n{backtrace}");
            tracing::error!(experiment, panic = %message, "unhandled panic contained");
            Err(message)
        }
    }
}
