//! Experiment engine: registration, execution and classification.
//!
//! The public API from this module is [`Experiment`] and the [`run`] helper.
//!
//! Internal modules:
//! - `registry`: immutable snapshot of behaviors, hooks and config shared by runs;
//! - `experiment`: registration API and the run state machine;
//! - `observer`: executes one behavior with timing and panic containment;
//! - `dispatcher`: fans candidates out on tokio tasks and funnels them back;
//! - `classifier`: classifies candidates as matched, ignored or mismatched;
//! - `barrier`: panic containment for hooks and the run as a whole.

mod barrier;
mod classifier;
mod dispatcher;
mod experiment;
mod observer;
mod registry;

pub(crate) use barrier::contain;
pub use experiment::{Experiment, run};
