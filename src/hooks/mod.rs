//! # Pluggable experiment hooks.
//!
//! Every decision point of a run is a hook with a default, collected in [`Hooks`]:
//!
//! | Hook          | Default                          | Fault handling                      |
//! |---------------|----------------------------------|-------------------------------------|
//! | `run_if`      | always enabled                   | fatal, returned from `run`          |
//! | `before_run`  | no-op                            | candidates skipped, still published |
//! | `compare`     | `PartialEq`                      | `OperationError{compare}`           |
//! | `ignore`      | none registered                  | `OperationError{ignore}`            |
//! | `clean`       | clone                            | returned from `cleaned_value`       |
//! | `publish`     | [`NoopPublisher`]                | `OperationError{publish}`           |
//! | `report`      | [`StderrReporter`]               | n/a                                 |
//!
//! Panics raised inside a hook are contained and treated as a fault of that hook.
//!
//! ## Architecture
//! ```text
//! finalize(result) ──► publish(&result) ──┬─ Ok
//!                                         └─ Err ─► OperationError{publish}
//!                                                        │
//!                  errors non-empty? ──► report(&errors) ◄┘   (once per run)
//! ```

mod publish;
mod report;
mod set;

#[cfg(feature = "logging")]
mod log;

pub use publish::{NoopPublisher, Publish, PublishFn};
pub use report::{Report, ReportFn, StderrReporter};
pub use set::{BeforeRunFn, CleanFn, CompareFn, Hooks, IgnoreFn, RunIfFn};

#[cfg(feature = "logging")]
pub use log::LogPublisher;
