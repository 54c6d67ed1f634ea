//! # scientist
//!
//! **Scientist** runs a trusted code path (the *control*) alongside one or more
//! alternative code paths (the *candidates*), compares their outcomes and
//! publishes the comparison, while the caller only ever receives the control's
//! outcome.
//!
//! It is meant for refactoring with confidence: put the old implementation in
//! the control, the new one in a candidate, and watch the published results
//! until they stop disagreeing.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                       Experiment::run(ctx)
//!                                │
//!              ┌─────────────────┴─────────────────┐
//!              ▼                                   │
//!     ┌─────────────────┐                          │
//!     │ run_if (gate)   │── fault ─► Err(RunIf)    │
//!     └────────┬────────┘                          │
//!              ▼                                   │
//!     ┌─────────────────┐                          │
//!     │ observe control │ (caller's token)         │
//!     └────────┬────────┘                          │
//!              │ gate open + candidates?           │
//!              ▼                                   │
//! ┌───────────────────────────────────────────┐    │
//! │ trial (inline or tokio::spawn)            │    │
//! │  before_run                               │    │
//! │  ┌────────┐ ┌────────┐ ┌────────┐         │    │
//! │  │  K1    │ │  K2    │ │  KN    │ tasks   │    │
//! │  └───┬────┘ └───┬────┘ └───┬────┘         │    │
//! │      └──────────┼──────────┘ mpsc funnel  │    │
//! │                 ▼                         │    │
//! │  classify: matched / ignored / mismatched │    │
//! │  publish(&result) ─► report(&errors)      │    │
//! └───────────────────────────────────────────┘    │
//!                                                  ▼
//!                                   control outcome returned
//! ```
//!
//! ### Guarantees
//! - The caller gets exactly the control's value or fault; candidates and
//!   hooks can never change it.
//! - Panics in behaviors and hooks are contained; a run never crashes the host.
//! - Cancelling the caller's token reaches the control only.
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                                |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------------|
//! | **Experiments**   | Register control, candidates and hooks; run.                 | [`Experiment`], [`run`]                           |
//! | **Behaviors**     | Named async code paths, closures or custom types.            | [`Behavior`], [`BehaviorFn`], [`BehaviorRef`]     |
//! | **Results**       | Observations and their classification.                       | [`ExperimentResult`], [`Observation`]             |
//! | **Hooks**         | Publishing results and reporting hook faults.                | [`Publish`], [`Report`]                           |
//! | **Errors**        | Typed errors for callers, behaviors and hooks.               | [`ExperimentError`], [`BehaviorError`], [`OperationError`] |
//! | **Configuration** | Synchronous or detached candidates, shuffling.               | [`Config`], [`RunMode`]                           |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogPublisher`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use scientist::{BehaviorError, Config, Experiment};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), scientist::ExperimentError> {
//!     let mut e = Experiment::<String>::new("greeting").with_config(Config::synchronous());
//!
//!     e.use_control(|_ctx: CancellationToken| async {
//!         Ok::<_, BehaviorError>(format!("hello {}", "world"))
//!     });
//!     e.try_candidate(|_ctx: CancellationToken| async {
//!         Ok::<_, BehaviorError>(["hello", "world"].join(" "))
//!     });
//!     e.publish(|result| {
//!         for obs in result.mismatched() {
//!             eprintln!("{} disagrees: {:?}", obs.name(), obs.outcome());
//!         }
//!         Ok(())
//!     });
//!
//!     let greeting = e.run(CancellationToken::new()).await?;
//!     assert_eq!(greeting, "hello world");
//!     Ok(())
//! }
//! ```
mod behaviors;
mod config;
mod engine;
mod error;
mod hooks;
mod results;

// ---- Public re-exports ----

pub use behaviors::{Behavior, BehaviorFn, BehaviorRef, BoxBehaviorFuture, CANDIDATE, CONTROL};
pub use config::{Config, RunMode};
pub use engine::{Experiment, run};
pub use error::{BehaviorError, BoxError, ExperimentError, OperationError, Stage};
pub use hooks::{
    BeforeRunFn, CleanFn, CompareFn, IgnoreFn, NoopPublisher, Publish, PublishFn, Report,
    ReportFn, RunIfFn, StderrReporter,
};
pub use results::{Annotations, Classification, ExperimentResult, Observation};

// Optional: expose a simple built-in publisher printing results (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use hooks::LogPublisher;
