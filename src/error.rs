//! Error types used by the experiment engine and its behaviors.
//!
//! This module defines three error families:
//!
//! - [`ExperimentError`] - returned from [`Experiment::run`](crate::Experiment::run).
//! - [`BehaviorError`] - the fault of one behavior (control or candidate), kept as data.
//! - [`OperationError`] - a fault raised by an optional hook, reported but never returned.
//!
//! All of them provide `as_label` (stable snake_case for logs/metrics) and the
//! experiment-facing ones provide `as_message`.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Boxed error returned by hooks (`run_if`, `compare`, `publish`, ...).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors returned to the caller of an experiment run.
///
/// Only the control's own fault, a gate fault, or a configuration problem ever
/// reaches the caller; candidate outcomes and hook faults never do.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ExperimentError {
    /// The control behavior returned (or panicked with) a fault.
    #[error(transparent)]
    Behavior(#[from] BehaviorError),

    /// A required behavior was never registered.
    #[error("behavior {behavior:?} not found for experiment {experiment:?}")]
    BehaviorNotFound {
        /// Slot name of the missing behavior.
        behavior: String,
        /// Experiment name.
        experiment: String,
    },

    /// The `run_if` gate faulted; nothing else was executed.
    #[error(transparent)]
    RunIf(BoxError),

    /// The setup closure given to [`run`](crate::run) faulted.
    #[error(transparent)]
    Setup(BoxError),

    /// The engine itself panicked before the control outcome existed.
    #[error("internal fault in experiment {experiment:?}: {message}")]
    Internal {
        /// Experiment name.
        experiment: String,
        /// Panic payload rendered as text.
        message: String,
    },
}

impl ExperimentError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use scientist::ExperimentError;
    ///
    /// let err = ExperimentError::BehaviorNotFound {
    ///     behavior: "control".into(),
    ///     experiment: "demo".into(),
    /// };
    /// assert_eq!(err.as_label(), "experiment_behavior_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ExperimentError::Behavior(_) => "experiment_behavior_fault",
            ExperimentError::BehaviorNotFound { .. } => "experiment_behavior_not_found",
            ExperimentError::RunIf(_) => "experiment_run_if",
            ExperimentError::Setup(_) => "experiment_setup",
            ExperimentError::Internal { .. } => "experiment_internal",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ExperimentError::Behavior(e) => format!("behavior: {e}"),
            ExperimentError::BehaviorNotFound {
                behavior,
                experiment,
            } => format!("missing behavior={behavior} experiment={experiment}"),
            ExperimentError::RunIf(e) => format!("run_if: {e}"),
            ExperimentError::Setup(e) => format!("setup: {e}"),
            ExperimentError::Internal {
                experiment,
                message,
            } => format!("internal: experiment={experiment} {message}"),
        }
    }

    /// Returns the control's fault, if that is what this error carries.
    pub fn as_behavior(&self) -> Option<&BehaviorError> {
        match self {
            ExperimentError::Behavior(e) => Some(e),
            _ => None,
        }
    }
}

/// # Fault produced by a single behavior.
///
/// Faults are data: they are stored in observations and compared by their
/// `Display` text. The type is cheap to clone so the control fault can be both
/// returned to the caller and published.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum BehaviorError {
    /// The behavior returned an error.
    #[error("{0}")]
    Failed(Arc<dyn std::error::Error + Send + Sync + 'static>),

    /// The behavior panicked; the panic was contained by the observer.
    #[error("recover from bad behavior {behavior}: {message}")]
    Panicked {
        /// Name of the behavior that panicked.
        behavior: String,
        /// Panic payload rendered as text.
        message: String,
    },
}

impl BehaviorError {
    /// Wraps any error (or string) as a behavior fault.
    ///
    /// # Example
    /// ```
    /// use scientist::BehaviorError;
    ///
    /// let err = BehaviorError::new("connection refused");
    /// assert_eq!(err.to_string(), "connection refused");
    /// ```
    pub fn new(err: impl Into<BoxError>) -> Self {
        BehaviorError::Failed(Arc::from(err.into()))
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BehaviorError::Failed(_) => "behavior_failed",
            BehaviorError::Panicked { .. } => "behavior_panicked",
        }
    }

    /// True if the fault was produced by panic containment.
    pub fn is_panic(&self) -> bool {
        matches!(self, BehaviorError::Panicked { .. })
    }
}

/// Hook stage an [`OperationError`] was raised in.
///
/// The `run_if` gate has no stage: its faults are returned as
/// [`ExperimentError::RunIf`] and never reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// The `before_run` hook.
    BeforeRun,
    /// The comparator.
    Compare,
    /// An ignore predicate.
    Ignore,
    /// The publisher.
    Publish,
}

impl Stage {
    /// Returns the stable snake_case name of the stage.
    pub fn as_label(&self) -> &'static str {
        match self {
            Stage::BeforeRun => "before_run",
            Stage::Compare => "compare",
            Stage::Ignore => "ignore",
            Stage::Publish => "publish",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// # Non-fatal fault raised by a hook during a run.
///
/// Collected on the [`ExperimentResult`](crate::ExperimentResult) and handed to
/// the error reporter once per run. `Display` shows the underlying error only.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct OperationError {
    /// Stage the fault was raised in.
    pub stage: Stage,
    /// Name of the experiment.
    pub experiment: String,
    /// The underlying hook error.
    pub error: BoxError,
}

impl OperationError {
    /// Creates a new operational error.
    pub fn new(stage: Stage, experiment: impl Into<String>, error: BoxError) -> Self {
        Self {
            stage,
            experiment: experiment.into(),
            error,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self.stage {
            Stage::BeforeRun => "operation_before_run",
            Stage::Compare => "operation_compare",
            Stage::Ignore => "operation_ignore",
            Stage::Publish => "operation_publish",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        format!(
            "error during {:?} for {:?} experiment: {}",
            self.stage.as_label(),
            self.experiment,
            self.error
        )
    }
}
