//! # Result of one experiment run.
//!
//! [`ExperimentResult`] is built fresh for every run that dispatches candidates.
//! It is written only by the task that drains the candidate funnel, then handed
//! (by reference) to the publisher.
//!
//! ## Views
//! ```text
//! candidates (completion order)
//!   ├─► matched()     classification == Matched
//!   ├─► ignored()     classification == Ignored
//!   └─► mismatched()  classification == Mismatched
//! ```

use std::collections::BTreeMap;

use crate::error::{BoxError, OperationError, Stage};
use crate::hooks::CleanFn;
use crate::results::{Classification, Observation};

/// Free-form tags attached to an experiment for publishers.
pub type Annotations = BTreeMap<String, String>;

/// Full outcome of one experiment run.
pub struct ExperimentResult<T> {
    pub(crate) experiment: String,
    pub(crate) annotations: Annotations,
    pub(crate) control: Observation<T>,
    pub(crate) candidates: Vec<Observation<T>>,
    pub(crate) errors: Vec<OperationError>,
    pub(crate) cleaner: CleanFn<T>,
}

impl<T> ExperimentResult<T> {
    pub(crate) fn new(
        experiment: impl Into<String>,
        annotations: Annotations,
        control: Observation<T>,
        cleaner: CleanFn<T>,
    ) -> Self {
        Self {
            experiment: experiment.into(),
            annotations,
            control,
            candidates: Vec::new(),
            errors: Vec::new(),
            cleaner,
        }
    }

    /// Name of the experiment.
    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    /// Annotations registered on the experiment.
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// The control observation.
    pub fn control(&self) -> &Observation<T> {
        &self.control
    }

    /// All candidate observations, in completion order.
    pub fn candidates(&self) -> &[Observation<T>] {
        &self.candidates
    }

    /// Candidates that agreed with the control.
    pub fn matched(&self) -> impl Iterator<Item = &Observation<T>> {
        self.by_class(Classification::Matched)
    }

    /// Candidates whose disagreement was accepted by an ignore predicate.
    pub fn ignored(&self) -> impl Iterator<Item = &Observation<T>> {
        self.by_class(Classification::Ignored)
    }

    /// Candidates that disagreed with the control.
    pub fn mismatched(&self) -> impl Iterator<Item = &Observation<T>> {
        self.by_class(Classification::Mismatched)
    }

    /// Operational errors recorded so far.
    pub fn errors(&self) -> &[OperationError] {
        &self.errors
    }

    /// True if no candidate was mismatched or ignored.
    pub fn is_matched(&self) -> bool {
        !self.is_mismatched() && !self.is_ignored()
    }

    /// True if at least one candidate was mismatched.
    pub fn is_mismatched(&self) -> bool {
        self.mismatched().next().is_some()
    }

    /// True if at least one candidate was ignored.
    pub fn is_ignored(&self) -> bool {
        self.ignored().next().is_some()
    }

    /// Applies the experiment's cleaner to an observation's value.
    ///
    /// Returns `None` if the observation holds a fault.
    pub fn cleaned_value(&self, observation: &Observation<T>) -> Option<Result<T, BoxError>> {
        observation.value().map(|v| crate::engine::contain(|| (self.cleaner)(v)))
    }

    pub(crate) fn push_error(&mut self, stage: Stage, error: BoxError) {
        tracing::warn!(
            experiment = %self.experiment,
            stage = stage.as_label(),
            error = %error,
            "operational error"
        );
        self.errors
            .push(OperationError::new(stage, self.experiment.clone(), error));
    }

    fn by_class(&self, class: Classification) -> impl Iterator<Item = &Observation<T>> {
        self.candidates
            .iter()
            .filter(move |o| o.classification() == class)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ExperimentResult<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExperimentResult")
            .field("experiment", &self.experiment)
            .field("annotations", &self.annotations)
            .field("control", &self.control)
            .field("candidates", &self.candidates)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}
