//! # Observation of a single behavior execution.
//!
//! An [`Observation`] is created by the observer once the behavior finished,
//! normally or through panic containment. After creation only its
//! [`Classification`] changes, and only for candidates during finalize.

use std::time::{Duration, SystemTime};

use crate::error::BehaviorError;

/// Bucket a candidate observation is classified into.
///
/// The control observation always stays [`Classification::Unclassified`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Classification {
    /// Not classified yet (or the control).
    #[default]
    Unclassified,
    /// Agreed with the control.
    Matched,
    /// Disagreed with the control, but an ignore predicate accepted the difference.
    Ignored,
    /// Disagreed with the control.
    Mismatched,
}

/// Captured outcome of executing one behavior once.
#[derive(Debug, Clone)]
pub struct Observation<T> {
    name: String,
    started_at: SystemTime,
    duration: Duration,
    outcome: Result<T, BehaviorError>,
    classification: Classification,
}

impl<T> Observation<T> {
    pub(crate) fn new(
        name: impl Into<String>,
        started_at: SystemTime,
        duration: Duration,
        outcome: Result<T, BehaviorError>,
    ) -> Self {
        Self {
            name: name.into(),
            started_at,
            duration,
            outcome,
            classification: Classification::Unclassified,
        }
    }

    /// Name of the behavior that produced this observation.
    ///
    /// Candidate order inside a result is completion order; identify
    /// observations by name, never by position.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wall-clock time the behavior was started.
    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    /// Time spent inside the behavior itself.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The behavior's outcome.
    pub fn outcome(&self) -> &Result<T, BehaviorError> {
        &self.outcome
    }

    /// The returned value, if the behavior succeeded.
    pub fn value(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    /// The fault, if the behavior failed or panicked.
    pub fn fault(&self) -> Option<&BehaviorError> {
        self.outcome.as_ref().err()
    }

    /// Classification assigned during finalize.
    pub fn classification(&self) -> Classification {
        self.classification
    }

    /// True if classified as matched.
    pub fn is_matched(&self) -> bool {
        self.classification == Classification::Matched
    }

    /// True if classified as ignored.
    pub fn is_ignored(&self) -> bool {
        self.classification == Classification::Ignored
    }

    /// True if classified as mismatched.
    pub fn is_mismatched(&self) -> bool {
        self.classification == Classification::Mismatched
    }

    pub(crate) fn classify(&mut self, classification: Classification) {
        self.classification = classification;
    }

    pub(crate) fn into_outcome(self) -> Result<T, BehaviorError> {
        self.outcome
    }
}
