//! # Candidate classification.
//!
//! Finalizes an [`ExperimentResult`] by putting every candidate into exactly one
//! bucket: matched, ignored or mismatched.
//!
//! ## Decision table
//! ```text
//! control   candidate   match?
//! Ok(c)     Ok(k)       compare(c, k)          (fault → no match + OperationError{compare})
//! Err(c)    Err(k)      c.to_string() == k.to_string()
//! Ok        Err         no (compare not called)
//! Err       Ok          no (compare not called)
//!
//! no match ─► ignore predicates in registration order
//!               ├─ first Ok(true)  → Ignored (later predicates not called)
//!               ├─ Err             → stop, OperationError{ignore}, not ignored
//!               └─ all Ok(false)   → Mismatched
//! ```
//!
//! Fault text equality is a simplification: two different causes with the same
//! message are indistinguishable, the same cause with different wrapping is not.

use crate::engine::barrier::contain;
use crate::error::{BoxError, Stage};
use crate::hooks::{CompareFn, Hooks, IgnoreFn};
use crate::results::{Classification, ExperimentResult, Observation};

impl<T: Send + Sync + 'static> ExperimentResult<T> {
    /// Classifies every candidate against the control, recording hook faults.
    pub(crate) fn finalize(&mut self, hooks: &Hooks<T>) {
        for idx in 0..self.candidates.len() {
            let (class, faults) = classify(
                &hooks.compare,
                &hooks.ignores,
                &self.control,
                &self.candidates[idx],
            );
            self.candidates[idx].classify(class);
            for (stage, err) in faults {
                self.push_error(stage, err);
            }
        }
    }
}

/// Classifies one candidate, returning its bucket and any hook faults raised.
pub(crate) fn classify<T>(
    compare: &CompareFn<T>,
    ignores: &[IgnoreFn<T>],
    control: &Observation<T>,
    candidate: &Observation<T>,
) -> (Classification, Vec<(Stage, BoxError)>) {
    let mut faults = Vec::new();

    let matched = matching(compare, control, candidate).unwrap_or_else(|err| {
        faults.push((Stage::Compare, err));
        false
    });
    if matched {
        return (Classification::Matched, faults);
    }

    let ignored = ignoring(ignores, control, candidate).unwrap_or_else(|err| {
        faults.push((Stage::Ignore, err));
        false
    });
    let class = if ignored {
        Classification::Ignored
    } else {
        Classification::Mismatched
    };
    (class, faults)
}

fn matching<T>(
    compare: &CompareFn<T>,
    control: &Observation<T>,
    candidate: &Observation<T>,
) -> Result<bool, BoxError> {
    match (control.outcome(), candidate.outcome()) {
        (Ok(c), Ok(k)) => contain(|| compare(c, k)),
        (Err(c), Err(k)) => Ok(c.to_string() == k.to_string()),
        _ => Ok(false),
    }
}

fn ignoring<T>(
    ignores: &[IgnoreFn<T>],
    control: &Observation<T>,
    candidate: &Observation<T>,
) -> Result<bool, BoxError> {
    for ignore in ignores {
        if contain(|| ignore(control, candidate))? {
            return Ok(true);
        }
    }
    Ok(false)
}
