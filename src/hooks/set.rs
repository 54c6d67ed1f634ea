//! # Hook set held by an experiment registry.
//!
//! [`Hooks`] is built once when the experiment is created, with every hook set
//! to its default. Registration replaces single hooks or appends ignore
//! predicates; runs share the set read-only.

use std::sync::Arc;

use crate::error::BoxError;
use crate::hooks::{NoopPublisher, Publish, Report, StderrReporter};
use crate::results::Observation;

/// Gate deciding whether candidates run at all.
pub type RunIfFn = Arc<dyn Fn() -> Result<bool, BoxError> + Send + Sync>;

/// Hook run once before candidates are dispatched.
pub type BeforeRunFn = Arc<dyn Fn() -> Result<(), BoxError> + Send + Sync>;

/// Comparator of control and candidate values.
pub type CompareFn<T> = Arc<dyn Fn(&T, &T) -> Result<bool, BoxError> + Send + Sync>;

/// Predicate accepting a control/candidate disagreement.
pub type IgnoreFn<T> =
    Arc<dyn Fn(&Observation<T>, &Observation<T>) -> Result<bool, BoxError> + Send + Sync>;

/// Transformation applied to values before publishing.
pub type CleanFn<T> = Arc<dyn Fn(&T) -> Result<T, BoxError> + Send + Sync>;

/// Decision and reporting hooks of one experiment.
pub struct Hooks<T: Send + Sync + 'static> {
    pub(crate) run_if: RunIfFn,
    pub(crate) before_run: BeforeRunFn,
    pub(crate) compare: CompareFn<T>,
    pub(crate) ignores: Vec<IgnoreFn<T>>,
    pub(crate) clean: CleanFn<T>,
    pub(crate) publisher: Arc<dyn Publish<T>>,
    pub(crate) reporter: Arc<dyn Report>,
}

impl<T: Clone + Send + Sync + 'static> Hooks<T> {
    /// Creates a hook set with the given comparator and defaults for everything else.
    pub fn with_comparator(compare: CompareFn<T>) -> Self {
        Self {
            run_if: Arc::new(|| Ok(true)),
            before_run: Arc::new(|| Ok(())),
            compare,
            ignores: Vec::new(),
            clean: Arc::new(|v: &T| Ok(v.clone())),
            publisher: Arc::new(NoopPublisher),
            reporter: Arc::new(StderrReporter),
        }
    }
}

impl<T: PartialEq + Clone + Send + Sync + 'static> Default for Hooks<T> {
    /// Structural equality (`PartialEq`) as comparator, defaults for everything else.
    fn default() -> Self {
        Self::with_comparator(Arc::new(|control: &T, candidate: &T| {
            Ok(control == candidate)
        }))
    }
}

impl<T: Send + Sync + 'static> Clone for Hooks<T> {
    fn clone(&self) -> Self {
        Self {
            run_if: Arc::clone(&self.run_if),
            before_run: Arc::clone(&self.before_run),
            compare: Arc::clone(&self.compare),
            ignores: self.ignores.clone(),
            clean: Arc::clone(&self.clean),
            publisher: Arc::clone(&self.publisher),
            reporter: Arc::clone(&self.reporter),
        }
    }
}
