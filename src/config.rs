//! # Experiment configuration.
//!
//! Provides [`Config`] settings applied to every run of an
//! [`Experiment`](crate::Experiment), and [`RunMode`] selecting whether candidate
//! work finishes before `run` returns.
//!
//! Config is fixed before the first run; runs read it through the registry
//! snapshot they take at start.

/// When candidate work (dispatch, classification, publish, report) happens
/// relative to the return of [`Experiment::run`](crate::Experiment::run).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunMode {
    /// Candidates, classification and publishing complete on the caller's task
    /// before `run` returns.
    ///
    /// The trial belongs to the `run` future: dropping it early (for example
    /// under `tokio::time::timeout`) abandons the trial, and neither publish nor
    /// report is called for that run.
    Synchronous,

    /// Candidate work is handed to a spawned tokio task; `run` returns the
    /// control outcome immediately. Completion is only observable through the
    /// publish/report hooks. Dropping the `run` future after it returned the
    /// control outcome does not affect the trial.
    ///
    /// Outside a tokio runtime nothing can be spawned and the trial runs
    /// inline, as in [`RunMode::Synchronous`].
    #[default]
    Detached,
}

/// Per-experiment configuration.
///
/// ## Field semantics
/// - `mode`: synchronous or detached candidate execution
/// - `shuffle`: randomize candidate submission order on every run
#[derive(Clone, Debug)]
pub struct Config {
    /// Execution mode for candidate work.
    ///
    /// In [`RunMode::Detached`] the continuation is spawned on the current
    /// tokio runtime when there is one.
    pub mode: RunMode,

    /// Submit candidates in a uniformly shuffled order on every run.
    ///
    /// Shuffling avoids systematic bias between earlier and later candidates
    /// (cache warm-up, contention). Disable only to get deterministic
    /// submission order; completion order stays nondeterministic either way.
    pub shuffle: bool,
}

impl Config {
    /// Returns a config running in [`RunMode::Synchronous`].
    #[inline]
    pub fn synchronous() -> Self {
        Self {
            mode: RunMode::Synchronous,
            ..Self::default()
        }
    }

    /// True if candidate work completes before `run` returns.
    #[inline]
    pub fn is_synchronous(&self) -> bool {
        self.mode == RunMode::Synchronous
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `mode = RunMode::Detached` (never adds candidate latency to the caller)
    /// - `shuffle = true`
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            shuffle: true,
        }
    }
}
