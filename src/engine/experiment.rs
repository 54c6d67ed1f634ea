//! # Experiment: registration API and run state machine.
//!
//! An [`Experiment`] runs a trusted **control** behavior and any number of
//! **candidate** behaviors, compares them and publishes the comparison, while
//! the caller always receives exactly the control's outcome.
//!
//! ## Run state machine
//! ```text
//! run(ctx)
//!   ├─► control registered?           no  ─► Err(BehaviorNotFound)
//!   ├─► run_if()                      err ─► Err(RunIf)              (nothing executed)
//!   ├─► observe(control, ctx)         caller's token, always executed
//!   ├─► gate false or no candidates   ─► return control outcome
//!   └─► trial (inline or tokio::spawn per RunMode)
//!         ├─► before_run()            err ─► OperationError{before_run}, no candidates
//!         ├─► dispatch(candidates)    detached tokens, shuffled, completion order
//!         ├─► finalize()              matched / ignored / mismatched
//!         ├─► publish(&result)        err ─► OperationError{publish}
//!         └─► report(&errors)         only if errors non-empty
//!   return control outcome            (fixed before the trial started)
//! ```
//!
//! ## Rules
//! - Exactly one control observation per run; it is never altered by the trial.
//! - The control runs with the caller's [`CancellationToken`]; candidates never see it.
//! - `publish` and `report` are each invoked at most once per run.
//! - Panics anywhere in the run are contained: behaviors by the observer, hooks
//!   as hook faults, anything else by a last-resort barrier that logs a backtrace.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use scientist::{BehaviorError, Experiment, RunMode};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), scientist::ExperimentError> {
//!     let mut e = Experiment::<u64>::new("sum");
//!     e.set_mode(RunMode::Synchronous);
//!     e.use_control(|_ctx| async { Ok::<u64, BehaviorError>((1..=100).sum()) });
//!     e.try_candidate(|_ctx| async { Ok::<u64, BehaviorError>(100 * 101 / 2) });
//!     e.publish(|r| {
//!         assert!(r.is_matched());
//!         Ok(())
//!     });
//!
//!     assert_eq!(e.run(CancellationToken::new()).await?, 5050);
//!     Ok(())
//! }
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::behaviors::{BehaviorFn, BehaviorRef, CANDIDATE, CONTROL};
use crate::config::{Config, RunMode};
use crate::engine::barrier::{self, contain, panic_message};
use crate::engine::dispatcher::dispatch;
use crate::engine::observer::observe;
use crate::engine::registry::Registry;
use crate::error::{BehaviorError, BoxError, ExperimentError, OperationError, Stage};
use crate::hooks::{Hooks, Publish, PublishFn, Report, ReportFn};
use crate::results::{Annotations, ExperimentResult, Observation};

/// A control behavior, its candidates and the hooks deciding how they are compared.
///
/// Configure with the `&mut self` methods, then call [`run`](Self::run) any
/// number of times, including concurrently; each run produces its own result.
pub struct Experiment<T: Send + Sync + 'static> {
    registry: Arc<Registry<T>>,
}

impl<T: PartialEq + Clone + Send + Sync + 'static> Experiment<T> {
    /// Creates an experiment comparing values with `PartialEq`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_hooks(name, Hooks::default())
    }
}

impl<T: Clone + Send + Sync + 'static> Experiment<T> {
    /// Creates an experiment with a custom comparator, for value types without `PartialEq`.
    pub fn with_comparator<F>(name: impl Into<String>, compare: F) -> Self
    where
        F: Fn(&T, &T) -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        Self::from_hooks(name, Hooks::with_comparator(Arc::new(compare)))
    }

    fn from_hooks(name: impl Into<String>, hooks: Hooks<T>) -> Self {
        Self {
            registry: Arc::new(Registry::new(name.into(), hooks)),
        }
    }

    /// Returns the experiment with `config` applied.
    pub fn with_config(mut self, config: Config) -> Self {
        self.registry_mut().config = config;
        self
    }

    /// Experiment name.
    pub fn name(&self) -> &str {
        &self.registry.name
    }

    /// Current configuration.
    pub fn config(&self) -> &Config {
        &self.registry.config
    }

    /// Switches between synchronous and detached candidate execution.
    pub fn set_mode(&mut self, mode: RunMode) {
        self.registry_mut().config.mode = mode;
    }

    /// Enables or disables per-run shuffling of candidate submission order.
    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.registry_mut().config.shuffle = shuffle;
    }

    /// Attaches a free-form tag passed to publishers.
    pub fn annotate(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.registry_mut()
            .annotations
            .insert(key.into(), value.into());
    }

    /// Annotations attached so far.
    pub fn annotations(&self) -> &Annotations {
        &self.registry.annotations
    }

    /// Registers the control behavior, replacing any previous one.
    pub fn use_control<F, Fut>(&mut self, f: F)
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BehaviorError>> + Send + 'static,
    {
        self.registry_mut().control = Some(BehaviorFn::arc(CONTROL, f));
    }

    /// Registers a candidate named `"candidate"`.
    pub fn try_candidate<F, Fut>(&mut self, f: F)
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BehaviorError>> + Send + 'static,
    {
        self.behavior(CANDIDATE, f);
    }

    /// Registers a named candidate. Duplicate names are allowed; each one runs.
    pub fn behavior<F, Fut>(&mut self, name: impl Into<Cow<'static, str>>, f: F)
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BehaviorError>> + Send + 'static,
    {
        self.add_behavior(BehaviorFn::arc(name, f));
    }

    /// Registers a candidate implemented as a [`Behavior`](crate::Behavior).
    pub fn add_behavior(&mut self, behavior: BehaviorRef<T>) {
        self.registry_mut().candidates.push(behavior);
    }

    /// Number of registered candidates.
    pub fn candidate_count(&self) -> usize {
        self.registry.candidates.len()
    }

    /// Replaces the comparator.
    pub fn compare<F>(&mut self, f: F)
    where
        F: Fn(&T, &T) -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        self.registry_mut().hooks.compare = Arc::new(f);
    }

    /// Appends an ignore predicate; predicates run in registration order.
    pub fn ignore<F>(&mut self, f: F)
    where
        F: Fn(&Observation<T>, &Observation<T>) -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        self.registry_mut().hooks.ignores.push(Arc::new(f));
    }

    /// Replaces the gate deciding whether candidates run.
    pub fn run_if<F>(&mut self, f: F)
    where
        F: Fn() -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        self.registry_mut().hooks.run_if = Arc::new(f);
    }

    /// Replaces the hook run before candidates are dispatched.
    pub fn before_run<F>(&mut self, f: F)
    where
        F: Fn() -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.registry_mut().hooks.before_run = Arc::new(f);
    }

    /// Replaces the value cleaner used by [`ExperimentResult::cleaned_value`].
    pub fn clean<F>(&mut self, f: F)
    where
        F: Fn(&T) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.registry_mut().hooks.clean = Arc::new(f);
    }

    /// Replaces the publisher with a closure.
    pub fn publish<F>(&mut self, f: F)
    where
        F: Fn(&ExperimentResult<T>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.publisher(PublishFn::new(f));
    }

    /// Replaces the publisher.
    pub fn publisher(&mut self, publisher: impl Publish<T>) {
        self.registry_mut().hooks.publisher = Arc::new(publisher);
    }

    /// Replaces the error reporter with a closure.
    pub fn report_errors<F>(&mut self, f: F)
    where
        F: Fn(&[OperationError]) + Send + Sync + 'static,
    {
        self.reporter(ReportFn::new(f));
    }

    /// Replaces the error reporter.
    pub fn reporter(&mut self, reporter: impl Report) {
        self.registry_mut().hooks.reporter = Arc::new(reporter);
    }

    /// Runs the experiment and returns the control's outcome.
    ///
    /// ### Cancellation
    /// `ctx` is passed to the control only. Candidates get a token nobody
    /// cancels, and detached work is never aborted by the caller.
    ///
    /// ### Errors
    /// - [`ExperimentError::Behavior`]: the control's own fault.
    /// - [`ExperimentError::BehaviorNotFound`]: no control registered.
    /// - [`ExperimentError::RunIf`]: the gate faulted; nothing was executed.
    /// - [`ExperimentError::Internal`]: the engine panicked before the control finished.
    ///
    /// ### Runtime
    /// In [`RunMode::Detached`] the trial is spawned on the current tokio
    /// runtime. Polled outside of one, the trial runs inline instead (as in
    /// [`RunMode::Synchronous`]) and candidates are polled on the caller's task.
    pub async fn run(&self, ctx: CancellationToken) -> Result<T, ExperimentError> {
        let registry = Arc::clone(&self.registry);

        let gated = barrier::guard(&registry.name, control_phase(&registry, ctx)).await;
        let (enabled, control) = match gated {
            Ok(phase) => phase?,
            Err(message) => {
                return Err(ExperimentError::Internal {
                    experiment: registry.name.clone(),
                    message,
                });
            }
        };

        if !enabled || registry.candidates.is_empty() {
            tracing::debug!(
                experiment = %registry.name,
                enabled,
                candidates = registry.candidates.len(),
                "candidates skipped"
            );
            return control.into_outcome().map_err(ExperimentError::Behavior);
        }

        let result = ExperimentResult::new(
            registry.name.clone(),
            registry.annotations.clone(),
            control.clone(),
            Arc::clone(&registry.hooks.clean),
        );
        match registry.config.mode {
            RunMode::Synchronous => {
                let _ = barrier::guard(&registry.name, trial(Arc::clone(&registry), result)).await;
            }
            RunMode::Detached => match Handle::try_current() {
                Ok(handle) => {
                    let registry = Arc::clone(&registry);
                    handle.spawn(async move {
                        let name = registry.name.clone();
                        let _ = barrier::guard(&name, trial(registry, result)).await;
                    });
                }
                Err(_) => {
                    tracing::warn!(
                        experiment = %registry.name,
                        "no tokio runtime, running detached trial inline"
                    );
                    let _ =
                        barrier::guard(&registry.name, trial(Arc::clone(&registry), result)).await;
                }
            },
        }

        control.into_outcome().map_err(ExperimentError::Behavior)
    }

    fn registry_mut(&mut self) -> &mut Registry<T> {
        Arc::make_mut(&mut self.registry)
    }
}

impl<T: Send + Sync + 'static> fmt::Debug for Experiment<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Experiment")
            .field("name", &self.registry.name)
            .field("config", &self.registry.config)
            .field("has_control", &self.registry.control.is_some())
            .field("candidates", &self.registry.candidate_names())
            .field("annotations", &self.registry.annotations)
            .finish_non_exhaustive()
    }
}

/// Gate plus control observation: everything the caller waits for.
async fn control_phase<T: Send + Sync + 'static>(
    registry: &Registry<T>,
    ctx: CancellationToken,
) -> Result<(bool, Observation<T>), ExperimentError> {
    let control = registry.control()?;
    let enabled = contain(|| (registry.hooks.run_if)()).map_err(|err| {
        tracing::warn!(experiment = %registry.name, error = %err, "run_if failed");
        ExperimentError::RunIf(err)
    })?;

    let observation = observe(control.as_ref(), ctx).await;
    Ok((enabled, observation))
}

/// Candidate side of a run: dispatch, classify, publish, report.
async fn trial<T: Send + Sync + 'static>(
    registry: Arc<Registry<T>>,
    mut result: ExperimentResult<T>,
) {
    match contain(|| (registry.hooks.before_run)()) {
        Ok(()) => {
            result.candidates =
                dispatch(&registry.name, &registry.candidates, registry.config.shuffle).await;
        }
        Err(err) => result.push_error(Stage::BeforeRun, err),
    }

    result.finalize(&registry.hooks);

    let publisher = &registry.hooks.publisher;
    let published = AssertUnwindSafe(publisher.publish(&result))
        .catch_unwind()
        .await;
    match published {
        Ok(Ok(())) => {
            tracing::debug!(
                experiment = %registry.name,
                publisher = publisher.name(),
                matched = result.is_matched(),
                "result published"
            );
        }
        Ok(Err(err)) => result.push_error(Stage::Publish, err),
        Err(payload) => result.push_error(
            Stage::Publish,
            format!("publisher panicked: {}", panic_message(&*payload)).into(),
        ),
    }

    if !result.errors.is_empty() {
        registry.hooks.reporter.report(&result.errors);
    }
}

/// Creates an experiment, lets `setup` configure it, and runs it once.
///
/// A fault returned by `setup` is returned as [`ExperimentError::Setup`]
/// without running anything.
///
/// # Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use scientist::BehaviorError;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let v = scientist::run("answer", CancellationToken::new(), |e| {
///     e.use_control(|_ctx| async { Ok::<i32, BehaviorError>(42) });
///     e.try_candidate(|_ctx| async { Ok::<i32, BehaviorError>(6 * 7) });
///     Ok(())
/// })
/// .await;
/// assert_eq!(v.ok(), Some(42));
/// # }
/// ```
pub async fn run<T, F>(
    name: impl Into<String>,
    ctx: CancellationToken,
    setup: F,
) -> Result<T, ExperimentError>
where
    T: PartialEq + Clone + Send + Sync + 'static,
    F: FnOnce(&mut Experiment<T>) -> Result<(), BoxError>,
{
    let mut experiment = Experiment::new(name);
    setup(&mut experiment).map_err(ExperimentError::Setup)?;
    experiment.run(ctx).await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::sync::Notify;

    use super::*;

    fn sync_experiment(name: &str) -> Experiment<i32> {
        Experiment::new(name).with_config(Config::synchronous())
    }

    type Ready = std::future::Ready<Result<i32, BehaviorError>>;

    fn value(v: i32) -> impl Fn(CancellationToken) -> Ready + Send + Sync + 'static {
        move |_ctx| std::future::ready(Ok(v))
    }

    fn boom(msg: &'static str) -> impl Fn(CancellationToken) -> Ready + Send + Sync + 'static {
        move |_ctx| panic!("{msg}")
    }

    fn fault(msg: &'static str) -> impl Fn(CancellationToken) -> Ready + Send + Sync + 'static {
        move |_ctx| std::future::ready(Err(BehaviorError::new(msg)))
    }

    /// Records every published result as `(matched, mismatched names)`.
    fn recording(e: &mut Experiment<i32>) -> Arc<Mutex<Vec<(bool, Vec<String>)>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        e.publish(move |r| {
            let mismatched = r.mismatched().map(|o| o.name().to_string()).collect();
            sink.lock().unwrap().push((r.is_matched(), mismatched));
            Ok(())
        });
        seen
    }

    #[tokio::test]
    async fn matching_candidate_is_published_as_match() {
        let mut e = sync_experiment("match");
        e.use_control(value(1));
        e.try_candidate(value(1));
        let seen = recording(&mut e);

        assert_eq!(e.run(CancellationToken::new()).await.ok(), Some(1));
        assert_eq!(*seen.lock().unwrap(), [(true, vec![])]);
    }

    #[tokio::test]
    async fn mismatching_candidate_returns_control_value() {
        let mut e = sync_experiment("mismatch");
        e.use_control(value(1));
        e.try_candidate(value(2));
        let seen = recording(&mut e);

        assert_eq!(e.run(CancellationToken::new()).await.ok(), Some(1));
        assert_eq!(*seen.lock().unwrap(), [(false, vec!["candidate".to_string()])]);
    }

    #[tokio::test]
    async fn hooks_run_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut e = sync_experiment("order");
        e.use_control(value(1));
        e.try_candidate(value(1));
        {
            let order = Arc::clone(&order);
            e.run_if(move || {
                order.lock().unwrap().push("run_if");
                Ok(true)
            });
        }
        {
            let order = Arc::clone(&order);
            e.before_run(move || {
                order.lock().unwrap().push("before_run");
                Ok(())
            });
        }
        {
            let order = Arc::clone(&order);
            e.publish(move |_| {
                order.lock().unwrap().push("publish");
                Ok(())
            });
        }

        e.run(CancellationToken::new()).await.unwrap();
        assert_eq!(*order.lock().unwrap(), ["run_if", "before_run", "publish"]);
    }

    #[tokio::test]
    async fn disabled_gate_skips_candidates() {
        let before = Arc::new(AtomicBool::new(false));
        let mut e = sync_experiment("disabled");
        e.use_control(value(1));
        e.try_candidate(boom("candidate must not run"));
        e.run_if(|| Ok(false));
        {
            let before = Arc::clone(&before);
            e.before_run(move || {
                before.store(true, Ordering::SeqCst);
                Ok(())
            });
        }
        let seen = recording(&mut e);

        assert_eq!(e.run(CancellationToken::new()).await.ok(), Some(1));
        assert!(!before.load(Ordering::SeqCst));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_candidates_means_no_publish() {
        let mut e = sync_experiment("solo");
        e.use_control(value(4));
        let seen = recording(&mut e);

        assert_eq!(e.run(CancellationToken::new()).await.ok(), Some(4));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn run_if_fault_is_returned_and_not_reported() {
        let control_ran = Arc::new(AtomicBool::new(false));
        let reports = Arc::new(AtomicUsize::new(0));
        let mut e = sync_experiment("gate");
        {
            let control_ran = Arc::clone(&control_ran);
            e.use_control(move |_ctx| {
                control_ran.store(true, Ordering::SeqCst);
                std::future::ready(Ok(1))
            });
        }
        e.try_candidate(value(1));
        e.run_if(|| Err("run_if".into()));
        {
            let reports = Arc::clone(&reports);
            e.report_errors(move |_| {
                reports.fetch_add(1, Ordering::SeqCst);
            });
        }
        let seen = recording(&mut e);

        let err = e.run(CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "run_if");
        assert_eq!(err.as_label(), "experiment_run_if");
        assert!(!control_ran.load(Ordering::SeqCst));
        assert_eq!(reports.load(Ordering::SeqCst), 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn custom_compare_overrides_equality() {
        let mut e = sync_experiment("compare");
        e.use_control(value(1));
        e.try_candidate(value(2));
        e.compare(|_, _| Ok(true));
        let seen = recording(&mut e);

        e.run(CancellationToken::new()).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), [(true, vec![])]);
    }

    #[tokio::test]
    async fn candidate_fault_against_control_value_mismatches() {
        let mut e = sync_experiment("one-sided");
        e.use_control(value(1));
        e.try_candidate(fault("candidate"));
        let seen = recording(&mut e);

        assert_eq!(e.run(CancellationToken::new()).await.ok(), Some(1));
        assert_eq!(*seen.lock().unwrap(), [(false, vec!["candidate".to_string()])]);
    }

    #[tokio::test]
    async fn equal_faults_match_and_control_fault_is_returned() {
        let mut e = sync_experiment("both-fail");
        e.use_control(fault("same"));
        e.try_candidate(fault("same"));
        let seen = recording(&mut e);

        let err = e.run(CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "same");
        assert!(err.as_behavior().is_some());
        assert_eq!(*seen.lock().unwrap(), [(true, vec![])]);
    }

    #[tokio::test]
    async fn missing_control_is_reported_to_caller() {
        let mut e = sync_experiment("no-control");
        e.try_candidate(value(1));

        match e.run(CancellationToken::new()).await {
            Err(ExperimentError::BehaviorNotFound {
                behavior,
                experiment,
            }) => {
                assert_eq!(behavior, "control");
                assert_eq!(experiment, "no-control");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn last_control_registration_wins() {
        let mut e = sync_experiment("replace");
        e.use_control(value(1));
        e.use_control(value(2));
        assert_eq!(e.run(CancellationToken::new()).await.ok(), Some(2));
    }

    #[tokio::test]
    async fn annotations_reach_the_publisher() {
        let got = Arc::new(Mutex::new(Annotations::new()));
        let mut e = sync_experiment("annotated");
        e.use_control(value(1));
        e.try_candidate(value(1));
        e.annotate("run_type", "sync");
        {
            let got = Arc::clone(&got);
            e.publish(move |r| {
                *got.lock().unwrap() = r.annotations().clone();
                Ok(())
            });
        }

        e.run(CancellationToken::new()).await.unwrap();
        assert_eq!(
            got.lock().unwrap().get("run_type").map(String::as_str),
            Some("sync")
        );
    }

    #[tokio::test]
    async fn control_panic_is_returned_as_fault() {
        let mut e = sync_experiment("panicky");
        e.use_control(boom("control blew up"));

        let err = e.run(CancellationToken::new()).await.unwrap_err();
        let fault = err.as_behavior().expect("behavior fault");
        assert!(fault.is_panic());
        assert_eq!(
            fault.to_string(),
            "recover from bad behavior control: control blew up"
        );
    }

    #[tokio::test]
    async fn candidate_panic_is_contained() {
        let mut e = sync_experiment("candidate-panic");
        e.use_control(value(1));
        e.try_candidate(boom("candidate blew up"));
        let seen = recording(&mut e);

        assert_eq!(e.run(CancellationToken::new()).await.ok(), Some(1));
        assert_eq!(*seen.lock().unwrap(), [(false, vec!["candidate".to_string()])]);
    }

    #[tokio::test]
    async fn only_the_control_sees_the_caller_token() {
        let candidate_saw_cancel = Arc::new(Mutex::new(None));
        let mut e = Experiment::<bool>::new("tokens").with_config(Config::synchronous());
        e.use_control(|ctx| std::future::ready(Ok(ctx.is_cancelled())));
        {
            let seen = Arc::clone(&candidate_saw_cancel);
            e.try_candidate(move |ctx| {
                *seen.lock().unwrap() = Some(ctx.is_cancelled());
                std::future::ready(Ok(ctx.is_cancelled()))
            });
        }

        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(e.run(token).await.ok(), Some(true));
        assert_eq!(*candidate_saw_cancel.lock().unwrap(), Some(false));
    }

    #[tokio::test]
    async fn panicking_reporter_does_not_reach_caller() {
        let mut e = sync_experiment("bad-reporter");
        e.use_control(value(1));
        e.try_candidate(value(1));
        e.publish(|_| Err("publish".into()));
        e.report_errors(|_| panic!("reporter blew up"));

        assert_eq!(e.run(CancellationToken::new()).await.ok(), Some(1));
    }

    #[tokio::test]
    async fn hook_faults_are_reported_once_per_run() {
        let reported = Arc::new(Mutex::new(Vec::new()));
        let mut e = sync_experiment("faults");
        e.use_control(value(1));
        e.try_candidate(value(2));
        e.before_run(|| Err("before".into()));
        e.publish(|_| Err("publish".into()));
        {
            let reported = Arc::clone(&reported);
            e.report_errors(move |errs| {
                reported
                    .lock()
                    .unwrap()
                    .push(errs.iter().map(|e| e.stage).collect::<Vec<_>>());
            });
        }

        e.run(CancellationToken::new()).await.unwrap();
        assert_eq!(
            *reported.lock().unwrap(),
            [vec![Stage::BeforeRun, Stage::Publish]]
        );
    }

    #[tokio::test]
    async fn cleaner_is_applied_on_demand() {
        let cleaned = Arc::new(Mutex::new(Vec::new()));
        let mut e = sync_experiment("clean");
        e.use_control(value(3));
        e.try_candidate(value(3));
        e.clean(|v| Ok(v * 100));
        {
            let cleaned = Arc::clone(&cleaned);
            e.publish(move |r| {
                let v = r.cleaned_value(r.control()).transpose()?;
                cleaned.lock().unwrap().push(v);
                Ok(())
            });
        }

        e.run(CancellationToken::new()).await.unwrap();
        assert_eq!(*cleaned.lock().unwrap(), [Some(300)]);
    }

    #[tokio::test]
    async fn detached_run_returns_before_candidates_finish() {
        let release = Arc::new(Notify::new());
        let published = Arc::new(Notify::new());
        let mut e = Experiment::<i32>::new("detached");
        e.use_control(value(1));
        {
            let release = Arc::clone(&release);
            e.try_candidate(move |_ctx| {
                let release = Arc::clone(&release);
                async move {
                    release.notified().await;
                    Ok(1)
                }
            });
        }
        {
            let published = Arc::clone(&published);
            e.publish(move |_| {
                published.notify_one();
                Ok(())
            });
        }

        assert_eq!(e.run(CancellationToken::new()).await.ok(), Some(1));
        release.notify_one();
        tokio::time::timeout(Duration::from_secs(5), published.notified())
            .await
            .expect("detached trial never published");
    }

    #[tokio::test]
    async fn dropped_synchronous_run_abandons_the_trial() {
        let published = Arc::new(AtomicUsize::new(0));
        let mut e = sync_experiment("dropped");
        e.use_control(value(1));
        e.try_candidate(|_ctx| async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, BehaviorError>(1)
        });
        {
            let published = Arc::clone(&published);
            e.publish(move |_| {
                published.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        let out = tokio::time::timeout(Duration::from_millis(50), e.run(CancellationToken::new()));
        assert!(out.await.is_err());
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(published.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn detached_run_without_runtime_completes_inline() {
        let mut e = Experiment::<i32>::new("no-runtime");
        e.use_control(value(1));
        e.try_candidate(value(2));
        e.behavior("same", value(1));
        let seen = recording(&mut e);

        let out = futures::executor::block_on(e.run(CancellationToken::new()));
        assert_eq!(out.ok(), Some(1));
        assert_eq!(*seen.lock().unwrap(), [(false, vec!["candidate".to_string()])]);
    }

    #[tokio::test]
    async fn run_helper_propagates_setup_fault() {
        let err = run("setup", CancellationToken::new(), |_: &mut Experiment<i32>| {
            Err("bad setup".into())
        })
        .await
        .unwrap_err();
        assert_eq!(err.as_label(), "experiment_setup");
        assert_eq!(err.to_string(), "bad setup");
    }
}
