//! # Example: custom_publisher
//!
//! Implements a [`Publish`] that keeps mismatch counters, together with an
//! ignore rule, a cleaner and a [`Report`] for hook faults.
//!
//! Shows how to:
//! - Implement the [`Publish`] trait and share its state with the caller.
//! - Register named candidates with [`Experiment::behavior`].
//! - Accept known differences with [`Experiment::ignore`].
//! - Receive operational errors through a custom [`Report`].
//!
//! ## Flow
//! ```text
//! run(ctx) ──► observe(control)
//!     └─► trial
//!           ├─► dispatch(candidates) ──► mpsc funnel
//!           ├─► classify (compare, ignore)
//!           ├─► Counters.publish(&result)
//!           └─► Tracing.report(&errors)      (only when a hook faulted)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example custom_publisher
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use scientist::{
    BehaviorError, BoxError, Config, Experiment, ExperimentResult, OperationError, Publish, Report,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Mismatch counters shared between the publisher and `main`.
#[derive(Default)]
struct Counters {
    runs: AtomicU64,
    matched: AtomicU64,
    ignored: AtomicU64,
    mismatched: AtomicU64,
}

struct CountingPublisher {
    counters: Arc<Counters>,
}

#[async_trait]
impl Publish<String> for CountingPublisher {
    async fn publish(&self, result: &ExperimentResult<String>) -> Result<(), BoxError> {
        self.counters.runs.fetch_add(1, Ordering::Relaxed);
        let c = &self.counters;
        c.matched.fetch_add(result.matched().count() as u64, Ordering::Relaxed);
        c.ignored.fetch_add(result.ignored().count() as u64, Ordering::Relaxed);
        c.mismatched.fetch_add(result.mismatched().count() as u64, Ordering::Relaxed);

        for obs in result.mismatched() {
            let control = result.cleaned_value(result.control()).transpose()?;
            let candidate = result.cleaned_value(obs).transpose()?;
            warn!(
                experiment = result.experiment(),
                candidate = obs.name(),
                ?control,
                ?candidate,
                fault = ?obs.fault().map(ToString::to_string),
                "mismatch"
            );
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

/// Sends hook faults to tracing instead of stderr.
struct TracingReporter;

impl Report for TracingReporter {
    fn report(&self, errors: &[OperationError]) {
        for err in errors {
            warn!(label = err.as_label(), "{}", err.as_message());
        }
    }
}

fn slugify_v1(title: &str) -> String {
    title
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

fn slugify_v2(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let counters = Arc::new(Counters::default());
    let titles = ["Hello World", "Rust: 2024 edition!", "  spaced   out  ", "Ünïcode Title"];

    for title in titles {
        let mut e = Experiment::<String>::new("slugify").with_config(Config::synchronous());

        let t = title.to_string();
        e.use_control(move |_ctx| {
            let slug = slugify_v1(&t);
            async move { Ok::<_, BehaviorError>(slug) }
        });
        let t = title.to_string();
        e.behavior("chars", move |_ctx| {
            let slug = slugify_v2(&t);
            async move { Ok::<_, BehaviorError>(slug) }
        });

        // Punctuation handling is an accepted difference.
        e.ignore(|control, candidate| {
            let strip = |s: &String| s.chars().filter(|c| c.is_alphanumeric()).collect::<String>();
            Ok(match (control.value(), candidate.value()) {
                (Some(c), Some(k)) => strip(c) == strip(k),
                _ => false,
            })
        });
        e.clean(|slug| Ok(slug.replace('-', " ")));
        e.publisher(CountingPublisher {
            counters: Arc::clone(&counters),
        });
        e.reporter(TracingReporter);

        let slug = e.run(CancellationToken::new()).await?;
        info!(title, slug = %slug, "control result");
    }

    info!(
        runs = counters.runs.load(Ordering::Relaxed),
        matched = counters.matched.load(Ordering::Relaxed),
        ignored = counters.ignored.load(Ordering::Relaxed),
        mismatched = counters.mismatched.load(Ordering::Relaxed),
        "experiment summary"
    );
    Ok(())
}
