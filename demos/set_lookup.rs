//! # Example: set_lookup
//!
//! Compares a linear scan over a vector (control) with a `HashSet` lookup
//! (candidate), once synchronously and once with detached candidates.
//!
//! Demonstrates how to:
//! - Register a control and a candidate with [`Experiment::use_control`] / [`Experiment::try_candidate`].
//! - Attach annotations that publishers receive.
//! - Print results with the built-in [`LogPublisher`].
//! - Wait for a detached trial through a publisher signal.
//!
//! ## Flow
//! ```text
//! run(ctx)
//!   ├─► observe(control: vec scan)           caller's task
//!   ├─► sync:     trial inline ─► publish ─► return
//!   └─► detached: return ─► trial on tokio task ─► publish ─► signal
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=scientist=debug cargo run --example set_lookup --features logging
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use scientist::{
    BehaviorError, BoxError, Config, Experiment, ExperimentResult, LogPublisher, Publish,
};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const SIZE: usize = 10_000;
const NEEDLE: usize = SIZE - 1;

/// Forwards to [`LogPublisher`] and then signals completion.
struct Signalled {
    done: Arc<Notify>,
}

#[async_trait]
impl Publish<bool> for Signalled {
    async fn publish(&self, result: &ExperimentResult<bool>) -> Result<(), BoxError> {
        let out = LogPublisher.publish(result).await;
        self.done.notify_one();
        out
    }

    fn name(&self) -> &'static str {
        "signalled"
    }
}

/// Haystack as a vector and as a set.
type Data = Arc<(Vec<usize>, HashSet<usize>)>;

fn lookup_experiment(name: &str, run_type: &str, data: &Data) -> Experiment<bool> {
    let mut e = Experiment::new(name);

    let arr = Arc::clone(data);
    e.use_control(move |_ctx: CancellationToken| {
        let found = arr.0.iter().any(|&i| i == NEEDLE);
        async move { Ok::<_, BehaviorError>(found) }
    });

    let set = Arc::clone(data);
    e.try_candidate(move |_ctx: CancellationToken| {
        let found = set.1.contains(&NEEDLE);
        async move { Ok::<_, BehaviorError>(found) }
    });

    e.annotate("control", "array");
    e.annotate("candidate", "map");
    e.annotate("run_type", run_type);
    e
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let data = Arc::new(((0..SIZE).collect::<Vec<_>>(), (0..SIZE).collect::<HashSet<_>>()));

    // 1. Synchronous: the trial completes before run returns.
    let start = Instant::now();
    let mut sync =
        lookup_experiment("synchronous", "sync", &data).with_config(Config::synchronous());
    sync.publisher(LogPublisher);
    match sync.run(CancellationToken::new()).await {
        Ok(found) => println!("synchronous experiment returned: {found}"),
        Err(err) => println!("experiment error: {}", err.as_message()),
    }
    println!("synchronous elapsed: {:?}", start.elapsed());

    // 2. Detached: run returns the control value, the trial finishes later.
    let start = Instant::now();
    let done = Arc::new(Notify::new());
    let mut detached = lookup_experiment("detached", "detached", &data);
    detached.publisher(Signalled {
        done: Arc::clone(&done),
    });
    match detached.run(CancellationToken::new()).await {
        Ok(found) => {
            done.notified().await;
            println!("detached experiment returned: {found}");
        }
        Err(err) => println!("experiment error: {}", err.as_message()),
    }
    println!("detached elapsed: {:?}", start.elapsed());

    Ok(())
}
