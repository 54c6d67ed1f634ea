//! # Example: detached
//!
//! Shows that detached candidates never add latency to the caller and never
//! see the caller's cancellation.
//!
//! Demonstrates how to:
//! - Run an experiment in the default [`RunMode::Detached`].
//! - Cancel the caller's token: the control observes it, candidates do not.
//! - Use a `oneshot` channel inside the publisher as the completion signal.
//!
//! ## Flow
//! ```text
//! run(ctx) ──► control (sees ctx) ──► return immediately
//!                  │
//!                  └─► tokio::spawn(trial)
//!                         ├─► "slow" candidate (300ms, fresh token)
//!                         └─► publish ──► oneshot ──► main
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=scientist=debug cargo run --example detached
//! ```

use std::sync::Mutex;
use std::time::{Duration, Instant};

use scientist::{BehaviorError, Experiment, RunMode};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut e = Experiment::<&'static str>::new("cancellation");
    assert_eq!(e.config().mode, RunMode::Detached);

    e.use_control(|ctx: CancellationToken| async move {
        if ctx.is_cancelled() {
            return Ok::<_, BehaviorError>("control: cancelled");
        }
        Ok("control: running")
    });
    e.behavior("slow", |ctx: CancellationToken| async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        if ctx.is_cancelled() {
            return Ok::<_, BehaviorError>("slow: cancelled");
        }
        Ok("slow: finished")
    });

    let (tx, rx) = oneshot::channel();
    let tx = Mutex::new(Some(tx));
    e.publish(move |r| {
        let line = r
            .candidates()
            .iter()
            .map(|o| format!("{}={:?} in {:?}", o.name(), o.value(), o.duration()))
            .collect::<Vec<_>>()
            .join(", ");
        if let Some(tx) = tx.lock().map_err(|_| "signal lock poisoned")?.take() {
            let _ = tx.send(line);
        }
        Ok(())
    });

    let ctx = CancellationToken::new();
    ctx.cancel();

    let start = Instant::now();
    let value = e.run(ctx).await?;
    println!("run returned {value:?} after {:?}", start.elapsed());

    let published = rx.await?;
    println!("published after {:?}: {published}", start.elapsed());
    Ok(())
}
