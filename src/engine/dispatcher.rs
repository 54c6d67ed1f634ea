//! # Candidate fan-out / fan-in.
//!
//! Runs every candidate on its own tokio task and funnels the finished
//! observations back to the single draining task.
//!
//! ## Architecture
//! ```text
//! dispatch(candidates)
//!   ├─► submission order (shuffled per run)
//!   ├─► spawn ─► observe(K1, detached token) ─► tx.send ──┐
//!   ├─► spawn ─► observe(K2, detached token) ─► tx.send ──┤  mpsc(capacity = N)
//!   └─► spawn ─► observe(KN, detached token) ─► tx.send ──┤
//!                                                          ▼
//!                      drain: rx.recv() until every sender is dropped
//! ```
//!
//! ## Rules
//! - Each task owns one sender clone; the channel closes exactly when the last
//!   task finished, so no separate counter is needed.
//! - Capacity equals the candidate count, so `send` never waits.
//! - The drainer is the only writer of the returned vector (completion order).
//! - Candidates get a fresh token that nobody cancels: cancelling the caller
//!   never reaches candidate work.
//! - Outside a tokio runtime nothing is spawned: candidates are polled together
//!   on the calling task.

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use rand::seq::SliceRandom;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::behaviors::BehaviorRef;
use crate::engine::observer::observe;
use crate::results::Observation;

/// Runs all candidates concurrently and returns their observations in completion order.
pub(crate) async fn dispatch<T: Send + 'static>(
    experiment: &str,
    candidates: &[BehaviorRef<T>],
    shuffle: bool,
) -> Vec<Observation<T>> {
    let order = submission_order(candidates, shuffle);
    let total = order.len();

    tracing::debug!(experiment, candidates = total, "dispatching candidates");
    if Handle::try_current().is_err() {
        return in_place(order).await;
    }

    let (tx, mut rx) = mpsc::channel::<Observation<T>>(total.max(1));
    for behavior in order {
        let tx = tx.clone();
        tokio::spawn(async move {
            let obs = observe(behavior.as_ref(), CancellationToken::new()).await;
            let _ = tx.send(obs).await;
        });
    }
    drop(tx);

    let mut finished = Vec::with_capacity(total);
    while let Some(obs) = rx.recv().await {
        finished.push(obs);
    }
    if finished.len() != total {
        tracing::error!(
            experiment,
            expected = total,
            received = finished.len(),
            "candidate task ended without an observation"
        );
    }
    finished
}

/// Polls all candidates concurrently on the current task, for callers outside
/// a tokio runtime. Observations are still returned in completion order.
async fn in_place<T: Send + 'static>(order: Vec<BehaviorRef<T>>) -> Vec<Observation<T>> {
    order
        .iter()
        .map(|behavior| observe(behavior.as_ref(), CancellationToken::new()))
        .collect::<FuturesUnordered<_>>()
        .collect()
        .await
}

/// Returns the candidates in the order they are submitted for this run.
fn submission_order<T>(candidates: &[BehaviorRef<T>], shuffle: bool) -> Vec<BehaviorRef<T>> {
    let mut order = candidates.to_vec();
    if shuffle {
        order.shuffle(&mut rand::rng());
    }
    order
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::Barrier;

    use super::*;
    use crate::behaviors::BehaviorFn;

    fn sleeper(name: &'static str, ms: u64) -> BehaviorRef<&'static str> {
        BehaviorFn::arc(name, move |_ctx: CancellationToken| async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(name)
        })
    }

    #[tokio::test]
    async fn empty_candidate_list_returns_nothing() {
        let out = dispatch::<u8>("empty", &[], true).await;
        assert!(out.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn results_arrive_in_completion_order() {
        let candidates = vec![sleeper("slow", 150), sleeper("fast", 1)];
        let out = dispatch("order", &candidates, false).await;

        let names: Vec<_> = out.iter().map(|o| o.name()).collect();
        assert_eq!(names, ["fast", "slow"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn candidates_run_concurrently() {
        // Both candidates only finish if they are in flight at the same time.
        let barrier = Arc::new(Barrier::new(2));
        let make = |name: &'static str| -> BehaviorRef<u8> {
            let barrier = Arc::clone(&barrier);
            BehaviorFn::arc(name, move |_ctx: CancellationToken| {
                let barrier = Arc::clone(&barrier);
                async move {
                    barrier.wait().await;
                    Ok(1)
                }
            })
        };

        let candidates = vec![make("a"), make("b")];
        let out = tokio::time::timeout(
            Duration::from_secs(5),
            dispatch("concurrent", &candidates, true),
        )
        .await
        .expect("candidates deadlocked");
        assert_eq!(out.len(), 2);
    }

    #[tokio::test]
    async fn candidates_get_a_detached_token() {
        let probe: BehaviorRef<bool> =
            BehaviorFn::arc("probe", |ctx: CancellationToken| async move {
                Ok(ctx.is_cancelled())
            });
        let out = dispatch("detached", &[probe], true).await;
        assert_eq!(out[0].value(), Some(&false));
    }

    #[tokio::test]
    async fn duplicate_names_each_produce_an_observation() {
        let candidates = vec![sleeper("dup", 1), sleeper("dup", 1), sleeper("dup", 1)];
        let out = dispatch("dups", &candidates, true).await;
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|o| o.name() == "dup"));
    }

    #[test]
    fn dispatch_outside_runtime_polls_in_place() {
        let ready = |name: &'static str| -> BehaviorRef<u8> {
            BehaviorFn::arc(name, |_ctx: CancellationToken| async { Ok(1) })
        };
        let candidates = vec![ready("a"), ready("b")];
        let out = futures::executor::block_on(dispatch("no-runtime", &candidates, false));

        let mut names: Vec<_> = out.iter().map(|o| o.name()).collect();
        names.sort_unstable();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn submission_order_is_a_permutation() {
        let candidates: Vec<_> = ["a", "b", "c", "d", "e"]
            .into_iter()
            .map(|n| sleeper(n, 0))
            .collect();

        let fixed = submission_order(&candidates, false);
        let names: Vec<_> = fixed.iter().map(|b| b.name()).collect();
        assert_eq!(names, ["a", "b", "c", "d", "e"]);

        let shuffled = submission_order(&candidates, true);
        let mut names: Vec<_> = shuffled.iter().map(|b| b.name()).collect();
        names.sort_unstable();
        assert_eq!(names, ["a", "b", "c", "d", "e"]);
    }
}
