//! # Observe a single behavior execution.
//!
//! Executes one [`Behavior`] and captures its outcome as an [`Observation`].
//!
//! ## Rules
//! - `started_at` is taken before the behavior is invoked, `duration` right after
//!   it settles; nothing else is inside the measured window.
//! - A panic while creating **or** polling the behavior's future is caught and
//!   stored as [`BehaviorError::Panicked`], tagged with the behavior name.
//! - The observer itself never panics, so sibling behaviors are unaffected.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Instant, SystemTime};

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::behaviors::Behavior;
use crate::engine::barrier::panic_message;
use crate::error::BehaviorError;
use crate::results::Observation;

/// Runs `behavior` once with `ctx` and records the outcome.
pub(crate) async fn observe<T: 'static>(
    behavior: &dyn Behavior<T>,
    ctx: CancellationToken,
) -> Observation<T> {
    let name = behavior.name();
    let started_at = SystemTime::now();
    let clock = Instant::now();

    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| behavior.spawn(ctx))) {
        Ok(fut) => match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(res) => res,
            Err(payload) => Err(panicked(name, &*payload)),
        },
        Err(payload) => Err(panicked(name, &*payload)),
    };
    let duration = clock.elapsed();

    tracing::debug!(
        behavior = name,
        ok = outcome.is_ok(),
        elapsed_us = duration.as_micros() as u64,
        "behavior observed"
    );
    Observation::new(name, started_at, duration, outcome)
}

fn panicked(name: &str, payload: &(dyn std::any::Any + Send)) -> BehaviorError {
    BehaviorError::Panicked {
        behavior: name.to_string(),
        message: panic_message(payload),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::behaviors::{BehaviorFn, BehaviorRef, BoxBehaviorFuture};

    #[tokio::test]
    async fn captures_value_and_timing() {
        let b: BehaviorRef<u32> = BehaviorFn::arc("slow", |_ctx: CancellationToken| async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(4)
        });

        let obs = observe(b.as_ref(), CancellationToken::new()).await;
        assert_eq!(obs.name(), "slow");
        assert_eq!(obs.value(), Some(&4));
        assert!(obs.fault().is_none());
        assert!(obs.duration() >= Duration::from_millis(20));
        assert!(obs.started_at() <= SystemTime::now());
    }

    #[tokio::test]
    async fn captures_returned_fault() {
        let b: BehaviorRef<u32> = BehaviorFn::arc("failing", |_ctx: CancellationToken| async {
            Err(BehaviorError::new("no rows"))
        });

        let obs = observe(b.as_ref(), CancellationToken::new()).await;
        assert_eq!(obs.fault().map(ToString::to_string).as_deref(), Some("no rows"));
        assert!(!obs.fault().is_some_and(BehaviorError::is_panic));
    }

    #[tokio::test]
    async fn contains_panic_inside_future() {
        let b: BehaviorRef<u32> = BehaviorFn::arc("bad", |_ctx: CancellationToken| async {
            let v: Vec<u32> = Vec::new();
            Ok(v[3])
        });

        let obs = observe(b.as_ref(), CancellationToken::new()).await;
        let fault = obs.fault().expect("panic is stored as fault");
        assert!(fault.is_panic());
        assert!(fault.to_string().starts_with("recover from bad behavior bad:"));
    }

    struct PanicsOnSpawn;

    impl Behavior<u32> for PanicsOnSpawn {
        fn name(&self) -> &str {
            "eager"
        }

        fn spawn(&self, _ctx: CancellationToken) -> BoxBehaviorFuture<u32> {
            panic!("refused to start")
        }
    }

    #[tokio::test]
    async fn contains_panic_while_spawning() {
        let obs = observe::<u32>(&PanicsOnSpawn, CancellationToken::new()).await;
        assert_eq!(
            obs.fault().map(ToString::to_string).as_deref(),
            Some("recover from bad behavior eager: refused to start")
        );
    }

    #[tokio::test]
    async fn observes_owned_heap_values() {
        let b: BehaviorRef<Vec<String>> =
            BehaviorFn::arc("owned", |_ctx: CancellationToken| async {
                Ok(vec!["a".to_string(), "b".to_string()])
            });

        let obs = observe(b.as_ref(), CancellationToken::new()).await;
        assert_eq!(obs.value().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn forwards_the_given_token() {
        let b: BehaviorRef<bool> = BehaviorFn::arc("probe", |ctx: CancellationToken| async move {
            Ok(ctx.is_cancelled())
        });

        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(observe(b.as_ref(), token).await.value(), Some(&true));
        assert_eq!(
            observe(b.as_ref(), CancellationToken::new()).await.value(),
            Some(&false)
        );
    }
}
