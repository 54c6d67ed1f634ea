//! # Simple logging publisher for debugging and demos.
//!
//! [`LogPublisher`] prints every observation of a result to stdout.
//!
//! ## Output format
//! ```text
//! [experiment] name=lookup matched=false
//! [observation] name=control value=Some(true) fault=None duration=1.2ms class=Unclassified
//! [observation] name=candidate value=Some(false) fault=None duration=3µs class=Mismatched
//! [annotation] candidate="map"
//! [annotation] control="array"
//! ```

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::hooks::Publish;
use crate::results::{ExperimentResult, Observation};

/// Simple stdout publisher.
///
/// Enabled via the `logging` feature. Not intended for production use;
/// implement a custom [`Publish`] for metrics or structured logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPublisher;

impl LogPublisher {
    fn print_observation<T: Debug>(o: &Observation<T>) {
        println!(
            "[observation] name={} value={:?} fault={:?} duration={:?} class={:?}",
            o.name(),
            o.value(),
            o.fault().map(ToString::to_string),
            o.duration(),
            o.classification()
        );
    }
}

#[async_trait]
impl<T: Debug + Send + Sync + 'static> Publish<T> for LogPublisher {
    async fn publish(&self, r: &ExperimentResult<T>) -> Result<(), BoxError> {
        println!(
            "[experiment] name={} matched={}",
            r.experiment(),
            r.is_matched()
        );
        Self::print_observation(r.control());
        for o in r.candidates() {
            Self::print_observation(o);
        }
        for (key, value) in r.annotations() {
            println!("[annotation] {key}={value:?}");
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
