//! # Run outcomes.
//!
//! - [`Observation`] - captured outcome (value or fault, timing) of one behavior execution
//! - [`Classification`] - bucket a candidate observation ends up in
//! - [`ExperimentResult`] - control observation, classified candidates and operational errors of one run

mod observation;
mod result;

pub use observation::{Classification, Observation};
pub use result::{Annotations, ExperimentResult};
