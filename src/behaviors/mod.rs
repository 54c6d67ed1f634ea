//! # Behavior abstractions.
//!
//! This module provides the units of work an experiment runs:
//! - [`Behavior`] - trait for a named async code path producing a value or a fault
//! - [`BehaviorFn`] - closure-backed behavior implementation
//! - [`BehaviorRef`] - shared reference to a behavior (`Arc<dyn Behavior<T>>`)

mod behavior;
mod behavior_fn;

pub use behavior::{Behavior, BehaviorRef, BoxBehaviorFuture};
pub use behavior_fn::BehaviorFn;

/// Slot name of the control behavior.
pub const CONTROL: &str = "control";

/// Default name given to candidates registered without an explicit name.
pub const CANDIDATE: &str = "candidate";
