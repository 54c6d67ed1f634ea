//! # Behavior registry.
//!
//! [`Registry`] holds everything a run needs: the control, the candidates, the
//! hook set and the config. The owning [`Experiment`](crate::Experiment) keeps
//! it behind an `Arc`; every run takes a clone of that `Arc`, so in-flight runs
//! (including detached ones) keep reading the snapshot they started with.
//!
//! ## Rules
//! - Mutation goes through `Arc::make_mut`: it copies the registry only while a
//!   run still holds the previous snapshot.
//! - Registration order of candidates is kept; submission order is decided per run.

use crate::behaviors::{BehaviorRef, CONTROL};
use crate::config::Config;
use crate::error::ExperimentError;
use crate::hooks::Hooks;
use crate::results::Annotations;

/// Behaviors, hooks and configuration of one experiment.
pub(crate) struct Registry<T: Send + Sync + 'static> {
    pub(crate) name: String,
    pub(crate) annotations: Annotations,
    pub(crate) config: Config,
    pub(crate) control: Option<BehaviorRef<T>>,
    pub(crate) candidates: Vec<BehaviorRef<T>>,
    pub(crate) hooks: Hooks<T>,
}

impl<T: Send + Sync + 'static> Registry<T> {
    pub(crate) fn new(name: String, hooks: Hooks<T>) -> Self {
        Self {
            name,
            annotations: Annotations::new(),
            config: Config::default(),
            control: None,
            candidates: Vec::new(),
            hooks,
        }
    }

    /// Returns the control, or `BehaviorNotFound` naming the control slot.
    pub(crate) fn control(&self) -> Result<&BehaviorRef<T>, ExperimentError> {
        self.control
            .as_ref()
            .ok_or_else(|| ExperimentError::BehaviorNotFound {
                behavior: CONTROL.to_string(),
                experiment: self.name.clone(),
            })
    }

    /// Candidate names in registration order.
    pub(crate) fn candidate_names(&self) -> Vec<&str> {
        self.candidates.iter().map(|b| b.name()).collect()
    }
}

impl<T: Send + Sync + 'static> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            annotations: self.annotations.clone(),
            config: self.config.clone(),
            control: self.control.clone(),
            candidates: self.candidates.clone(),
            hooks: self.hooks.clone(),
        }
    }
}
