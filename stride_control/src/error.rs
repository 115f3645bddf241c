//! Error types of the control core.
//!
//! Input-validation failures (planning, numeric domain) surface to the
//! caller immediately. Stale context and phase-ring eviction are not errors
//! here; they are absorbed and logged where they occur.

use thiserror::Error;

use stride_common::config::ConfigError;
use stride_common::walking::error::{CommandError, NumericDomainError, PlanningInputError};

use crate::context::handoff::{HandoffEvent, HandoffState};

/// A handoff event that is illegal in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("handoff event {event:?} rejected in state {state:?}: {reason}")]
pub struct HandoffError {
    pub event: HandoffEvent,
    pub state: HandoffState,
    pub reason: &'static str,
}

/// Any failure of one estimator or controller tick.
#[derive(Debug, Clone, Error)]
pub enum ControlError {
    #[error("planning input: {0}")]
    Planning(#[from] PlanningInputError),

    #[error("numeric domain: {0}")]
    Numeric(#[from] NumericDomainError),

    #[error("command aggregation: {0}")]
    Command(#[from] CommandError),

    #[error(transparent)]
    Handoff(#[from] HandoffError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ControlError {
    /// True for failures caused by the supplied plan or parameters rather
    /// than by the control core itself.
    pub const fn is_input_error(&self) -> bool {
        matches!(self, Self::Planning(_) | Self::Numeric(_) | Self::Config(_))
    }
}
