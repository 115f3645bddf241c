//! Estimator/controller handoff state machine.
//!
//! AwaitingEstimate → EstimateReady → ControlReady → AwaitingEstimate.
//!
//! The estimator never waits for the controller: `BeginEstimate` is legal
//! from every state. The controller may consume the same estimate more
//! than once (`ControlWritten` from `ControlReady`).

/// Handoff state of one context instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandoffState {
    /// Estimator is writing a new estimate.
    #[default]
    AwaitingEstimate,
    /// Estimate complete; controller may consume it.
    EstimateReady,
    /// Controller wrote its desired outputs for the current estimate.
    ControlReady,
}

/// Handoff event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffEvent {
    /// Estimator starts a new cycle.
    BeginEstimate,
    /// Estimator wrote timestamp and sensor blocks.
    EstimateWritten,
    /// Controller wrote desired outputs.
    ControlWritten,
}

/// Result of a handoff transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition succeeded; carries the new state.
    Ok(HandoffState),
    /// Transition rejected, with the reason.
    Rejected(&'static str),
}

impl TransitionResult {
    #[inline]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct HandoffStateMachine {
    state: HandoffState,
}

impl HandoffStateMachine {
    pub const fn new() -> Self {
        Self {
            state: HandoffState::AwaitingEstimate,
        }
    }

    #[inline]
    pub const fn state(&self) -> HandoffState {
        self.state
    }

    pub fn handle_event(&mut self, event: HandoffEvent) -> TransitionResult {
        use HandoffEvent::*;
        use HandoffState::*;

        let next = match (self.state, event) {
            (_, BeginEstimate) => AwaitingEstimate,

            (AwaitingEstimate | EstimateReady, EstimateWritten) => EstimateReady,

            // Repeated consumption of one estimate is legal.
            (EstimateReady | ControlReady, ControlWritten) => ControlReady,

            _ => return TransitionResult::Rejected(invalid_transition_reason(self.state, event)),
        };

        self.state = next;
        TransitionResult::Ok(next)
    }

    /// True once an estimate is available to the controller.
    #[inline]
    pub const fn has_estimate(&self) -> bool {
        matches!(
            self.state,
            HandoffState::EstimateReady | HandoffState::ControlReady
        )
    }
}

fn invalid_transition_reason(state: HandoffState, event: HandoffEvent) -> &'static str {
    use HandoffEvent::*;
    use HandoffState::*;
    match (state, event) {
        (ControlReady, EstimateWritten) => {
            "ControlReady: estimate must begin with BeginEstimate"
        }
        (AwaitingEstimate, ControlWritten) => "AwaitingEstimate: no estimate to control from",
        _ => "invalid event for current state",
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
