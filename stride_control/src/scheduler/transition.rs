//! Step transitions: lift-off / touch-down events at one instant.
//!
//! A [`StepTransition`] groups every per-side contact event that happens at
//! the same time. Transitions are emitted one event each, stably sorted,
//! then merged by [`collapse_transitions`] before phase construction.

use heapless::Vec as FixedVec;

use stride_common::consts::{MAX_EVENTS_PER_TRANSITION, MAX_STEP_TRANSITIONS};
use stride_common::walking::error::PlanningInputError;
use stride_common::walking::footstep::{FootPolygon, Pose};
use stride_common::walking::side::Side;

/// Contact change of a single foot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    LiftOff,
    TouchDown,
}

/// One foot's contact change, carrying the footstep's goal pose.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionEvent {
    pub side: Side,
    pub kind: TransitionKind,
    pub pose: Pose,
    /// Predicted sole polygon for a touch-down, if the planner supplied one.
    pub support: Option<FootPolygon>,
}

/// All contact events occurring at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct StepTransition {
    pub time: f64,
    pub events: FixedVec<TransitionEvent, MAX_EVENTS_PER_TRANSITION>,
}

impl StepTransition {
    /// Transition holding a single event.
    pub fn single(time: f64, event: TransitionEvent) -> Self {
        let mut events = FixedVec::new();
        // Capacity is at least one.
        let _ = events.push(event);
        Self { time, events }
    }

    /// Number of events of `kind`.
    pub fn count(&self, kind: TransitionKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }
}

/// Fixed-capacity transition list (one lift-off + one touch-down per footstep).
pub type TransitionList = FixedVec<StepTransition, MAX_STEP_TRANSITIONS>;

/// Merge neighbouring transitions closer than `epsilon` in time.
///
/// `list` must already be sorted by time. The merged transition keeps the
/// earliest time and the union of the events, in list order. Returns the
/// number of merges performed, i.e. how much `list.len()` decreased.
///
/// # Errors
/// `PlanningInputError::TooManySimultaneousEvents` if a merged transition
/// would exceed `MAX_EVENTS_PER_TRANSITION` events; `list` is left in a
/// partially merged but still sorted state.
pub fn collapse_transitions(
    list: &mut TransitionList,
    epsilon: f64,
) -> Result<usize, PlanningInputError> {
    if list.len() < 2 {
        return Ok(0);
    }

    let mut anchor = 0;
    let mut merges = 0;
    for i in 1..list.len() {
        if (list[i].time - list[anchor].time).abs() <= epsilon {
            let (head, tail) = list.split_at_mut(i);
            let target = &mut head[anchor];
            let time = target.time;
            for event in tail[0].events.iter() {
                target
                    .events
                    .push(event.clone())
                    .map_err(|_| PlanningInputError::TooManySimultaneousEvents { time })?;
            }
            merges += 1;
        } else {
            anchor += 1;
            list.swap(anchor, i);
        }
    }
    list.truncate(anchor + 1);
    Ok(merges)
}
