//! Contact sequence scheduler.
//!
//! Turns the queued footstep plan into a time-ordered contact schedule:
//!
//! 1. [`ContactSequenceScheduler::update`] snapshots the live contact set
//!    and sole poses.
//! 2. [`ContactSequenceScheduler::compute_step_transitions`] emits one
//!    lift-off and one touch-down per pending footstep, stably sorts,
//!    collapses simultaneous events and drops anything in the past.
//! 3. [`ContactSequenceScheduler::compute_contact_phases`] walks the
//!    transitions and fills the look-ahead [`ContactPhaseRing`].
//! 4. [`ContactSequenceScheduler::advance`] keeps that ring across ticks:
//!    it retires consumed phases and appends new transitions, rebuilding
//!    only when the live contact set leaves the schedule.
//!
//! All working storage is fixed-capacity; a planning pass never allocates.

pub mod phase;
pub mod transition;

use heapless::Vec as FixedVec;
use nalgebra::Vector2;
use tracing::debug;

use stride_common::consts::{MAX_QUEUED_FOOTSTEPS, MAX_SUPPORT_VERTICES};
use stride_common::walking::config::{RobotConfig, SchedulerConfig};
use stride_common::walking::error::PlanningInputError;
use stride_common::walking::footstep::{
    insertion_sort_by, rectangular_foot, FootPolygon, Footstep, Pose, SupportPolygon,
};
use stride_common::walking::side::{FeetInContact, Side, SideMap};

pub use phase::{ContactPhase, ContactPhaseRing};
pub use transition::{
    collapse_transitions, StepTransition, TransitionEvent, TransitionKind, TransitionList,
};

// ─── Live Snapshot ──────────────────────────────────────────────────

/// Robot state captured by `update`; the first phase opens from it.
#[derive(Debug, Clone)]
struct LiveSnapshot {
    feet_in_contact: FeetInContact,
    sole_poses: SideMap<Pose>,
    time: f64,
}

/// Running contact state while walking the transitions.
#[derive(Debug, Clone)]
struct ContactCursor {
    feet: FeetInContact,
    poses: SideMap<Pose>,
    soles: SideMap<FootPolygon>,
}

impl ContactCursor {
    fn apply(&mut self, event: &TransitionEvent, default_sole: &FootPolygon) {
        match event.kind {
            TransitionKind::LiftOff => self.feet.remove_side(event.side),
            TransitionKind::TouchDown => {
                self.feet.insert_side(event.side);
                self.poses[event.side] = event.pose;
                self.soles[event.side] = event
                    .support
                    .as_ref()
                    .unwrap_or(default_sole)
                    .clone();
            }
        }
    }

    fn open_phase(&self, start_time: f64) -> ContactPhase {
        let feet = self.feet;
        let sole_poses = SideMap::from_fn(|side| {
            feet.contains_side(side).then_some(self.poses[side])
        });
        ContactPhase::open(feet, start_time, sole_poses, self.support_region())
    }

    fn support_region(&self) -> SupportPolygon {
        let mut points: FixedVec<Vector2<f64>, MAX_SUPPORT_VERTICES> = FixedVec::new();
        for side in self.feet.sides() {
            let pose = &self.poses[side];
            for vertex in self.soles[side].iter() {
                // Two soles of at most MAX_FOOT_VERTICES each always fit.
                let _ = points.push(pose.transform_point2(vertex));
            }
        }
        let mut region = SupportPolygon::new();
        region.set_convex_hull(&points);
        region
    }
}

// ─── Scheduler ──────────────────────────────────────────────────────

/// Contact sequence scheduler, owned by the controller task.
#[derive(Debug, Clone)]
pub struct ContactSequenceScheduler {
    config: SchedulerConfig,
    default_sole: FootPolygon,
    live: LiveSnapshot,
    transitions: TransitionList,
    raw_transition_count: usize,
    phases: ContactPhaseRing,
}

impl ContactSequenceScheduler {
    pub fn new(config: &SchedulerConfig, robot: &RobotConfig) -> Self {
        Self {
            config: config.clone(),
            default_sole: rectangular_foot(robot.foot_length, robot.foot_width),
            live: LiveSnapshot {
                feet_in_contact: FeetInContact::BOTH,
                sole_poses: SideMap::default(),
                time: 0.0,
            },
            transitions: TransitionList::new(),
            raw_transition_count: 0,
            phases: ContactPhaseRing::new(),
        }
    }

    /// Reset working state from the live robot.
    pub fn update(
        &mut self,
        feet_in_contact: FeetInContact,
        sole_poses: &SideMap<Pose>,
        current_time: f64,
    ) {
        self.live = LiveSnapshot {
            feet_in_contact,
            sole_poses: *sole_poses,
            time: current_time,
        };
        self.transitions.clear();
        self.raw_transition_count = 0;
    }

    /// Build the sorted, collapsed transition list for `footsteps`.
    ///
    /// Emits a lift-off for every footstep with `start_time >= current_time`
    /// and a touch-down for every footstep with `end_time >= current_time`.
    /// The input is never mutated; repeated calls with the same arguments
    /// give the same result.
    pub fn compute_step_transitions(
        &mut self,
        current_time: f64,
        footsteps: &[Footstep],
    ) -> Result<&[StepTransition], PlanningInputError> {
        self.transitions.clear();
        self.raw_transition_count = 0;

        if footsteps.len() > MAX_QUEUED_FOOTSTEPS {
            return Err(PlanningInputError::TooManyFootsteps {
                count: footsteps.len(),
                capacity: MAX_QUEUED_FOOTSTEPS,
            });
        }

        for step in footsteps {
            step.validate()?;
            let event = |kind: TransitionKind| TransitionEvent {
                side: step.side,
                kind,
                pose: step.goal_pose,
                support: match kind {
                    TransitionKind::TouchDown => step.predicted_support.clone(),
                    TransitionKind::LiftOff => None,
                },
            };
            // 2 * MAX_QUEUED_FOOTSTEPS slots: never full here.
            if step.start_time >= current_time {
                let _ = self.transitions.push(StepTransition::single(
                    step.start_time,
                    event(TransitionKind::LiftOff),
                ));
            }
            if step.end_time >= current_time {
                let _ = self.transitions.push(StepTransition::single(
                    step.end_time,
                    event(TransitionKind::TouchDown),
                ));
            }
        }
        self.raw_transition_count = self.transitions.len();

        insertion_sort_by(&mut self.transitions, |a, b| a.time < b.time);
        let merges = collapse_transitions(&mut self.transitions, self.config.transition_epsilon)?;
        if merges > 0 {
            debug!(merges, "collapsed simultaneous step transitions");
        }
        self.transitions.retain(|t| t.time >= current_time);

        Ok(&self.transitions)
    }

    /// Number of transitions emitted by the last pass, before collapsing.
    #[inline]
    pub fn raw_transition_count(&self) -> usize {
        self.raw_transition_count
    }

    /// Transitions from the last `compute_step_transitions` call.
    #[inline]
    pub fn transitions(&self) -> &[StepTransition] {
        &self.transitions
    }

    /// Build the look-ahead phase ring from `transitions`.
    ///
    /// The first phase opens at the `update` time with the live contact
    /// set. Each later transition closes the open phase and opens the next.
    /// Construction stops when the look-ahead is full or the transitions
    /// run out; the last phase stays open.
    ///
    /// # Errors
    /// `PlanningInputError::NoFeetInContact` for the first phase with both
    /// feet airborne. The ring is still populated so the offending plan can
    /// be inspected.
    pub fn compute_contact_phases(
        &mut self,
        transitions: &[StepTransition],
    ) -> Result<&ContactPhaseRing, PlanningInputError> {
        build_phases(
            &mut self.phases,
            &self.live,
            &self.default_sole,
            self.config.look_ahead_phases,
            transitions,
        )?;
        Ok(&self.phases)
    }

    /// Transitions then phases, in one call.
    pub fn plan(
        &mut self,
        current_time: f64,
        footsteps: &[Footstep],
    ) -> Result<&ContactPhaseRing, PlanningInputError> {
        self.compute_step_transitions(current_time, footsteps)?;
        build_phases(
            &mut self.phases,
            &self.live,
            &self.default_sole,
            self.config.look_ahead_phases,
            &self.transitions,
        )?;
        Ok(&self.phases)
    }

    /// Per-tick schedule maintenance for the running controller.
    ///
    /// Retires phases that ended by `current_time`. While the live contact
    /// set matches the scheduled phase at `current_time`, the ring is kept
    /// and extended up to the look-ahead with
    /// [`append_transition`](Self::append_transition). Otherwise (first
    /// tick, early touch-down, late lift-off) it is rebuilt from the live
    /// state as in [`plan`](Self::plan). `footsteps` must be the plan the
    /// ring was built from; call `plan` after changing it.
    pub fn advance(
        &mut self,
        current_time: f64,
        footsteps: &[Footstep],
    ) -> Result<&ContactPhaseRing, PlanningInputError> {
        self.compute_step_transitions(current_time, footsteps)?;
        self.retire_before(current_time);

        let on_schedule = self
            .phases
            .phase_at(current_time)
            .is_some_and(|phase| phase.feet_in_contact == self.live.feet_in_contact);
        if !on_schedule {
            debug!(
                time = current_time,
                "live contact off schedule, rebuilding contact phases"
            );
            build_phases(
                &mut self.phases,
                &self.live,
                &self.default_sole,
                self.config.look_ahead_phases,
                &self.transitions,
            )?;
            return Ok(&self.phases);
        }

        let look_ahead = self
            .config
            .look_ahead_phases
            .clamp(1, ContactPhaseRing::CAPACITY);
        while self.phases.len() < look_ahead {
            let Some(open_start) = self.phases.last().map(|p| p.start_time) else {
                break;
            };
            let Some(next) = self
                .transitions
                .iter()
                .find(|t| t.time > open_start)
                .cloned()
            else {
                break;
            };
            self.append_transition(&next)?;
        }
        Ok(&self.phases)
    }

    /// Extend the schedule with one more transition.
    ///
    /// Closes the open phase at `transition.time` and appends the resulting
    /// phase, evicting the oldest phase if the ring is full.
    pub fn append_transition(
        &mut self,
        transition: &StepTransition,
    ) -> Result<Option<ContactPhase>, PlanningInputError> {
        let mut cursor = match self.phases.last() {
            Some(open) => cursor_from_phase(open, &self.live, &self.default_sole),
            None => cursor_from_live(&self.live, &self.default_sole),
        };
        for event in transition.events.iter() {
            cursor.apply(event, &self.default_sole);
        }
        if let Some(open) = self.phases.last_mut() {
            open.end_time = transition.time;
        }
        let phase = cursor.open_phase(transition.time);
        let index = self.phases.len().min(ContactPhaseRing::CAPACITY - 1);
        let evicted = self.phases.push(phase);
        if cursor.feet.is_empty() {
            return Err(PlanningInputError::NoFeetInContact {
                phase_index: index,
                start_time: transition.time,
            });
        }
        Ok(evicted)
    }

    /// Drop phases that ended at or before `time`.
    pub fn retire_before(&mut self, time: f64) -> usize {
        self.phases.retire_before(time)
    }

    #[inline]
    pub fn phases(&self) -> &ContactPhaseRing {
        &self.phases
    }

    /// Contact set captured by the last `update`.
    #[inline]
    pub fn live_feet_in_contact(&self) -> FeetInContact {
        self.live.feet_in_contact
    }

    /// True if any transition is still pending.
    #[inline]
    pub fn has_pending_transitions(&self) -> bool {
        !self.transitions.is_empty()
    }
}

fn cursor_from_live(live: &LiveSnapshot, default_sole: &FootPolygon) -> ContactCursor {
    ContactCursor {
        feet: live.feet_in_contact,
        poses: live.sole_poses,
        soles: SideMap::from_fn(|_| default_sole.clone()),
    }
}

fn cursor_from_phase(
    phase: &ContactPhase,
    live: &LiveSnapshot,
    default_sole: &FootPolygon,
) -> ContactCursor {
    let mut cursor = cursor_from_live(live, default_sole);
    cursor.feet = phase.feet_in_contact;
    for side in Side::ALL {
        if let Some(pose) = phase.sole_poses[side] {
            cursor.poses[side] = pose;
        }
    }
    cursor
}

fn build_phases(
    phases: &mut ContactPhaseRing,
    live: &LiveSnapshot,
    default_sole: &FootPolygon,
    look_ahead: usize,
    transitions: &[StepTransition],
) -> Result<(), PlanningInputError> {
    let look_ahead = look_ahead.clamp(1, ContactPhaseRing::CAPACITY);
    let mut cursor = cursor_from_live(live, default_sole);

    phases.clear();
    phases.push(cursor.open_phase(live.time));

    for transition in transitions {
        let Some(open_start) = phases.last().map(|p| p.start_time) else {
            break;
        };
        if transition.time <= open_start {
            // Same instant as the open phase: amend it in place.
            for event in transition.events.iter() {
                cursor.apply(event, default_sole);
            }
            if let Some(open) = phases.last_mut() {
                *open = cursor.open_phase(open_start);
            }
            continue;
        }
        if phases.len() >= look_ahead {
            break;
        }
        for event in transition.events.iter() {
            cursor.apply(event, default_sole);
        }
        if let Some(open) = phases.last_mut() {
            open.end_time = transition.time;
        }
        phases.push(cursor.open_phase(transition.time));
    }

    match phases
        .iter()
        .enumerate()
        .find(|(_, p)| p.feet_in_contact.is_empty())
    {
        Some((phase_index, phase)) => Err(PlanningInputError::NoFeetInContact {
            phase_index,
            start_time: phase.start_time,
        }),
        None => Ok(()),
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
