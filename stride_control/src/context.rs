//! Real-time context handoff between the estimator and controller tasks.
//!
//! Each task owns a private [`RealTimeContext`]. Contexts cross task
//! boundaries only by deep copy through a [`ContextExchange`] pair; the
//! handoff state machine tracks where a context is in the
//! estimate → control cycle. The exchange never blocks: a controller that
//! runs faster than the estimator simply reuses the last estimate.

pub mod exchange;
pub mod handoff;

use tracing::debug;

use stride_common::walking::context::RealTimeContextData;

use crate::error::HandoffError;

pub use exchange::{ContextExchange, ContextFreshness, ContextPublisher, ContextSubscriber};
pub use handoff::{HandoffEvent, HandoffState, HandoffStateMachine, TransitionResult};

/// Which periodic task owns a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRole {
    Estimator,
    Controller,
}

/// Per-task context: working data, an inbound scratch buffer and the
/// handoff state.
#[derive(Debug, Clone)]
pub struct RealTimeContext {
    role: TaskRole,
    data: RealTimeContextData,
    inbox: RealTimeContextData,
    handoff: HandoffStateMachine,
}

impl RealTimeContext {
    pub fn new(role: TaskRole, initial: RealTimeContextData) -> Self {
        Self {
            role,
            inbox: initial.clone(),
            data: initial,
            handoff: HandoffStateMachine::new(),
        }
    }

    #[inline]
    pub fn role(&self) -> TaskRole {
        self.role
    }

    #[inline]
    pub fn data(&self) -> &RealTimeContextData {
        &self.data
    }

    /// Mutable access for the owning task to fill its own field group.
    #[inline]
    pub fn data_mut(&mut self) -> &mut RealTimeContextData {
        &mut self.data
    }

    #[inline]
    pub fn state(&self) -> HandoffState {
        self.handoff.state()
    }

    // ─── Estimator side ─────────────────────────────────────────────

    /// Start a new estimate. Always legal: the estimator does not wait for
    /// the controller.
    pub fn begin_estimate(&mut self, timestamp_ns: i64) -> Result<(), HandoffError> {
        self.require_role(TaskRole::Estimator, HandoffEvent::BeginEstimate)?;
        self.apply(HandoffEvent::BeginEstimate)?;
        self.data.timestamp = timestamp_ns;
        self.data.estimator_ran = false;
        Ok(())
    }

    /// Mark the estimate complete and deep-copy it to the controller.
    pub fn publish_estimate(
        &mut self,
        publisher: &mut ContextPublisher<RealTimeContextData>,
    ) -> Result<u64, HandoffError> {
        self.require_role(TaskRole::Estimator, HandoffEvent::EstimateWritten)?;
        self.apply(HandoffEvent::EstimateWritten)?;
        self.data.estimator_ran = true;
        Ok(publisher.publish(&self.data))
    }

    /// Pull the controller's latest desired outputs into this context.
    /// Only the controller-owned field group is taken.
    pub fn ingest_control(
        &mut self,
        subscriber: &mut ContextSubscriber<RealTimeContextData>,
    ) -> ContextFreshness {
        let freshness = subscriber.read_into(&mut self.inbox);
        if freshness.has_data() && self.inbox.controller_ran {
            self.data.copy_control_from(&self.inbox);
        }
        freshness
    }

    // ─── Controller side ────────────────────────────────────────────

    /// Pull the latest estimate into this context. Only the
    /// estimator-owned field group is taken; controller outputs stay.
    ///
    /// A fresh estimate moves the context to `EstimateReady`. Repeated or
    /// stale reads leave the state as is, so the controller may run again
    /// on the estimate it already has.
    pub fn consume_estimate(
        &mut self,
        subscriber: &mut ContextSubscriber<RealTimeContextData>,
    ) -> Result<ContextFreshness, HandoffError> {
        self.require_role(TaskRole::Controller, HandoffEvent::EstimateWritten)?;
        let freshness = subscriber.read_into(&mut self.inbox);
        match freshness {
            ContextFreshness::Fresh { sequence, skipped } => {
                self.data.copy_estimate_from(&self.inbox);
                self.apply(HandoffEvent::BeginEstimate)?;
                if self.data.estimator_ran {
                    self.apply(HandoffEvent::EstimateWritten)?;
                }
                if skipped > 0 {
                    debug!(sequence, skipped, "controller skipped estimates");
                }
            }
            ContextFreshness::Repeated { .. } | ContextFreshness::Stale { .. } => {
                self.data.copy_estimate_from(&self.inbox);
            }
            ContextFreshness::NoData => {}
        }
        Ok(freshness)
    }

    /// True once an estimate is available for control.
    #[inline]
    pub fn has_estimate(&self) -> bool {
        self.handoff.has_estimate()
    }

    /// Mark the desired outputs written and deep-copy them to the
    /// estimator. Rejected before the first estimate arrives.
    pub fn publish_control(
        &mut self,
        publisher: &mut ContextPublisher<RealTimeContextData>,
    ) -> Result<u64, HandoffError> {
        self.require_role(TaskRole::Controller, HandoffEvent::ControlWritten)?;
        self.apply(HandoffEvent::ControlWritten)?;
        self.data.controller_ran = true;
        Ok(publisher.publish(&self.data))
    }

    // ─── Internals ──────────────────────────────────────────────────

    fn apply(&mut self, event: HandoffEvent) -> Result<HandoffState, HandoffError> {
        let state = self.handoff.state();
        match self.handoff.handle_event(event) {
            TransitionResult::Ok(next) => Ok(next),
            TransitionResult::Rejected(reason) => Err(HandoffError {
                event,
                state,
                reason,
            }),
        }
    }

    fn require_role(&self, role: TaskRole, event: HandoffEvent) -> Result<(), HandoffError> {
        if self.role == role {
            return Ok(());
        }
        Err(HandoffError {
            event,
            state: self.handoff.state(),
            reason: match role {
                TaskRole::Estimator => "operation reserved for the estimator context",
                TaskRole::Controller => "operation reserved for the controller context",
            },
        })
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use stride_common::walking::context::{JointDesired, ProcessedJointBlock, RobotMotionStatus};

    struct Pair {
        estimator: RealTimeContext,
        controller: RealTimeContext,
        estimate_tx: ContextPublisher<RealTimeContextData>,
        estimate_rx: ContextSubscriber<RealTimeContextData>,
        control_tx: ContextPublisher<RealTimeContextData>,
        control_rx: ContextSubscriber<RealTimeContextData>,
    }

    fn pair(stale_threshold: u32) -> Pair {
        let initial = RealTimeContextData {
            processed_joint_state: ProcessedJointBlock::with_joint_count(2),
            ..Default::default()
        };
        let (estimate_tx, estimate_rx) = ContextExchange::channel(initial.clone(), stale_threshold);
        let (control_tx, control_rx) = ContextExchange::channel(initial.clone(), stale_threshold);
        Pair {
            estimator: RealTimeContext::new(TaskRole::Estimator, initial.clone()),
            controller: RealTimeContext::new(TaskRole::Controller, initial),
            estimate_tx,
            estimate_rx,
            control_tx,
            control_rx,
        }
    }

    fn estimate(p: &mut Pair, timestamp: i64, position: f64) {
        p.estimator.begin_estimate(timestamp).unwrap();
        p.estimator.data_mut().processed_joint_state.joints[0].position = position;
        p.estimator.publish_estimate(&mut p.estimate_tx).unwrap();
    }

    #[test]
    fn full_handoff_cycle() {
        let mut p = pair(3);
        estimate(&mut p, 1_000, 0.5);
        assert_eq!(p.estimator.state(), HandoffState::EstimateReady);
        assert!(p.estimator.data().estimator_ran);

        let freshness = p.controller.consume_estimate(&mut p.estimate_rx).unwrap();
        assert!(freshness.is_fresh());
        assert_eq!(p.controller.state(), HandoffState::EstimateReady);
        assert_eq!(p.controller.data().timestamp, 1_000);
        assert_eq!(p.controller.data().processed_joint_state.joints[0].position, 0.5);

        p.controller.data_mut().robot_motion_status = RobotMotionStatus::Standing;
        p.controller.publish_control(&mut p.control_tx).unwrap();
        assert_eq!(p.controller.state(), HandoffState::ControlReady);

        p.estimator.begin_estimate(2_000).unwrap();
        assert!(p.estimator.ingest_control(&mut p.control_rx).is_fresh());
        assert_eq!(p.estimator.state(), HandoffState::AwaitingEstimate);
        assert!(!p.estimator.data().estimator_ran);
        assert!(p.estimator.data().controller_ran);
        assert_eq!(
            p.estimator.data().robot_motion_status,
            RobotMotionStatus::Standing
        );
    }

    #[test]
    fn control_before_any_estimate_is_rejected() {
        let mut p = pair(3);
        assert_eq!(
            p.controller.consume_estimate(&mut p.estimate_rx).unwrap(),
            ContextFreshness::NoData
        );
        let err = p.controller.publish_control(&mut p.control_tx).unwrap_err();
        assert_eq!(err.state, HandoffState::AwaitingEstimate);
        assert_eq!(p.control_tx.sequence(), 0);
    }

    #[test]
    fn controller_may_reuse_an_estimate() {
        let mut p = pair(2);
        estimate(&mut p, 1_000, 0.1);

        assert!(p.controller.consume_estimate(&mut p.estimate_rx).unwrap().is_fresh());
        p.controller.publish_control(&mut p.control_tx).unwrap();

        assert_eq!(
            p.controller.consume_estimate(&mut p.estimate_rx).unwrap(),
            ContextFreshness::Repeated { missed: 1 }
        );
        p.controller.publish_control(&mut p.control_tx).unwrap();

        assert_eq!(
            p.controller.consume_estimate(&mut p.estimate_rx).unwrap(),
            ContextFreshness::Stale { missed: 2 }
        );
        p.controller.publish_control(&mut p.control_tx).unwrap();
        assert_eq!(p.controller.data().timestamp, 1_000);
        assert_eq!(p.controller.state(), HandoffState::ControlReady);
    }

    #[test]
    fn consume_keeps_controller_outputs() {
        let mut p = pair(3);
        let _ = p
            .controller
            .data_mut()
            .low_level_joint_desired
            .joints
            .push(JointDesired {
                position: Some(1.0),
                ..Default::default()
            });

        estimate(&mut p, 5, 0.0);
        p.controller.consume_estimate(&mut p.estimate_rx).unwrap();
        assert_eq!(p.controller.data().low_level_joint_desired.joints.len(), 1);
    }

    #[test]
    fn estimator_ignores_control_before_controller_ran() {
        let mut p = pair(3);
        p.estimator.data_mut().robot_motion_status = RobotMotionStatus::InMotion;
        assert_eq!(
            p.estimator.ingest_control(&mut p.control_rx),
            ContextFreshness::NoData
        );
        assert_eq!(
            p.estimator.data().robot_motion_status,
            RobotMotionStatus::InMotion
        );
    }

    #[test]
    fn roles_are_enforced() {
        let mut p = pair(3);
        assert!(p.controller.begin_estimate(0).is_err());
        assert!(p.estimator.publish_control(&mut p.control_tx).is_err());
        assert!(p.estimator.consume_estimate(&mut p.estimate_rx).is_err());
        assert_eq!(p.estimator.role(), TaskRole::Estimator);
    }

    #[test]
    fn estimator_overwrites_without_waiting() {
        let mut p = pair(3);
        estimate(&mut p, 1, 0.1);
        estimate(&mut p, 2, 0.2);
        estimate(&mut p, 3, 0.3);
        assert_eq!(
            p.controller.consume_estimate(&mut p.estimate_rx).unwrap(),
            ContextFreshness::Fresh {
                sequence: 3,
                skipped: 2
            }
        );
        assert_eq!(p.controller.data().timestamp, 3);
    }
}
