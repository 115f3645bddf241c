//! Controller task: authoritative for the desired-output blocks.
//!
//! Per tick: take the latest estimate, advance the contact schedule against
//! the live contact set, recompute the ICP recursion multipliers, build the
//! command bundle for the QP consumer, write low-level desired outputs and
//! hand the context back to the estimator.

use nalgebra::{Vector3, Vector6};
use tracing::warn;

use stride_common::walking::command::{
    JointAccelerationCommand, MomentumRateCommand, SpatialAccelerationCommand,
};
use stride_common::walking::config::{IcpConfig, RobotConfig, SchedulerConfig};
use stride_common::walking::context::{
    JointControlMode, JointDesired, RealTimeContextData, RobotMotionStatus,
};
use stride_common::walking::footstep::Footstep;
use stride_common::walking::side::FeetInContact;

use super::sensors::{detect_contact, SoleFrames};
use crate::command::{MomentumCommandAggregator, QpCommandConsumer};
use crate::context::{
    ContextFreshness, ContextPublisher, ContextSubscriber, RealTimeContext, TaskRole,
};
use crate::cycle::PeriodicTask;
use crate::error::ControlError;
use crate::icp::{IcpRecursionEngine, RecursionTiming};
use crate::scheduler::ContactSequenceScheduler;

/// Outcome of one controller tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerTick {
    /// No estimate has arrived yet; nothing was published.
    Idle,
    /// Outputs were computed and published.
    Controlled(ContextFreshness),
}

pub struct ControllerTask<F: SoleFrames, C: QpCommandConsumer> {
    context: RealTimeContext,
    estimates: ContextSubscriber<RealTimeContextData>,
    controls: ContextPublisher<RealTimeContextData>,
    scheduler: ContactSequenceScheduler,
    icp: IcpRecursionEngine,
    icp_config: IcpConfig,
    robot: RobotConfig,
    aggregator: MomentumCommandAggregator,
    footsteps: Vec<Footstep>,
    frames: F,
    consumer: C,
}

impl<F: SoleFrames, C: QpCommandConsumer> ControllerTask<F, C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        initial: RealTimeContextData,
        estimates: ContextSubscriber<RealTimeContextData>,
        controls: ContextPublisher<RealTimeContextData>,
        scheduler_config: &SchedulerConfig,
        icp_config: &IcpConfig,
        robot: &RobotConfig,
        footsteps: Vec<Footstep>,
        frames: F,
        consumer: C,
    ) -> Result<Self, ControlError> {
        Ok(Self {
            context: RealTimeContext::new(TaskRole::Controller, initial),
            estimates,
            controls,
            scheduler: ContactSequenceScheduler::new(scheduler_config, robot),
            icp: IcpRecursionEngine::new(icp_config)?,
            icp_config: icp_config.clone(),
            robot: robot.clone(),
            aggregator: MomentumCommandAggregator::new(),
            footsteps,
            frames,
            consumer,
        })
    }

    /// One controller cycle.
    ///
    /// # Errors
    /// Planning and numeric-domain errors are returned as soon as they are
    /// detected; nothing is published for that tick.
    pub fn step(&mut self) -> Result<ControllerTick, ControlError> {
        let freshness = self.context.consume_estimate(&mut self.estimates)?;
        if !self.context.has_estimate() {
            return Ok(ControllerTick::Idle);
        }

        let time = self.context.data().time_s();
        let feet = detect_contact(self.context.data(), self.robot.contact_force_threshold);
        let sole_poses = self.frames.sole_poses(self.context.data());

        self.scheduler.update(feet, &sole_poses, time);
        let phases = match self.scheduler.advance(time, &self.footsteps) {
            Ok(phases) => phases,
            Err(e) => {
                warn!(time, error = %e, "rejected footstep plan");
                self.icp.reset();
                return Err(e.into());
            }
        };

        let timing = RecursionTiming::from_phases(phases, &self.icp_config);
        if let Err(e) = self.icp.compute(&timing) {
            warn!(time, error = %e, "ICP recursion failed");
            return Err(e.into());
        }

        self.build_commands(feet)?;
        let tick = self.aggregator.tick_count();
        self.consumer.consume(tick, self.aggregator.finish_tick());

        self.write_desired_outputs();
        self.context.publish_control(&mut self.controls)?;
        Ok(ControllerTick::Controlled(freshness))
    }

    fn build_commands(&mut self, feet: FeetInContact) -> Result<(), ControlError> {
        self.aggregator.reset();

        // Regulate linear momentum to zero.
        self.aggregator
            .add_momentum_rate(&MomentumRateCommand::linear(Vector3::zeros(), Some(1.0)))?;

        let damping = self.robot.joint_damping;
        for (i, joint) in self
            .context
            .data()
            .processed_joint_state
            .joints
            .iter()
            .enumerate()
        {
            self.aggregator
                .add_joint_acceleration(&JointAccelerationCommand {
                    joint: i as u16,
                    acceleration: -damping * joint.velocity,
                    weight: Some(1.0),
                })?;
        }

        // Feet in contact must not accelerate.
        let world = self.frames.world_body();
        for side in feet.sides() {
            self.aggregator
                .add_spatial_acceleration(&SpatialAccelerationCommand {
                    body: self.frames.foot_body(side),
                    base: world,
                    acceleration: Vector6::zeros(),
                    weight: None,
                })?;
        }
        Ok(())
    }

    fn write_desired_outputs(&mut self) {
        let moving = self.scheduler.has_pending_transitions();
        let damping = self.robot.joint_damping;
        let data = self.context.data_mut();

        data.low_level_joint_desired.clear();
        for joint in data.processed_joint_state.joints.iter() {
            // Same capacity as the joint block.
            let _ = data.low_level_joint_desired.joints.push(JointDesired {
                control_mode: Some(JointControlMode::Force),
                position: Some(joint.position),
                velocity: Some(0.0),
                acceleration: Some(-damping * joint.velocity),
                torque: None,
                reset_integrators: false,
            });
        }
        data.robot_motion_status = if moving {
            RobotMotionStatus::InMotion
        } else {
            RobotMotionStatus::Standing
        };
    }

    #[inline]
    pub fn context(&self) -> &RealTimeContext {
        &self.context
    }

    #[inline]
    pub fn scheduler(&self) -> &ContactSequenceScheduler {
        &self.scheduler
    }

    #[inline]
    pub fn icp(&self) -> &IcpRecursionEngine {
        &self.icp
    }

    #[inline]
    pub fn aggregator(&self) -> &MomentumCommandAggregator {
        &self.aggregator
    }

    #[inline]
    pub fn consumer(&self) -> &C {
        &self.consumer
    }
}

impl<F: SoleFrames, C: QpCommandConsumer> PeriodicTask for ControllerTask<F, C> {
    fn name(&self) -> &'static str {
        "controller"
    }

    fn tick(&mut self, _timestamp_ns: i64) -> Result<(), ControlError> {
        self.step().map(|_| ())
    }
}
