//! Estimator and controller tasks and their wiring.
//!
//! The two tasks are connected by two exchanges: estimates flow
//! estimator → controller, desired outputs flow controller → estimator.
//! Each task owns its own context; nothing else is shared.

pub mod controller;
pub mod estimator;
pub mod sensors;

use tracing::info;

use stride_common::walking::config::{StrideConfig, TimingConfig};
use stride_common::walking::context::{ProcessedJointBlock, RealTimeContextData};
use stride_common::walking::footstep::Footstep;

use crate::command::QpCommandConsumer;
use crate::context::ContextExchange;
use crate::error::ControlError;

pub use controller::{ControllerTask, ControllerTick};
pub use estimator::EstimatorTask;
pub use sensors::{detect_contact, FixedSoleFrames, SensorSource, SimulatedStance, SoleFrames};

/// Both tasks of one control core.
pub struct TaskPair<S: SensorSource, F: SoleFrames, C: QpCommandConsumer> {
    pub estimator: EstimatorTask<S>,
    pub controller: ControllerTask<F, C>,
}

/// Stale thresholds (estimates, controls) in reads of the respective
/// reader.
///
/// The estimator normally runs faster than the controller, so it sees
/// every controller output repeated `controller / estimator` times; its
/// threshold scales with that ratio.
pub fn stale_thresholds(timing: &TimingConfig) -> (u32, u32) {
    let ratio = timing
        .controller_period_us
        .div_ceil(timing.estimator_period_us.max(1))
        .max(1);
    (
        timing.stale_threshold,
        timing.stale_threshold.saturating_mul(ratio),
    )
}

/// Context every task starts from.
pub fn initial_context(config: &StrideConfig) -> RealTimeContextData {
    RealTimeContextData {
        processed_joint_state: ProcessedJointBlock::with_joint_count(config.robot.joint_count),
        ..Default::default()
    }
}

/// Build both tasks and connect their exchanges.
pub fn build_tasks<S, F, C>(
    config: &StrideConfig,
    footsteps: Vec<Footstep>,
    sensors: S,
    frames: F,
    consumer: C,
) -> Result<TaskPair<S, F, C>, ControlError>
where
    S: SensorSource,
    F: SoleFrames,
    C: QpCommandConsumer,
{
    let initial = initial_context(config);
    let (estimate_threshold, control_threshold) = stale_thresholds(&config.timing);
    let (estimate_tx, estimate_rx) = ContextExchange::channel(initial.clone(), estimate_threshold);
    let (control_tx, control_rx) = ContextExchange::channel(initial.clone(), control_threshold);

    info!(
        footsteps = footsteps.len(),
        joints = config.robot.joint_count,
        estimate_threshold,
        control_threshold,
        "tasks built"
    );

    Ok(TaskPair {
        estimator: EstimatorTask::new(initial.clone(), estimate_tx, control_rx, sensors),
        controller: ControllerTask::new(
            initial,
            estimate_rx,
            control_tx,
            &config.scheduler,
            &config.icp,
            &config.robot,
            footsteps,
            frames,
            consumer,
        )?,
    })
}
