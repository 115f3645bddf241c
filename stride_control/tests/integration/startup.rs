//! Integration test: startup sequence.
//!
//! Validates: config loading from TOML strings → all validations pass →
//! tasks built → controller idle until the first estimate → first control
//! published back to the estimator.

use stride_common::config::ConfigError;
use stride_common::walking::context::RobotMotionStatus;
use stride_common::walking::side::Side;

use stride_control::command::RecordingConsumer;
use stride_control::config::{load_config_from_strings, LoadedConfig};
use stride_control::context::{ContextFreshness, HandoffState};
use stride_control::error::ControlError;
use stride_control::task::{build_tasks, ControllerTick, FixedSoleFrames, SimulatedStance};

// ── Config TOML ─────────────────────────────────────────────────────

const STRIDE_TOML: &str = r#"
[shared]
service_name = "stride-startup-test"

[timing]
estimator_period_us = 1000
controller_period_us = 2000
stale_threshold = 2

[icp]
gravity = 9.81
com_height = 0.9

[robot]
mass = 60.0
joint_count = 6
"#;

const PLAN_TOML: &str = r#"
[[footsteps]]
side = "right"
position = [0.25, -0.125, 0.0]
start = 0.5
end = 1.0

[[footsteps]]
side = "left"
position = [0.5, 0.125, 0.0]
start = 1.0
end = 1.5
"#;

fn load() -> LoadedConfig {
    load_config_from_strings(STRIDE_TOML, Some(PLAN_TOML)).unwrap()
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn config_strings_load_and_validate() {
    let LoadedConfig { config, footsteps } = load();
    assert_eq!(config.shared.service_name, "stride-startup-test");
    assert_eq!(config.timing.controller_period_us, 2000);
    assert_eq!(config.robot.joint_count, 6);
    assert_eq!(footsteps.len(), 2);
    assert_eq!(footsteps[0].side, Side::Right);
    assert!((config.icp.omega() - (9.81f64 / 0.9).sqrt()).abs() < 1e-12);
}

#[test]
fn first_cycles_after_startup() {
    let LoadedConfig { config, footsteps } = load();
    let sensors = SimulatedStance::new(&config.robot, config.icp.gravity, &footsteps);
    let frames = FixedSoleFrames::new(&config.robot);
    let tasks = build_tasks(&config, footsteps, sensors, frames, RecordingConsumer::default())
        .unwrap();
    let (mut estimator, mut controller) = (tasks.estimator, tasks.controller);

    // Controller before any estimate: idle, nothing published.
    assert_eq!(controller.step().unwrap(), ControllerTick::Idle);
    assert_eq!(controller.context().state(), HandoffState::AwaitingEstimate);
    assert!(controller.consumer().bundles.is_empty());

    // First estimate.
    assert_eq!(estimator.step(0).unwrap(), 1);
    assert_eq!(estimator.context().state(), HandoffState::EstimateReady);
    assert_eq!(estimator.last_control(), ContextFreshness::NoData);

    // First control.
    assert!(matches!(
        controller.step().unwrap(),
        ControllerTick::Controlled(ContextFreshness::Fresh { sequence: 1, .. })
    ));
    assert_eq!(controller.context().state(), HandoffState::ControlReady);
    let bundle = controller.consumer().last().unwrap();
    assert_eq!(bundle.joint_acceleration.len(), 6);
    assert_eq!(bundle.spatial_acceleration.len(), 2, "both feet planted");

    // Estimator picks it up on its next cycle.
    estimator.step(1_000_000).unwrap();
    let data = estimator.context().data();
    assert!(data.controller_ran);
    assert_eq!(data.robot_motion_status, RobotMotionStatus::InMotion);
    assert_eq!(data.low_level_joint_desired.joints.len(), 6);
    assert_eq!(data.processed_joint_state.len(), 6);
}

#[test]
fn invalid_timing_rejected_at_startup() {
    let toml = "[timing]\nestimator_period_us = 10\n";
    let err = load_config_from_strings(toml, None).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));

    let control_error = ControlError::from(err);
    assert!(control_error.is_input_error());
}

#[test]
fn malformed_plan_rejected_at_startup() {
    let plan = r#"
[[footsteps]]
side = "left"
position = [0.3, 0.125, 0.0]
start = 1.6
end = 1.0
"#;
    assert!(load_config_from_strings(STRIDE_TOML, Some(plan)).is_err());
}
