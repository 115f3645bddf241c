//! Integration test: two-step walking scenarios.
//!
//! Validates: footstep plan → transitions → contact phases → ICP
//! multipliers → command bundle, both on the scheduler alone and through the
//! full estimator/controller loop.

use nalgebra::Vector4;

use stride_common::walking::config::{IcpConfig, RobotConfig, SchedulerConfig, StrideConfig};
use stride_common::walking::context::RobotMotionStatus;
use stride_common::walking::error::{NumericDomainError, PlanningInputError};
use stride_common::walking::footstep::{Footstep, Pose};
use stride_common::walking::side::{FeetInContact, Side, SideMap};

use stride_control::command::RecordingConsumer;
use stride_control::error::ControlError;
use stride_control::icp::{IcpRecursionEngine, RecursionTiming};
use stride_control::scheduler::{ContactSequenceScheduler, TransitionKind};
use stride_control::task::{build_tasks, ControllerTick, FixedSoleFrames, SimulatedStance};

// ── Fixtures ────────────────────────────────────────────────────────

fn stance() -> SideMap<Pose> {
    SideMap::new(
        Pose::from_xyz_yaw(0.0, 0.125, 0.0, 0.0),
        Pose::from_xyz_yaw(0.0, -0.125, 0.0, 0.0),
    )
}

fn step(side: Side, x: f64, start: f64, end: f64) -> Footstep {
    let y = match side {
        Side::Left => 0.125,
        Side::Right => -0.125,
    };
    Footstep::new(side, Pose::from_xyz_yaw(x, y, 0.0, 0.0), start, end)
}

fn standing_scheduler() -> ContactSequenceScheduler {
    let mut s = ContactSequenceScheduler::new(&SchedulerConfig::default(), &RobotConfig::default());
    s.update(FeetInContact::BOTH, &stance(), 0.0);
    s
}

fn alternating_plan() -> Vec<Footstep> {
    vec![
        step(Side::Left, 0.3, 1.0, 1.6),
        step(Side::Right, 0.6, 1.6, 2.2),
    ]
}

// ── Scheduler alone ─────────────────────────────────────────────────

#[test]
fn overlapping_steps_leave_robot_airborne() {
    let mut s = standing_scheduler();
    let steps = [
        step(Side::Left, 0.3, 1.0, 1.6),
        step(Side::Right, 0.6, 1.3, 1.9),
    ];

    let err = s.plan(0.0, &steps).unwrap_err();

    assert_eq!(s.raw_transition_count(), 4);
    assert_eq!(s.transitions().len(), 4, "no two events share an instant");
    assert_eq!(
        err,
        PlanningInputError::NoFeetInContact {
            phase_index: 2,
            start_time: 1.3,
        }
    );

    // The offending schedule is kept for inspection.
    let phases = s.phases();
    assert!(phases.len() >= 3);
    assert_eq!(phases.first().unwrap().start_time, 0.0);
    assert!(phases.is_well_formed());
    let feet: Vec<FeetInContact> = phases.iter().map(|p| p.feet_in_contact).collect();
    assert_eq!(
        feet,
        vec![
            FeetInContact::BOTH,
            FeetInContact::RIGHT,
            FeetInContact::empty(),
            FeetInContact::LEFT,
            FeetInContact::BOTH,
        ]
    );
}

#[test]
fn alternating_steps_give_double_single_single_double() {
    let mut s = standing_scheduler();
    let plan = alternating_plan();

    let phases = s.plan(0.0, &plan).unwrap();

    let summary: Vec<(FeetInContact, f64, f64)> = phases
        .iter()
        .map(|p| (p.feet_in_contact, p.start_time, p.end_time))
        .collect();
    assert_eq!(
        summary,
        vec![
            (FeetInContact::BOTH, 0.0, 1.0),
            (FeetInContact::RIGHT, 1.0, 1.6),
            (FeetInContact::LEFT, 1.6, 2.2),
            (FeetInContact::BOTH, 2.2, f64::INFINITY),
        ]
    );

    assert_eq!(s.raw_transition_count(), 4);
    let transitions = s.transitions();
    assert_eq!(transitions.len(), 3);
    assert_eq!(transitions[1].count(TransitionKind::TouchDown), 1);
    assert_eq!(transitions[1].count(TransitionKind::LiftOff), 1);

    // Single support on the right sole only.
    let right_only = s.phases().get(1).unwrap();
    assert!(right_only.sole_poses[Side::Left].is_none());
    let area = right_only.support_region.area();
    assert!((area - 0.22 * 0.11).abs() < 1e-9, "area {area}");

    // Left foot landed at its goal pose.
    let left_only = s.phases().get(2).unwrap();
    let landed = left_only.sole_poses[Side::Left].unwrap();
    assert!((landed.position.x - 0.3).abs() < 1e-12);
}

#[test]
fn replanning_mid_swing_starts_from_live_contact() {
    let mut s = ContactSequenceScheduler::new(&SchedulerConfig::default(), &RobotConfig::default());
    s.update(FeetInContact::RIGHT, &stance(), 1.2);

    let phases = s.plan(1.2, &alternating_plan()).unwrap();

    let first = phases.first().unwrap();
    assert_eq!(first.feet_in_contact, FeetInContact::RIGHT);
    assert_eq!(first.start_time, 1.2);
    assert_eq!(first.end_time, 1.6);
    assert_eq!(phases.len(), 3);
}

// ── ICP on the scheduled timing ─────────────────────────────────────

#[test]
fn exit_cmp_multiplier_matches_closed_form() {
    let timing = RecursionTiming {
        current_double_support: 0.2,
        upcoming_double_support: 0.2,
        single_support: 0.6,
        double_support_split_ratio: 0.5,
        exit_cmp_ratio: 0.5,
        spline_start: 0.1,
        spline_end: 0.5,
        total_trajectory_time: 0.8,
    };
    let mut engine = IcpRecursionEngine::with_omega(3.0).unwrap();
    engine.compute(&timing).unwrap();

    let projection = (-0.6f64).exp() * (1.0 - (-0.9f64).exp());
    let expected = Vector4::new(
        projection,
        3.0 * projection,
        1.0 - (-0.9f64).exp(),
        -3.0 * (-0.9f64).exp(),
    );
    assert!((engine.exit_cmp().value() - expected).norm() < 1e-12);
}

#[test]
fn timing_from_single_support_phase_has_no_current_double_support() {
    let mut s = ContactSequenceScheduler::new(&SchedulerConfig::default(), &RobotConfig::default());
    s.update(FeetInContact::RIGHT, &stance(), 1.2);
    let phases = s.plan(1.2, &alternating_plan()).unwrap();

    let timing = RecursionTiming::from_phases(phases, &IcpConfig::default());

    assert_eq!(timing.current_double_support, 0.0);
    assert!((timing.single_support - 0.4).abs() < 1e-12);
    assert_eq!(timing.upcoming_double_support, 0.0, "swing follows swing");
    timing.validate().unwrap();
}

// ── Full estimator/controller loop ──────────────────────────────────

struct Observation {
    time: f64,
    feet: FeetInContact,
    status: RobotMotionStatus,
    spatial_commands: usize,
    phase_start: f64,
}

/// Observations strictly inside `(lo, hi)`, away from the switch instants.
fn within(observations: &[Observation], lo: f64, hi: f64) -> impl Iterator<Item = &Observation> {
    observations
        .iter()
        .filter(move |o| o.time > lo + 0.01 && o.time < hi - 0.01)
}

#[test]
fn closed_loop_walks_the_plan() {
    let config = StrideConfig::default();
    let plan = alternating_plan();
    let sensors = SimulatedStance::new(&config.robot, config.icp.gravity, &plan);
    let frames = FixedSoleFrames::new(&config.robot);
    let tasks = build_tasks(&config, plan, sensors, frames, RecordingConsumer::default()).unwrap();
    let (mut estimator, mut controller) = (tasks.estimator, tasks.controller);

    // 1 ms estimator, every fourth tick followed by the controller.
    let mut observations = Vec::new();
    for k in 0..3000i64 {
        estimator.step(k * 1_000_000).unwrap();
        if k % 4 != 3 {
            continue;
        }
        let tick = controller.step().unwrap();
        assert!(matches!(tick, ControllerTick::Controlled(f) if f.is_fresh()));

        assert!(controller.icp().exit_cmp().value().iter().all(|v| v.is_finite()));
        assert!(controller.icp().state_end().value().iter().all(|v| v.is_finite()));

        let bundle = controller.consumer().last().unwrap();
        observations.push(Observation {
            time: controller.context().data().time_s(),
            feet: controller.scheduler().live_feet_in_contact(),
            status: controller.context().data().robot_motion_status,
            spatial_commands: bundle.spatial_acceleration.len(),
            phase_start: controller.scheduler().phases().first().unwrap().start_time,
        });
    }

    assert_eq!(observations.len(), 750);
    let bundles = &controller.consumer().bundles;
    assert_eq!(bundles.len(), 750);
    for (i, (tick, bundle)) in bundles.iter().enumerate() {
        assert_eq!(*tick, i as u64 + 1);
        assert_eq!(bundle.momentum_rate.len(), 1);
        assert_eq!(bundle.joint_acceleration.len(), config.robot.joint_count);
    }

    for o in within(&observations, 0.0, 1.0) {
        assert_eq!(o.feet, FeetInContact::BOTH);
        assert_eq!(o.status, RobotMotionStatus::InMotion);
        assert_eq!(o.spatial_commands, 2);
    }
    for o in within(&observations, 1.0, 1.6) {
        assert_eq!(o.feet, FeetInContact::RIGHT, "at {}", o.time);
        assert_eq!(o.spatial_commands, 1);
        // Schedule carried over from earlier ticks, not rebuilt at `o.time`.
        assert_eq!(o.phase_start, 1.0, "at {}", o.time);
    }
    for o in within(&observations, 1.6, 2.2) {
        assert_eq!(o.feet, FeetInContact::LEFT, "at {}", o.time);
        assert_eq!(o.spatial_commands, 1);
        assert_eq!(o.phase_start, 1.6, "at {}", o.time);
    }
    for o in within(&observations, 2.2, 3.0) {
        assert_eq!(o.feet, FeetInContact::BOTH);
        assert_eq!(o.status, RobotMotionStatus::Standing);
    }

    // The estimator folded the controller outputs back in.
    let estimate = estimator.context().data();
    assert!(estimate.controller_ran);
    assert_eq!(estimate.robot_motion_status, RobotMotionStatus::Standing);
    assert_eq!(
        estimate.low_level_joint_desired.joints.len(),
        config.robot.joint_count
    );
}

#[test]
fn distant_first_step_stops_the_controller() {
    let config = StrideConfig::default();
    let plan = vec![step(Side::Left, 0.3, 2000.0, 2000.6)];
    let sensors = SimulatedStance::new(&config.robot, config.icp.gravity, &plan);
    let frames = FixedSoleFrames::new(&config.robot);
    let tasks = build_tasks(&config, plan, sensors, frames, RecordingConsumer::default()).unwrap();
    let (mut estimator, mut controller) = (tasks.estimator, tasks.controller);

    estimator.step(1_000_000).unwrap();
    assert!(matches!(
        controller.step(),
        Err(ControlError::Numeric(NumericDomainError::NonFiniteMultiplier { .. }))
    ));
    assert!(controller.consumer().bundles.is_empty(), "no Inf reaches the QP");
    assert_eq!(*controller.icp().exit_cmp().value(), Vector4::zeros());
    assert_eq!(*controller.icp().state_end().value(), Vector4::zeros());
}
