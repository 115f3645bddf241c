//! Integration test: estimator/controller context handoff.
//!
//! Validates: the two tasks exchange contexts without blocking, by deep
//! copy only, degrade gracefully when one side stops publishing, and run
//! concurrently under the cycle runner.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use stride_common::walking::config::StrideConfig;
use stride_common::walking::context::RobotMotionStatus;
use stride_common::walking::error::PlanningInputError;
use stride_common::walking::footstep::{Footstep, Pose};
use stride_common::walking::side::Side;

use stride_control::command::NullConsumer;
use stride_control::context::{ContextFreshness, HandoffState};
use stride_control::cycle::{CycleError, CycleRunner, PeriodicTask};
use stride_control::error::ControlError;
use stride_control::task::{
    build_tasks, ControllerTick, FixedSoleFrames, SimulatedStance, TaskPair,
};

type StanceTasks = TaskPair<SimulatedStance, FixedSoleFrames, NullConsumer>;

fn tasks(footsteps: Vec<Footstep>) -> StanceTasks {
    let config = StrideConfig::default();
    let sensors = SimulatedStance::new(&config.robot, config.icp.gravity, &footsteps);
    let frames = FixedSoleFrames::new(&config.robot);
    build_tasks(&config, footsteps, sensors, frames, NullConsumer::default()).unwrap()
}

// ── Single-threaded interleavings ───────────────────────────────────

#[test]
fn controller_reuses_last_estimate_until_stale() {
    let TaskPair {
        mut estimator,
        mut controller,
    } = tasks(Vec::new());

    estimator.step(1_000_000).unwrap();
    assert_eq!(
        controller.step().unwrap(),
        ControllerTick::Controlled(ContextFreshness::Fresh {
            sequence: 1,
            skipped: 0
        })
    );

    // Estimator stalls: the controller keeps running on the same estimate.
    assert_eq!(
        controller.step().unwrap(),
        ControllerTick::Controlled(ContextFreshness::Repeated { missed: 1 })
    );
    assert_eq!(
        controller.step().unwrap(),
        ControllerTick::Controlled(ContextFreshness::Repeated { missed: 2 })
    );
    assert_eq!(
        controller.step().unwrap(),
        ControllerTick::Controlled(ContextFreshness::Stale { missed: 3 })
    );
    assert_eq!(controller.consumer().consumed, 4);
    assert_eq!(controller.context().data().timestamp, 1_000_000);

    // Recovery on the next publish.
    estimator.step(2_000_000).unwrap();
    assert!(matches!(
        controller.step().unwrap(),
        ControllerTick::Controlled(ContextFreshness::Fresh { sequence: 2, .. })
    ));
}

#[test]
fn estimator_never_waits_for_controller() {
    let TaskPair {
        mut estimator,
        mut controller,
    } = tasks(Vec::new());

    for k in 1..=10 {
        assert_eq!(estimator.step(k * 1_000_000).unwrap(), k as u64);
    }
    assert_eq!(estimator.last_control(), ContextFreshness::NoData);

    // Controller takes the latest and reports what it skipped.
    assert_eq!(
        controller.step().unwrap(),
        ControllerTick::Controlled(ContextFreshness::Fresh {
            sequence: 10,
            skipped: 9
        })
    );
    assert_eq!(controller.context().data().timestamp, 10_000_000);

    estimator.step(11_000_000).unwrap();
    assert!(estimator.last_control().is_fresh());
    assert!(estimator.context().data().controller_ran);
}

#[test]
fn controller_is_idle_until_first_estimate() {
    let TaskPair { mut controller, .. } = tasks(Vec::new());
    for _ in 0..3 {
        assert_eq!(controller.step().unwrap(), ControllerTick::Idle);
    }
    assert_eq!(controller.consumer().consumed, 0);
    assert_eq!(controller.context().state(), HandoffState::AwaitingEstimate);
}

#[test]
fn each_task_keeps_its_own_copy() {
    let TaskPair {
        mut estimator,
        mut controller,
    } = tasks(Vec::new());

    estimator.step(1_000_000).unwrap();
    controller.step().unwrap();
    let seen_by_controller = controller.context().data().clone();

    // A later estimate does not reach the controller until it reads again.
    estimator.step(2_000_000).unwrap();
    assert_eq!(controller.context().data(), &seen_by_controller);
    assert_ne!(
        estimator.context().data().timestamp,
        seen_by_controller.timestamp
    );

    // Estimator-owned blocks are never overwritten by controller output.
    estimator.step(3_000_000).unwrap();
    assert_eq!(estimator.context().data().timestamp, 3_000_000);
    assert_eq!(
        estimator.context().data().robot_motion_status,
        RobotMotionStatus::Standing
    );
}

// ── Concurrent run ──────────────────────────────────────────────────

fn run_until_cleared<T: PeriodicTask>(
    task: &mut T,
    period_us: u32,
    epoch: Instant,
    running: &AtomicBool,
) -> Result<u64, CycleError> {
    let mut runner = CycleRunner::new(period_us, epoch);
    let result = runner.run(task, running);
    if result.is_err() {
        running.store(false, Ordering::SeqCst);
    }
    result.map(|()| runner.stats().cycle_count)
}

#[test]
fn tasks_run_concurrently_without_blocking() {
    let TaskPair {
        mut estimator,
        mut controller,
    } = tasks(Vec::new());
    let running = AtomicBool::new(true);
    let epoch = Instant::now();

    let (estimator_cycles, controller_cycles) = std::thread::scope(|s| {
        let est = s.spawn(|| run_until_cleared(&mut estimator, 1000, epoch, &running));
        let ctl = s.spawn(|| run_until_cleared(&mut controller, 4000, epoch, &running));
        std::thread::sleep(Duration::from_millis(200));
        running.store(false, Ordering::SeqCst);
        (est.join().unwrap(), ctl.join().unwrap())
    });

    assert!(estimator_cycles.unwrap() > 0);
    assert!(controller_cycles.unwrap() > 0);
    assert!(controller.consumer().consumed > 0);
    assert!(controller.context().has_estimate());
}

#[test]
fn planning_failure_stops_both_loops() {
    let plan = vec![
        Footstep::new(Side::Left, Pose::from_xyz_yaw(0.3, 0.125, 0.0, 0.0), 1.0, 1.6),
        Footstep::new(Side::Right, Pose::from_xyz_yaw(0.6, -0.125, 0.0, 0.0), 1.3, 1.9),
    ];
    let TaskPair {
        mut estimator,
        mut controller,
    } = tasks(plan);
    let running = AtomicBool::new(true);
    let epoch = Instant::now();

    let (estimator_result, controller_result) = std::thread::scope(|s| {
        let est = s.spawn(|| run_until_cleared(&mut estimator, 1000, epoch, &running));
        let ctl = s.spawn(|| run_until_cleared(&mut controller, 4000, epoch, &running));
        // Safety net in case the failure never surfaces.
        let deadline = Instant::now() + Duration::from_secs(5);
        while running.load(Ordering::SeqCst) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        running.store(false, Ordering::SeqCst);
        (est.join().unwrap(), ctl.join().unwrap())
    });

    assert!(estimator_result.is_ok());
    match controller_result {
        Err(CycleError::Task {
            task: "controller",
            source: ControlError::Planning(PlanningInputError::NoFeetInContact { start_time, .. }),
        }) => assert_eq!(start_time, 1.3),
        other => panic!("expected planning failure, got {other:?}"),
    }
    assert_eq!(controller.consumer().consumed, 0, "nothing handed to the QP");
}
