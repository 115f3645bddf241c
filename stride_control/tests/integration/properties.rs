//! Property tests over randomized timings and footstep plans.

use proptest::prelude::*;

use stride_common::walking::config::{IcpConfig, RobotConfig, SchedulerConfig};
use stride_common::walking::error::NumericDomainError;
use stride_common::walking::footstep::{Footstep, Pose};
use stride_common::walking::side::{FeetInContact, Side, SideMap};

use stride_control::context::{ContextExchange, ContextFreshness};
use stride_control::icp::{IcpRecursionEngine, RecursionTiming};
use stride_control::scheduler::ContactSequenceScheduler;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

/// Alternating plan starting at 0.5 s. Each entry is (swing, gap before the
/// next lift-off).
fn alternating(steps: &[(f64, f64)]) -> Vec<Footstep> {
    let mut plan = Vec::with_capacity(steps.len());
    let mut start = 0.5;
    let mut side = Side::Left;
    for (i, &(swing, gap)) in steps.iter().enumerate() {
        let end = start + swing;
        let y = if side == Side::Left { 0.125 } else { -0.125 };
        let x = 0.3 * (i + 1) as f64;
        plan.push(Footstep::new(side, Pose::from_xyz_yaw(x, y, 0.0, 0.0), start, end));
        start = end + gap;
        side = side.opposite();
    }
    plan
}

fn standing_scheduler() -> ContactSequenceScheduler {
    let mut s = ContactSequenceScheduler::new(&SchedulerConfig::default(), &RobotConfig::default());
    let stance = SideMap::new(
        Pose::from_xyz_yaw(0.0, 0.125, 0.0, 0.0),
        Pose::from_xyz_yaw(0.0, -0.125, 0.0, 0.0),
    );
    s.update(FeetInContact::BOTH, &stance, 0.0);
    s
}

proptest! {
    #[test]
    fn multipliers_are_finite_and_consistent(
        omega in 0.5f64..10.0,
        current_ds in 0.0f64..500.0,
        single in 0.2f64..500.0,
        upcoming_ds in 0.0f64..500.0,
    ) {
        let timing = RecursionTiming::from_durations(
            &IcpConfig::default(),
            current_ds,
            single,
            upcoming_ds,
        );
        let mut engine = IcpRecursionEngine::with_omega(omega).unwrap();
        let result = engine.compute(&timing);

        let exit = engine.exit_cmp().value();
        let end = engine.state_end().value();
        // Either finite outputs or an error with zeroed outputs, never Inf.
        prop_assert!(exit.iter().chain(end.iter()).all(|v| v.is_finite()));
        match result {
            Ok(()) => {
                // Velocity rows are ω times the position rows.
                prop_assert!(close(exit[1], omega * exit[0]));
                prop_assert!(close(end[1], omega * end[0]));
                prop_assert!(close(end[3], omega * end[2]));
                prop_assert!(close(exit[3], -omega * (1.0 - exit[2])));
            }
            Err(NumericDomainError::NonFiniteMultiplier { .. }) => {
                prop_assert_eq!(exit.norm(), 0.0);
                prop_assert_eq!(end.norm(), 0.0);
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }

    #[test]
    fn short_steps_never_overflow(
        omega in 0.5f64..10.0,
        current_ds in 0.0f64..0.5,
        single in 0.2f64..1.5,
        upcoming_ds in 0.0f64..0.5,
    ) {
        let timing = RecursionTiming::from_durations(
            &IcpConfig::default(),
            current_ds,
            single,
            upcoming_ds,
        );
        let mut engine = IcpRecursionEngine::with_omega(omega).unwrap();
        prop_assert!(engine.compute(&timing).is_ok());
    }

    #[test]
    fn invalid_timing_zeroes_outputs(
        omega in 0.5f64..10.0,
        negative in -1.0f64..-1e-6,
    ) {
        let config = IcpConfig::default();
        let mut engine = IcpRecursionEngine::with_omega(omega).unwrap();
        engine.compute(&RecursionTiming::nominal(&config)).unwrap();
        prop_assert!(engine.exit_cmp().value().norm() > 0.0);

        let bad = RecursionTiming { single_support: negative, ..RecursionTiming::nominal(&config) };
        prop_assert!(engine.compute(&bad).is_err());
        prop_assert_eq!(engine.exit_cmp().value().norm(), 0.0);
        prop_assert_eq!(engine.state_end().value().norm(), 0.0);
    }

    #[test]
    fn alternating_plans_keep_a_foot_down(
        steps in prop::collection::vec((0.3f64..0.8, 0.05f64..0.3), 1..8),
    ) {
        let plan = alternating(&steps);
        let mut s = standing_scheduler();
        let phases = s.plan(0.0, &plan).unwrap();

        prop_assert!(phases.is_well_formed());
        prop_assert!(phases.iter().all(|p| !p.feet_in_contact.is_empty()));
        prop_assert_eq!(phases.len(), (2 * plan.len() + 1).min(5));
        prop_assert_eq!(phases.first().unwrap().feet_in_contact, FeetInContact::BOTH);

        prop_assert_eq!(s.raw_transition_count(), 2 * plan.len());
        prop_assert_eq!(s.transitions().len(), 2 * plan.len());
    }

    #[test]
    fn back_to_back_steps_collapse(
        swings in prop::collection::vec(0.3f64..0.8, 1..8),
    ) {
        let steps: Vec<(f64, f64)> = swings.iter().map(|&s| (s, 0.0)).collect();
        let plan = alternating(&steps);
        let mut s = standing_scheduler();
        let phases = s.plan(0.0, &plan).unwrap();

        prop_assert!(phases.is_well_formed());
        prop_assert!(phases.iter().all(|p| !p.feet_in_contact.is_empty()));
        // Every touch-down coincides with the next lift-off.
        prop_assert_eq!(s.raw_transition_count(), 2 * plan.len());
        prop_assert_eq!(s.transitions().len(), plan.len() + 1);
    }

    #[test]
    fn planning_is_repeatable(
        steps in prop::collection::vec((0.3f64..0.8, 0.0f64..0.3), 1..8),
        now in 0.0f64..2.0,
    ) {
        let plan = alternating(&steps);
        let mut s = standing_scheduler();
        let first = s.compute_step_transitions(now, &plan).unwrap().to_vec();
        let second = s.compute_step_transitions(now, &plan).unwrap().to_vec();
        prop_assert_eq!(&first, &second);
        prop_assert!(first.windows(2).all(|w| w[0].time < w[1].time));
        prop_assert!(first.iter().all(|t| t.time >= now));
    }

    #[test]
    fn subscriber_sees_latest_publish(
        bursts in prop::collection::vec(0u64..5, 1..40),
    ) {
        let (mut tx, mut rx) = ContextExchange::channel(0u64, 1000);
        let mut published = 0u64;
        let mut last_read = 0u64;
        for burst in bursts {
            for _ in 0..burst {
                published += 1;
                tx.publish(&(published * 7));
            }
            let mut out = 0;
            match rx.read_into(&mut out) {
                ContextFreshness::NoData => prop_assert_eq!(published, 0),
                ContextFreshness::Fresh { sequence, skipped } => {
                    prop_assert_eq!(sequence, published);
                    prop_assert_eq!(skipped, published - last_read - 1);
                    prop_assert_eq!(out, published * 7);
                    last_read = published;
                }
                ContextFreshness::Repeated { .. } | ContextFreshness::Stale { .. } => {
                    prop_assert_eq!(burst, 0);
                    prop_assert_eq!(out, published * 7);
                }
            }
        }
    }
}
