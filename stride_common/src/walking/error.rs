//! Walking-domain error types.
//!
//! Every variant carries plain `Copy` data so errors can be raised from the
//! RT path without allocating.

use thiserror::Error;

use super::side::Side;

/// Malformed planner input or a degenerate contact schedule.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PlanningInputError {
    /// Footstep interval is empty, reversed or non-finite.
    #[error("invalid {side:?} footstep interval [{start_time}, {end_time}]")]
    InvalidFootstepInterval {
        side: Side,
        start_time: f64,
        end_time: f64,
    },

    /// Footstep goal pose contains NaN or infinite values.
    #[error("{side:?} footstep goal pose is not finite")]
    NonFiniteGoalPose { side: Side },

    /// More footsteps than the scheduler can queue.
    #[error("{count} footsteps exceed queue capacity {capacity}")]
    TooManyFootsteps { count: usize, capacity: usize },

    /// More events coincide at one instant than a transition can hold.
    #[error("too many simultaneous contact events at t={time}")]
    TooManySimultaneousEvents { time: f64 },

    /// A scheduled phase has no foot on the ground.
    #[error("contact phase {phase_index} starting at t={start_time} has no feet in contact")]
    NoFeetInContact { phase_index: usize, start_time: f64 },
}

/// Input outside the domain of the closed-form ICP recursion.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum NumericDomainError {
    /// Natural frequency must be strictly positive and finite.
    #[error("natural frequency must be positive and finite, got {0}")]
    InvalidOmega(f64),

    /// A duration is negative or non-finite.
    #[error("{name} must be a finite non-negative duration, got {value}")]
    InvalidDuration { name: &'static str, value: f64 },

    /// A ratio lies outside [0, 1].
    #[error("{name} must lie in [0, 1], got {value}")]
    RatioOutOfRange { name: &'static str, value: f64 },

    /// Spline window is reversed or exceeds the trajectory.
    #[error("spline window [{start}, {end}] invalid for trajectory of {total}s")]
    InvalidSplineWindow { start: f64, end: f64, total: f64 },

    /// Gravity or CoM height makes the pendulum undefined.
    #[error("pendulum parameters invalid: gravity={gravity}, com_height={com_height}")]
    InvalidPendulum { gravity: f64, com_height: f64 },

    /// Valid inputs whose exponentials overflowed.
    #[error("{kind} multiplier is not finite")]
    NonFiniteMultiplier { kind: &'static str },
}

/// Command list a submission was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    MomentumRate,
    JointAcceleration,
    SpatialAcceleration,
    PointAcceleration,
    ExternalWrench,
}

/// Aggregator misuse within a control tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    /// `add_*` called before the tick was opened with `reset()`.
    #[error("{0:?} command submitted before the tick was reset")]
    TickNotOpen(CommandKind),

    /// Fixed-capacity list is full for this tick.
    #[error("{kind:?} command list full (capacity {capacity})")]
    ListFull { kind: CommandKind, capacity: usize },
}
