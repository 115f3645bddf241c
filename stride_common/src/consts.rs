//! System-wide constants for the Stride workspace.
//!
//! Single source of truth for all fixed capacities, timing bounds and
//! default paths. Every RT container is sized from these values.

use static_assertions::const_assert;

// ─── Fixed Capacities ───────────────────────────────────────────────

/// Maximum number of actuated one-DoF joints carried in a context block.
pub const MAX_JOINTS: usize = 32;

/// Maximum number of force/torque sensors carried in a context block.
pub const MAX_FORCE_SENSORS: usize = 4;

/// Look-ahead capacity of the contact phase ring.
pub const CONTACT_PHASE_CAPACITY: usize = 5;

/// Maximum number of footsteps the scheduler accepts in one planning pass.
pub const MAX_QUEUED_FOOTSTEPS: usize = 16;

/// Maximum number of step transitions (one lift-off + one touch-down per footstep).
pub const MAX_STEP_TRANSITIONS: usize = 2 * MAX_QUEUED_FOOTSTEPS;

/// Maximum number of per-side events merged into one step transition.
pub const MAX_EVENTS_PER_TRANSITION: usize = 4;

/// Maximum vertex count of a single foot sole polygon.
pub const MAX_FOOT_VERTICES: usize = 8;

/// Maximum vertex count of a derived support region (both feet).
pub const MAX_SUPPORT_VERTICES: usize = 2 * MAX_FOOT_VERTICES;

/// Per-tick capacity of the momentum rate command list.
pub const MAX_MOMENTUM_RATE_COMMANDS: usize = 4;

/// Per-tick capacity of the joint acceleration command list.
pub const MAX_JOINT_ACCELERATION_COMMANDS: usize = MAX_JOINTS;

/// Per-tick capacity of the spatial acceleration command list.
pub const MAX_SPATIAL_ACCELERATION_COMMANDS: usize = 8;

/// Per-tick capacity of the point acceleration command list.
pub const MAX_POINT_ACCELERATION_COMMANDS: usize = 8;

/// Per-tick capacity of the external wrench command list.
pub const MAX_EXTERNAL_WRENCH_COMMANDS: usize = 4;

const_assert!(MAX_STEP_TRANSITIONS >= 2 * MAX_QUEUED_FOOTSTEPS);
const_assert!(MAX_SUPPORT_VERTICES >= 2 * MAX_FOOT_VERTICES);
const_assert!(CONTACT_PHASE_CAPACITY >= 2);

// ─── Timing ─────────────────────────────────────────────────────────

/// Default estimator period in microseconds (1 kHz sensor rate).
pub const ESTIMATOR_PERIOD_US: u32 = 1000;

/// Default controller period in microseconds (250 Hz control rate).
pub const CONTROLLER_PERIOD_US: u32 = 4000;

/// Lower bound for either task period [µs].
pub const TASK_PERIOD_US_MIN: u32 = 100;

/// Upper bound for either task period [µs].
pub const TASK_PERIOD_US_MAX: u32 = 100_000;

/// Consecutive controller reads without a new estimate before the context is reported stale.
pub const STALE_THRESHOLD_DEFAULT: u32 = 3;

/// Two transitions closer than this [s] are treated as simultaneous.
pub const TRANSITION_TIME_EPSILON: f64 = 1.0e-6;

// ─── Physics Defaults ───────────────────────────────────────────────

/// Standard gravity [m/s²].
pub const GRAVITY_DEFAULT: f64 = 9.81;

/// Nominal center-of-mass height [m].
pub const COM_HEIGHT_DEFAULT: f64 = 0.9;

// ─── Paths ──────────────────────────────────────────────────────────

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/stride/stride.toml";
