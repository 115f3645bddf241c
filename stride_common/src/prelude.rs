//! Prelude module for common re-exports.
//!
//! ```rust
//! use stride_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};
pub use crate::walking::config::{
    FootstepPlan, IcpConfig, RobotConfig, SchedulerConfig, StrideConfig, TimingConfig,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{CONTACT_PHASE_CAPACITY, MAX_JOINTS};

// ─── Walking Types ──────────────────────────────────────────────────
pub use crate::walking::command::{
    ExternalWrenchCommand, JointAccelerationCommand, MomentumRateCommand,
    PointAccelerationCommand, SpatialAccelerationCommand, Wrench,
};
pub use crate::walking::context::RealTimeContextData;
pub use crate::walking::error::{CommandError, NumericDomainError, PlanningInputError};
pub use crate::walking::footstep::{Footstep, Pose, SupportPolygon};
pub use crate::walking::side::{FeetInContact, Side, SideMap};

/// Default estimator period as Duration.
pub const DEFAULT_ESTIMATOR_PERIOD: Duration =
    Duration::from_micros(crate::consts::ESTIMATOR_PERIOD_US as u64);

/// Default controller period as Duration.
pub const DEFAULT_CONTROLLER_PERIOD: Duration =
    Duration::from_micros(crate::consts::CONTROLLER_PERIOD_US as u64);
