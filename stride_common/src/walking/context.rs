//! Data blocks exchanged between the estimator and controller tasks.
//!
//! Every block is fixed-capacity and `Clone + PartialEq`. A context is
//! transferred only by deep copy ([`RealTimeContextData::copy_from`]);
//! `clone_from` reuses the destination's inline storage, so copying never
//! allocates.

use heapless::Vec as FixedVec;
use nalgebra::{Vector2, Vector3};

use super::command::Wrench;
use super::side::{Side, SideMap};
use crate::consts::{MAX_FORCE_SENSORS, MAX_JOINTS};

// ─── Joint State ────────────────────────────────────────────────────

/// Filtered state of one one-DoF joint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointState {
    /// [rad]
    pub position: f64,
    /// [rad/s]
    pub velocity: f64,
    /// [rad/s²]
    pub acceleration: f64,
    /// [N·m]
    pub torque: f64,
}

/// Processed joint state, in robot joint order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessedJointBlock {
    pub joints: FixedVec<JointState, MAX_JOINTS>,
}

impl ProcessedJointBlock {
    /// Block with `count` zeroed joints (clamped to capacity).
    pub fn with_joint_count(count: usize) -> Self {
        let mut joints = FixedVec::new();
        for _ in 0..count.min(MAX_JOINTS) {
            let _ = joints.push(JointState::default());
        }
        Self { joints }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

// ─── Force Sensors ──────────────────────────────────────────────────

/// One force/torque sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ForceSensorReading {
    /// Foot the sensor is mounted on, if any.
    pub side: Option<Side>,
    /// Measured wrench, sole frame.
    pub wrench: Wrench,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForceSensorBlock {
    pub sensors: FixedVec<ForceSensorReading, MAX_FORCE_SENSORS>,
}

impl ForceSensorBlock {
    /// Vertical force measured under `side` [N], summed over its sensors.
    pub fn normal_force(&self, side: Side) -> f64 {
        self.sensors
            .iter()
            .filter(|s| s.side == Some(side))
            .map(|s| s.wrench.linear.z)
            .sum()
    }
}

// ─── Center of Pressure ─────────────────────────────────────────────

/// Per-foot center of pressure in sole frame [m]; `None` when unloaded.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CenterOfPressureBlock {
    pub per_foot: SideMap<Option<Vector2<f64>>>,
}

// ─── Motion Status ──────────────────────────────────────────────────

/// Coarse motion status reported by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RobotMotionStatus {
    #[default]
    Unknown,
    Standing,
    InMotion,
}

// ─── Low-Level Desired Output ───────────────────────────────────────

/// Control mode requested from the joint-level servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JointControlMode {
    #[default]
    Force,
    Position,
}

/// Desired set-points for one joint. `None` means "not commanded".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointDesired {
    pub control_mode: Option<JointControlMode>,
    pub position: Option<f64>,
    pub velocity: Option<f64>,
    pub acceleration: Option<f64>,
    pub torque: Option<f64>,
    pub reset_integrators: bool,
}

/// Low-level joint desired output, in robot joint order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LowLevelJointDesiredBlock {
    pub joints: FixedVec<JointDesired, MAX_JOINTS>,
}

impl LowLevelJointDesiredBlock {
    pub fn clear(&mut self) {
        self.joints.clear();
    }
}

// ─── Context ────────────────────────────────────────────────────────

/// Complete state carried between the estimator and controller tasks.
///
/// Field ownership: `timestamp`, `estimator_ran`, `processed_joint_state`,
/// `force_sensors` and `center_of_pressure` are written by the estimator;
/// `controller_ran`, `robot_motion_status` and `low_level_joint_desired` by
/// the controller.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RealTimeContextData {
    /// Monotonic estimator timestamp [ns].
    pub timestamp: i64,
    pub controller_ran: bool,
    pub estimator_ran: bool,
    pub processed_joint_state: ProcessedJointBlock,
    pub force_sensors: ForceSensorBlock,
    pub center_of_pressure: CenterOfPressureBlock,
    pub robot_motion_status: RobotMotionStatus,
    pub low_level_joint_desired: LowLevelJointDesiredBlock,
}

impl RealTimeContextData {
    /// Deep copy of every block, flag and the timestamp.
    #[inline]
    pub fn copy_from(&mut self, other: &RealTimeContextData) {
        self.clone_from(other);
    }

    /// Exhaustive value comparison.
    #[inline]
    pub fn equals(&self, other: &RealTimeContextData) -> bool {
        self == other
    }

    /// Copy only the controller-owned field group.
    pub fn copy_control_from(&mut self, other: &RealTimeContextData) {
        self.controller_ran = other.controller_ran;
        self.robot_motion_status = other.robot_motion_status;
        self.low_level_joint_desired
            .clone_from(&other.low_level_joint_desired);
    }

    /// Copy only the estimator-owned field group.
    pub fn copy_estimate_from(&mut self, other: &RealTimeContextData) {
        self.timestamp = other.timestamp;
        self.estimator_ran = other.estimator_ran;
        self.processed_joint_state
            .clone_from(&other.processed_joint_state);
        self.force_sensors.clone_from(&other.force_sensors);
        self.center_of_pressure = other.center_of_pressure;
    }

    /// Estimate timestamp in seconds.
    #[inline]
    pub fn time_s(&self) -> f64 {
        self.timestamp as f64 * 1.0e-9
    }

    /// Vertical force per foot [N].
    pub fn foot_normal_forces(&self) -> SideMap<f64> {
        SideMap::from_fn(|side| self.force_sensors.normal_force(side))
    }

    /// Sum of measured foot forces, world frame [N].
    pub fn total_foot_force(&self) -> Vector3<f64> {
        self.force_sensors
            .sensors
            .iter()
            .fold(Vector3::zeros(), |acc, s| acc + s.wrench.linear)
    }
}
