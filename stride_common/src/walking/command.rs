//! Whole-body motion commands submitted to the QP solver.
//!
//! All commands are plain `Copy` values so the aggregator can store them
//! by value in fixed-capacity lists. A `weight` of `None` marks a hard
//! constraint; `Some(w)` is a soft objective with weight `w`.

use nalgebra::{Vector3, Vector6};

/// Index of a one-DoF joint in the robot's joint ordering.
pub type JointId = u16;

/// Index of a rigid body in the robot's body ordering.
pub type RigidBodyId = u16;

/// Spatial force: torque (angular) and force (linear), world frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Wrench {
    /// Torque [N·m].
    pub angular: Vector3<f64>,
    /// Force [N].
    pub linear: Vector3<f64>,
}

impl Wrench {
    pub fn new(angular: Vector3<f64>, linear: Vector3<f64>) -> Self {
        Self { angular, linear }
    }

    /// Pure force along `linear`.
    pub fn force(linear: Vector3<f64>) -> Self {
        Self {
            angular: Vector3::zeros(),
            linear,
        }
    }

    /// Stacked `[angular; linear]`.
    pub fn as_vector6(&self) -> Vector6<f64> {
        Vector6::new(
            self.angular.x,
            self.angular.y,
            self.angular.z,
            self.linear.x,
            self.linear.y,
            self.linear.z,
        )
    }
}

/// Desired rate of change of centroidal momentum `[angular; linear]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentumRateCommand {
    pub rate: Vector6<f64>,
    /// Per-axis selection; unselected axes are left free.
    pub selection: [bool; 6],
    pub weight: Option<f64>,
}

impl MomentumRateCommand {
    /// Linear momentum rate only (angular axes free).
    pub fn linear(rate: Vector3<f64>, weight: Option<f64>) -> Self {
        Self {
            rate: Vector6::new(0.0, 0.0, 0.0, rate.x, rate.y, rate.z),
            selection: [false, false, false, true, true, true],
            weight,
        }
    }
}

/// Desired acceleration of a single one-DoF joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointAccelerationCommand {
    pub joint: JointId,
    /// [rad/s²].
    pub acceleration: f64,
    pub weight: Option<f64>,
}

/// Desired spatial acceleration of a body relative to a base body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialAccelerationCommand {
    pub body: RigidBodyId,
    pub base: RigidBodyId,
    /// `[angular; linear]`.
    pub acceleration: Vector6<f64>,
    pub weight: Option<f64>,
}

/// Desired linear acceleration of a body-fixed point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointAccelerationCommand {
    pub body: RigidBodyId,
    /// Point in body frame [m].
    pub point: Vector3<f64>,
    /// [m/s²].
    pub acceleration: Vector3<f64>,
    pub weight: Option<f64>,
}

/// Known external wrench acting on a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExternalWrenchCommand {
    pub body: RigidBodyId,
    pub wrench: Wrench,
}

impl JointAccelerationCommand {
    #[inline]
    pub fn is_hard_constraint(&self) -> bool {
        self.weight.is_none()
    }
}
