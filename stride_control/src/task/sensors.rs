//! Sensor and kinematics seams of the periodic tasks.
//!
//! The raw sensor-reading layer and the kinematic model are external; the
//! tasks see them only through [`SensorSource`] and [`SoleFrames`].

use nalgebra::{Vector2, Vector3};

use stride_common::walking::command::{RigidBodyId, Wrench};
use stride_common::walking::config::RobotConfig;
use stride_common::walking::context::{ForceSensorReading, JointState, RealTimeContextData};
use stride_common::walking::footstep::{Footstep, Pose};
use stride_common::walking::side::{FeetInContact, Side, SideMap};

/// Fills the estimator-owned blocks of a context each cycle.
pub trait SensorSource {
    /// Write joint state, force sensors and center of pressure for `time_s`.
    fn sample(&mut self, time_s: f64, data: &mut RealTimeContextData);
}

/// Live sole frames and rigid-body ids of the robot model.
pub trait SoleFrames {
    /// World pose of each sole for the given estimate.
    fn sole_poses(&self, data: &RealTimeContextData) -> SideMap<Pose>;

    /// Rigid body carrying the sole of `side`.
    fn foot_body(&self, side: Side) -> RigidBodyId;

    /// Rigid body accelerations are expressed against.
    fn world_body(&self) -> RigidBodyId {
        0
    }
}

/// Classify contact from the measured normal force under each foot.
pub fn detect_contact(data: &RealTimeContextData, force_threshold: f64) -> FeetInContact {
    let forces = data.foot_normal_forces();
    let mut feet = FeetInContact::empty();
    for side in Side::ALL {
        if forces[side] >= force_threshold {
            feet.insert_side(side);
        }
    }
    feet
}

// ─── Simulated stance ───────────────────────────────────────────────

/// Open-loop sensor model that follows a footstep plan.
///
/// A foot is unloaded during `[start_time, end_time)` of any of its
/// footsteps; the body weight is split evenly over the loaded feet. Joints
/// hold position with a small deterministic sway in velocity.
#[derive(Debug, Clone)]
pub struct SimulatedStance {
    weight: f64,
    joint_count: usize,
    footsteps: Vec<Footstep>,
}

impl SimulatedStance {
    pub fn new(robot: &RobotConfig, gravity: f64, footsteps: &[Footstep]) -> Self {
        Self {
            weight: robot.mass * gravity,
            joint_count: robot.joint_count,
            footsteps: footsteps.to_vec(),
        }
    }

    /// Feet on the ground at `time_s` according to the plan.
    pub fn loaded_feet(&self, time_s: f64) -> FeetInContact {
        let mut feet = FeetInContact::BOTH;
        for step in &self.footsteps {
            if step.start_time <= time_s && time_s < step.end_time {
                feet.remove_side(step.side);
            }
        }
        feet
    }
}

impl SensorSource for SimulatedStance {
    fn sample(&mut self, time_s: f64, data: &mut RealTimeContextData) {
        let loaded = self.loaded_feet(time_s);
        let per_foot = if loaded.is_empty() {
            0.0
        } else {
            self.weight / loaded.count() as f64
        };

        data.force_sensors.sensors.clear();
        for side in Side::ALL {
            let force = if loaded.contains_side(side) { per_foot } else { 0.0 };
            // MAX_FORCE_SENSORS >= 2.
            let _ = data.force_sensors.sensors.push(ForceSensorReading {
                side: Some(side),
                wrench: Wrench::force(Vector3::new(0.0, 0.0, force)),
            });
            data.center_of_pressure.per_foot[side] =
                loaded.contains_side(side).then(Vector2::zeros);
        }

        let joints = &mut data.processed_joint_state.joints;
        joints.clear();
        for i in 0..self.joint_count {
            let phase = time_s + 0.1 * i as f64;
            let _ = joints.push(JointState {
                position: 0.0,
                velocity: 0.01 * phase.sin(),
                acceleration: 0.0,
                torque: 0.0,
            });
        }
    }
}

// ─── Fixed sole frames ──────────────────────────────────────────────

/// Soles at ±stance_width/2 around the origin, independent of the estimate.
#[derive(Debug, Clone, Copy)]
pub struct FixedSoleFrames {
    poses: SideMap<Pose>,
    bodies: SideMap<RigidBodyId>,
}

impl FixedSoleFrames {
    pub fn new(robot: &RobotConfig) -> Self {
        let half = 0.5 * robot.stance_width;
        Self {
            poses: SideMap::new(
                Pose::from_xyz_yaw(0.0, half, 0.0, 0.0),
                Pose::from_xyz_yaw(0.0, -half, 0.0, 0.0),
            ),
            bodies: SideMap::new(1, 2),
        }
    }
}

impl SoleFrames for FixedSoleFrames {
    fn sole_poses(&self, _data: &RealTimeContextData) -> SideMap<Pose> {
        self.poses
    }

    fn foot_body(&self, side: Side) -> RigidBodyId {
        self.bodies[side]
    }
}
