//! Footsteps, sole poses and support polygons.

use heapless::Vec as FixedVec;
use nalgebra::{UnitQuaternion, Vector2, Vector3};

use super::error::PlanningInputError;
use super::side::Side;
use crate::consts::{MAX_FOOT_VERTICES, MAX_SUPPORT_VERTICES};

/// Rigid pose in world frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Position [m].
    pub position: Vector3<f64>,
    /// Orientation.
    pub orientation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
        }
    }

    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Planar pose: position on the ground plane and heading about +z.
    pub fn from_xyz_yaw(x: f64, y: f64, z: f64, yaw: f64) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            orientation: UnitQuaternion::from_euler_angles(0.0, 0.0, yaw),
        }
    }

    /// Heading about +z [rad].
    #[inline]
    pub fn yaw(&self) -> f64 {
        self.orientation.euler_angles().2
    }

    /// Project a sole-frame 2D point into the world ground plane.
    #[inline]
    pub fn transform_point2(&self, local: &Vector2<f64>) -> Vector2<f64> {
        let world = self.position + self.orientation * Vector3::new(local.x, local.y, 0.0);
        Vector2::new(world.x, world.y)
    }

    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.orientation.coords.iter().all(|v| v.is_finite())
    }
}

/// Sole polygon in the foot's own frame.
pub type FootPolygon = FixedVec<Vector2<f64>, MAX_FOOT_VERTICES>;

/// Build a rectangular sole polygon centered on the sole frame origin.
pub fn rectangular_foot(length: f64, width: f64) -> FootPolygon {
    let (hx, hy) = (0.5 * length, 0.5 * width);
    let mut polygon = FootPolygon::new();
    for (x, y) in [(hx, hy), (-hx, hy), (-hx, -hy), (hx, -hy)] {
        // Capacity is MAX_FOOT_VERTICES >= 4.
        let _ = polygon.push(Vector2::new(x, y));
    }
    polygon
}

/// Convex support region on the ground plane, counter-clockwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupportPolygon {
    vertices: FixedVec<Vector2<f64>, MAX_SUPPORT_VERTICES>,
}

impl SupportPolygon {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn vertices(&self) -> &[Vector2<f64>] {
        &self.vertices
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    /// Replace the region with the convex hull of `points` (monotone chain).
    ///
    /// Points beyond `MAX_SUPPORT_VERTICES` are ignored. Collinear points
    /// are dropped from the hull.
    pub fn set_convex_hull(&mut self, points: &[Vector2<f64>]) {
        let mut sorted: FixedVec<Vector2<f64>, MAX_SUPPORT_VERTICES> = FixedVec::new();
        for p in points.iter().take(MAX_SUPPORT_VERTICES) {
            let _ = sorted.push(*p);
        }
        insertion_sort_by(&mut sorted, |a, b| {
            a.x < b.x || (a.x == b.x && a.y < b.y)
        });

        self.vertices.clear();
        if sorted.len() < 3 {
            for p in sorted.iter() {
                let _ = self.vertices.push(*p);
            }
            return;
        }

        // One spare slot for the closing point when every input is a vertex.
        let mut chain: FixedVec<Vector2<f64>, { MAX_SUPPORT_VERTICES + 1 }> = FixedVec::new();

        // Lower hull.
        for p in sorted.iter() {
            while chain.len() >= 2
                && cross(&chain[chain.len() - 2], &chain[chain.len() - 1], p) <= 0.0
            {
                chain.pop();
            }
            let _ = chain.push(*p);
        }
        // Upper hull.
        let lower_len = chain.len() + 1;
        for p in sorted.iter().rev().skip(1) {
            while chain.len() >= lower_len
                && cross(&chain[chain.len() - 2], &chain[chain.len() - 1], p) <= 0.0
            {
                chain.pop();
            }
            let _ = chain.push(*p);
        }
        // Last point repeats the first.
        chain.pop();
        for p in chain.iter() {
            let _ = self.vertices.push(*p);
        }
    }

    /// Signed area (positive for counter-clockwise order).
    pub fn area(&self) -> f64 {
        let n = self.vertices.len();
        if n < 3 {
            return 0.0;
        }
        let mut twice = 0.0;
        for i in 0..n {
            let a = &self.vertices[i];
            let b = &self.vertices[(i + 1) % n];
            twice += a.x * b.y - b.x * a.y;
        }
        0.5 * twice
    }

    /// True if `point` lies inside or on the boundary.
    pub fn contains(&self, point: &Vector2<f64>) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        (0..n).all(|i| cross(&self.vertices[i], &self.vertices[(i + 1) % n], point) >= -1e-12)
    }
}

#[inline]
fn cross(o: &Vector2<f64>, a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Stable in-place insertion sort; allocation-free for RT paths.
pub fn insertion_sort_by<T>(items: &mut [T], mut less: impl FnMut(&T, &T) -> bool) {
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && less(&items[j], &items[j - 1]) {
            items.swap(j, j - 1);
            j -= 1;
        }
    }
}

/// A planned footstep, as handed over by the external planner.
///
/// Immutable once queued: the scheduler only ever borrows `&[Footstep]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Footstep {
    pub side: Side,
    /// Sole pose once the step has landed.
    pub goal_pose: Pose,
    /// Lift-off time [s].
    pub start_time: f64,
    /// Touch-down time [s].
    pub end_time: f64,
    /// Predicted sole contact polygon (sole frame), if the planner provides one.
    pub predicted_support: Option<FootPolygon>,
}

impl Footstep {
    pub fn new(side: Side, goal_pose: Pose, start_time: f64, end_time: f64) -> Self {
        Self {
            side,
            goal_pose,
            start_time,
            end_time,
            predicted_support: None,
        }
    }

    pub fn with_predicted_support(mut self, polygon: FootPolygon) -> Self {
        self.predicted_support = Some(polygon);
        self
    }

    /// Swing duration [s].
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Reject empty, negative or non-finite time intervals.
    pub fn validate(&self) -> Result<(), PlanningInputError> {
        if !self.start_time.is_finite()
            || !self.end_time.is_finite()
            || self.end_time <= self.start_time
        {
            return Err(PlanningInputError::InvalidFootstepInterval {
                side: self.side,
                start_time: self.start_time,
                end_time: self.end_time,
            });
        }
        if !self.goal_pose.is_finite() {
            return Err(PlanningInputError::NonFiniteGoalPose { side: self.side });
        }
        Ok(())
    }
}
