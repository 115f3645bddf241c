//! Walking controller configuration.
//!
//! All config types use `serde::Deserialize` for TOML loading.
//! Numeric parameters have const `MIN`/`MAX` bounds checked by `validate()`.
//! Every section defaults, so an empty document is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SharedConfig};
use crate::consts::{
    COM_HEIGHT_DEFAULT, CONTACT_PHASE_CAPACITY, CONTROLLER_PERIOD_US, ESTIMATOR_PERIOD_US,
    GRAVITY_DEFAULT, MAX_JOINTS, MAX_QUEUED_FOOTSTEPS, STALE_THRESHOLD_DEFAULT,
    TASK_PERIOD_US_MAX, TASK_PERIOD_US_MIN, TRANSITION_TIME_EPSILON,
};

use super::footstep::{Footstep, Pose};
use super::side::Side;

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ConfigError::ValidationError(format!(
            "{name} {value} out of range [{min}, {max}]"
        )));
    }
    Ok(())
}

// ─── Top-Level Config ───────────────────────────────────────────────

/// Complete Stride configuration.
///
/// ```toml
/// [shared]
/// service_name = "stride-biped-01"
///
/// [timing]
/// estimator_period_us = 1000
/// controller_period_us = 4000
///
/// [icp]
/// com_height = 0.85
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrideConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub icp: IcpConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub robot: RobotConfig,
}

impl StrideConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.timing.validate()?;
        self.icp.validate()?;
        self.scheduler.validate()?;
        self.robot.validate()?;
        Ok(())
    }
}

// ─── Timing ─────────────────────────────────────────────────────────

/// Periods of the two real-time tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Estimator period [µs] (default: 1000).
    #[serde(default = "default_estimator_period")]
    pub estimator_period_us: u32,

    /// Controller period [µs] (default: 4000).
    #[serde(default = "default_controller_period")]
    pub controller_period_us: u32,

    /// Controller reads without a fresh estimate before reporting stale (default: 3).
    #[serde(default = "default_stale_threshold")]
    pub stale_threshold: u32,
}

fn default_estimator_period() -> u32 {
    ESTIMATOR_PERIOD_US
}
fn default_controller_period() -> u32 {
    CONTROLLER_PERIOD_US
}
fn default_stale_threshold() -> u32 {
    STALE_THRESHOLD_DEFAULT
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            estimator_period_us: default_estimator_period(),
            controller_period_us: default_controller_period(),
            stale_threshold: default_stale_threshold(),
        }
    }
}

impl TimingConfig {
    pub const STALE_THRESHOLD_MAX: u32 = 1000;

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, period) in [
            ("estimator_period_us", self.estimator_period_us),
            ("controller_period_us", self.controller_period_us),
        ] {
            if !(TASK_PERIOD_US_MIN..=TASK_PERIOD_US_MAX).contains(&period) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} {period} out of range [{TASK_PERIOD_US_MIN}, {TASK_PERIOD_US_MAX}]"
                )));
            }
        }
        if self.stale_threshold == 0 || self.stale_threshold > Self::STALE_THRESHOLD_MAX {
            return Err(ConfigError::ValidationError(format!(
                "stale_threshold {} out of range [1, {}]",
                self.stale_threshold,
                Self::STALE_THRESHOLD_MAX
            )));
        }
        Ok(())
    }

    /// Controller period [s].
    #[inline]
    pub fn controller_period_s(&self) -> f64 {
        f64::from(self.controller_period_us) * 1.0e-6
    }

    /// Estimator period [s].
    #[inline]
    pub fn estimator_period_s(&self) -> f64 {
        f64::from(self.estimator_period_us) * 1.0e-6
    }
}

// ─── ICP ────────────────────────────────────────────────────────────

/// Linear inverted pendulum and CMP timing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcpConfig {
    /// Gravity magnitude [m/s²] (default: 9.81).
    #[serde(default = "default_gravity")]
    pub gravity: f64,

    /// Nominal CoM height above the ground [m] (default: 0.9).
    #[serde(default = "default_com_height")]
    pub com_height: f64,

    /// Fraction of double support spent before the upcoming step's entry CMP (default: 0.5).
    #[serde(default = "default_half")]
    pub double_support_split_ratio: f64,

    /// Fraction of the step spent on the exit CMP (default: 0.5).
    #[serde(default = "default_half")]
    pub exit_cmp_ratio: f64,

    /// Swing spline start, as a fraction of step duration (default: 0.125).
    #[serde(default = "default_spline_start_ratio")]
    pub spline_start_ratio: f64,

    /// Swing spline end, as a fraction of step duration (default: 0.625).
    #[serde(default = "default_spline_end_ratio")]
    pub spline_end_ratio: f64,

    /// Double support used when the schedule is too short to tell [s] (default: 0.2).
    #[serde(default = "default_nominal_double_support")]
    pub nominal_double_support: f64,

    /// Single support used when the schedule is too short to tell [s] (default: 0.6).
    #[serde(default = "default_nominal_single_support")]
    pub nominal_single_support: f64,
}

fn default_gravity() -> f64 {
    GRAVITY_DEFAULT
}
fn default_com_height() -> f64 {
    COM_HEIGHT_DEFAULT
}
fn default_half() -> f64 {
    0.5
}
fn default_spline_start_ratio() -> f64 {
    0.125
}
fn default_spline_end_ratio() -> f64 {
    0.625
}
fn default_nominal_double_support() -> f64 {
    0.2
}
fn default_nominal_single_support() -> f64 {
    0.6
}

impl Default for IcpConfig {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            com_height: default_com_height(),
            double_support_split_ratio: default_half(),
            exit_cmp_ratio: default_half(),
            spline_start_ratio: default_spline_start_ratio(),
            spline_end_ratio: default_spline_end_ratio(),
            nominal_double_support: default_nominal_double_support(),
            nominal_single_support: default_nominal_single_support(),
        }
    }
}

impl IcpConfig {
    pub const GRAVITY_MIN: f64 = 0.1;
    pub const GRAVITY_MAX: f64 = 30.0;
    pub const COM_HEIGHT_MIN: f64 = 0.1;
    pub const COM_HEIGHT_MAX: f64 = 3.0;
    pub const DURATION_MIN: f64 = 0.0;
    pub const DURATION_MAX: f64 = 10.0;

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("gravity", self.gravity, Self::GRAVITY_MIN, Self::GRAVITY_MAX)?;
        check_range(
            "com_height",
            self.com_height,
            Self::COM_HEIGHT_MIN,
            Self::COM_HEIGHT_MAX,
        )?;
        check_range(
            "double_support_split_ratio",
            self.double_support_split_ratio,
            0.0,
            1.0,
        )?;
        check_range("exit_cmp_ratio", self.exit_cmp_ratio, 0.0, 1.0)?;
        check_range("spline_start_ratio", self.spline_start_ratio, 0.0, 1.0)?;
        check_range("spline_end_ratio", self.spline_end_ratio, 0.0, 1.0)?;
        if self.spline_start_ratio > self.spline_end_ratio {
            return Err(ConfigError::ValidationError(format!(
                "spline_start_ratio {} exceeds spline_end_ratio {}",
                self.spline_start_ratio, self.spline_end_ratio
            )));
        }
        check_range(
            "nominal_double_support",
            self.nominal_double_support,
            Self::DURATION_MIN,
            Self::DURATION_MAX,
        )?;
        check_range(
            "nominal_single_support",
            self.nominal_single_support,
            Self::DURATION_MIN,
            Self::DURATION_MAX,
        )?;
        Ok(())
    }

    /// Pendulum natural frequency sqrt(g / z0) [1/s].
    #[inline]
    pub fn omega(&self) -> f64 {
        (self.gravity / self.com_height).sqrt()
    }
}

// ─── Scheduler ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Transitions closer than this are merged [s] (default: 1e-6).
    #[serde(default = "default_transition_epsilon")]
    pub transition_epsilon: f64,

    /// Contact phases kept in the look-ahead (default: 5, max: 5).
    #[serde(default = "default_look_ahead")]
    pub look_ahead_phases: usize,
}

fn default_transition_epsilon() -> f64 {
    TRANSITION_TIME_EPSILON
}
fn default_look_ahead() -> usize {
    CONTACT_PHASE_CAPACITY
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            transition_epsilon: default_transition_epsilon(),
            look_ahead_phases: default_look_ahead(),
        }
    }
}

impl SchedulerConfig {
    pub const EPSILON_MIN: f64 = 0.0;
    pub const EPSILON_MAX: f64 = 0.05;

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "transition_epsilon",
            self.transition_epsilon,
            Self::EPSILON_MIN,
            Self::EPSILON_MAX,
        )?;
        if self.look_ahead_phases < 2 || self.look_ahead_phases > CONTACT_PHASE_CAPACITY {
            return Err(ConfigError::ValidationError(format!(
                "look_ahead_phases {} out of range [2, {}]",
                self.look_ahead_phases, CONTACT_PHASE_CAPACITY
            )));
        }
        Ok(())
    }
}

// ─── Robot ──────────────────────────────────────────────────────────

/// Minimal robot parameters the control core needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Total mass [kg] (default: 75.0).
    #[serde(default = "default_mass")]
    pub mass: f64,

    /// Actuated one-DoF joints (default: 12).
    #[serde(default = "default_joint_count")]
    pub joint_count: usize,

    /// Sole length along the foot x axis [m] (default: 0.22).
    #[serde(default = "default_foot_length")]
    pub foot_length: f64,

    /// Sole width along the foot y axis [m] (default: 0.11).
    #[serde(default = "default_foot_width")]
    pub foot_width: f64,

    /// Lateral distance between the two sole frames at rest [m] (default: 0.25).
    #[serde(default = "default_stance_width")]
    pub stance_width: f64,

    /// Vertical force above which a foot counts as loaded [N] (default: 50.0).
    #[serde(default = "default_contact_force_threshold")]
    pub contact_force_threshold: f64,

    /// Joint velocity damping used for the joint acceleration objective [1/s] (default: 5.0).
    #[serde(default = "default_joint_damping")]
    pub joint_damping: f64,
}

fn default_mass() -> f64 {
    75.0
}
fn default_joint_count() -> usize {
    12
}
fn default_foot_length() -> f64 {
    0.22
}
fn default_foot_width() -> f64 {
    0.11
}
fn default_stance_width() -> f64 {
    0.25
}
fn default_contact_force_threshold() -> f64 {
    50.0
}
fn default_joint_damping() -> f64 {
    5.0
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            mass: default_mass(),
            joint_count: default_joint_count(),
            foot_length: default_foot_length(),
            foot_width: default_foot_width(),
            stance_width: default_stance_width(),
            contact_force_threshold: default_contact_force_threshold(),
            joint_damping: default_joint_damping(),
        }
    }
}

impl RobotConfig {
    pub const MASS_MIN: f64 = 1.0;
    pub const MASS_MAX: f64 = 500.0;
    pub const FOOT_DIM_MIN: f64 = 0.01;
    pub const FOOT_DIM_MAX: f64 = 1.0;
    pub const STANCE_WIDTH_MAX: f64 = 2.0;
    pub const FORCE_THRESHOLD_MAX: f64 = 5000.0;
    pub const DAMPING_MAX: f64 = 1000.0;

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("mass", self.mass, Self::MASS_MIN, Self::MASS_MAX)?;
        if self.joint_count == 0 || self.joint_count > MAX_JOINTS {
            return Err(ConfigError::ValidationError(format!(
                "joint_count {} out of range [1, {}]",
                self.joint_count, MAX_JOINTS
            )));
        }
        check_range(
            "foot_length",
            self.foot_length,
            Self::FOOT_DIM_MIN,
            Self::FOOT_DIM_MAX,
        )?;
        check_range(
            "foot_width",
            self.foot_width,
            Self::FOOT_DIM_MIN,
            Self::FOOT_DIM_MAX,
        )?;
        check_range("stance_width", self.stance_width, 0.0, Self::STANCE_WIDTH_MAX)?;
        check_range(
            "contact_force_threshold",
            self.contact_force_threshold,
            0.0,
            Self::FORCE_THRESHOLD_MAX,
        )?;
        check_range("joint_damping", self.joint_damping, 0.0, Self::DAMPING_MAX)?;
        Ok(())
    }
}

// ─── Footstep Plan ──────────────────────────────────────────────────

/// One planned footstep as written in a plan file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootstepPlanEntry {
    pub side: Side,
    /// Goal sole position [m].
    pub position: [f64; 3],
    /// Goal heading [rad].
    #[serde(default)]
    pub yaw: f64,
    /// Lift-off time [s].
    pub start: f64,
    /// Touch-down time [s].
    pub end: f64,
}

impl FootstepPlanEntry {
    pub fn to_footstep(&self) -> Footstep {
        let [x, y, z] = self.position;
        Footstep::new(
            self.side,
            Pose::from_xyz_yaw(x, y, z, self.yaw),
            self.start,
            self.end,
        )
    }
}

/// Footstep plan file.
///
/// ```toml
/// [[footsteps]]
/// side = "left"
/// position = [0.3, 0.125, 0.0]
/// start = 1.0
/// end = 1.6
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FootstepPlan {
    #[serde(default)]
    pub footsteps: Vec<FootstepPlanEntry>,
}

impl FootstepPlan {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.footsteps.len() > MAX_QUEUED_FOOTSTEPS {
            return Err(ConfigError::ValidationError(format!(
                "{} footsteps exceed capacity {}",
                self.footsteps.len(),
                MAX_QUEUED_FOOTSTEPS
            )));
        }
        for (i, entry) in self.footsteps.iter().enumerate() {
            entry
                .to_footstep()
                .validate()
                .map_err(|e| ConfigError::ValidationError(format!("footstep {i}: {e}")))?;
        }
        Ok(())
    }

    /// Materialize the plan; called once at startup, outside the RT loop.
    pub fn to_footsteps(&self) -> Vec<Footstep> {
        self.footsteps.iter().map(FootstepPlanEntry::to_footstep).collect()
    }
}
