//! Step timing parameters for the ICP recursion.

use stride_common::walking::config::IcpConfig;
use stride_common::walking::error::NumericDomainError;

use crate::scheduler::{ContactPhase, ContactPhaseRing};

/// Scalar timing inputs shared by both recursion multipliers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecursionTiming {
    /// Current double-support duration D_c [s].
    pub current_double_support: f64,
    /// Upcoming double-support duration D_u [s].
    pub upcoming_double_support: f64,
    /// Single-support duration S [s].
    pub single_support: f64,
    /// Fraction of double support spent before the entry CMP switch.
    pub double_support_split_ratio: f64,
    /// Fraction of the step spent on the exit CMP.
    pub exit_cmp_ratio: f64,
    /// Swing spline window start [s], relative to step start.
    pub spline_start: f64,
    /// Swing spline window end [s], relative to step start.
    pub spline_end: f64,
    /// Total step trajectory time [s].
    pub total_trajectory_time: f64,
}

impl RecursionTiming {
    /// Nominal timing from configuration alone.
    pub fn nominal(config: &IcpConfig) -> Self {
        Self::from_durations(
            config,
            config.nominal_double_support,
            config.nominal_single_support,
            config.nominal_double_support,
        )
    }

    /// Timing for the given D_c, S and D_u, with ratios and spline window
    /// taken from `config`.
    pub fn from_durations(
        config: &IcpConfig,
        current_double_support: f64,
        single_support: f64,
        upcoming_double_support: f64,
    ) -> Self {
        let step_duration = current_double_support + single_support;
        Self {
            current_double_support,
            upcoming_double_support,
            single_support,
            double_support_split_ratio: config.double_support_split_ratio,
            exit_cmp_ratio: config.exit_cmp_ratio,
            spline_start: config.spline_start_ratio * step_duration,
            spline_end: config.spline_end_ratio * step_duration,
            total_trajectory_time: step_duration,
        }
    }

    /// Derive D_c, S and D_u from the scheduled phases.
    ///
    /// The leading double-support phase gives D_c (zero when the robot is
    /// already in single support), the next single-support phase gives S and
    /// the phase after it gives D_u (zero when two swings follow each other
    /// directly). Open or missing phases fall back to the nominal durations.
    pub fn from_phases(phases: &ContactPhaseRing, config: &IcpConfig) -> Self {
        let ds_nominal = config.nominal_double_support;
        let ss_nominal = config.nominal_single_support;
        fn finite_or(phase: &ContactPhase, nominal: f64) -> f64 {
            if phase.is_open() {
                nominal
            } else {
                phase.duration()
            }
        }

        let mut it = phases.iter().peekable();

        let current_double_support = match it.peek() {
            Some(p) if p.feet_in_contact.is_double_support() => {
                let d = finite_or(p, ds_nominal);
                it.next();
                d
            }
            Some(p) if p.feet_in_contact.is_single_support() => 0.0,
            _ => ds_nominal,
        };

        let single_support = match it.peek() {
            Some(p) if p.feet_in_contact.is_single_support() => {
                let d = finite_or(p, ss_nominal);
                it.next();
                d
            }
            _ => ss_nominal,
        };

        let upcoming_double_support = match it.peek() {
            Some(p) if p.feet_in_contact.is_double_support() => finite_or(p, ds_nominal),
            Some(p) if p.feet_in_contact.is_single_support() => 0.0,
            _ => ds_nominal,
        };

        Self::from_durations(
            config,
            current_double_support,
            single_support,
            upcoming_double_support,
        )
    }

    /// D_c + S.
    #[inline]
    pub fn step_duration(&self) -> f64 {
        self.current_double_support + self.single_support
    }

    /// Reject negative or non-finite durations, ratios outside [0, 1] and
    /// a reversed or overlong spline window.
    pub fn validate(&self) -> Result<(), NumericDomainError> {
        for (name, value) in [
            ("current_double_support", self.current_double_support),
            ("upcoming_double_support", self.upcoming_double_support),
            ("single_support", self.single_support),
            ("spline_start", self.spline_start),
            ("spline_end", self.spline_end),
            ("total_trajectory_time", self.total_trajectory_time),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(NumericDomainError::InvalidDuration { name, value });
            }
        }
        for (name, value) in [
            ("double_support_split_ratio", self.double_support_split_ratio),
            ("exit_cmp_ratio", self.exit_cmp_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(NumericDomainError::RatioOutOfRange { name, value });
            }
        }
        if self.spline_start > self.spline_end || self.spline_end > self.total_trajectory_time {
            return Err(NumericDomainError::InvalidSplineWindow {
                start: self.spline_start,
                end: self.spline_end,
                total: self.total_trajectory_time,
            });
        }
        Ok(())
    }
}

/// Reject a non-positive or non-finite natural frequency.
#[inline]
pub fn validate_omega(omega: f64) -> Result<(), NumericDomainError> {
    if omega.is_finite() && omega > 0.0 {
        Ok(())
    } else {
        Err(NumericDomainError::InvalidOmega(omega))
    }
}
