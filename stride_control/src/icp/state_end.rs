//! State-end recursion multiplier.
//!
//! Propagates the boundary ICP to the start and end of the current swing
//! spline segment: `[e^{ω·t_0}; ω·e^{ω·t_0}; e^{−ω·T_last}; ω·e^{−ω·T_last}]`.

use nalgebra::Vector4;

use stride_common::walking::error::NumericDomainError;

use super::timing::{validate_omega, RecursionTiming};

/// 4×1 state-end recursion multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StateEndRecursionMultiplier {
    value: Vector4<f64>,
}

impl StateEndRecursionMultiplier {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn reset(&mut self) {
        self.value = Vector4::zeros();
    }

    #[inline]
    pub fn value(&self) -> &Vector4<f64> {
        &self.value
    }

    /// Recompute from `omega` and `timing`. On error the output is zeroed.
    pub fn compute(
        &mut self,
        omega: f64,
        timing: &RecursionTiming,
    ) -> Result<(), NumericDomainError> {
        if let Err(e) = validate_omega(omega).and_then(|()| timing.validate()) {
            self.reset();
            return Err(e);
        }

        let split = timing.double_support_split_ratio;
        let end_of_current_ds = (1.0 - split) * timing.current_double_support;
        let upcoming_initial_ds = split * timing.upcoming_double_support;

        let last_segment = timing.total_trajectory_time - timing.spline_end;
        let to_end = (-omega * last_segment).exp();

        let time_to_initial = upcoming_initial_ds + end_of_current_ds + timing.spline_start
            - timing.step_duration();
        let to_start = (omega * time_to_initial).exp();

        self.value = Vector4::new(to_start, omega * to_start, to_end, omega * to_end);
        if !self.value.iter().all(|v| v.is_finite()) {
            self.reset();
            return Err(NumericDomainError::NonFiniteMultiplier { kind: "state-end" });
        }
        Ok(())
    }
}
