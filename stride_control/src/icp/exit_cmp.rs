//! Exit-CMP projection multiplier.
//!
//! Contribution of the upcoming step's exit CMP to the ICP at the current
//! step boundary. Output layout:
//!
//! | entry | value |
//! |---|---|
//! | 0 | `e^{ω·t_entry} · (1 − e^{ω·t_exit})` |
//! | 1 | `ω` × entry 0 |
//! | 2 | `1 − e^{−ω·T_last}` |
//! | 3 | `−ω · e^{−ω·T_last}` |

use nalgebra::Vector4;

use stride_common::walking::error::NumericDomainError;

use super::timing::{validate_omega, RecursionTiming};

/// 4×1 exit-CMP projection multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExitCmpProjectionMultiplier {
    value: Vector4<f64>,
}

impl ExitCmpProjectionMultiplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero the output.
    #[inline]
    pub fn reset(&mut self) {
        self.value = Vector4::zeros();
    }

    #[inline]
    pub fn value(&self) -> &Vector4<f64> {
        &self.value
    }

    /// Recompute from `omega` and `timing`.
    ///
    /// Long durations can overflow the exponentials even for valid inputs;
    /// a non-finite result is an error. On error the output is zeroed.
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
        let step_duration = timing.step_duration();
        let time_on_exit = timing.exit_cmp_ratio * step_duration;
        let time_on_entry = step_duration - time_on_exit;

        let exit_time = split * timing.upcoming_double_support - time_on_exit;
        let exit_recursion = (omega * exit_time).exp();

        let entry_time =
            timing.spline_start + (1.0 - split) * timing.current_double_support - time_on_entry;
        let entry_recursion = (omega * entry_time).exp();

        let last_segment = timing.total_trajectory_time - timing.spline_end;
        let last_projection = (-omega * last_segment).exp();

        let projection = entry_recursion * (1.0 - exit_recursion);
        self.value = Vector4::new(
            projection,
            omega * projection,
            1.0 - last_projection,
            -omega * last_projection,
        );
        if !self.value.iter().all(|v| v.is_finite()) {
            self.reset();
            return Err(NumericDomainError::NonFiniteMultiplier { kind: "exit-CMP" });
        }
        Ok(())
    }
}
