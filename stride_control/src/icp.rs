//! ICP recursion engine.
//!
//! Closed-form linear inverted pendulum recursion multipliers used as
//! balance setpoint coefficients. Both multipliers are pure functions of
//! ω₀ and [`RecursionTiming`]; the engine only caches ω₀ and the outputs.

pub mod exit_cmp;
pub mod state_end;
pub mod timing;

use stride_common::walking::config::IcpConfig;
use stride_common::walking::error::NumericDomainError;

pub use exit_cmp::ExitCmpProjectionMultiplier;
pub use state_end::StateEndRecursionMultiplier;
pub use timing::{validate_omega, RecursionTiming};

/// Pendulum natural frequency ω₀ = sqrt(g / z₀).
pub fn omega_from(gravity: f64, com_height: f64) -> Result<f64, NumericDomainError> {
    if !gravity.is_finite() || !com_height.is_finite() || gravity <= 0.0 || com_height <= 0.0 {
        return Err(NumericDomainError::InvalidPendulum {
            gravity,
            com_height,
        });
    }
    Ok((gravity / com_height).sqrt())
}

/// Owns ω₀ and both recursion multipliers.
#[derive(Debug, Clone)]
pub struct IcpRecursionEngine {
    omega: f64,
    exit_cmp: ExitCmpProjectionMultiplier,
    state_end: StateEndRecursionMultiplier,
}

impl IcpRecursionEngine {
    pub fn new(config: &IcpConfig) -> Result<Self, NumericDomainError> {
        Self::with_omega(omega_from(config.gravity, config.com_height)?)
    }

    pub fn with_omega(omega: f64) -> Result<Self, NumericDomainError> {
        validate_omega(omega)?;
        Ok(Self {
            omega,
            exit_cmp: ExitCmpProjectionMultiplier::new(),
            state_end: StateEndRecursionMultiplier::new(),
        })
    }

    #[inline]
    pub fn omega(&self) -> f64 {
        self.omega
    }

    /// Recompute both multipliers. On error both outputs are zeroed.
    pub fn compute(&mut self, timing: &RecursionTiming) -> Result<(), NumericDomainError> {
        let result = self
            .exit_cmp
            .compute(self.omega, timing)
            .and_then(|()| self.state_end.compute(self.omega, timing));
        if result.is_err() {
            self.reset();
        }
        result
    }

    pub fn reset(&mut self) {
        self.exit_cmp.reset();
        self.state_end.reset();
    }

    #[inline]
    pub fn exit_cmp(&self) -> &ExitCmpProjectionMultiplier {
        &self.exit_cmp
    }

    #[inline]
    pub fn state_end(&self) -> &StateEndRecursionMultiplier {
        &self.state_end
    }
}
