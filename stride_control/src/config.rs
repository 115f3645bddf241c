//! TOML configuration loader with validation.
//!
//! Loads [`StrideConfig`] and, optionally, a [`FootstepPlan`] from TOML.
//! Validates parameter bounds per section, then cross-checks the plan
//! against the configuration (per-side overlap, minimum step duration).

use std::path::Path;

use stride_common::config::{ConfigError, ConfigLoader};
use stride_common::walking::config::{FootstepPlan, StrideConfig};
use stride_common::walking::footstep::{insertion_sort_by, Footstep};
use stride_common::walking::side::Side;

// ─── Loaded Config Bundle ───────────────────────────────────────────

/// Complete validated configuration, ready for runtime use.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: StrideConfig,
    /// Footstep plan, materialized once at startup.
    pub footsteps: Vec<Footstep>,
}

// ─── Loading Functions ──────────────────────────────────────────────

/// Load and validate the configuration file and an optional plan file.
pub fn load_config(
    config_path: &Path,
    plan_path: Option<&Path>,
) -> Result<LoadedConfig, ConfigError> {
    let config = StrideConfig::load(config_path)?;
    let plan = match plan_path {
        Some(path) => FootstepPlan::load(path)?,
        None => FootstepPlan::default(),
    };
    finish(config, plan)
}

/// Load config from TOML strings (for testing).
pub fn load_config_from_strings(
    config_toml: &str,
    plan_toml: Option<&str>,
) -> Result<LoadedConfig, ConfigError> {
    let config = StrideConfig::load_str(config_toml)?;
    let plan = match plan_toml {
        Some(text) => FootstepPlan::load_str(text)?,
        None => FootstepPlan::default(),
    };
    finish(config, plan)
}

fn finish(config: StrideConfig, plan: FootstepPlan) -> Result<LoadedConfig, ConfigError> {
    config.validate()?;
    plan.validate()?;
    let footsteps = plan.to_footsteps();
    validate_plan_consistency(&config, &footsteps)?;
    Ok(LoadedConfig { config, footsteps })
}

// ─── Plan Validation ────────────────────────────────────────────────

/// Cross-check a plan against the configuration.
///
/// - Every footstep must last longer than the transition epsilon, or its
///   lift-off and touch-down would collapse into one instant.
/// - Footsteps of the same side must not overlap in time.
///
/// Overlap between the two sides is legal here; whether it leaves the
/// robot airborne is a planning-time decision of the scheduler.
pub fn validate_plan_consistency(
    config: &StrideConfig,
    footsteps: &[Footstep],
) -> Result<(), ConfigError> {
    let epsilon = config.scheduler.transition_epsilon;
    for (i, step) in footsteps.iter().enumerate() {
        if step.duration() <= epsilon {
            return Err(ConfigError::ValidationError(format!(
                "footstep {i}: duration {} not above transition epsilon {epsilon}",
                step.duration()
            )));
        }
    }

    for side in Side::ALL {
        let mut intervals: Vec<(f64, f64)> = footsteps
            .iter()
            .filter(|s| s.side == side)
            .map(|s| (s.start_time, s.end_time))
            .collect();
        insertion_sort_by(&mut intervals, |a, b| a.0 < b.0);
        for pair in intervals.windows(2) {
            if pair[1].0 < pair[0].1 {
                return Err(ConfigError::ValidationError(format!(
                    "{side:?} footsteps overlap: [{}, {}) and [{}, {})",
                    pair[0].0, pair[0].1, pair[1].0, pair[1].1
                )));
            }
        }
    }
    Ok(())
}

// ─── Tests ──────────────────────────────────────────────────────────
