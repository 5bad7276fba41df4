//! Simulation configuration loading and validation.
//!
//! All fields are checked before any simulation step runs.

use crate::domain::engine::SimConfig;
use crate::domain::error::DivtraderError;
use crate::domain::mode::ConfiguredMode;
use crate::ports::config_port::ConfigPort;

/// Read the `[simulation]` section into a validated [`SimConfig`].
pub fn build_sim_config(config: &dyn ConfigPort) -> Result<SimConfig, DivtraderError> {
    let mode_str =
        config
            .get_string("simulation", "mode")
            .ok_or_else(|| DivtraderError::ConfigMissing {
                section: "simulation".to_string(),
                key: "mode".to_string(),
            })?;
    let mode: ConfiguredMode = mode_str.parse()?;

    let sim = SimConfig {
        initial_capital: config.get_double("simulation", "initial_capital", 0.0),
        divisions: config.get_int("simulation", "divisions", 0).max(0) as u32,
        mode,
        rebalance_period: config.get_int("simulation", "rebalance_period", 10).max(0) as u32,
    };
    sim.validate()?;
    Ok(sim)
}

/// Validation-only entry point for the `validate` subcommand.
pub fn validate_sim_config(config: &dyn ConfigPort) -> Result<(), DivtraderError> {
    build_sim_config(config).map(|_| ())
}
