// fusion_sim/src/config.rs

//! Loading of the application configuration: built-in defaults, optionally
//! overridden by a TOML file.

use std::path::Path;

use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use fusion_core::config::UkfConfig;
use fusion_core::types::N_X;
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// Root of the data parsed from a config TOML file. Every section is optional.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FusionConfig {
    pub filter: UkfConfig,
    pub scenario: ScenarioConfig,
}

/// Parameters of a synthetic run. Sensor noise is taken from `[filter]` so
/// the filter is tuned to the data it sees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Seed for the pseudo-random number generator, for determinism.
    pub seed: u64,
    /// Duration of the scenario in seconds.
    pub duration_s: f64,
    /// Time between two consecutive measurements (s). Sensors alternate.
    pub sample_period_s: f64,
    /// True initial state `[px, py, v, yaw, yaw_rate]`.
    pub initial_state: [f64; N_X],
    /// Standard deviation of the true longitudinal acceleration (m/s^2).
    pub std_a: f64,
    /// Standard deviation of the true yaw acceleration (rad/s^2).
    pub std_yawdd: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            duration_s: 25.0,
            sample_period_s: 0.05,
            initial_state: [0.6, 0.6, 5.0, 0.0, 0.2],
            std_a: 0.3,
            std_yawdd: 0.3,
        }
    }
}

impl ScenarioConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.sample_period_s.is_finite() && self.sample_period_s > 0.0) {
            return Err(SimError::InvalidScenario(format!(
                "sample_period_s must be positive, got {}",
                self.sample_period_s
            )));
        }
        if !(self.duration_s.is_finite() && self.duration_s >= 0.0) {
            return Err(SimError::InvalidScenario(format!(
                "duration_s must be non-negative, got {}",
                self.duration_s
            )));
        }
        if self.initial_state.iter().any(|v| !v.is_finite()) {
            return Err(SimError::InvalidScenario(
                "initial_state must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

impl FusionConfig {
    /// Defaults merged with the given TOML file, if any.
    pub fn figment(path: Option<&Path>) -> Figment {
        let figment = Figment::from(Serialized::defaults(FusionConfig::default()));
        match path {
            Some(path) => figment.merge(Toml::file(path)),
            None => figment,
        }
    }

    /// Extracts and validates the configuration from a figment.
    pub fn from_figment(figment: &Figment) -> Result<Self, SimError> {
        let config: FusionConfig = figment.extract()?;
        config.filter.validate()?;
        config.scenario.validate()?;
        Ok(config)
    }

    pub fn load(path: Option<&Path>) -> Result<Self, SimError> {
        if let Some(path) = path {
            // `Toml::file` silently yields nothing for a missing file.
            if !path.is_file() {
                return Err(SimError::MissingConfig(path.to_path_buf()));
            }
            info!("Loading configuration from: {:?}", path);
        }
        Self::from_figment(&Self::figment(path))
    }

    pub fn to_toml(&self) -> Result<String, SimError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
