// fusion_core/src/estimation/mod.rs

use crate::error::FilterError;
use crate::messages::{MeasurementMessage, SensorKind};
use crate::state::FilterState;

/// What a single `process` call did with its measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessOutcome {
    /// The measurement seeded the state. No prediction or update ran.
    Initialized,
    /// The filter predicted forward and fused the measurement.
    Updated {
        sensor: SensorKind,
        /// Normalized Innovation Squared of this update.
        nis: f64,
        /// Number of prediction sub-steps used to reach the measurement time.
        prediction_steps: usize,
    },
    /// The sensor is disabled in the configuration; nothing changed.
    Skipped { sensor: SensorKind },
}

/// The contract for any algorithm that performs the "State Estimator" role.
/// Its sole responsibility is to estimate the state of a single object.
pub trait StateEstimator: Send + Sync {
    /// The single entry point for sensor data. Implementations either consume
    /// the measurement completely or return an error and leave their state untouched.
    fn process(&mut self, message: &MeasurementMessage) -> Result<ProcessOutcome, FilterError>;

    /// Returns a reference to the current best estimate of the state.
    fn get_state(&self) -> &FilterState;

    /// Whether a first measurement has been seen.
    fn is_initialized(&self) -> bool;
}

pub mod filters;
pub mod kalman;
pub mod stepping;
pub mod unscented;
