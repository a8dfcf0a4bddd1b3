// fusion_core/src/models/measurement/mod.rs

use std::fmt::Debug;

use crate::messages::SensorKind;
use crate::types::StateVector;

// --- MEASUREMENT MODEL TRAIT ---
// Represents the mathematical model of a sensor. `z = h(x) + v`
pub trait MeasurementModel: Debug + Send + Sync {
    /// The measurement vector `z` of this sensor.
    type Vector;
    /// The matching measurement noise covariance `R`.
    type Covariance;

    fn sensor(&self) -> SensorKind;

    /// Returns the measurement noise covariance matrix `R`.
    fn get_r(&self) -> &Self::Covariance;

    /// Predicts the ideal measurement `z_pred = h(x)` from a state vector.
    fn predict_measurement(&self, state: &StateVector) -> Self::Vector;

    /// `a - b`, with any angular component wrapped into `[-pi, pi]`.
    fn residual(&self, a: &Self::Vector, b: &Self::Vector) -> Self::Vector;
}

pub mod lidar;
pub mod radar;
