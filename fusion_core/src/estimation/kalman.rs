// fusion_core/src/estimation/kalman.rs

use crate::models::measurement::lidar::LidarModel;
use crate::models::measurement::MeasurementModel;
use crate::types::{LidarVector, StateCovariance, StateVector};

/// Result of folding one measurement into a state estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateResult {
    pub vector: StateVector,
    pub covariance: StateCovariance,
    /// Normalized Innovation Squared of the fused measurement.
    pub nis: f64,
}

/// PURE FUNCTION: classical (linear) Kalman update with a lidar position reading.
///
/// Returns `None` when the innovation covariance cannot be inverted.
pub fn linear_update(
    x: &StateVector,
    p: &StateCovariance,
    z: &LidarVector,
    model: &LidarModel,
) -> Option<UpdateResult> {
    let h = model.get_h();

    // Innovation (y) and innovation covariance (S).
    let y = model.residual(z, &model.predict_measurement(x));
    let pht = p * h.transpose();
    let s = h * pht + model.get_r();
    let s_inv = s.try_inverse()?;

    // Kalman gain (K), then state and covariance.
    let k_gain = pht * s_inv;
    let vector = x + k_gain * y;
    let covariance = (StateCovariance::identity() - k_gain * h) * p;

    let nis = (y.transpose() * s_inv * y)[(0, 0)];

    Some(UpdateResult {
        vector,
        covariance,
        nis,
    })
}
