// fusion_core/src/models/measurement/radar.rs

use crate::messages::SensorKind;
use crate::models::measurement::MeasurementModel;
use crate::types::{RadarCovariance, RadarVector, StateVector, MIN_POSITION};
use crate::utils::angles::angle_difference;

/// Index of the bearing inside the radar measurement vector.
pub const BEARING_IDX: usize = 1;

/// Polar radar model: `z = [range, bearing, range_rate]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarModel {
    /// The R matrix for this sensor.
    pub noise_covariance: RadarCovariance,
}

impl RadarModel {
    pub fn new(noise_covariance: RadarCovariance) -> Self {
        Self { noise_covariance }
    }
}

impl MeasurementModel for RadarModel {
    type Vector = RadarVector;
    type Covariance = RadarCovariance;

    fn sensor(&self) -> SensorKind {
        SensorKind::Radar
    }

    fn get_r(&self) -> &RadarCovariance {
        &self.noise_covariance
    }

    fn predict_measurement(&self, state: &StateVector) -> RadarVector {
        let mut p_x = state[0];
        let mut p_y = state[1];
        let v = state[2];
        let yaw = state[3];

        // Range and bearing are undefined at the origin.
        if p_x.abs() < MIN_POSITION && p_y.abs() < MIN_POSITION {
            p_x = MIN_POSITION;
            p_y = MIN_POSITION;
        }

        let v1 = yaw.cos() * v;
        let v2 = yaw.sin() * v;
        let rho = (p_x * p_x + p_y * p_y).sqrt();

        RadarVector::new(rho, p_y.atan2(p_x), (p_x * v1 + p_y * v2) / rho)
    }

    fn residual(&self, a: &RadarVector, b: &RadarVector) -> RadarVector {
        let mut diff = a - b;
        diff[BEARING_IDX] = angle_difference(a[BEARING_IDX], b[BEARING_IDX]);
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RadarNoise;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_4, PI};

    fn model() -> RadarModel {
        RadarModel::new(RadarNoise::default().covariance())
    }

    #[test]
    fn test_predicts_range_bearing_and_range_rate() {
        // Moving straight away from the sensor along the diagonal.
        let state = StateVector::new(3.0, 3.0, 2.0, FRAC_PI_4, 0.0);
        let z = model().predict_measurement(&state);
        assert_abs_diff_eq!(z[0], 18.0_f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(z[1], FRAC_PI_4, epsilon = 1e-12);
        assert_abs_diff_eq!(z[2], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_origin_is_clamped_and_finite() {
        let state = StateVector::new(0.0, 0.0, 4.0, 1.0, 0.5);
        let z = model().predict_measurement(&state);
        assert!(z.iter().all(|v| v.is_finite()), "got {:?}", z);
        assert_abs_diff_eq!(z[0], MIN_POSITION * 2.0_f64.sqrt(), epsilon = 1e-15);
        assert_abs_diff_eq!(z[1], FRAC_PI_4, epsilon = 1e-12);
    }

    #[test]
    fn test_residual_wraps_bearing() {
        let a = RadarVector::new(1.0, PI - 0.05, 0.0);
        let b = RadarVector::new(0.5, -PI + 0.05, 1.0);
        let diff = model().residual(&a, &b);
        assert_abs_diff_eq!(diff[0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(diff[1], -0.1, epsilon = 1e-9);
        assert_abs_diff_eq!(diff[2], -1.0, epsilon = 1e-12);
    }
}
