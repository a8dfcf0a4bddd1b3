// fusion_core/src/models/measurement/lidar.rs

use nalgebra::SMatrix;

use crate::messages::SensorKind;
use crate::models::measurement::MeasurementModel;
use crate::types::{LidarCovariance, LidarVector, StateVector, N_LIDAR, N_X};

/// Linear projection from the state onto a lidar position reading.
pub type LidarJacobian = SMatrix<f64, N_LIDAR, N_X>;

/// Cartesian position model: `z = H x`, with `H` selecting `px` and `py`.
#[derive(Debug, Clone, PartialEq)]
pub struct LidarModel {
    /// The R matrix for this sensor.
    pub noise_covariance: LidarCovariance,
    h_matrix: LidarJacobian,
}

impl LidarModel {
    pub fn new(noise_covariance: LidarCovariance) -> Self {
        #[rustfmt::skip]
        let h_matrix = LidarJacobian::new(
            1.0, 0.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0, 0.0,
        );
        Self {
            noise_covariance,
            h_matrix,
        }
    }

    /// The measurement matrix `H`. Constant, since the model is linear.
    pub fn get_h(&self) -> &LidarJacobian {
        &self.h_matrix
    }
}

impl MeasurementModel for LidarModel {
    type Vector = LidarVector;
    type Covariance = LidarCovariance;

    fn sensor(&self) -> SensorKind {
        SensorKind::Lidar
    }

    fn get_r(&self) -> &LidarCovariance {
        &self.noise_covariance
    }

    fn predict_measurement(&self, state: &StateVector) -> LidarVector {
        self.h_matrix * state
    }

    fn residual(&self, a: &LidarVector, b: &LidarVector) -> LidarVector {
        a - b
    }
}
