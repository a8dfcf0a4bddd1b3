// fusion_core/src/config.rs

//! Construction-time parameters of the filter. Everything here is fixed for
//! the lifetime of an `UnscentedKalmanFilter`.

use serde::{Deserialize, Serialize};

use crate::error::FilterError;
use crate::types::{
    LidarCovariance, RadarCovariance, StateCovariance, StateVector, TimestampUs, N_X,
};

/// Standard deviations of the two process-noise variables of the augmented state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessNoise {
    /// Longitudinal acceleration noise (m/s^2).
    pub std_a: f64,
    /// Yaw acceleration noise (rad/s^2).
    pub std_yawdd: f64,
}

impl Default for ProcessNoise {
    fn default() -> Self {
        Self {
            std_a: 0.5,
            std_yawdd: 0.5,
        }
    }
}

/// Lidar measurement noise, one standard deviation per axis (m).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LaserNoise {
    pub std_px: f64,
    pub std_py: f64,
}

impl Default for LaserNoise {
    fn default() -> Self {
        Self {
            std_px: 0.15,
            std_py: 0.15,
        }
    }
}

impl LaserNoise {
    pub fn covariance(&self) -> LidarCovariance {
        LidarCovariance::new(self.std_px.powi(2), 0.0, 0.0, self.std_py.powi(2))
    }
}

/// Radar measurement noise: range (m), bearing (rad) and range rate (m/s).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RadarNoise {
    pub std_r: f64,
    pub std_phi: f64,
    pub std_rd: f64,
}

impl Default for RadarNoise {
    fn default() -> Self {
        Self {
            std_r: 0.3,
            std_phi: 0.03,
            std_rd: 0.3,
        }
    }
}

impl RadarNoise {
    pub fn covariance(&self) -> RadarCovariance {
        RadarCovariance::from_diagonal(&nalgebra::Vector3::new(
            self.std_r.powi(2),
            self.std_phi.powi(2),
            self.std_rd.powi(2),
        ))
    }
}

/// Top-level filter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UkfConfig {
    /// If false, lidar measurements are only used to initialize the filter.
    pub use_laser: bool,
    /// If false, radar measurements are only used to initialize the filter.
    pub use_radar: bool,
    /// Longest gap (s) between two measurements the filter will predict across.
    pub max_time_gap_s: f64,
    /// Diagonal of the covariance the filter starts from on its first measurement.
    pub initial_covariance: [f64; N_X],
    pub process_noise: ProcessNoise,
    pub laser_noise: LaserNoise,
    pub radar_noise: RadarNoise,
}

impl Default for UkfConfig {
    fn default() -> Self {
        Self {
            use_laser: true,
            use_radar: true,
            max_time_gap_s: 3600.0,
            initial_covariance: [1.0; N_X],
            process_noise: ProcessNoise::default(),
            laser_noise: LaserNoise::default(),
            radar_noise: RadarNoise::default(),
        }
    }
}

impl UkfConfig {
    /// Checks that every noise term is a positive, finite number.
    ///
    /// A zero standard deviation would make the augmented covariance (or the
    /// innovation covariance) rank deficient, so it is rejected up front.
    pub fn validate(&self) -> Result<(), FilterError> {
        let named = [
            ("process_noise.std_a", self.process_noise.std_a),
            ("process_noise.std_yawdd", self.process_noise.std_yawdd),
            ("laser_noise.std_px", self.laser_noise.std_px),
            ("laser_noise.std_py", self.laser_noise.std_py),
            ("radar_noise.std_r", self.radar_noise.std_r),
            ("radar_noise.std_phi", self.radar_noise.std_phi),
            ("radar_noise.std_rd", self.radar_noise.std_rd),
        ];
        for (name, value) in named {
            if !(value.is_finite() && value > 0.0) {
                return Err(FilterError::InvalidConfig(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )));
            }
        }

        if !(self.max_time_gap_s.is_finite() && self.max_time_gap_s >= 0.0) {
            return Err(FilterError::InvalidConfig(format!(
                "max_time_gap_s must be non-negative and finite, got {}",
                self.max_time_gap_s
            )));
        }

        for (i, value) in self.initial_covariance.iter().enumerate() {
            if !(value.is_finite() && *value > 0.0) {
                return Err(FilterError::InvalidConfig(format!(
                    "initial_covariance[{}] must be positive and finite, got {}",
                    i, value
                )));
            }
        }
        Ok(())
    }

    /// `max_time_gap_s` in microseconds.
    pub fn max_time_gap_us(&self) -> TimestampUs {
        (self.max_time_gap_s * 1_000_000.0).round() as TimestampUs
    }

    pub fn initial_covariance_matrix(&self) -> StateCovariance {
        StateCovariance::from_diagonal(&StateVector::from(self.initial_covariance))
    }
}
