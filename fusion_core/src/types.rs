// fusion_core/src/types.rs

use nalgebra::{SMatrix, SVector};

// --- Core Dimensions ---
/// Number of variables in the CTRV state vector `[px, py, v, yaw, yaw_rate]`.
pub const N_X: usize = 5;
/// Augmented dimension: the state plus longitudinal and yaw acceleration noise.
pub const N_AUG: usize = 7;
/// Number of sigma points generated from the augmented distribution.
pub const N_SIGMA: usize = 2 * N_AUG + 1;
/// Radar measurement dimension `[range, bearing, range_rate]`.
pub const N_RADAR: usize = 3;
/// Lidar measurement dimension `[px, py]`.
pub const N_LIDAR: usize = 2;

/// Sigma point spreading parameter.
pub const LAMBDA: f64 = 3.0 - N_AUG as f64;

/// Lower bound applied to both position components when they collapse onto the origin.
pub const MIN_POSITION: f64 = 1e-4;

// --- Core Type Aliases ---
pub type StateVector = SVector<f64, N_X>;
pub type StateCovariance = SMatrix<f64, N_X, N_X>;

pub type AugStateVector = SVector<f64, N_AUG>;
pub type AugStateCovariance = SMatrix<f64, N_AUG, N_AUG>;

/// Augmented sigma points, one per column.
pub type AugSigmaPoints = SMatrix<f64, N_AUG, N_SIGMA>;
/// Sigma points after propagation through the motion model, one per column.
pub type SigmaPoints = SMatrix<f64, N_X, N_SIGMA>;
pub type SigmaWeightVector = SVector<f64, N_SIGMA>;

pub type RadarVector = SVector<f64, N_RADAR>;
pub type RadarCovariance = SMatrix<f64, N_RADAR, N_RADAR>;
pub type RadarSigmaPoints = SMatrix<f64, N_RADAR, N_SIGMA>;

pub type LidarVector = SVector<f64, N_LIDAR>;
pub type LidarCovariance = SMatrix<f64, N_LIDAR, N_LIDAR>;

/// Microsecond timestamp, as carried by every sensor record.
pub type TimestampUs = u64;
