// fusion_core/src/metrics.rs

//! Consistency and accuracy metrics computed over filter output.

use nalgebra::Vector4;
use thiserror::Error;

use crate::messages::SensorKind;

/// 95th percentile of the chi-squared distribution with 2 degrees of freedom.
pub const CHI2_95_LIDAR: f64 = 5.991;
/// 95th percentile of the chi-squared distribution with 3 degrees of freedom.
pub const CHI2_95_RADAR: f64 = 7.815;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricsError {
    #[error("cannot compute RMSE over an empty set of estimations")]
    Empty,
    #[error("{estimations} estimations but {ground_truth} ground truth samples")]
    LengthMismatch {
        estimations: usize,
        ground_truth: usize,
    },
}

/// Root mean squared error of `[px, py, vx, vy]` estimates against ground truth.
pub fn calculate_rmse(
    estimations: &[Vector4<f64>],
    ground_truth: &[Vector4<f64>],
) -> Result<Vector4<f64>, MetricsError> {
    if estimations.len() != ground_truth.len() {
        return Err(MetricsError::LengthMismatch {
            estimations: estimations.len(),
            ground_truth: ground_truth.len(),
        });
    }
    if estimations.is_empty() {
        return Err(MetricsError::Empty);
    }

    let sum_sq = estimations
        .iter()
        .zip(ground_truth)
        .fold(Vector4::zeros(), |acc, (est, gt)| {
            let e = est - gt;
            acc + e.component_mul(&e)
        });

    Ok((sum_sq / estimations.len() as f64).map(f64::sqrt))
}

/// Running NIS statistics of one sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NisStats {
    pub count: usize,
    pub above_threshold: usize,
    pub sum: f64,
}

impl NisStats {
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    /// Fraction of samples above the 95 % threshold. A consistent filter
    /// lands close to 0.05.
    pub fn exceedance_ratio(&self) -> Option<f64> {
        (self.count > 0).then(|| self.above_threshold as f64 / self.count as f64)
    }
}

/// Accumulates NIS samples per sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NisMonitor {
    lidar: NisStats,
    radar: NisStats,
}

impl NisMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn threshold(sensor: SensorKind) -> f64 {
        match sensor {
            SensorKind::Lidar => CHI2_95_LIDAR,
            SensorKind::Radar => CHI2_95_RADAR,
        }
    }

    pub fn record(&mut self, sensor: SensorKind, nis: f64) {
        let threshold = Self::threshold(sensor);
        let stats = match sensor {
            SensorKind::Lidar => &mut self.lidar,
            SensorKind::Radar => &mut self.radar,
        };
        stats.count += 1;
        stats.sum += nis;
        if nis > threshold {
            stats.above_threshold += 1;
        }
    }

    pub fn stats(&self, sensor: SensorKind) -> &NisStats {
        match sensor {
            SensorKind::Lidar => &self.lidar,
            SensorKind::Radar => &self.radar,
        }
    }
}
