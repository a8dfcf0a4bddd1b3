// fusion_core/src/messages.rs

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::TimestampUs;

// =========================================================================
// == Core Message and Data Enums ==
// =========================================================================

/// The two sensor families the filter knows how to fuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    Lidar,
    Radar,
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorKind::Lidar => write!(f, "lidar"),
            SensorKind::Radar => write!(f, "radar"),
        }
    }
}

/// Raw readings of a single sensor observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeasurementData {
    /// Polar observation: range (m), bearing (rad) and range rate (m/s).
    Radar { rho: f64, phi: f64, rho_dot: f64 },
    /// Cartesian position observation (m).
    Lidar { px: f64, py: f64 },
}

impl MeasurementData {
    pub fn kind(&self) -> SensorKind {
        match self {
            MeasurementData::Radar { .. } => SensorKind::Radar,
            MeasurementData::Lidar { .. } => SensorKind::Lidar,
        }
    }

    /// The Cartesian position this reading implies, ignoring velocity.
    pub fn position(&self) -> (f64, f64) {
        match *self {
            MeasurementData::Radar { rho, phi, .. } => (rho * phi.cos(), rho * phi.sin()),
            MeasurementData::Lidar { px, py } => (px, py),
        }
    }
}

/// A timestamped sensor observation. This is the single input of the filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementMessage {
    pub timestamp: TimestampUs,
    pub data: MeasurementData,
}

impl MeasurementMessage {
    pub fn radar(timestamp: TimestampUs, rho: f64, phi: f64, rho_dot: f64) -> Self {
        Self {
            timestamp,
            data: MeasurementData::Radar { rho, phi, rho_dot },
        }
    }

    pub fn lidar(timestamp: TimestampUs, px: f64, py: f64) -> Self {
        Self {
            timestamp,
            data: MeasurementData::Lidar { px, py },
        }
    }

    pub fn kind(&self) -> SensorKind {
        self.data.kind()
    }
}
