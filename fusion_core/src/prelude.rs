// fusion_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::estimation::{ProcessOutcome, StateEstimator};
pub use crate::messages::{MeasurementData, MeasurementMessage, SensorKind};
pub use crate::models::dynamics::EstimationDynamics;
pub use crate::models::measurement::MeasurementModel;

// --- Core Data Structures ---
pub use crate::config::{LaserNoise, ProcessNoise, RadarNoise, UkfConfig};
pub use crate::error::FilterError;
pub use crate::state::{FilterState, StateVariable};
pub use crate::types::{StateCovariance, StateVector, TimestampUs};

// --- Estimation Algorithms ---
pub use crate::estimation::filters::ukf::{Prediction, UnscentedKalmanFilter};

// --- Concrete Model Implementations ---
pub use crate::models::dynamics::ctrv::CtrvModel;
pub use crate::models::measurement::lidar::LidarModel;
pub use crate::models::measurement::radar::RadarModel;

// --- Metrics ---
pub use crate::metrics::{calculate_rmse, MetricsError, NisMonitor};
