// fusion_core/src/error.rs

use thiserror::Error;

use crate::messages::SensorKind;
use crate::types::TimestampUs;

/// Everything that can go wrong while constructing or running the filter.
///
/// A failed `process_measurement` call never leaves the filter half-updated:
/// the state, covariance and clock are exactly what they were before the call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("invalid filter configuration: {0}")]
    InvalidConfig(String),

    #[error("augmented covariance is not positive definite (prediction dt = {dt} s)")]
    CovarianceNotPositiveDefinite { dt: f64 },

    #[error("{sensor} innovation covariance is singular")]
    SingularInnovation { sensor: SensorKind },

    #[error("gap of {gap_us} us between measurements exceeds the configured maximum of {max_us} us")]
    TimeGapTooLarge { gap_us: TimestampUs, max_us: TimestampUs },

    #[error("measurement at {received} us is older than the last processed one at {last} us")]
    OutOfOrderMeasurement {
        last: TimestampUs,
        received: TimestampUs,
    },
}
