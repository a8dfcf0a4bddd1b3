// fusion_sim/src/runner.rs

use fusion_core::config::UkfConfig;
use fusion_core::estimation::filters::ukf::UnscentedKalmanFilter;
use fusion_core::estimation::{ProcessOutcome, StateEstimator};
use fusion_core::messages::MeasurementMessage;
use fusion_core::metrics::{calculate_rmse, NisMonitor};
use fusion_core::state::FilterState;
use log::{debug, info};
use nalgebra::Vector4;

use crate::error::SimError;
use crate::log_reader::{GroundTruth, SensorRecord};

/// The filter's output right after one measurement was processed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub measurement: MeasurementMessage,
    pub outcome: ProcessOutcome,
    pub state: FilterState,
    pub ground_truth: Option<GroundTruth>,
}

impl Estimate {
    pub fn nis(&self) -> Option<f64> {
        match self.outcome {
            ProcessOutcome::Updated { nis, .. } => Some(nis),
            _ => None,
        }
    }
}

/// Everything a run over one sensor log produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub estimates: Vec<Estimate>,
    pub nis: NisMonitor,
    /// RMSE of `[px, py, vx, vy]` over every estimate with ground truth.
    pub rmse: Option<Vector4<f64>>,
    pub skipped: usize,
}

/// Feeds every record through a fresh filter, in order.
pub fn run_filter(config: &UkfConfig, records: &[SensorRecord]) -> Result<RunReport, SimError> {
    let mut filter = UnscentedKalmanFilter::new(*config)?;
    run_with(&mut filter, records)
}

/// Drives any `StateEstimator` over the records. A filter error aborts the run.
pub fn run_with<E: StateEstimator>(
    estimator: &mut E,
    records: &[SensorRecord],
) -> Result<RunReport, SimError> {
    let mut estimates = Vec::with_capacity(records.len());
    let mut nis = NisMonitor::new();
    let mut skipped = 0;

    for record in records {
        let outcome = estimator.process(&record.measurement)?;
        match outcome {
            ProcessOutcome::Updated { sensor, nis: value, .. } => nis.record(sensor, value),
            ProcessOutcome::Skipped { .. } => skipped += 1,
            ProcessOutcome::Initialized => {}
        }
        estimates.push(Estimate {
            measurement: record.measurement,
            outcome,
            state: *estimator.get_state(),
            ground_truth: record.ground_truth,
        });
    }

    let (estimated, truth): (Vec<_>, Vec<_>) = estimates
        .iter()
        .filter_map(|e| e.ground_truth.map(|gt| (e.state.cartesian(), gt.cartesian())))
        .unzip();
    let rmse = if truth.is_empty() {
        debug!("no ground truth in input, skipping RMSE");
        None
    } else {
        Some(calculate_rmse(&estimated, &truth)?)
    };

    Ok(RunReport {
        estimates,
        nis,
        rmse,
        skipped,
    })
}

impl RunReport {
    /// Logs a human-readable summary at `info` level.
    pub fn log_summary(&self, label: &str) {
        info!(
            "{}: {} measurements processed ({} skipped)",
            label,
            self.estimates.len(),
            self.skipped
        );
        if let Some(rmse) = &self.rmse {
            info!(
                "{}: RMSE px = {:.4}, py = {:.4}, vx = {:.4}, vy = {:.4}",
                label, rmse[0], rmse[1], rmse[2], rmse[3]
            );
        }
        for sensor in [
            fusion_core::messages::SensorKind::Lidar,
            fusion_core::messages::SensorKind::Radar,
        ] {
            let stats = self.nis.stats(sensor);
            if let (Some(mean), Some(ratio)) = (stats.mean(), stats.exceedance_ratio()) {
                info!(
                    "{}: {} NIS mean = {:.3}, {:.1}% above {:.3} ({} updates)",
                    label,
                    sensor,
                    mean,
                    ratio * 100.0,
                    NisMonitor::threshold(sensor),
                    stats.count
                );
            }
        }
    }
}
