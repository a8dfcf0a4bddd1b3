// fusion_sim/src/synthetic.rs

//! Deterministic synthetic scenarios: a CTRV ground-truth trajectory driven by
//! random accelerations, observed by alternating noisy lidar and radar.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use fusion_core::config::{LaserNoise, RadarNoise};
use fusion_core::messages::MeasurementMessage;
use fusion_core::models::dynamics::ctrv::CtrvModel;
use fusion_core::models::dynamics::EstimationDynamics;
use fusion_core::state::StateVariable;
use fusion_core::types::{AugStateVector, StateVector, TimestampUs, MIN_POSITION, N_X};
use log::debug;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::config::{FusionConfig, ScenarioConfig};
use crate::error::SimError;
use crate::log_reader::{format_record, GroundTruth, SensorRecord};

/// Zero-mean sensor noise, sampled per reading.
struct SensorNoise {
    lidar_px: Normal<f64>,
    lidar_py: Normal<f64>,
    radar_rho: Normal<f64>,
    radar_phi: Normal<f64>,
    radar_rho_dot: Normal<f64>,
}

impl SensorNoise {
    fn new(laser: &LaserNoise, radar: &RadarNoise) -> Result<Self, SimError> {
        Ok(Self {
            lidar_px: Normal::new(0.0, laser.std_px)?,
            lidar_py: Normal::new(0.0, laser.std_py)?,
            radar_rho: Normal::new(0.0, radar.std_r)?,
            radar_phi: Normal::new(0.0, radar.std_phi)?,
            radar_rho_dot: Normal::new(0.0, radar.std_rd)?,
        })
    }
}

/// Exact radar reading of a state.
fn ideal_radar(truth: &StateVector) -> (f64, f64, f64) {
    let px = truth[StateVariable::Px.index()];
    let py = truth[StateVariable::Py.index()];
    let v = truth[StateVariable::Speed.index()];
    let yaw = truth[StateVariable::Yaw.index()];

    let rho = (px * px + py * py).sqrt();
    let phi = py.atan2(px);
    let rho_dot = (px * yaw.cos() * v + py * yaw.sin() * v) / rho.max(MIN_POSITION);
    (rho, phi, rho_dot)
}

fn ground_truth(truth: &StateVector) -> GroundTruth {
    let v = truth[StateVariable::Speed.index()];
    let yaw = truth[StateVariable::Yaw.index()];
    GroundTruth {
        px: truth[StateVariable::Px.index()],
        py: truth[StateVariable::Py.index()],
        vx: v * yaw.cos(),
        vy: v * yaw.sin(),
        yaw: Some(yaw),
        yaw_rate: Some(truth[StateVariable::YawRate.index()]),
    }
}

/// Generates the measurement records of a scenario. Even samples are lidar,
/// odd samples radar, starting at timestamp 0.
pub fn generate(config: &FusionConfig) -> Result<Vec<SensorRecord>, SimError> {
    let scenario: &ScenarioConfig = &config.scenario;
    scenario.validate()?;

    let mut rng = ChaCha8Rng::seed_from_u64(scenario.seed);
    let accel = Normal::new(0.0, scenario.std_a)?;
    let yaw_accel = Normal::new(0.0, scenario.std_yawdd)?;
    let noise = SensorNoise::new(&config.filter.laser_noise, &config.filter.radar_noise)?;

    let dt = scenario.sample_period_s;
    let samples = (scenario.duration_s / dt).floor() as usize + 1;
    let dynamics = CtrvModel;
    let mut truth = StateVector::from(scenario.initial_state);
    let mut records = Vec::with_capacity(samples);

    for k in 0..samples {
        if k > 0 {
            let mut x_aug = AugStateVector::zeros();
            x_aug.fixed_rows_mut::<N_X>(0).copy_from(&truth);
            x_aug[N_X] = accel.sample(&mut rng);
            x_aug[N_X + 1] = yaw_accel.sample(&mut rng);
            truth = dynamics.propagate(&x_aug, dt);
        }

        let timestamp = (k as f64 * dt * 1_000_000.0).round() as TimestampUs;
        let measurement = if k % 2 == 0 {
            MeasurementMessage::lidar(
                timestamp,
                truth[StateVariable::Px.index()] + noise.lidar_px.sample(&mut rng),
                truth[StateVariable::Py.index()] + noise.lidar_py.sample(&mut rng),
            )
        } else {
            let (rho, phi, rho_dot) = ideal_radar(&truth);
            MeasurementMessage::radar(
                timestamp,
                rho + noise.radar_rho.sample(&mut rng),
                phi + noise.radar_phi.sample(&mut rng),
                rho_dot + noise.radar_rho_dot.sample(&mut rng),
            )
        };

        records.push(SensorRecord {
            measurement,
            ground_truth: Some(ground_truth(&truth)),
        });
    }

    debug!(
        "generated {} records over {:.2} s (seed {})",
        records.len(),
        scenario.duration_s,
        scenario.seed
    );
    Ok(records)
}

/// Writes records in the sensor log format read by `log_reader`.
pub fn write_log(path: &Path, records: &[SensorRecord]) -> Result<(), SimError> {
    let file = File::create(path).map_err(|e| SimError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for record in records {
        writeln!(writer, "{}", format_record(record)).map_err(|e| SimError::io(path, e))?;
    }
    writer.flush().map_err(|e| SimError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::run_filter;
    use approx::assert_abs_diff_eq;
    use fusion_core::messages::SensorKind;

    #[test]
    fn test_same_seed_same_scenario() {
        let config = FusionConfig::default();
        let a = generate(&config).unwrap();
        let b = generate(&config).unwrap();
        assert_eq!(a, b);

        let mut other = config;
        other.scenario.seed += 1;
        assert_ne!(generate(&other).unwrap(), a);
    }

    #[test]
    fn test_sensors_alternate_on_a_fixed_clock() {
        let mut config = FusionConfig::default();
        config.scenario.duration_s = 1.0;
        let records = generate(&config).unwrap();

        assert_eq!(records.len(), 21);
        for (k, record) in records.iter().enumerate() {
            let expected = if k % 2 == 0 {
                SensorKind::Lidar
            } else {
                SensorKind::Radar
            };
            assert_eq!(record.measurement.kind(), expected);
            assert_eq!(record.measurement.timestamp, k as u64 * 50_000);
            assert!(record.ground_truth.is_some());
        }

        let gt = records[0].ground_truth.unwrap();
        assert_abs_diff_eq!(gt.px, 0.6);
        assert_abs_diff_eq!(gt.vx, 5.0);
    }

    #[test]
    fn test_ideal_radar_of_receding_target() {
        let (rho, phi, rho_dot) = ideal_radar(&StateVector::new(3.0, 4.0, 2.0, 4f64.atan2(3.0), 0.0));
        assert_abs_diff_eq!(rho, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(phi, 4f64.atan2(3.0), epsilon = 1e-12);
        assert_abs_diff_eq!(rho_dot, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_filter_tracks_synthetic_scenario() {
        let config = FusionConfig::default();
        let records = generate(&config).unwrap();
        let report = run_filter(&config.filter, &records).unwrap();

        let rmse = report.rmse.unwrap();
        assert!(rmse[0] < 0.3 && rmse[1] < 0.3, "position RMSE {}", rmse);
        assert!(rmse[2] < 1.5 && rmse[3] < 1.5, "velocity RMSE {}", rmse);
        assert!(report.estimates.iter().all(|e| e.state.is_finite()));
    }

    #[test]
    fn test_zero_period_is_rejected() {
        let mut config = FusionConfig::default();
        config.scenario.sample_period_s = 0.0;
        assert!(matches!(
            generate(&config),
            Err(SimError::InvalidScenario(_))
        ));
    }
}
