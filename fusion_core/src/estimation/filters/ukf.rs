// fusion_core/src/estimation/filters/ukf.rs

use log::{debug, trace, warn};

// --- Core Library Imports ---
use crate::config::UkfConfig;
use crate::error::FilterError;
use crate::estimation::kalman::{linear_update, UpdateResult};
use crate::estimation::stepping::{split_time_step, TimeSteps};
use crate::estimation::unscented::{
    augmented_sigma_points, predict_sigma_points, state_difference, state_moments, Moments,
    SigmaWeights,
};
use crate::estimation::{ProcessOutcome, StateEstimator};
use crate::messages::{MeasurementData, MeasurementMessage, SensorKind};
use crate::models::dynamics::ctrv::CtrvModel;
use crate::models::measurement::lidar::LidarModel;
use crate::models::measurement::radar::{RadarModel, BEARING_IDX};
use crate::models::measurement::MeasurementModel;
use crate::state::{FilterState, StateVariable};
use crate::types::{
    LidarVector, RadarCovariance, RadarSigmaPoints, RadarVector, SigmaPoints, StateCovariance,
    StateVector, TimestampUs, MIN_POSITION, N_RADAR, N_SIGMA, N_X,
};
use crate::utils::angles::normalize_angle;

/// Predicted radar measurement mean and innovation covariance `S`.
pub type RadarMoments = Moments<RadarVector, RadarCovariance>;

/// Output of one prediction step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Sigma points after propagation, one per column. Needed by the radar update.
    pub sigma_points: SigmaPoints,
    pub mean: StateVector,
    pub covariance: StateCovariance,
}

/// A CTRV Unscented Kalman Filter fusing radar and lidar observations.
///
/// The state is `[px, py, v, yaw, yaw_rate]`. The first measurement seeds the
/// state; every later one triggers a prediction over the elapsed time followed
/// by the sensor-specific update.
#[derive(Debug, Clone)]
pub struct UnscentedKalmanFilter {
    config: UkfConfig,
    state: FilterState,
    is_initialized: bool,

    dynamics: CtrvModel,
    lidar_model: LidarModel,
    radar_model: RadarModel,

    // --- UKF-specific internal state ---
    /// Weights of the sigma points, fixed at construction.
    weights: SigmaWeights,

    // --- Diagnostics ---
    nis_lidar: f64,
    nis_radar: f64,
}

impl UnscentedKalmanFilter {
    pub fn new(config: UkfConfig) -> Result<Self, FilterError> {
        config.validate()?;

        Ok(Self {
            state: FilterState {
                covariance: config.initial_covariance_matrix(),
                ..FilterState::default()
            },
            is_initialized: false,
            dynamics: CtrvModel,
            lidar_model: LidarModel::new(config.laser_noise.covariance()),
            radar_model: RadarModel::new(config.radar_noise.covariance()),
            weights: SigmaWeights::default(),
            nis_lidar: 0.0,
            nis_radar: 0.0,
            config,
        })
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn state_vector(&self) -> &StateVector {
        &self.state.vector
    }

    pub fn covariance(&self) -> &StateCovariance {
        &self.state.covariance
    }

    /// NIS of the most recent lidar update (0 until one has run).
    pub fn nis_lidar(&self) -> f64 {
        self.nis_lidar
    }

    /// NIS of the most recent radar update (0 until one has run).
    pub fn nis_radar(&self) -> f64 {
        self.nis_radar
    }

    pub fn last_timestamp(&self) -> TimestampUs {
        self.state.last_update_timestamp
    }

    fn sensor_enabled(&self, sensor: SensorKind) -> bool {
        match sensor {
            SensorKind::Lidar => self.config.use_laser,
            SensorKind::Radar => self.config.use_radar,
        }
    }

    /// Processes one measurement: initialize on the first call, otherwise
    /// predict to the measurement time and update.
    ///
    /// On error the filter is left exactly as it was before the call.
    pub fn process_measurement(
        &mut self,
        message: &MeasurementMessage,
    ) -> Result<ProcessOutcome, FilterError> {
        if !self.is_initialized {
            self.initialize(message);
            return Ok(ProcessOutcome::Initialized);
        }

        let sensor = message.kind();
        if !self.sensor_enabled(sensor) {
            debug!("{} disabled, skipping measurement at {} us", sensor, message.timestamp);
            return Ok(ProcessOutcome::Skipped { sensor });
        }

        let last = self.state.last_update_timestamp;
        if message.timestamp < last {
            return Err(FilterError::OutOfOrderMeasurement {
                last,
                received: message.timestamp,
            });
        }
        let gap_us = message.timestamp - last;
        let max_us = self.config.max_time_gap_us();
        if gap_us > max_us {
            return Err(FilterError::TimeGapTooLarge { gap_us, max_us });
        }

        // --- 1. PREDICT: advance to the measurement time ---
        let steps = split_time_step(gap_us);
        let prediction_steps = steps.len();
        if prediction_steps > 1 {
            debug!("splitting {} us gap into {} prediction steps", gap_us, prediction_steps);
        }
        let prediction = self.predict_steps(steps)?;

        // --- 2. UPDATE: fuse the measurement at that time ---
        let update = match message.data {
            MeasurementData::Radar { rho, phi, rho_dot } => {
                self.update_radar(&prediction, &RadarVector::new(rho, phi, rho_dot))?
            }
            MeasurementData::Lidar { px, py } => self.update_lidar(
                &prediction.mean,
                &prediction.covariance,
                &LidarVector::new(px, py),
            )?,
        };

        // --- 3. Commit ---
        self.state.vector = update.vector;
        self.state.covariance = update.covariance;
        self.state.last_update_timestamp = message.timestamp;
        match sensor {
            SensorKind::Lidar => self.nis_lidar = update.nis,
            SensorKind::Radar => self.nis_radar = update.nis,
        }

        trace!("x = {}", self.state.vector.transpose());
        trace!("P = {}", self.state.covariance);
        trace!("NIS_{} = {}", sensor, update.nis);

        Ok(ProcessOutcome::Updated {
            sensor,
            nis: update.nis,
            prediction_steps,
        })
    }

    /// Seeds the state from the first measurement. Never fails: degenerate
    /// positions are clamped rather than rejected.
    fn initialize(&mut self, message: &MeasurementMessage) {
        let mut x = match message.data {
            MeasurementData::Radar { rho, phi, rho_dot } => {
                let phi = normalize_angle(phi);
                let vx = rho_dot * phi.cos();
                let vy = rho_dot * phi.sin();
                StateVector::new(
                    rho * phi.cos(),
                    rho * phi.sin(),
                    (vx * vx + vy * vy).sqrt(),
                    phi,
                    0.0,
                )
            }
            MeasurementData::Lidar { px, py } => StateVector::new(px, py, 0.0, 0.0, 0.0),
        };

        let (px, py) = (StateVariable::Px.index(), StateVariable::Py.index());
        if x[px].abs() < MIN_POSITION && x[py].abs() < MIN_POSITION {
            x[px] = MIN_POSITION;
            x[py] = MIN_POSITION;
        }

        self.state = FilterState {
            vector: x,
            covariance: self.config.initial_covariance_matrix(),
            last_update_timestamp: message.timestamp,
        };
        self.is_initialized = true;

        debug!(
            "initialized from {} at {} us: x = {}",
            message.kind(),
            message.timestamp,
            x.transpose()
        );
    }

    /// Predicts the current state `dt` seconds ahead in a single step,
    /// without modifying the filter.
    pub fn predict(&self, dt: f64) -> Result<Prediction, FilterError> {
        self.predict_from(&self.state.vector, &self.state.covariance, dt)
    }

    /// Chains one prediction per step, starting from the current state.
    fn predict_steps(&self, mut steps: TimeSteps) -> Result<Prediction, FilterError> {
        let first = steps.next().unwrap_or(0.0);
        let mut prediction = self.predict(first)?;
        for dt in steps {
            prediction = self.predict_from(&prediction.mean, &prediction.covariance, dt)?;
        }
        Ok(prediction)
    }

    /// One prediction step from an arbitrary `(x, P)`.
    pub fn predict_from(
        &self,
        x: &StateVector,
        p: &StateCovariance,
        dt: f64,
    ) -> Result<Prediction, FilterError> {
        // --- 1. Generate augmented sigma points ---
        let x_sig_aug =
            augmented_sigma_points(x, p, &self.config.process_noise, &self.weights).ok_or_else(
                || {
                    warn!("Cholesky decomposition failed, P = {}", p);
                    FilterError::CovarianceNotPositiveDefinite { dt }
                },
            )?;

        // --- 2. Propagate each point through the CTRV model ---
        let sigma_points = predict_sigma_points(&self.dynamics, &x_sig_aug, dt);

        // --- 3. Recover the predicted mean and covariance ---
        let moments = state_moments(&sigma_points, &self.weights);

        Ok(Prediction {
            sigma_points,
            mean: moments.mean,
            covariance: moments.covariance,
        })
    }

    /// Maps the predicted sigma points into radar space and recovers the
    /// predicted measurement mean and innovation covariance `S` (noise included).
    pub fn predict_radar_measurement(
        &self,
        sigma_points: &SigmaPoints,
    ) -> (RadarSigmaPoints, RadarMoments) {
        let mut z_sig = RadarSigmaPoints::zeros();
        for i in 0..N_SIGMA {
            let point: StateVector = sigma_points.column(i).into_owned();
            z_sig.set_column(i, &self.radar_model.predict_measurement(&point));
        }

        // Weighted mean taken around the central point, so bearings straddling
        // +/-pi do not average out to a meaningless angle.
        let center: RadarVector = z_sig.column(0).into_owned();
        let mut mean = center;
        for i in 1..N_SIGMA {
            let point: RadarVector = z_sig.column(i).into_owned();
            mean += self.weights.get(i) * self.radar_model.residual(&point, &center);
        }
        mean[BEARING_IDX] = normalize_angle(mean[BEARING_IDX]);

        let mut s_cov = RadarCovariance::zeros();
        for i in 0..N_SIGMA {
            let point: RadarVector = z_sig.column(i).into_owned();
            let diff = self.radar_model.residual(&point, &mean);
            s_cov += self.weights.get(i) * diff * diff.transpose();
        }
        s_cov += self.radar_model.get_r();

        (
            z_sig,
            Moments {
                mean,
                covariance: s_cov,
            },
        )
    }

    /// Unscented radar update on top of a prediction.
    pub fn update_radar(
        &self,
        prediction: &Prediction,
        z: &RadarVector,
    ) -> Result<UpdateResult, FilterError> {
        let mut z = *z;
        z[BEARING_IDX] = normalize_angle(z[BEARING_IDX]);

        // --- 1. Predicted measurement and its covariance ---
        let (z_sig, z_moments) = self.predict_radar_measurement(&prediction.sigma_points);
        let z_pred = z_moments.mean;
        let s_cov = z_moments.covariance;

        // --- 2. Cross-correlation between state and measurement ---
        let mut t_cov = nalgebra::SMatrix::<f64, N_X, N_RADAR>::zeros();
        for i in 0..N_SIGMA {
            let x_point: StateVector = prediction.sigma_points.column(i).into_owned();
            let z_point: RadarVector = z_sig.column(i).into_owned();
            let x_diff = state_difference(&x_point, &prediction.mean);
            let z_diff = self.radar_model.residual(&z_point, &z_pred);
            t_cov += self.weights.get(i) * x_diff * z_diff.transpose();
        }

        let s_inv = s_cov.try_inverse().ok_or_else(|| {
            warn!("radar innovation covariance is singular, S = {}", s_cov);
            FilterError::SingularInnovation {
                sensor: self.radar_model.sensor(),
            }
        })?;

        // --- 3. Kalman gain, state and covariance ---
        let k_gain = t_cov * s_inv;
        let z_diff = self.radar_model.residual(&z, &z_pred);

        let vector = prediction.mean + k_gain * z_diff;
        let covariance = symmetrize(&(prediction.covariance - k_gain * s_cov * k_gain.transpose()));

        let nis = (z_diff.transpose() * s_inv * z_diff)[(0, 0)];

        Ok(UpdateResult {
            vector,
            covariance,
            nis,
        })
    }

    /// Linear lidar update of `(x, P)`.
    pub fn update_lidar(
        &self,
        x: &StateVector,
        p: &StateCovariance,
        z: &LidarVector,
    ) -> Result<UpdateResult, FilterError> {
        let mut result = linear_update(x, p, z, &self.lidar_model).ok_or_else(|| {
            warn!("lidar innovation covariance is singular, P = {}", p);
            FilterError::SingularInnovation {
                sensor: self.lidar_model.sensor(),
            }
        })?;
        result.covariance = symmetrize(&result.covariance);
        Ok(result)
    }
}

/// Tiny numerical errors can make P slightly non-symmetric. This forces it.
fn symmetrize(p: &StateCovariance) -> StateCovariance {
    (p + p.transpose()) * 0.5
}

impl StateEstimator for UnscentedKalmanFilter {
    fn process(&mut self, message: &MeasurementMessage) -> Result<ProcessOutcome, FilterError> {
        self.process_measurement(message)
    }

    fn get_state(&self) -> &FilterState {
        &self.state
    }

    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}
