// fusion_core/src/estimation/unscented.rs

//! Unscented-transform building blocks shared by the prediction and the radar
//! update: sigma point weights, augmented sigma point generation and the
//! recombination of propagated points into a mean and covariance.

use nalgebra::Cholesky;

use crate::config::ProcessNoise;
use crate::models::dynamics::EstimationDynamics;
use crate::state::StateVariable;
use crate::types::{
    AugSigmaPoints, AugStateCovariance, AugStateVector, SigmaPoints, SigmaWeightVector,
    StateCovariance, StateVector, LAMBDA, N_AUG, N_SIGMA, N_X,
};
use crate::utils::angles::angle_difference;

/// Mean and covariance of a distribution, as recovered from sigma points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments<V, C> {
    pub mean: V,
    pub covariance: C,
}

pub type StateMoments = Moments<StateVector, StateCovariance>;

/// The `2 * n_aug + 1` weights used for every weighted sum over sigma points.
///
/// The mean weight `lambda / (lambda + n_aug)` differs from the other
/// `2 * n_aug`, which all equal `0.5 / (lambda + n_aug)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SigmaWeights {
    lambda: f64,
    weights: SigmaWeightVector,
}

impl Default for SigmaWeights {
    fn default() -> Self {
        Self::new(LAMBDA)
    }
}

impl SigmaWeights {
    pub fn new(lambda: f64) -> Self {
        let n_aug = N_AUG as f64;
        let mut weights = SigmaWeightVector::from_element(0.5 / (lambda + n_aug));
        weights[0] = lambda / (lambda + n_aug);
        Self { lambda, weights }
    }

    /// Distance of the outer sigma points from the mean, in units of the
    /// Cholesky factor's columns.
    pub fn spread(&self) -> f64 {
        (self.lambda + N_AUG as f64).sqrt()
    }

    pub fn as_vector(&self) -> &SigmaWeightVector {
        &self.weights
    }

    pub fn get(&self, i: usize) -> f64 {
        self.weights[i]
    }

    pub fn sum(&self) -> f64 {
        self.weights.sum()
    }
}

/// Builds the augmented mean `[x, 0, 0]` and the block-diagonal augmented
/// covariance `diag(P, std_a^2, std_yawdd^2)`.
pub fn augment(
    x: &StateVector,
    p: &StateCovariance,
    noise: &ProcessNoise,
) -> (AugStateVector, AugStateCovariance) {
    let mut x_aug = AugStateVector::zeros();
    x_aug.fixed_rows_mut::<N_X>(0).copy_from(x);

    let mut p_aug = AugStateCovariance::zeros();
    p_aug.fixed_view_mut::<N_X, N_X>(0, 0).copy_from(p);
    p_aug[(N_X, N_X)] = noise.std_a * noise.std_a;
    p_aug[(N_X + 1, N_X + 1)] = noise.std_yawdd * noise.std_yawdd;

    (x_aug, p_aug)
}

/// Generates the augmented sigma points around `(x, P)`.
///
/// Returns `None` when the augmented covariance is not positive definite and
/// therefore has no Cholesky factor.
pub fn augmented_sigma_points(
    x: &StateVector,
    p: &StateCovariance,
    noise: &ProcessNoise,
    weights: &SigmaWeights,
) -> Option<AugSigmaPoints> {
    let (x_aug, p_aug) = augment(x, p, noise);

    // Cholesky decomposition: P_aug = L * L^T
    let l_matrix = Cholesky::new(p_aug)?.l();
    let scaled_l = l_matrix * weights.spread();

    let mut sigma_points = AugSigmaPoints::zeros();
    sigma_points.set_column(0, &x_aug);
    for i in 0..N_AUG {
        sigma_points.set_column(i + 1, &(x_aug + scaled_l.column(i)));
        sigma_points.set_column(i + 1 + N_AUG, &(x_aug - scaled_l.column(i)));
    }

    Some(sigma_points)
}

/// Pushes every augmented sigma point through the motion model.
pub fn predict_sigma_points<D>(dynamics: &D, x_sig_aug: &AugSigmaPoints, dt: f64) -> SigmaPoints
where
    D: EstimationDynamics + ?Sized,
{
    let mut x_sig_pred = SigmaPoints::zeros();
    for i in 0..N_SIGMA {
        let point: AugStateVector = x_sig_aug.column(i).into_owned();
        x_sig_pred.set_column(i, &dynamics.propagate(&point, dt));
    }
    x_sig_pred
}

/// Difference between a sigma point and the mean, heading wrapped.
pub fn state_difference(point: &StateVector, mean: &StateVector) -> StateVector {
    let yaw = StateVariable::Yaw.index();
    let mut diff = point - mean;
    diff[yaw] = angle_difference(point[yaw], mean[yaw]);
    diff
}

/// Recovers the predicted state mean and covariance from propagated sigma points.
pub fn state_moments(x_sig_pred: &SigmaPoints, weights: &SigmaWeights) -> StateMoments {
    // x = sum(w_i * X_i)
    let mean: StateVector = x_sig_pred * weights.as_vector();

    // P = sum(w_i * (X_i - x) * (X_i - x)^T)
    let mut covariance = StateCovariance::zeros();
    for i in 0..N_SIGMA {
        let point: StateVector = x_sig_pred.column(i).into_owned();
        let diff = state_difference(&point, &mean);
        covariance += weights.get(i) * diff * diff.transpose();
    }

    Moments { mean, covariance }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dynamics::ctrv::CtrvModel;
    use approx::assert_abs_diff_eq;

    fn sample_state() -> (StateVector, StateCovariance) {
        let x = StateVector::new(5.7441, 1.3800, 2.2049, 0.5015, 0.3528);
        #[rustfmt::skip]
        let p = StateCovariance::new(
             0.0043,   -0.0013,    0.0030,   -0.0022,   -0.0020,
            -0.0013,    0.0077,    0.0011,    0.0071,    0.0060,
             0.0030,    0.0011,    0.0054,    0.0007,    0.0008,
            -0.0022,    0.0071,    0.0007,    0.0098,    0.0100,
            -0.0020,    0.0060,    0.0008,    0.0100,    0.0123,
        );
        (x, p)
    }

    #[test]
    fn test_weights_sum_to_one() {
        for lambda in [LAMBDA, -2.0, 0.0, 1.0, 3.0, 10.0] {
            let weights = SigmaWeights::new(lambda);
            assert_abs_diff_eq!(weights.sum(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_default_weights() {
        let weights = SigmaWeights::default();
        assert_abs_diff_eq!(weights.get(0), -4.0 / 3.0, epsilon = 1e-12);
        for i in 1..N_SIGMA {
            assert_abs_diff_eq!(weights.get(i), 1.0 / 6.0, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(weights.spread(), 3.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_augmentation_is_block_diagonal() {
        let (x, p) = sample_state();
        let (x_aug, p_aug) = augment(&x, &p, &ProcessNoise::default());
        assert_eq!(x_aug.fixed_rows::<N_X>(0), x);
        assert_eq!(x_aug[5], 0.0);
        assert_eq!(x_aug[6], 0.0);
        assert_eq!(p_aug.fixed_view::<N_X, N_X>(0, 0), p);
        assert_eq!(p_aug[(5, 5)], 0.25);
        assert_eq!(p_aug[(6, 6)], 0.25);
        assert_eq!(p_aug[(5, 0)], 0.0);
        assert_eq!(p_aug[(6, 5)], 0.0);
    }

    #[test]
    fn test_sigma_points_are_symmetric_around_mean() {
        let (x, p) = sample_state();
        let weights = SigmaWeights::default();
        let sig = augmented_sigma_points(&x, &p, &ProcessNoise::default(), &weights).unwrap();
        let center: AugStateVector = sig.column(0).into_owned();
        for i in 1..=N_AUG {
            let plus: AugStateVector = sig.column(i).into_owned();
            let minus: AugStateVector = sig.column(i + N_AUG).into_owned();
            assert_abs_diff_eq!((plus + minus) * 0.5, center, epsilon = 1e-12);
        }
        // First offset is sqrt(3) * sqrt(P[0,0]) along px only.
        assert_abs_diff_eq!(
            sig[(0, 1)] - x[0],
            3.0_f64.sqrt() * 0.0043_f64.sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_identity_transform_recovers_moments() {
        let (x, p) = sample_state();
        let weights = SigmaWeights::default();
        let sig = augmented_sigma_points(&x, &p, &ProcessNoise::default(), &weights).unwrap();

        // With dt = 0 the motion model is the identity on the state rows.
        let propagated = predict_sigma_points(&CtrvModel, &sig, 0.0);
        let moments = state_moments(&propagated, &weights);

        assert_abs_diff_eq!(moments.mean, x, epsilon = 1e-9);
        assert_abs_diff_eq!(moments.covariance, p, epsilon = 1e-9);
    }

    #[test]
    fn test_not_positive_definite_has_no_sigma_points() {
        let x = StateVector::zeros();
        let mut p = StateCovariance::identity();
        p[(2, 2)] = -1.0;
        let weights = SigmaWeights::default();
        assert!(augmented_sigma_points(&x, &p, &ProcessNoise::default(), &weights).is_none());
    }

    #[test]
    fn test_predicted_covariance_is_symmetric() {
        let (x, p) = sample_state();
        let weights = SigmaWeights::default();
        let sig = augmented_sigma_points(&x, &p, &ProcessNoise::default(), &weights).unwrap();
        let moments = state_moments(&predict_sigma_points(&CtrvModel, &sig, 0.1), &weights);
        let asymmetry = (moments.covariance - moments.covariance.transpose()).amax();
        assert!(asymmetry < 1e-12, "asymmetry {}", asymmetry);
        for i in 0..N_X {
            assert!(moments.covariance[(i, i)] > 0.0);
        }
    }

    #[test]
    fn test_heading_difference_is_wrapped() {
        let point = StateVector::new(0.0, 0.0, 0.0, 3.1, 0.0);
        let mean = StateVector::new(0.0, 0.0, 0.0, -3.1, 0.0);
        let diff = state_difference(&point, &mean);
        assert_abs_diff_eq!(diff[3], 6.2 - 2.0 * std::f64::consts::PI, epsilon = 1e-12);
    }
}
