// fusion_core/src/models/dynamics/ctrv.rs

use crate::models::dynamics::EstimationDynamics;
use crate::types::{AugStateVector, StateVector};

/// Below this yaw rate (rad/s) the turning solution is replaced by its
/// straight-line limit to avoid dividing by a vanishing yaw rate.
pub const YAW_RATE_EPSILON: f64 = 1e-3;

/// Constant Turn Rate and Velocity kinematics.
///
/// Augmented layout: `[px, py, v, yaw, yaw_rate, nu_a, nu_yawdd]`, where
/// `nu_a` is longitudinal acceleration noise and `nu_yawdd` yaw acceleration noise.
#[derive(Debug, Clone, Copy, Default)]
pub struct CtrvModel;

impl EstimationDynamics for CtrvModel {
    fn propagate(&self, x_aug: &AugStateVector, dt: f64) -> StateVector {
        // --- Extract from the augmented vector ---
        let p_x = x_aug[0];
        let p_y = x_aug[1];
        let v = x_aug[2];
        let yaw = x_aug[3];
        let yawd = x_aug[4];
        let nu_a = x_aug[5];
        let nu_yawdd = x_aug[6];

        // --- Deterministic part ---
        let (mut px_p, mut py_p) = if yawd.abs() > YAW_RATE_EPSILON {
            (
                p_x + v / yawd * ((yaw + yawd * dt).sin() - yaw.sin()),
                p_y + v / yawd * (yaw.cos() - (yaw + yawd * dt).cos()),
            )
        } else {
            (p_x + v * dt * yaw.cos(), p_y + v * dt * yaw.sin())
        };
        let mut v_p = v;
        let mut yaw_p = yaw + yawd * dt;
        let mut yawd_p = yawd;

        // --- Process noise contribution ---
        let dt2 = dt * dt;
        px_p += 0.5 * nu_a * dt2 * yaw.cos();
        py_p += 0.5 * nu_a * dt2 * yaw.sin();
        v_p += nu_a * dt;

        yaw_p += 0.5 * nu_yawdd * dt2;
        yawd_p += nu_yawdd * dt;

        StateVector::new(px_p, py_p, v_p, yaw_p, yawd_p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_zero_dt_is_identity() {
        let x = StateVector::new(1.0, -2.0, 3.0, 0.4, 0.7);
        let x_p = CtrvModel.propagate_state(&x, 0.0);
        assert_abs_diff_eq!(x_p, x, epsilon = EPSILON);
    }

    #[test]
    fn test_straight_line_below_yaw_rate_threshold() {
        let x = StateVector::new(0.0, 0.0, 2.0, FRAC_PI_2, 0.0);
        let x_p = CtrvModel.propagate_state(&x, 0.5);
        assert_abs_diff_eq!(x_p[0], 0.0, epsilon = EPSILON);
        assert_abs_diff_eq!(x_p[1], 1.0, epsilon = EPSILON);
        assert_abs_diff_eq!(x_p[2], 2.0, epsilon = EPSILON);
        assert_abs_diff_eq!(x_p[3], FRAC_PI_2, epsilon = EPSILON);
    }

    #[test]
    fn test_turning_solution_follows_circle() {
        // v = 1 m/s, yaw rate = 1 rad/s -> circle of radius 1 centred at (0, 1).
        let x = StateVector::new(0.0, 0.0, 1.0, 0.0, 1.0);
        let x_p = CtrvModel.propagate_state(&x, PI);
        assert_abs_diff_eq!(x_p[0], 0.0, epsilon = EPSILON);
        assert_abs_diff_eq!(x_p[1], 2.0, epsilon = EPSILON);
        assert_abs_diff_eq!(x_p[3], PI, epsilon = EPSILON);
        assert_abs_diff_eq!(x_p[4], 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_turning_and_straight_branches_agree_near_threshold() {
        let dt = 0.1;
        let below = StateVector::new(1.0, 1.0, 5.0, 0.3, 0.999e-3);
        let above = StateVector::new(1.0, 1.0, 5.0, 0.3, 1.001e-3);
        let p_below = CtrvModel.propagate_state(&below, dt);
        let p_above = CtrvModel.propagate_state(&above, dt);
        assert_abs_diff_eq!(p_below[0], p_above[0], epsilon = 1e-4);
        assert_abs_diff_eq!(p_below[1], p_above[1], epsilon = 1e-4);
    }

    #[test]
    fn test_noise_terms_scale_with_dt() {
        let mut x_aug = AugStateVector::zeros();
        x_aug[2] = 1.0; // v
        x_aug[5] = 2.0; // nu_a
        x_aug[6] = -1.0; // nu_yawdd
        let dt = 0.2;
        let x_p = CtrvModel.propagate(&x_aug, dt);

        // px: v*dt + 0.5*nu_a*dt^2 along yaw = 0
        assert_abs_diff_eq!(x_p[0], 0.2 + 0.5 * 2.0 * 0.04, epsilon = EPSILON);
        assert_abs_diff_eq!(x_p[1], 0.0, epsilon = EPSILON);
        assert_abs_diff_eq!(x_p[2], 1.0 + 2.0 * dt, epsilon = EPSILON);
        assert_abs_diff_eq!(x_p[3], 0.5 * -1.0 * 0.04, epsilon = EPSILON);
        assert_abs_diff_eq!(x_p[4], -dt, epsilon = EPSILON);
    }
}
