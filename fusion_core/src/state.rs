// fusion_core/src/state.rs

use nalgebra::Vector4;

use crate::types::{StateCovariance, StateVector, TimestampUs, N_X};

/// Every variable that exists in the CTRV state vector, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateVariable {
    /// Position along the world x-axis (m).
    Px,
    /// Position along the world y-axis (m).
    Py,
    /// Speed magnitude along the heading (m/s).
    Speed,
    /// Heading angle (rad). Not wrapped; only differences are normalized.
    Yaw,
    /// Heading rate (rad/s).
    YawRate,
}

impl StateVariable {
    /// The ordered "schema" of the state vector.
    pub const LAYOUT: [StateVariable; N_X] = [
        StateVariable::Px,
        StateVariable::Py,
        StateVariable::Speed,
        StateVariable::Yaw,
        StateVariable::YawRate,
    ];

    /// Index of this variable inside `StateVector`.
    pub const fn index(self) -> usize {
        match self {
            StateVariable::Px => 0,
            StateVariable::Py => 1,
            StateVariable::Speed => 2,
            StateVariable::Yaw => 3,
            StateVariable::YawRate => 4,
        }
    }
}

/// The state object owned by the filter. It bundles the state vector with
/// its covariance and the timestamp of the last processed measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterState {
    /// The numerical state vector `x`.
    pub vector: StateVector,
    /// The covariance matrix `P`.
    pub covariance: StateCovariance,
    /// Timestamp of the last processed measurement, in microseconds.
    pub last_update_timestamp: TimestampUs,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            vector: StateVector::zeros(),
            covariance: StateCovariance::identity(),
            last_update_timestamp: 0,
        }
    }
}

impl FilterState {
    pub fn get(&self, var: StateVariable) -> f64 {
        self.vector[var.index()]
    }

    /// Variance of a single state variable.
    pub fn variance(&self, var: StateVariable) -> f64 {
        let i = var.index();
        self.covariance[(i, i)]
    }

    pub fn position(&self) -> (f64, f64) {
        (self.get(StateVariable::Px), self.get(StateVariable::Py))
    }

    /// Velocity decomposed along the world axes.
    pub fn velocity(&self) -> (f64, f64) {
        let v = self.get(StateVariable::Speed);
        let yaw = self.get(StateVariable::Yaw);
        (v * yaw.cos(), v * yaw.sin())
    }

    /// `[px, py, vx, vy]`, the representation ground truth is recorded in.
    pub fn cartesian(&self) -> Vector4<f64> {
        let (px, py) = self.position();
        let (vx, vy) = self.velocity();
        Vector4::new(px, py, vx, vy)
    }

    pub fn is_finite(&self) -> bool {
        self.vector.iter().all(|v| v.is_finite()) && self.covariance.iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_layout_matches_indices() {
        for (i, var) in StateVariable::LAYOUT.iter().enumerate() {
            assert_eq!(var.index(), i);
        }
    }

    #[test]
    fn test_cartesian_projects_speed_along_heading() {
        let state = FilterState {
            vector: StateVector::new(1.0, 2.0, 3.0, FRAC_PI_2, 0.1),
            ..Default::default()
        };
        let c = state.cartesian();
        assert_abs_diff_eq!(c[0], 1.0);
        assert_abs_diff_eq!(c[1], 2.0);
        assert_abs_diff_eq!(c[2], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c[3], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_default_is_identity_covariance() {
        let state = FilterState::default();
        assert_eq!(state.variance(StateVariable::Yaw), 1.0);
        assert!(state.is_finite());
    }
}
