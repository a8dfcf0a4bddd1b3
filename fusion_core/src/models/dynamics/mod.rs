// fusion_core/src/models/dynamics/mod.rs

use std::fmt::Debug;

use crate::types::{AugStateVector, StateVector, N_X};

/// A motion model used by the estimator to push sigma points forward in time.
///
/// The model works on the *augmented* state so that process noise enters the
/// propagation non-additively: the last two entries of the augmented vector
/// are noise samples, not state.
pub trait EstimationDynamics: Debug + Send + Sync {
    /// Propagates one augmented sigma point over `dt` seconds and returns the
    /// resulting (non-augmented) state.
    fn propagate(&self, x_aug: &AugStateVector, dt: f64) -> StateVector;

    /// Noise-free propagation of a plain state vector.
    fn propagate_state(&self, x: &StateVector, dt: f64) -> StateVector {
        let mut x_aug = AugStateVector::zeros();
        x_aug.fixed_rows_mut::<N_X>(0).copy_from(x);
        self.propagate(&x_aug, dt)
    }
}

pub mod ctrv;
