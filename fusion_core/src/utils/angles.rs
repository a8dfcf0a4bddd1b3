// fusion_core/src/utils/angles.rs

use num_traits::{Float, FloatConst};

/// Wraps an angle into `[-pi, pi]` by removing the nearest multiple of `2*pi`.
///
/// Angles already inside the interval are returned untouched, so the function
/// is idempotent. Every angular *difference* that enters a weighted sum
/// (heading residuals, bearing residuals) has to go through here.
pub fn normalize_angle<T>(angle: T) -> T
where
    T: Float + FloatConst,
{
    if angle.abs() > T::PI() {
        let two_pi = T::TAU();
        angle - (angle / two_pi).round() * two_pi
    } else {
        angle
    }
}

/// Shortest signed angular distance from `b` to `a`.
pub fn angle_difference<T>(a: T, b: T) -> T
where
    T: Float + FloatConst,
{
    normalize_angle(a - b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_inside_interval_is_untouched() {
        for angle in [-PI, -1.0, 0.0, 0.5, PI] {
            assert_eq!(normalize_angle(angle), angle);
        }
    }

    #[test]
    fn test_wraps_into_interval() {
        assert_abs_diff_eq!(normalize_angle(3.0 * PI / 2.0), -PI / 2.0, epsilon = EPSILON);
        assert_abs_diff_eq!(normalize_angle(-3.0 * PI / 2.0), PI / 2.0, epsilon = EPSILON);
        assert_abs_diff_eq!(normalize_angle(4.0 * PI + 0.25), 0.25, epsilon = EPSILON);
        assert_abs_diff_eq!(normalize_angle(-7.0 * PI - 0.1), PI - 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_sweep_stays_in_range_and_is_idempotent() {
        let mut angle = -60.0_f64;
        while angle <= 60.0 {
            let wrapped = normalize_angle(angle);
            assert!(
                wrapped.abs() <= PI + EPSILON,
                "{} normalized to {} which is outside [-pi, pi]",
                angle,
                wrapped
            );
            // Same direction on the unit circle.
            assert_abs_diff_eq!(wrapped.sin(), angle.sin(), epsilon = 1e-9);
            assert_abs_diff_eq!(wrapped.cos(), angle.cos(), epsilon = 1e-9);
            assert_abs_diff_eq!(normalize_angle(wrapped), wrapped, epsilon = EPSILON);
            angle += 0.173;
        }
    }

    #[test]
    fn test_generic_over_f32() {
        let wrapped = normalize_angle(7.0_f32);
        assert!((wrapped - (7.0 - 2.0 * std::f32::consts::PI)).abs() < 1e-5);
    }

    #[test]
    fn test_angle_difference_takes_short_way_round() {
        let diff = angle_difference(PI - 0.1, -PI + 0.1);
        assert_abs_diff_eq!(diff, -0.2, epsilon = 1e-9);
    }
}
