// fusion_core/src/estimation/stepping.rs

use crate::types::TimestampUs;

/// Gaps longer than this (µs) are integrated in several smaller predictions.
pub const MAX_SINGLE_STEP_US: TimestampUs = 200_000;
/// Size (µs) of each sub-step used when a gap is split.
pub const SUB_STEP_US: TimestampUs = 100_000;

fn to_seconds(us: TimestampUs) -> f64 {
    us as f64 / 1_000_000.0
}

/// The prediction steps (s) covering one measurement gap, produced lazily.
///
/// Gaps up to `MAX_SINGLE_STEP_US` are covered in one step (a zero gap still
/// yields one zero-length step so the sigma points are regenerated). Longer
/// gaps are chopped into `SUB_STEP_US` pieces until at most one sub-step
/// remains, which becomes the final step. Never empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSteps {
    remaining_us: TimestampUs,
    chunked: bool,
    done: bool,
}

impl Iterator for TimeSteps {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.done {
            return None;
        }
        if self.chunked && self.remaining_us > SUB_STEP_US {
            self.remaining_us -= SUB_STEP_US;
            return Some(to_seconds(SUB_STEP_US));
        }
        self.done = true;
        Some(to_seconds(self.remaining_us))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = if self.done {
            0
        } else if self.chunked {
            self.remaining_us.div_ceil(SUB_STEP_US) as usize
        } else {
            1
        };
        (n, Some(n))
    }
}

impl ExactSizeIterator for TimeSteps {}

/// Splits an elapsed time, in microseconds, into prediction steps.
pub fn split_time_step(gap_us: TimestampUs) -> TimeSteps {
    TimeSteps {
        remaining_us: gap_us,
        chunked: gap_us > MAX_SINGLE_STEP_US,
        done: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn steps(gap_us: TimestampUs) -> Vec<f64> {
        split_time_step(gap_us).collect()
    }

    #[test]
    fn test_short_gap_is_single_step() {
        assert_eq!(steps(50_000), vec![0.05]);
        assert_eq!(steps(150_000), vec![0.15]);
        assert_eq!(steps(200_000), vec![0.2]);
        assert_eq!(steps(0), vec![0.0]);
        assert_eq!(split_time_step(0).len(), 1);
    }

    #[test]
    fn test_long_gap_is_chopped_into_sub_steps() {
        let s = steps(550_000);
        assert_eq!(s.len(), 6);
        for step in &s[..5] {
            assert_eq!(*step, 0.1);
        }
        assert_eq!(s[5], 0.05);
        assert_abs_diff_eq!(s.iter().sum::<f64>(), 0.55, epsilon = 1e-12);
    }

    #[test]
    fn test_whole_multiples_have_no_trailing_sliver() {
        assert_eq!(steps(400_000), vec![0.1; 4]);
        assert_eq!(split_time_step(400_000).len(), 4);
        assert_eq!(steps(1_000_000), vec![0.1; 10]);
    }

    #[test]
    fn test_every_step_is_bounded_and_sum_is_preserved() {
        for gap_us in [210_000, 300_000, 999_000, 1_000_001, 2_500_000, 13_370_000] {
            let iter = split_time_step(gap_us);
            let expected_len = iter.len();
            let s: Vec<f64> = iter.collect();
            assert_eq!(s.len(), expected_len);
            assert!(s.iter().all(|v| *v > 0.0 && *v <= 0.1));
            assert_abs_diff_eq!(s.iter().sum::<f64>(), gap_us as f64 / 1e6, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_huge_gap_is_not_materialized() {
        let mut iter = split_time_step(1_000_000_000_000_000_000);
        assert_eq!(iter.len(), 10_000_000_000_000);
        assert_eq!(iter.next(), Some(0.1));
        assert_eq!(iter.len(), 9_999_999_999_999);
    }
}
