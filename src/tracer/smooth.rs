//! The linear-tent weighting used to spread a [`SmoothDelta`](crate::path::SmoothDelta)
//! across several advance steps, reused by merge
//! recovery to distribute value/offset jumps across a parent chain.

use crate::path::{Segment, SmoothDelta};

/// `linear_dist(n, x) = (x < n/2 ? x+1 : n-x) / S`,
/// `S = (floor(n/2) + n mod 2) * (floor(n/2) + 1)`.
///
/// Sums to `1` over `x in 0..n` for every `n >= 1`.
pub fn linear_dist(n: i64, x: i64) -> f64 {
    if n <= 0 {
        return 0.0;
    }
    let half = n / 2;
    let rem = n % 2;
    let s = ((half + rem) * (half + 1)) as f64;
    let numerator = if x < half { x + 1 } else { n - x };
    numerator as f64 / s
}

/// The `(extra_value, extra_offset)` contribution of `segment`'s
/// `SmoothDelta` at advance-step index `step_index` (0-based, counted from
/// the first advance of the segment's own trace, not the tail margin).
///
/// Simplification: the fractional split for frames that straddle the last
/// whole step is not modeled here — it only matters when
/// `length mod step_size != 0`, and weights still sum to `1` across the
/// window regardless (see `DESIGN.md`).
pub fn smooth_delta_contrib(segment: &Segment, step_index: i64) -> (f64, f64) {
    let Some(sd) = segment.smooth_delta else {
        return (0.0, 0.0);
    };
    if sd.steps_total <= 0 {
        return (sd.value_delta, sd.offset_delta);
    }
    let j = step_index - sd.steps_start;
    let n_eff = (sd.steps_total - 2 * sd.steps_padding).max(0);
    let jp = j - sd.steps_padding;
    if jp < 0 || jp >= n_eff {
        return (0.0, 0.0);
    }
    let w = linear_dist(n_eff, jp);
    (sd.value_delta * w, sd.offset_delta * w)
}

/// Builds the `SmoothDelta` to apply to one link of a distribution chain
///.: `steps_total` shared out proportional to each
/// link's own full-step count, no padding.
pub fn chain_share(full_steps: i64, total_full_steps: i64, value_delta: f64, offset_delta: f64, steps_start: i64) -> SmoothDelta {
    let total = total_full_steps.max(1);
    SmoothDelta {
        value_delta: value_delta * full_steps as f64 / total as f64,
        offset_delta: offset_delta * full_steps as f64 / total as f64,
        steps_total: full_steps,
        steps_start,
        steps_padding: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_dist_sums_to_one() {
        for n in 1..20 {
            let sum: f64 = (0..n).map(|x| linear_dist(n, x)).sum();
            assert!((sum - 1.0).abs() < 1e-9, "n={n} sum={sum}");
        }
    }

    #[test]
    fn smooth_delta_contrib_zero_padding_windows_tent() {
        let mut seg = Segment::new(10.0, Default::default());
        seg.smooth_delta = Some(SmoothDelta {
            value_delta: 2.0,
            offset_delta: 0.0,
            steps_total: 10,
            steps_start: 0,
            steps_padding: 2,
        });
        let mut total = 0.0;
        for i in 0..10 {
            let (v, _) = smooth_delta_contrib(&seg, i);
            if i < 2 || i >= 8 {
                assert_eq!(v, 0.0);
            }
            total += v;
        }
        assert!((total - 2.0).abs() < 1e-9);
    }
}
