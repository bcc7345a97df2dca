//! Percentile math: sample ranks and cut-point interpolation.
//!
//! Both functions are pure, clamp to `[0, 100]`, and are monotonically
//! non-decreasing in the metric value — a merchant can never score lower by
//! improving a metric.

use crate::peers::MetricAggregate;

/// Clamp a score into the 0..=100 band.
fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// Fraction of the sample at or below `value`, expressed 0..=100.
///
/// Returns `None` for an empty sample; the caller falls back to cut points.
pub fn percentile_rank(value: f64, sample: &[f64]) -> Option<f64> {
    if sample.is_empty() {
        return None;
    }
    let at_or_below = sample.iter().filter(|v| **v <= value).count();
    Some(clamp_score(at_or_below as f64 / sample.len() as f64 * 100.0))
}

/// Piecewise-linear score from quartile cut points.
///
/// Maps `p25 -> 25`, `p50 -> 50`, `p75 -> 75`, interpolating linearly inside
/// each band and extrapolating above `p75` with a cap at 100. Degenerate cut
/// points (zero or collapsed quartiles) fall back to the band's floor value
/// instead of dividing by zero.
pub fn cut_point_score(value: f64, p25: f64, p50: f64, p75: f64) -> f64 {
    let score = if value <= p25 {
        if p25 > 0.0 { 25.0 * (value / p25) } else { 25.0 }
    } else if value <= p50 {
        if p50 - p25 > 0.0 {
            25.0 + 25.0 * ((value - p25) / (p50 - p25))
        } else {
            25.0
        }
    } else if value <= p75 {
        if p75 - p50 > 0.0 {
            50.0 + 25.0 * ((value - p50) / (p75 - p50))
        } else {
            50.0
        }
    } else if p75 > 0.0 {
        75.0 + 25.0 * ((value - p75) / p75)
    } else {
        75.0
    };
    clamp_score(score)
}

/// Percentile and score of one metric against its peer aggregate.
///
/// The percentile comes from the sample distribution when one exists,
/// otherwise from the cut-point interpolation; the score is the percentile
/// itself (a monotonic 0..=100 transform).
pub fn metric_score(value: f64, agg: &MetricAggregate) -> (f64, f64) {
    let percentile = percentile_rank(value, &agg.sample)
        .unwrap_or_else(|| cut_point_score(value, agg.p25, agg.p50, agg.p75));
    (percentile, percentile)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agg(p25: f64, p50: f64, p75: f64, sample: Vec<f64>) -> MetricAggregate {
        MetricAggregate {
            p25,
            p50,
            p75,
            sample,
        }
    }

    #[test]
    fn interpolates_between_median_and_p75() {
        // AOV 120 against p50=100, p75=150 lands 40% into the 50..75 band.
        let score = cut_point_score(120.0, 50.0, 100.0, 150.0);
        assert_eq!(score, 60.0);
    }

    #[test]
    fn cut_points_map_to_their_band_edges() {
        assert_eq!(cut_point_score(50.0, 50.0, 100.0, 150.0), 25.0);
        assert_eq!(cut_point_score(100.0, 50.0, 100.0, 150.0), 50.0);
        assert_eq!(cut_point_score(150.0, 50.0, 100.0, 150.0), 75.0);
    }

    #[test]
    fn outliers_stay_in_bounds() {
        // A wild outlier against small peers must still clamp at 100.
        assert_eq!(cut_point_score(1_000_000.0, 50.0, 100.0, 150.0), 100.0);
        assert_eq!(cut_point_score(0.0, 50.0, 100.0, 150.0), 0.0);
    }

    #[test]
    fn degenerate_cut_points_do_not_divide_by_zero() {
        assert_eq!(cut_point_score(5.0, 0.0, 0.0, 0.0), 75.0);
        assert_eq!(cut_point_score(0.0, 0.0, 0.0, 0.0), 25.0);
        assert_eq!(cut_point_score(7.0, 7.0, 7.0, 7.0), 25.0);
    }

    #[test]
    fn sample_rank_counts_at_or_below() {
        let sample = vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 200.0];
        assert_eq!(percentile_rank(90.0, &sample), Some(90.0));
        assert_eq!(percentile_rank(5.0, &sample), Some(0.0));
        assert_eq!(percentile_rank(500.0, &sample), Some(100.0));
        assert_eq!(percentile_rank(1.0, &[]), None);
    }

    #[test]
    fn metric_score_prefers_the_sample() {
        // Cut points alone would give 75 + a sliver; the sample says 90.
        let a = agg(
            50.0,
            100.0,
            180.0,
            vec![10.0, 20.0, 40.0, 60.0, 90.0, 110.0, 130.0, 160.0, 180.0, 400.0],
        );
        let (percentile, score) = metric_score(200.0, &a);
        assert_eq!(percentile, 90.0);
        assert_eq!(score, 90.0);

        let no_sample = agg(50.0, 100.0, 180.0, vec![]);
        let (percentile, score) = metric_score(120.0, &no_sample);
        assert_eq!(percentile, 56.25);
        assert_eq!(score, 56.25);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn scores_always_in_bounds(
            value in 0.0f64..1e9,
            a in 0.0f64..1e6,
            b in 0.0f64..1e6,
            c in 0.0f64..1e6,
        ) {
            let mut cuts = [a, b, c];
            cuts.sort_by(|x, y| x.total_cmp(y));
            let score = cut_point_score(value, cuts[0], cuts[1], cuts[2]);
            prop_assert!((0.0..=100.0).contains(&score));
        }

        #[test]
        fn scores_are_monotonic_in_the_metric(
            v1 in 0.0f64..1e9,
            v2 in 0.0f64..1e9,
            a in 0.0f64..1e6,
            b in 0.0f64..1e6,
            c in 0.0f64..1e6,
        ) {
            let mut cuts = [a, b, c];
            cuts.sort_by(|x, y| x.total_cmp(y));
            let (lo, hi) = if v1 <= v2 { (v1, v2) } else { (v2, v1) };
            let s_lo = cut_point_score(lo, cuts[0], cuts[1], cuts[2]);
            let s_hi = cut_point_score(hi, cuts[0], cuts[1], cuts[2]);
            prop_assert!(s_lo <= s_hi, "score({lo})={s_lo} > score({hi})={s_hi}");
        }

        #[test]
        fn sample_rank_is_monotonic(
            v1 in 0.0f64..1e6,
            v2 in 0.0f64..1e6,
            sample in proptest::collection::vec(0.0f64..1e6, 1..40),
        ) {
            let (lo, hi) = if v1 <= v2 { (v1, v2) } else { (v2, v1) };
            let r_lo = percentile_rank(lo, &sample).unwrap();
            let r_hi = percentile_rank(hi, &sample).unwrap();
            prop_assert!(r_lo <= r_hi);
        }
    }
}
