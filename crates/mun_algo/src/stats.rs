//! Small descriptive statistics over `f64` samples.
//!
//! Empty inputs yield 0.0 rather than NaN. Percentiles interpolate linearly
//! between order statistics (the common "linear" definition).

use serde::Serialize;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

pub fn median(values: &[f64]) -> f64 {
    percentile(values, 50.0)
}

/// `p` in [0,100].
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile_sorted(&sorted, p)
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Weighted mean; weights need not be normalised. 0.0 if the weights sum to 0.
pub fn weighted_mean(values: &[f64], weights: &[f64]) -> f64 {
    let wsum: f64 = weights.iter().sum();
    if wsum <= 0.0 {
        return 0.0;
    }
    values.iter().zip(weights).map(|(v, w)| v * w).sum::<f64>() / wsum
}

/// Weighted population standard deviation around the weighted mean.
pub fn weighted_std(values: &[f64], weights: &[f64]) -> f64 {
    let wsum: f64 = weights.iter().sum();
    if wsum <= 0.0 {
        return 0.0;
    }
    let m = weighted_mean(values, weights);
    let var = values.iter().zip(weights).map(|(v, w)| w * (v - m) * (v - m)).sum::<f64>() / wsum;
    var.sqrt()
}

/// Two-sided z-score for `confidence` (e.g. 0.95 → 1.96).
///
/// The usual levels come from a fixed table; anything else goes through the
/// Abramowitz & Stegun 26.2.23 rational approximation (|error| < 4.5e-4).
pub fn z_for_confidence(confidence: f64) -> f64 {
    const TABLE: [(f64, f64); 3] = [(0.90, 1.645), (0.95, 1.96), (0.99, 2.576)];
    if let Some(&(_, z)) = TABLE.iter().find(|(c, _)| (c - confidence).abs() < 1e-9) {
        return z;
    }
    if !(confidence > 0.0 && confidence < 1.0) {
        return 1.96;
    }
    let tail = (1.0 - confidence) / 2.0;
    let t = (-2.0 * tail.ln()).sqrt();
    let (c0, c1, c2) = (2.515_517, 0.802_853, 0.010_328);
    let (d1, d2, d3) = (1.432_788, 0.189_269, 0.001_308);
    t - (c0 + c1 * t + c2 * t * t) / (1.0 + d1 * t + d2 * t * t + d3 * t * t * t)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistributionSummary {
    pub mean: f64,
    pub std: f64,
    pub median: f64,
    /// Lower percentile bound at the requested confidence.
    pub low: f64,
    pub high: f64,
}

/// Mean, std, median and the central `confidence` interval of `values`.
pub fn summarize(values: &[f64], confidence: f64) -> DistributionSummary {
    if values.is_empty() {
        return DistributionSummary { mean: 0.0, std: 0.0, median: 0.0, low: 0.0, high: 0.0 };
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let tail = (1.0 - confidence.clamp(0.0, 1.0)) / 2.0 * 100.0;
    DistributionSummary {
        mean: mean(values),
        std: std_dev(values),
        median: percentile_sorted(&sorted, 50.0),
        low: percentile_sorted(&sorted, tail),
        high: percentile_sorted(&sorted, 100.0 - tail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn basic_moments() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&xs), 5.0);
        assert_eq!(std_dev(&xs), 2.0);
        assert_eq!(median(&xs), 4.5);
    }

    #[test]
    fn percentile_interpolates() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&xs, 0.0), 1.0);
        assert_eq!(percentile(&xs, 100.0), 4.0);
        assert!(close(percentile(&xs, 25.0), 1.75, 1e-12));
        assert_eq!(percentile(&[3.0], 90.0), 3.0);
    }

    #[test]
    fn weighted_matches_unweighted_on_equal_weights() {
        let xs = [1.0, 2.0, 6.0];
        let w = [0.5, 0.5, 0.5];
        assert!(close(weighted_mean(&xs, &w), mean(&xs), 1e-12));
        assert!(close(weighted_std(&xs, &w), std_dev(&xs), 1e-12));
        assert_eq!(weighted_mean(&xs, &[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn z_scores() {
        assert_eq!(z_for_confidence(0.95), 1.96);
        assert_eq!(z_for_confidence(0.99), 2.576);
        assert!(close(z_for_confidence(0.80), 1.2816, 1e-3));
        assert!(close(z_for_confidence(0.68), 0.9945, 1e-3));
    }

    #[test]
    fn empty_summary_is_zero() {
        let s = summarize(&[], 0.95);
        assert_eq!(s.mean, 0.0);
        assert_eq!(s.high, 0.0);
    }

    #[test]
    fn summary_bounds_bracket_median() {
        let xs: Vec<f64> = (0..=100).map(f64::from).collect();
        let s = summarize(&xs, 0.95);
        assert_eq!(s.median, 50.0);
        assert!(close(s.low, 2.5, 1e-9));
        assert!(close(s.high, 97.5, 1e-9));
    }
}
