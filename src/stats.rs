//! Descriptive statistics over metric samples
//!
//! Everything accumulates in `f64`, the precision the corpus is stored in.
//! Threshold targets are compared against these means directly, so a mean
//! must come out exactly as the samples define it.

/// Arithmetic mean; `None` for an empty sample
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn sum_of_squares(values: &[f64], mean: f64) -> f64 {
    values.iter().map(|v| (v - mean).powi(2)).sum()
}

/// Population standard deviation (divide by n)
pub fn population_stddev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some((sum_of_squares(values, m) / values.len() as f64).sqrt())
}

/// Sample standard deviation (divide by n - 1); `None` below two observations
pub fn sample_stddev(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = mean(values)?;
    Some((sum_of_squares(values, m) / (n - 1) as f64).sqrt())
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Mean that ignores NaN entries
///
/// 0.0 when nothing remains or the mean itself is not finite (infinite
/// entries, or sums that overflow).
pub fn nan_mean(values: &[f64]) -> f64 {
    let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    mean(&present).filter(|m| m.is_finite()).unwrap_or(0.0)
}

/// Coefficient of variation (population std / mean)
///
/// 0.0 for an empty sample or a non-positive mean.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let Some(mean) = mean(values) else {
        return 0.0;
    };
    if mean <= 0.0 {
        return 0.0;
    }
    population_stddev(values).map_or(0.0, |std| std / mean)
}

/// |curr - prev| / prev, defined only when prev is positive
pub fn relative_change(prev: f64, curr: f64) -> Option<f64> {
    (prev > 0.0).then(|| (curr - prev).abs() / prev)
}

/// Index of the first sample whose change from its predecessor is below `tolerance`
///
/// Scans consecutive pairs in order; pairs with a non-positive predecessor
/// are skipped. Index 0 is never returned.
pub fn first_stable_index(values: &[f64], tolerance: f64) -> Option<usize> {
    values
        .windows(2)
        .position(|pair| relative_change(pair[0], pair[1]).is_some_and(|c| c < tolerance))
        .map(|i| i + 1)
}
