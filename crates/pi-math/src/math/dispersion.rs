//! Central tendency and dispersion of quote sets.
//!
//! All functions return None for empty input or input containing
//! non-finite values, so callers can surface "insufficient data"
//! instead of a fabricated zero.

use super::stable::compensated_sum;

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() || !all_finite(values) {
        return None;
    }
    Some(compensated_sum(values.iter().copied()) / values.len() as f64)
}

/// Population variance (divides by n, not n - 1).
///
/// Quote sets are the full population of current vendor prices, not a
/// sample, so the population form is used.
pub fn population_variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let sq = compensated_sum(values.iter().map(|v| (v - m) * (v - m)));
    Some((sq / values.len() as f64).max(0.0))
}

/// Population standard deviation.
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    population_variance(values).map(f64::sqrt)
}

/// Coefficient of variation (std-dev / mean).
///
/// None when the mean is not strictly positive.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    if m <= 0.0 {
        return None;
    }
    let sd = population_std_dev(values)?;
    Some(sd / m)
}

/// Min and max of a slice, or None if empty or non-finite.
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() || !all_finite(values) {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_basic() {
        assert_eq!(mean(&[3.85, 4.12, 3.98]).map(|m| (m * 100.0).round()), Some(398.0));
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, f64::NAN]), None);
    }

    #[test]
    fn std_dev_of_constant_is_zero() {
        assert_eq!(population_std_dev(&[5.0, 5.0, 5.0]), Some(0.0));
    }

    #[test]
    fn std_dev_known_value() {
        // Population std-dev of {2,4,4,4,5,5,7,9} is exactly 2.
        let sd = population_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - 2.0).abs() < 1e-12);
    }

    #[test]
    fn cv_requires_positive_mean() {
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]), None);
        assert_eq!(coefficient_of_variation(&[-1.0, -3.0]), None);
        let cv = coefficient_of_variation(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((cv - 0.4).abs() < 1e-12);
    }

    #[test]
    fn min_max_basic() {
        assert_eq!(min_max(&[4.0, 1.5, 9.0]), Some((1.5, 9.0)));
        assert_eq!(min_max(&[]), None);
    }
}
