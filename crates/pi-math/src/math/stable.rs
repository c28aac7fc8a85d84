//! Numerically stable summation and ratio primitives.
//!
//! Money totals are folded with Neumaier's variant of Kahan summation so
//! that regrouping the same records (by job, by category, by date window)
//! yields totals that differ only by the final rounding of each group.

/// Compensated (Neumaier) sum of an iterator of values.
///
/// Returns 0.0 for empty input. NaN propagates.
pub fn compensated_sum<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut sum = 0.0_f64;
    let mut compensation = 0.0_f64;
    for v in values {
        let t = sum + v;
        if sum.abs() >= v.abs() {
            compensation += (sum - t) + v;
        } else {
            compensation += (v - t) + sum;
        }
        sum = t;
    }
    sum + compensation
}

/// Compensated sum of a slice.
pub fn sum_slice(values: &[f64]) -> f64 {
    compensated_sum(values.iter().copied())
}

/// Ratio `num / den`, or None when the denominator is zero or either
/// operand is not finite.
pub fn safe_ratio(num: f64, den: f64) -> Option<f64> {
    if !num.is_finite() || !den.is_finite() || den == 0.0 {
        return None;
    }
    Some(num / den)
}

/// Signed percentage change from `baseline` to `current`.
///
/// `(current - baseline) / baseline * 100`. None when the baseline is not a
/// strictly positive finite number.
pub fn pct_change(baseline: f64, current: f64) -> Option<f64> {
    if !baseline.is_finite() || !current.is_finite() || baseline <= 0.0 {
        return None;
    }
    Some((current - baseline) / baseline * 100.0)
}

/// Values are equal within an absolute-or-relative tolerance.
pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    if a == b {
        return true;
    }
    (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
}
