//! Ordinary least-squares line fit over an evenly spaced series.

use serde::{Deserialize, Serialize};

use super::stable::compensated_sum;

/// Result of fitting `y = intercept + slope * x` with `x = 0, 1, ..., n-1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineFit {
    /// Change in y per period.
    pub slope: f64,
    /// Fitted value at x = 0.
    pub intercept: f64,
    /// Coefficient of determination in [0, 1].
    pub r_squared: f64,
    /// Number of points fitted.
    pub n: usize,
}

impl LineFit {
    /// Fitted value at period `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Fitted value at the last observed period.
    pub fn last_fitted(&self) -> f64 {
        self.predict(self.n.saturating_sub(1) as f64)
    }
}

/// Fit a line to `ys` indexed by position.
///
/// Returns None for fewer than two points or any non-finite value.
/// A perfectly flat series fits with `r_squared = 1.0`.
pub fn linear_fit(ys: &[f64]) -> Option<LineFit> {
    let n = ys.len();
    if n < 2 || ys.iter().any(|y| !y.is_finite()) {
        return None;
    }
    let nf = n as f64;
    let x_mean = (nf - 1.0) / 2.0;
    let y_mean = compensated_sum(ys.iter().copied()) / nf;

    let sxx = compensated_sum((0..n).map(|i| {
        let dx = i as f64 - x_mean;
        dx * dx
    }));
    let sxy = compensated_sum(
        ys.iter()
            .enumerate()
            .map(|(i, y)| (i as f64 - x_mean) * (y - y_mean)),
    );

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let ss_tot = compensated_sum(ys.iter().map(|y| (y - y_mean) * (y - y_mean)));
    let ss_res = compensated_sum(ys.iter().enumerate().map(|(i, y)| {
        let r = y - (intercept + slope * i as f64);
        r * r
    }));

    let r_squared = if ss_tot <= f64::EPSILON * y_mean.abs().max(1.0) {
        1.0
    } else {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    };

    Some(LineFit {
        slope,
        intercept,
        r_squared,
        n,
    })
}
