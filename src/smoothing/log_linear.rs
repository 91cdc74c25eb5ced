// Log-linear fit of count-of-counts, used to smooth Good-Turing discounts.

use serde::{Deserialize, Serialize};

use crate::errors::{check_value, SmoothingError};

/// Histogram buckets with less support than this are treated as empty.
const MIN_SUPPORT: f64 = 0.1;

/// Fitted line `ln n_c = slope * c + intercept` over the count histogram,
/// plus the table of smoothed expected counts it produces.
///
/// `smoothed_counts[i]` holds `exp(slope * c_i + intercept)` where `c_i` is
/// the i-th count value that had histogram support. Positions past the last
/// supported count stay 0. Katz discounting looks the table up by raw count,
/// so this alignment decides which values get compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLinearSmoother {
    slope: f64,
    intercept: f64,
    cutoff: usize,
    support: Vec<usize>,
    smoothed_counts: Vec<f64>,
}

/// Fit a smoother to raw counts, considering count values `0..=cutoff`.
pub fn fit_smoother<I>(counts: I, cutoff: usize) -> Result<LogLinearSmoother, SmoothingError>
where
    I: IntoIterator<Item = f64>,
{
    let histogram = count_histogram(counts, cutoff);

    let mut support = Vec::new();
    let mut log_frequencies = Vec::new();
    for (count, &frequency) in histogram.iter().enumerate() {
        if frequency > MIN_SUPPORT {
            support.push(count);
            log_frequencies.push(frequency.ln());
        }
    }

    let xs: Vec<f64> = support.iter().map(|&c| c as f64).collect();
    let (slope, intercept) = linear_regression(&xs, &log_frequencies)?;

    let mut smoothed_counts = vec![0.; cutoff + 1];
    for (idx, &x) in xs.iter().enumerate() {
        smoothed_counts[idx] = check_value("smoothed count", (slope * x + intercept).exp())?;
    }

    Ok(LogLinearSmoother {
        slope,
        intercept,
        cutoff,
        support,
        smoothed_counts,
    })
}

/// `histogram[c]` = number of events whose raw count is exactly `c`, for
/// `c` in `0..=cutoff`. Larger counts are not tallied.
pub fn count_histogram<I>(counts: I, cutoff: usize) -> Vec<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut histogram = vec![0.; cutoff + 1];
    for count in counts {
        if count >= 0. && count <= cutoff as f64 {
            histogram[count as usize] += 1.;
        }
    }
    histogram
}

/// Ordinary least squares; returns `(slope, intercept)`.
pub fn linear_regression(xs: &[f64], ys: &[f64]) -> Result<(f64, f64), SmoothingError> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return Err(SmoothingError::InsufficientSupport(n));
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);

    let x_bar = xs.iter().sum::<f64>() / n as f64;
    let y_bar = ys.iter().sum::<f64>() / n as f64;

    let mut xx = 0.;
    let mut xy = 0.;
    for (x, y) in xs.iter().zip(ys.iter()) {
        xx += (x - x_bar) * (x - x_bar);
        xy += (x - x_bar) * (y - y_bar);
    }
    // Repeated x values only.
    if xx == 0. {
        return Err(SmoothingError::InsufficientSupport(1));
    }

    let slope = xy / xx;
    let intercept = y_bar - slope * x_bar;
    if !slope.is_finite() || !intercept.is_finite() {
        return Err(SmoothingError::InvalidValue {
            what: "regression coefficient",
            value: if slope.is_finite() { intercept } else { slope },
        });
    }
    Ok((slope, intercept))
}

impl LogLinearSmoother {
    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn cutoff(&self) -> usize {
        self.cutoff
    }

    /// Count values that had histogram support, in increasing order.
    pub fn support(&self) -> &[usize] {
        &self.support
    }

    pub fn smoothed_count(&self, index: usize) -> f64 {
        self.smoothed_counts.get(index).copied().unwrap_or(0.)
    }

    /// Good-Turing style discounted count `(c + 1) * s[c] / s[c - 1]` for
    /// `1 <= count <= cutoff`. `None` when the ratio is undefined because
    /// `s[c - 1]` is 0.
    pub fn discounted_count(&self, count: usize) -> Option<f64> {
        if count == 0 || count > self.cutoff {
            return None;
        }
        let denominator = self.smoothed_count(count - 1);
        if denominator == 0. {
            return None;
        }
        Some((count as f64 + 1.) * self.smoothed_count(count) / denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_linear_regression_closed_form() {
        let xs = [1., 2., 3.];
        let ys = [5f64.ln(), 3f64.ln(), 1f64.ln()];
        let (slope, intercept) = linear_regression(&xs, &ys).unwrap();
        // x_bar = 2, y_bar = ln(15) / 3, Sxx = 2, Sxy = -ln(5)
        assert!(close(slope, -(5f64.ln()) / 2.));
        assert!(close(intercept, 15f64.ln() / 3. + 5f64.ln()));
    }

    #[test]
    fn test_linear_regression_needs_two_points() {
        assert_eq!(
            linear_regression(&[1.], &[0.]),
            Err(SmoothingError::InsufficientSupport(1))
        );
        assert_eq!(
            linear_regression(&[], &[]),
            Err(SmoothingError::InsufficientSupport(0))
        );
        assert!(linear_regression(&[2., 2.], &[1., 3.]).is_err());
    }

    #[test]
    fn test_count_histogram() {
        let counts = vec![1., 1., 2., 7., 3., 1.];
        assert_eq!(count_histogram(counts, 3), vec![0., 3., 1., 1.]);
    }

    #[test]
    fn test_fit_smoother() {
        // Five events seen once, three twice, one three times.
        let counts = vec![1., 1., 1., 1., 1., 2., 2., 2., 3.];
        let smoother = fit_smoother(counts, 5).unwrap();
        assert_eq!(smoother.support(), &[1, 2, 3]);
        assert!(close(smoother.slope(), -(5f64.ln()) / 2.));
        assert!(close(smoother.smoothed_count(0), (smoother.slope() + smoother.intercept()).exp()));
        assert_eq!(smoother.smoothed_count(3), 0.);
        assert_eq!(smoother.smoothed_count(99), 0.);
    }

    #[test]
    fn test_table_follows_filtered_support() {
        // Counts 1 (x4) and 3 (x1): no support at 2.
        let counts = vec![1., 1., 1., 1., 3.];
        let smoother = fit_smoother(counts, 4).unwrap();
        assert!(close(smoother.slope(), -(2f64.ln())));
        assert!(close(smoother.intercept(), 8f64.ln()));
        // Slot 1 holds the fit at count 3, not at count 2.
        assert!(close(smoother.smoothed_count(0), 4.));
        assert!(close(smoother.smoothed_count(1), 1.));
        assert_eq!(smoother.smoothed_count(2), 0.);

        assert!(close(smoother.discounted_count(1).unwrap(), 2. * 1. / 4.));
        // s[2] = 0 so count 2 is discounted to nothing.
        assert_eq!(smoother.discounted_count(2), Some(0.));
        // s[2] = 0 in the denominator: undefined.
        assert_eq!(smoother.discounted_count(3), None);
        assert_eq!(smoother.discounted_count(0), None);
        assert_eq!(smoother.discounted_count(5), None);
    }

    #[test]
    fn test_fit_smoother_insufficient_support() {
        let counts = vec![2., 2., 2.];
        assert_eq!(
            fit_smoother(counts, 5),
            Err(SmoothingError::InsufficientSupport(1))
        );
        // Counts above the cutoff are not support points.
        let counts = vec![1., 9., 12.];
        assert!(fit_smoother(counts, 5).is_err());
    }
}
