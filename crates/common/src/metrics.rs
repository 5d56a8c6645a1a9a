//! Forecast-error summary used to rank fitted models.

use serde::{Deserialize, Serialize};

/// Differences at or below this are treated as ties in [`ForecastErrors::better_than`].
const TOLERANCE: f64 = 1e-8;

/// In-sample error statistics of a fitted model, with error = actual − forecast.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastErrors {
    /// Mean signed error.
    pub bias: f64,
    /// Mean absolute deviation.
    pub mad: f64,
    /// Mean absolute percentage error over non-zero actuals.
    pub mape: f64,
    /// Mean squared error.
    pub mse: f64,
    /// Sum of absolute errors.
    pub sae: f64,
}

impl ForecastErrors {
    /// Score `forecast` against `actual`, pairwise up to the shorter length.
    pub fn evaluate(forecast: &[f64], actual: &[f64]) -> Self {
        let n = forecast.len().min(actual.len());
        if n == 0 {
            return Self::default();
        }

        let mut sum_err = 0.0;
        let mut sum_abs = 0.0;
        let mut sum_sq = 0.0;
        let mut sum_pct = 0.0;
        let mut pct_count = 0usize;

        for (f, a) in forecast.iter().zip(actual).take(n) {
            let err = a - f;
            sum_err += err;
            sum_abs += err.abs();
            sum_sq += err * err;
            if a.abs() > f64::EPSILON {
                sum_pct += (err / a).abs();
                pct_count += 1;
            }
        }

        let n_f = n as f64;
        Self {
            bias: sum_err / n_f,
            mad: sum_abs / n_f,
            mape: if pct_count > 0 {
                sum_pct / pct_count as f64
            } else {
                0.0
            },
            mse: sum_sq / n_f,
            sae: sum_abs,
        }
    }

    /// True when every statistic is a finite number.
    pub fn is_finite(&self) -> bool {
        [self.bias, self.mad, self.mape, self.mse, self.sae]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Whether `self` should replace `other` as the best model.
    ///
    /// Each statistic votes +1/-1 (absolute bias for the bias term); a tied
    /// vote falls back to the summed difference. A summary is never better
    /// than itself. A summary with any non-finite statistic always loses.
    pub fn better_than(&self, other: &ForecastErrors) -> bool {
        if !self.is_finite() {
            return false;
        }
        if !other.is_finite() {
            return true;
        }

        let pairs = [
            (self.bias.abs(), other.bias.abs()),
            (self.mad, other.mad),
            (self.mape, other.mape),
            (self.mse, other.mse),
            (self.sae, other.sae),
        ];

        let mut score = 0i32;
        for (mine, theirs) in pairs {
            if (mine - theirs).abs() <= TOLERANCE {
                continue;
            }
            if mine < theirs {
                score += 1;
            } else {
                score -= 1;
            }
        }

        if score == 0 {
            let diff: f64 = pairs.iter().map(|(mine, theirs)| mine - theirs).sum();
            return diff < 0.0;
        }
        score > 0
    }
}
