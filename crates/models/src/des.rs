//! Holt's linear (double exponential) smoothing.

use common::{
    DataSequence, Entry, ForecastErrors, ForecastModel, ModelConfig, OptimizerConfig, ParameterBag,
    Result, TsmmError,
};
use tracing::debug;

use crate::optimizer::{finite_or_max, minimize, Bounds};
use crate::period::step_index;
use crate::stats::fill_expected;

/// Level + trend smoothing without seasonality. Needs at least two points to
/// seed the trend.
pub struct DoubleExponentialSmoothingModel {
    optimizer: OptimizerConfig,
    fitted: Option<FittedDes>,
}

struct FittedDes {
    alpha: f64,
    gamma: f64,
    start_level: f64,
    start_trend: f64,
    start_time: i64,
    granularity: i64,
    smoothed: Smoothed,
    range: f64,
    errors: ForecastErrors,
}

/// Output of one pass of the recurrence, with the state after the last point.
struct Smoothed {
    expected: Vec<f64>,
    level: f64,
    trend: f64,
}

/// One-step-ahead values: the first point echoes the starting level, every
/// later point is the previous level plus trend. The first observation only
/// seeds the state.
fn smooth(observed: &[f64], alpha: f64, gamma: f64, start_level: f64, start_trend: f64) -> Smoothed {
    let mut level = start_level;
    let mut trend = start_trend;
    let mut expected = Vec::with_capacity(observed.len());

    for (i, &obs) in observed.iter().enumerate() {
        if i == 0 {
            expected.push(level);
            continue;
        }
        let forecast = level + trend;
        expected.push(forecast);

        let prev_level = level;
        level = alpha * obs + (1.0 - alpha) * forecast;
        trend = gamma * (level - prev_level) + (1.0 - gamma) * trend;
    }
    Smoothed {
        expected,
        level,
        trend,
    }
}

impl FittedDes {
    /// In-sample value at training step `index`, or the trend line continued
    /// from the final state past the end of the window.
    fn value_at(&self, index: usize) -> f64 {
        let n = self.smoothed.expected.len();
        if index < n {
            return self.smoothed.expected[index];
        }
        let h = (index - n + 1) as f64;
        self.smoothed.level + h * self.smoothed.trend
    }
}

impl DoubleExponentialSmoothingModel {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            optimizer: config.optimizer.clone(),
            fitted: None,
        }
    }

    /// Fitted `(alpha, gamma)`.
    pub fn coefficients(&self) -> Option<(f64, f64)> {
        self.fitted.as_ref().map(|f| (f.alpha, f.gamma))
    }

    fn fitted(&self) -> Result<&FittedDes> {
        self.fitted.as_ref().ok_or_else(|| {
            TsmmError::ModelError("DoubleExponentialSmoothingModel is not trained".into())
        })
    }
}

impl ForecastModel for DoubleExponentialSmoothingModel {
    fn name(&self) -> &str {
        "DoubleExponentialSmoothingModel"
    }

    fn train(&mut self, data: &DataSequence) -> Result<()> {
        self.fitted = None;
        if data.len() < 2 {
            return Err(TsmmError::InsufficientData(format!(
                "DoubleExponentialSmoothingModel requires at least 2 points, got {}",
                data.len()
            )));
        }

        let granularity = data
            .granularity()
            .filter(|&g| g > 0)
            .ok_or_else(|| TsmmError::InvalidInput("timestamps must be increasing".into()))?;
        let values = data.values();
        let start_level = values[0];
        let start_trend = values[1] - values[0];

        let best = minimize(
            |p| {
                let smoothed = smooth(&values, p[0], p[1], start_level, start_trend);
                finite_or_max(
                    smoothed
                        .expected
                        .iter()
                        .zip(&values)
                        .map(|(e, a)| (a - e) * (a - e))
                        .sum(),
                )
            },
            &[0.3, 0.1],
            &Bounds::uniform(2, 0.0, 1.0),
            &self.optimizer,
        );
        let (alpha, gamma) = (best[0], best[1]);

        let smoothed = smooth(&values, alpha, gamma, start_level, start_trend);
        let errors = ForecastErrors::evaluate(&smoothed.expected, &values);

        debug!(
            alpha = alpha,
            gamma = gamma,
            data_length = values.len(),
            mad = errors.mad,
            mse = errors.mse,
            "DoubleExponentialSmoothingModel trained"
        );

        self.fitted = Some(FittedDes {
            alpha,
            gamma,
            start_level,
            start_trend,
            start_time: data[0].time(),
            granularity,
            smoothed,
            range: data.value_range(),
            errors,
        });
        Ok(())
    }

    /// In-sample values for timestamps inside the training window, the
    /// continued trend line after it. Timestamps before the training start
    /// are rejected.
    fn predict(&self, sequence: &mut DataSequence) -> Result<()> {
        let fitted = self.fitted()?;
        let mut filled = DataSequence::new();
        for entry in sequence.iter() {
            if entry.time() < fitted.start_time {
                return Err(TsmmError::InvalidInput(format!(
                    "DoubleExponentialSmoothingModel can't predict before training time ({} < {})",
                    entry.time(),
                    fitted.start_time
                )));
            }
            let index = step_index(entry.time(), fitted.start_time, fitted.granularity);
            filled.push(Entry::new(entry.time(), fitted.value_at(index as usize) as f32));
        }
        *sequence = filled;
        Ok(())
    }

    fn model_params(&self) -> Result<ParameterBag> {
        let fitted = self.fitted()?;
        Ok(ParameterBag::new()
            .with("range", fitted.range)
            .with("alpha", fitted.alpha)
            .with("gamma", fitted.gamma)
            .with("startlevel", fitted.start_level)
            .with("starttrend", fitted.start_trend))
    }

    fn predict_with_params(
        &self,
        params: &ParameterBag,
        observed: &DataSequence,
        expected: &mut DataSequence,
    ) -> Result<()> {
        let alpha = params.get_f64("alpha")?;
        let gamma = params.get_f64("gamma")?;
        let start_level = params.get_f64("startlevel")?;
        let start_trend = params.get_f64("starttrend")?;

        let smoothed = smooth(&observed.values(), alpha, gamma, start_level, start_trend);
        fill_expected(expected, observed, smoothed.expected);
        Ok(())
    }

    fn forecast_errors(&self) -> Option<&ForecastErrors> {
        self.fitted.as_ref().map(|f| &f.errors)
    }
}
