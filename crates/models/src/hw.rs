//! Holt-Winters triple exponential smoothing with multiplicative seasonality.
//!
//! Fitting picks `alpha`, `beta`, `gamma` by a bounded simplex search over
//! the in-sample squared error. The same recurrence drives the training
//! error, live prediction and stateless replay from a parameter bag, so a
//! replay over the training window reproduces the live forecast exactly.

use common::{
    DataSequence, Entry, ForecastErrors, ForecastModel, ModelConfig, OptimizerConfig,
    ParameterBag, Result, TsmmError,
};
use tracing::debug;

use crate::optimizer::{finite_or_max, minimize, Bounds};
use crate::period::{infer_period, raw_seasonal_offset, step_index, PeriodTable, SECOND};
use crate::stats::fill_expected;

const EPSILON: f64 = 1e-10;

// ---------------------------------------------------------------------------
// Type definitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct HwCoefficients {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HwInitialState {
    pub base: f64,
    pub trend: f64,
    pub seasonal: Vec<f64>,
}

/// Output of one pass of the recurrence.
#[derive(Debug, Clone)]
pub(crate) struct Smoothed {
    pub expected: Vec<f64>,
    pub base: f64,
    pub trend: f64,
    /// Seasonal index produced at every step.
    pub seasonal: Vec<f64>,
}

#[derive(Debug, Clone)]
struct FittedHw {
    period: usize,
    start_time: i64,
    granularity: i64,
    coefficients: HwCoefficients,
    initial: HwInitialState,
    smoothed: Smoothed,
    range: f64,
    errors: ForecastErrors,
}

// ---------------------------------------------------------------------------
// State initialization
// ---------------------------------------------------------------------------

/// Level from the first cycle, trend from the first two cycles, seasonal
/// indices from a multiplicative decomposition over every complete cycle.
/// Requires `values.len() >= 2 * period`.
pub(crate) fn initialize_state(values: &[f64], period: usize) -> HwInitialState {
    let p = period as f64;
    let first: f64 = values[..period].iter().sum();
    let growth: f64 = (0..period).map(|i| values[i + period] - values[i]).sum();

    HwInitialState {
        base: first / p,
        trend: growth / (p * p),
        seasonal: initial_seasonal(values, period),
    }
}

fn initial_seasonal(values: &[f64], period: usize) -> Vec<f64> {
    let cycles: Vec<&[f64]> = values.chunks_exact(period).collect();

    let mut seasonal = vec![0.0; period];
    for cycle in &cycles {
        let average = cycle.iter().sum::<f64>() / period as f64;
        for (s, v) in seasonal.iter_mut().zip(cycle.iter()) {
            *s += if average == 0.0 { 0.0 } else { v / average };
        }
    }
    for s in seasonal.iter_mut() {
        *s /= cycles.len() as f64;
    }
    seasonal
}

// ---------------------------------------------------------------------------
// Recurrence
// ---------------------------------------------------------------------------

/// Runs the smoothing recurrence over `observed`, starting the seasonal
/// lookup at phase `offset` of the initial indices.
pub(crate) fn smooth(
    observed: &[f64],
    coefficients: HwCoefficients,
    initial: &HwInitialState,
    offset: usize,
) -> Smoothed {
    let HwCoefficients { alpha, beta, gamma } = coefficients;
    let period = initial.seasonal.len();

    let mut base = initial.base;
    let mut trend = initial.trend;
    let mut expected = Vec::with_capacity(observed.len());
    let mut seasonal = Vec::with_capacity(observed.len());

    for (i, &obs) in observed.iter().enumerate() {
        let s_prev = if i < period {
            initial.seasonal[(i + offset) % period]
        } else {
            seasonal[i - period]
        };

        let level = base + trend;
        expected.push(level * s_prev);

        // A zero seasonal index keeps the level as the new base; a zero base
        // keeps the previous index.
        let new_base = if s_prev.abs() < EPSILON {
            level
        } else {
            alpha * (obs / s_prev) + (1.0 - alpha) * level
        };
        trend = beta * (new_base - base) + (1.0 - beta) * trend;
        seasonal.push(if new_base.abs() < EPSILON {
            s_prev
        } else {
            gamma * (obs / new_base) + (1.0 - gamma) * s_prev
        });
        base = new_base;
    }

    Smoothed {
        expected,
        base,
        trend,
        seasonal,
    }
}

fn sse(expected: &[f64], actual: &[f64]) -> f64 {
    expected
        .iter()
        .zip(actual)
        .map(|(e, a)| (a - e) * (a - e))
        .sum()
}

// ---------------------------------------------------------------------------
// Coefficient search
// ---------------------------------------------------------------------------

pub(crate) fn fit_coefficients(
    values: &[f64],
    initial: &HwInitialState,
    config: &OptimizerConfig,
) -> HwCoefficients {
    let best = minimize(
        |p| {
            let coefficients = HwCoefficients {
                alpha: p[0],
                beta: p[1],
                gamma: p[2],
            };
            let smoothed = smooth(values, coefficients, initial, 0);
            finite_or_max(sse(&smoothed.expected, values))
        },
        &[0.3, 0.05, 0.1],
        &Bounds::uniform(3, 0.0, 1.0),
        config,
    );
    HwCoefficients {
        alpha: best[0],
        beta: best[1],
        gamma: best[2],
    }
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// Triple exponential smoothing over a period inferred from the sampling
/// granularity. Second-level data is rejected.
pub struct TripleExponentialSmoothingModel {
    name: &'static str,
    table: PeriodTable,
    optimizer: OptimizerConfig,
    fitted: Option<FittedHw>,
}

impl TripleExponentialSmoothingModel {
    pub fn new(config: &ModelConfig) -> Self {
        Self::with_table("TripleExponentialSmoothingModel", PeriodTable::Standard, config)
    }

    fn with_table(name: &'static str, table: PeriodTable, config: &ModelConfig) -> Self {
        Self {
            name,
            table,
            optimizer: config.optimizer.clone(),
            fitted: None,
        }
    }

    pub fn period(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.period)
    }

    /// Fitted `(alpha, beta, gamma)`.
    pub fn coefficients(&self) -> Option<(f64, f64, f64)> {
        self.fitted.as_ref().map(|f| {
            let c = f.coefficients;
            (c.alpha, c.beta, c.gamma)
        })
    }

    fn fitted(&self) -> Result<&FittedHw> {
        self.fitted
            .as_ref()
            .ok_or_else(|| TsmmError::ModelError(format!("{} is not trained", self.name)))
    }

    fn infer_period(&self, data: &DataSequence) -> Result<usize> {
        let period = infer_period(data, self.table)?;
        if data.granularity() == Some(SECOND) {
            return Err(TsmmError::UnsupportedGranularity(SECOND));
        }
        if data.len() < 2 * period {
            return Err(TsmmError::InsufficientData(format!(
                "{} requires at least 2 full seasonal cycles ({} points), got {}",
                self.name,
                2 * period,
                data.len()
            )));
        }
        Ok(period)
    }
}

impl FittedHw {
    /// Value at training step `index`, continuing past the end of the
    /// training window with the final level, trend and seasonal indices.
    fn value_at(&self, index: usize) -> f64 {
        let n = self.smoothed.expected.len();
        if index < n {
            return self.smoothed.expected[index];
        }
        let h = index - n + 1;
        let season = self.smoothed.seasonal[n - self.period + (h - 1) % self.period];
        (self.smoothed.base + h as f64 * self.smoothed.trend) * season
    }
}

impl ForecastModel for TripleExponentialSmoothingModel {
    fn name(&self) -> &str {
        self.name
    }

    fn train(&mut self, data: &DataSequence) -> Result<()> {
        self.fitted = None;
        let period = self.infer_period(data)?;
        let granularity = data
            .granularity()
            .ok_or_else(|| TsmmError::InvalidInput("cannot derive granularity".into()))?;

        let values = data.values();
        let initial = initialize_state(&values, period);
        let coefficients = fit_coefficients(&values, &initial, &self.optimizer);
        let smoothed = smooth(&values, coefficients, &initial, 0);
        let errors = ForecastErrors::evaluate(&smoothed.expected, &values);

        debug!(
            model = self.name,
            period = period,
            data_length = values.len(),
            alpha = coefficients.alpha,
            beta = coefficients.beta,
            gamma = coefficients.gamma,
            start_base = initial.base,
            start_trend = initial.trend,
            bias = errors.bias,
            mad = errors.mad,
            mape = errors.mape,
            mse = errors.mse,
            sae = errors.sae,
            "Triple exponential smoothing trained"
        );

        self.fitted = Some(FittedHw {
            period,
            start_time: data[0].time(),
            granularity,
            coefficients,
            initial,
            smoothed,
            range: data.value_range(),
            errors,
        });
        Ok(())
    }

    /// In-sample fitted values for timestamps inside the training window and
    /// an h-step-ahead forecast after it. Timestamps before the training
    /// start are rejected.
    fn predict(&self, sequence: &mut DataSequence) -> Result<()> {
        let fitted = self.fitted()?;
        let mut filled = DataSequence::new();
        for entry in sequence.iter() {
            let index = step_index(entry.time(), fitted.start_time, fitted.granularity);
            if entry.time() < fitted.start_time || index < 0 {
                return Err(TsmmError::InvalidInput(format!(
                    "{} can't predict before training time ({} < {})",
                    self.name,
                    entry.time(),
                    fitted.start_time
                )));
            }
            filled.push(Entry::new(
                entry.time(),
                fitted.value_at(index as usize) as f32,
            ));
        }
        *sequence = filled;
        Ok(())
    }

    fn model_params(&self) -> Result<ParameterBag> {
        let fitted = self.fitted()?;
        let period = i32::try_from(fitted.period)
            .map_err(|_| TsmmError::ModelError("period does not fit in i32".into()))?;
        Ok(ParameterBag::new()
            .with("range", fitted.range)
            .with("alpha", fitted.coefficients.alpha)
            .with("beta", fitted.coefficients.beta)
            .with("gamma", fitted.coefficients.gamma)
            .with("startTime", fitted.start_time)
            .with("period", period)
            .with("startbase", fitted.initial.base)
            .with("starttrend", fitted.initial.trend)
            .with("startseasonal", fitted.initial.seasonal.clone()))
    }

    /// Replays the recurrence from the bag's initial state over `observed`.
    /// Unlike the seasonal-median replay, a window whose phase offset comes
    /// out negative is an error rather than wrapped.
    fn predict_with_params(
        &self,
        params: &ParameterBag,
        observed: &DataSequence,
        expected: &mut DataSequence,
    ) -> Result<()> {
        let coefficients = HwCoefficients {
            alpha: params.get_f64("alpha")?,
            beta: params.get_f64("beta")?,
            gamma: params.get_f64("gamma")?,
        };
        let start_time = params.get_i64("startTime")?;
        let period = params.get_positive_usize("period")?;
        let mut seasonal = params.get_f64_array("startseasonal")?;
        if seasonal.len() < period {
            return Err(TsmmError::InvalidInput(format!(
                "startseasonal has {} values, period is {}",
                seasonal.len(),
                period
            )));
        }
        seasonal.truncate(period);
        let initial = HwInitialState {
            base: params.get_f64("startbase")?,
            trend: params.get_f64("starttrend")?,
            seasonal,
        };

        let offset = raw_seasonal_offset(observed, start_time, period)?;
        if offset < 0 {
            return Err(TsmmError::InvalidInput(format!(
                "{} can't predict before training time",
                self.name
            )));
        }

        let smoothed = smooth(&observed.values(), coefficients, &initial, offset as usize);
        fill_expected(expected, observed, smoothed.expected);
        Ok(())
    }

    fn forecast_errors(&self) -> Option<&ForecastErrors> {
        self.fitted.as_ref().map(|f| &f.errors)
    }
}

/// Triple exponential smoothing over coarse cycles only: a day of minutes,
/// a week of hours or a year of days. No short-history fallback.
pub struct LongTripleExponentialSmoothingModel {
    inner: TripleExponentialSmoothingModel,
}

impl LongTripleExponentialSmoothingModel {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            inner: TripleExponentialSmoothingModel::with_table(
                "LongTripleExponentialSmoothingModel",
                PeriodTable::Long,
                config,
            ),
        }
    }

    pub fn period(&self) -> Option<usize> {
        self.inner.period()
    }

    pub fn coefficients(&self) -> Option<(f64, f64, f64)> {
        self.inner.coefficients()
    }
}

impl ForecastModel for LongTripleExponentialSmoothingModel {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn train(&mut self, data: &DataSequence) -> Result<()> {
        self.inner.train(data)
    }

    fn predict(&self, sequence: &mut DataSequence) -> Result<()> {
        self.inner.predict(sequence)
    }

    fn model_params(&self) -> Result<ParameterBag> {
        self.inner.model_params()
    }

    fn predict_with_params(
        &self,
        params: &ParameterBag,
        observed: &DataSequence,
        expected: &mut DataSequence,
    ) -> Result<()> {
        self.inner.predict_with_params(params, observed, expected)
    }

    fn forecast_errors(&self) -> Option<&ForecastErrors> {
        self.inner.forecast_errors()
    }
}
