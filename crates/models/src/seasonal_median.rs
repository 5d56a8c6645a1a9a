use common::{
    DataSequence, Entry, ForecastErrors, ForecastModel, ModelConfig, ParameterBag, Result,
    TsmmError,
};
use tracing::debug;

use crate::period::{infer_period, raw_seasonal_offset, step_index, PeriodTable};
use crate::stats::{fill_expected, median_in_place};

/// Seasonal baseline: the median of every phase of the inferred period.
pub struct SeasonalMedianModel {
    fitted: Option<FittedSeasonalMedian>,
}

struct FittedSeasonalMedian {
    period: usize,
    start_time: i64,
    granularity: i64,
    seasonal: Vec<f64>,
    range: f64,
    errors: ForecastErrors,
}

/// Median of `values[i], values[i + period], ...` for each phase `i`.
///
/// Phases without any observation (history shorter than one period) take the
/// median of the whole series.
pub fn seasonal_medians(values: &[f64], period: usize) -> Vec<f64> {
    let overall = median_in_place(&mut values.to_vec()).unwrap_or(0.0);
    (0..period)
        .map(|phase| {
            let mut bucket: Vec<f64> = values.iter().skip(phase).step_by(period).copied().collect();
            median_in_place(&mut bucket).unwrap_or(overall)
        })
        .collect()
}

impl SeasonalMedianModel {
    pub fn new(_config: &ModelConfig) -> Self {
        Self { fitted: None }
    }

    pub fn period(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.period)
    }

    /// Fitted per-phase medians.
    pub fn seasonal(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(|f| f.seasonal.as_slice())
    }

    fn fitted(&self) -> Result<&FittedSeasonalMedian> {
        self.fitted
            .as_ref()
            .ok_or_else(|| TsmmError::ModelError("SeasonalMedianModel is not trained".into()))
    }
}

impl ForecastModel for SeasonalMedianModel {
    fn name(&self) -> &str {
        "SeasonalMedianModel"
    }

    fn train(&mut self, data: &DataSequence) -> Result<()> {
        self.fitted = None;
        if data.is_empty() {
            return Err(TsmmError::InvalidInput(
                "SeasonalMedianModel requires data".into(),
            ));
        }
        let period = infer_period(data, PeriodTable::Standard)?;
        let granularity = data
            .granularity()
            .ok_or_else(|| TsmmError::InvalidInput("cannot derive granularity".into()))?;

        let values = data.values();
        let seasonal = seasonal_medians(&values, period);
        let forecast: Vec<f64> = (0..values.len()).map(|i| seasonal[i % period]).collect();
        let errors = ForecastErrors::evaluate(&forecast, &values);

        debug!(
            period = period,
            data_length = values.len(),
            bias = errors.bias,
            mad = errors.mad,
            mape = errors.mape,
            mse = errors.mse,
            sae = errors.sae,
            "SeasonalMedianModel trained"
        );

        self.fitted = Some(FittedSeasonalMedian {
            period,
            start_time: data[0].time(),
            granularity,
            seasonal,
            range: data.value_range(),
            errors,
        });
        Ok(())
    }

    /// Each timestamp receives the median of its own phase, counted in
    /// training-granularity steps from the training start.
    fn predict(&self, sequence: &mut DataSequence) -> Result<()> {
        let fitted = self.fitted()?;
        let period = fitted.period as i64;
        let filled: DataSequence = sequence
            .iter()
            .map(|e| {
                let phase =
                    step_index(e.time(), fitted.start_time, fitted.granularity).rem_euclid(period);
                Entry::new(e.time(), fitted.seasonal[phase as usize] as f32)
            })
            .collect();
        *sequence = filled;
        Ok(())
    }

    fn model_params(&self) -> Result<ParameterBag> {
        let fitted = self.fitted()?;
        let period = i32::try_from(fitted.period)
            .map_err(|_| TsmmError::ModelError("period does not fit in i32".into()))?;
        Ok(ParameterBag::new()
            .with("range", fitted.range)
            .with("period", period)
            .with("startTime", fitted.start_time)
            .with("seasonal", fitted.seasonal.clone()))
    }

    /// Realigns the stored phases to `observed`. A window starting before
    /// the training start wraps around into `[0, period)`.
    fn predict_with_params(
        &self,
        params: &ParameterBag,
        observed: &DataSequence,
        expected: &mut DataSequence,
    ) -> Result<()> {
        let period = params.get_positive_usize("period")?;
        let start_time = params.get_i64("startTime")?;
        let seasonal = params.get_f64_array("seasonal")?;
        if seasonal.len() < period {
            return Err(TsmmError::InvalidInput(format!(
                "seasonal has {} values, period is {}",
                seasonal.len(),
                period
            )));
        }

        let mut offset = raw_seasonal_offset(observed, start_time, period)?;
        if offset < 0 {
            offset += period as i64;
        }
        let offset = offset as usize;

        fill_expected(
            expected,
            observed,
            (0..observed.len()).map(|i| seasonal[(i + offset) % period]),
        );
        Ok(())
    }

    fn forecast_errors(&self) -> Option<&ForecastErrors> {
        self.fitted.as_ref().map(|f| &f.errors)
    }
}
