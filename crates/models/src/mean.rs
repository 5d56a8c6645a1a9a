use common::{
    DataSequence, Entry, ForecastErrors, ForecastModel, ModelConfig, ParameterBag, Result,
    TsmmError,
};
use tracing::debug;

use crate::stats::{fill_expected, median_in_place};

/// Constant baseline model.
///
/// Despite the name, the fitted constant is the median of the training
/// values rather than their mean; persisted bags and downstream consumers
/// depend on this, so the name and behavior are kept as they are.
pub struct MeanModel {
    fitted: Option<FittedMean>,
}

struct FittedMean {
    value: f64,
    range: f64,
    errors: ForecastErrors,
}

impl MeanModel {
    pub fn new(_config: &ModelConfig) -> Self {
        Self { fitted: None }
    }

    /// The fitted constant, if trained.
    pub fn value(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.value)
    }
}

impl ForecastModel for MeanModel {
    fn name(&self) -> &str {
        "MeanModel"
    }

    /// An empty sequence is accepted and leaves the model untrained.
    fn train(&mut self, data: &DataSequence) -> Result<()> {
        let mut values = data.values();
        let Some(value) = median_in_place(&mut values) else {
            debug!("MeanModel received no data, nothing fitted");
            self.fitted = None;
            return Ok(());
        };

        let actual = data.values();
        let forecast = vec![value; actual.len()];
        let errors = ForecastErrors::evaluate(&forecast, &actual);

        debug!(
            value = value,
            bias = errors.bias,
            mad = errors.mad,
            mape = errors.mape,
            mse = errors.mse,
            sae = errors.sae,
            "MeanModel trained"
        );

        self.fitted = Some(FittedMean {
            value,
            range: data.value_range(),
            errors,
        });
        Ok(())
    }

    fn predict(&self, sequence: &mut DataSequence) -> Result<()> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or_else(|| TsmmError::ModelError("MeanModel is not trained".into()))?;
        let filled: DataSequence = sequence
            .iter()
            .map(|e| Entry::new(e.time(), fitted.value as f32))
            .collect();
        *sequence = filled;
        Ok(())
    }

    fn model_params(&self) -> Result<ParameterBag> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or_else(|| TsmmError::ModelError("MeanModel is not trained".into()))?;
        Ok(ParameterBag::new()
            .with("range", fitted.range)
            .with("mean", fitted.value))
    }

    fn predict_with_params(
        &self,
        params: &ParameterBag,
        observed: &DataSequence,
        expected: &mut DataSequence,
    ) -> Result<()> {
        let mean = params.get_f64("mean")?;
        fill_expected(expected, observed, std::iter::repeat(mean));
        Ok(())
    }

    fn forecast_errors(&self) -> Option<&ForecastErrors> {
        self.fitted.as_ref().map(|f| &f.errors)
    }
}
