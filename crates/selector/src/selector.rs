use common::{
    DataSequence, EnsembleConfig, ForecastErrors, ForecastModel, ParameterBag, Result, TsmmError,
};
use tracing::{debug, info, warn};

const NAME: &str = "AutoForecastModel";

/// Trains every enabled roster entry on the same data and keeps the one with
/// the best in-sample error summary.
pub struct AutoForecastModel {
    config: EnsembleConfig,
    best: Option<Box<dyn ForecastModel>>,
    errors: Option<ForecastErrors>,
}

impl Default for AutoForecastModel {
    fn default() -> Self {
        Self::new(EnsembleConfig::default())
    }
}

impl AutoForecastModel {
    pub fn new(config: EnsembleConfig) -> Self {
        Self {
            config,
            best: None,
            errors: None,
        }
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    /// The retained winner, if any candidate survived training.
    pub fn best_model(&self) -> Option<&dyn ForecastModel> {
        self.best.as_deref()
    }

    fn winner(&self) -> Result<&dyn ForecastModel> {
        self.best_model()
            .ok_or_else(|| TsmmError::ModelError("no model has been selected".into()))
    }

    /// Train `candidates` in order and keep the best. Replaces any previous
    /// winner, leaving none if every candidate was dropped.
    fn select(
        &mut self,
        candidates: Vec<Box<dyn ForecastModel>>,
        data: &DataSequence,
    ) -> Result<()> {
        self.best = None;
        self.errors = None;

        let mut best: Option<(Box<dyn ForecastModel>, ForecastErrors)> = None;
        for mut candidate in candidates {
            match candidate.train(data) {
                Ok(()) => {}
                Err(e) if e.is_invalid_input() => {
                    warn!(model = candidate.name(), error = %e, "Candidate dropped");
                    continue;
                }
                Err(e) => return Err(e),
            }

            let Some(errors) = candidate.forecast_errors().copied() else {
                debug!(model = candidate.name(), "Candidate has no error summary, skipped");
                continue;
            };
            debug!(
                model = candidate.name(),
                mad = errors.mad,
                mape = errors.mape,
                mse = errors.mse,
                "Candidate trained"
            );

            let replace = match &best {
                None => true,
                Some((_, best_errors)) => errors.better_than(best_errors),
            };
            if replace {
                best = Some((candidate, errors));
            }
        }

        match best {
            Some((model, errors)) => {
                info!(
                    model = model.name(),
                    mad = errors.mad,
                    mape = errors.mape,
                    "Best model selected"
                );
                self.best = Some(model);
                self.errors = Some(errors);
            }
            None => warn!("No candidate model survived training"),
        }
        Ok(())
    }
}

impl ForecastModel for AutoForecastModel {
    fn name(&self) -> &str {
        self.best.as_ref().map_or(NAME, |m| m.name())
    }

    fn train(&mut self, data: &DataSequence) -> Result<()> {
        let candidates = self
            .config
            .enabled_kinds()
            .map(|kind| models::build_model(kind, &self.config.model))
            .collect();
        self.select(candidates, data)
    }

    fn predict(&self, sequence: &mut DataSequence) -> Result<()> {
        self.winner()?.predict(sequence)
    }

    fn model_params(&self) -> Result<ParameterBag> {
        self.winner()?.model_params()
    }

    fn predict_with_params(
        &self,
        params: &ParameterBag,
        observed: &DataSequence,
        expected: &mut DataSequence,
    ) -> Result<()> {
        self.winner()?.predict_with_params(params, observed, expected)
    }

    fn forecast_errors(&self) -> Option<&ForecastErrors> {
        self.errors.as_ref()
    }
}

#[cfg(test)]
mod tests;
