mod des;
mod hw;
mod mean;
mod optimizer;
pub mod period;
mod seasonal_median;
mod stats;

pub use des::DoubleExponentialSmoothingModel;
pub use hw::{LongTripleExponentialSmoothingModel, TripleExponentialSmoothingModel};
pub use mean::MeanModel;
pub use period::{infer_period, PeriodTable};
pub use seasonal_median::{seasonal_medians, SeasonalMedianModel};

use common::{ForecastModel, ModelConfig, ModelKind};

/// Build an untrained model of the given kind.
pub fn build_model(kind: ModelKind, config: &ModelConfig) -> Box<dyn ForecastModel> {
    match kind {
        ModelKind::MeanModel => Box::new(MeanModel::new(config)),
        ModelKind::SeasonalMedianModel => Box::new(SeasonalMedianModel::new(config)),
        ModelKind::TripleExponentialSmoothingModel => {
            Box::new(TripleExponentialSmoothingModel::new(config))
        }
        ModelKind::LongTripleExponentialSmoothingModel => {
            Box::new(LongTripleExponentialSmoothingModel::new(config))
        }
        ModelKind::DoubleExponentialSmoothingModel => {
            Box::new(DoubleExponentialSmoothingModel::new(config))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_model_names_match_kind() {
        let config = ModelConfig::default();
        for kind in [
            ModelKind::MeanModel,
            ModelKind::SeasonalMedianModel,
            ModelKind::TripleExponentialSmoothingModel,
            ModelKind::LongTripleExponentialSmoothingModel,
            ModelKind::DoubleExponentialSmoothingModel,
        ] {
            assert_eq!(build_model(kind, &config).name(), kind.name());
        }
    }
}
