use super::*;
use common::{Entry, ModelConfig, ModelKind, RosterEntry};

const START: i64 = 1_704_067_200;
const HOUR: i64 = 3600;

struct StubModel {
    name: &'static str,
    summary: Option<ForecastErrors>,
    fail_with: Option<fn() -> TsmmError>,
    trained: bool,
}

impl StubModel {
    fn scoring(name: &'static str, scale: f64) -> Box<dyn ForecastModel> {
        Box::new(Self {
            name,
            summary: Some(errors(scale)),
            fail_with: None,
            trained: false,
        })
    }

    fn failing(name: &'static str, fail_with: fn() -> TsmmError) -> Box<dyn ForecastModel> {
        Box::new(Self {
            name,
            summary: None,
            fail_with: Some(fail_with),
            trained: false,
        })
    }

    fn silent(name: &'static str) -> Box<dyn ForecastModel> {
        Box::new(Self {
            name,
            summary: None,
            fail_with: None,
            trained: false,
        })
    }
}

impl ForecastModel for StubModel {
    fn name(&self) -> &str {
        self.name
    }

    fn train(&mut self, _data: &DataSequence) -> Result<()> {
        if let Some(fail) = self.fail_with {
            return Err(fail());
        }
        self.trained = true;
        Ok(())
    }

    fn predict(&self, sequence: &mut DataSequence) -> Result<()> {
        let filled: DataSequence = sequence.iter().map(|e| Entry::new(e.time(), 1.0)).collect();
        *sequence = filled;
        Ok(())
    }

    fn model_params(&self) -> Result<ParameterBag> {
        Ok(ParameterBag::new().with("stub", self.name))
    }

    fn predict_with_params(
        &self,
        _params: &ParameterBag,
        observed: &DataSequence,
        expected: &mut DataSequence,
    ) -> Result<()> {
        *expected = observed.clone();
        Ok(())
    }

    fn forecast_errors(&self) -> Option<&ForecastErrors> {
        if self.trained {
            self.summary.as_ref()
        } else {
            None
        }
    }
}

fn errors(scale: f64) -> ForecastErrors {
    ForecastErrors {
        bias: scale,
        mad: scale,
        mape: scale / 100.0,
        mse: scale * scale,
        sae: scale * 10.0,
    }
}

fn data() -> DataSequence {
    DataSequence::from_values(START, HOUR, &[1.0, 2.0, 3.0, 4.0])
}

fn selected(candidates: Vec<Box<dyn ForecastModel>>) -> AutoForecastModel {
    let mut auto = AutoForecastModel::default();
    auto.select(candidates, &data()).unwrap();
    auto
}

fn with_roster(kinds: &[ModelKind]) -> AutoForecastModel {
    AutoForecastModel::new(EnsembleConfig {
        model: ModelConfig::default(),
        roster: kinds.iter().copied().map(RosterEntry::enabled).collect(),
    })
}

fn daily_cycle(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let level = 200.0 + 0.5 * i as f64;
            let ratio = 1.0 + 0.3 * (2.0 * std::f64::consts::PI * i as f64 / 24.0).sin();
            (level * ratio) as f32
        })
        .collect()
}

#[test]
fn test_strictly_better_candidate_replaces() {
    let auto = selected(vec![
        StubModel::scoring("a", 5.0),
        StubModel::scoring("b", 8.0),
        StubModel::scoring("c", 2.0),
    ]);
    assert_eq!(auto.name(), "c");
    assert_eq!(auto.forecast_errors(), Some(&errors(2.0)));
}

#[test]
fn test_worse_candidate_never_replaces() {
    let auto = selected(vec![
        StubModel::scoring("a", 1.0),
        StubModel::scoring("b", 3.0),
        StubModel::scoring("c", 2.0),
    ]);
    assert_eq!(auto.name(), "a");
}

#[test]
fn test_identical_summary_keeps_first() {
    let auto = selected(vec![
        StubModel::scoring("first", 3.0),
        StubModel::scoring("second", 3.0),
    ]);
    assert_eq!(auto.name(), "first");
}

#[test]
fn test_nan_scored_first_candidate_is_replaced() {
    let broken: Box<dyn ForecastModel> = Box::new(StubModel {
        name: "nan",
        summary: Some(ForecastErrors {
            mse: f64::NAN,
            ..errors(1.0)
        }),
        fail_with: None,
        trained: false,
    });
    let auto = selected(vec![broken, StubModel::scoring("finite", 50.0)]);
    assert_eq!(auto.name(), "finite");
}

#[test]
fn test_invalid_input_candidate_dropped() {
    let auto = selected(vec![
        StubModel::failing("short", || TsmmError::InsufficientData("too short".into())),
        StubModel::failing("coarse", || TsmmError::UnsupportedGranularity(7)),
        StubModel::scoring("ok", 4.0),
    ]);
    assert_eq!(auto.name(), "ok");
}

#[test]
fn test_other_errors_propagate() {
    let mut auto = AutoForecastModel::default();
    let err = auto
        .select(
            vec![
                StubModel::scoring("a", 1.0),
                StubModel::failing("broken", || TsmmError::ModelError("boom".into())),
            ],
            &data(),
        )
        .unwrap_err();
    assert!(matches!(err, TsmmError::ModelError(_)));
    assert!(auto.best_model().is_none());
}

#[test]
fn test_candidate_without_summary_skipped() {
    let auto = selected(vec![
        StubModel::silent("quiet"),
        StubModel::scoring("a", 4.0),
    ]);
    assert_eq!(auto.name(), "a");
}

#[test]
fn test_no_survivor_leaves_no_model() {
    let auto = selected(vec![
        StubModel::failing("x", || TsmmError::InvalidInput("bad".into())),
        StubModel::silent("quiet"),
    ]);
    assert!(auto.best_model().is_none());
    assert!(auto.forecast_errors().is_none());
    assert_eq!(auto.name(), "AutoForecastModel");

    let mut seq = data();
    assert!(matches!(auto.predict(&mut seq), Err(TsmmError::ModelError(_))));
    assert!(matches!(auto.model_params(), Err(TsmmError::ModelError(_))));
    let mut out = DataSequence::new();
    assert!(matches!(
        auto.predict_with_params(&ParameterBag::new(), &data(), &mut out),
        Err(TsmmError::ModelError(_))
    ));
}

#[test]
fn test_retrain_replaces_winner() {
    let mut auto = selected(vec![StubModel::scoring("a", 1.0)]);
    auto.select(vec![StubModel::scoring("b", 9.0)], &data())
        .unwrap();
    assert_eq!(auto.name(), "b");
}

#[test]
fn test_forwarding_reaches_winner() {
    let auto = selected(vec![StubModel::scoring("stubbed", 1.0)]);
    let params = auto.model_params().unwrap();
    assert_eq!(params.get("stub"), Some(&common::ParamValue::from("stubbed")));

    let mut seq = data();
    auto.predict(&mut seq).unwrap();
    assert!(seq.iter().all(|e| e.value() == 1.0));
}

#[test]
fn test_default_roster_on_empty_data() {
    let mut auto = AutoForecastModel::default();
    auto.train(&DataSequence::new()).unwrap();
    assert!(auto.best_model().is_none());
    assert_eq!(auto.name(), "AutoForecastModel");
}

#[test]
fn test_default_roster_prefers_seasonal_model() {
    let data = DataSequence::from_values(START, HOUR, &daily_cycle(96));
    let mut auto = AutoForecastModel::default();
    auto.train(&data).unwrap();

    assert_ne!(auto.name(), "MeanModel");
    let best = auto.best_model().unwrap();
    assert_eq!(auto.forecast_errors(), best.forecast_errors());
}

#[test]
fn test_disabled_entries_not_trained() {
    let data = DataSequence::from_values(START, HOUR, &daily_cycle(96));
    let mut auto = AutoForecastModel::new(EnsembleConfig {
        model: ModelConfig::default(),
        roster: vec![
            RosterEntry::enabled(ModelKind::MeanModel),
            RosterEntry::disabled(ModelKind::SeasonalMedianModel),
            RosterEntry::disabled(ModelKind::TripleExponentialSmoothingModel),
        ],
    });
    auto.train(&data).unwrap();
    assert_eq!(auto.name(), "MeanModel");
}

#[test]
fn test_selector_replay_matches_live_predict() {
    let data = DataSequence::from_values(START, HOUR, &daily_cycle(96));
    let mut auto = AutoForecastModel::default();
    auto.train(&data).unwrap();

    let mut live = data.clone();
    auto.predict(&mut live).unwrap();
    let mut replayed = DataSequence::new();
    auto.predict_with_params(&auto.model_params().unwrap(), &data, &mut replayed)
        .unwrap();
    assert_eq!(live, replayed);
}

#[test]
fn test_replay_before_training_start() {
    let data = DataSequence::from_values(START, HOUR, &daily_cycle(96));
    let earlier = DataSequence::from_values(START - 5 * HOUR, HOUR, &daily_cycle(10));

    let mut median = with_roster(&[ModelKind::SeasonalMedianModel]);
    median.train(&data).unwrap();
    let mut out = DataSequence::new();
    median
        .predict_with_params(&median.model_params().unwrap(), &earlier, &mut out)
        .unwrap();
    assert_eq!(out.len(), earlier.len());

    let mut smoothing = with_roster(&[ModelKind::TripleExponentialSmoothingModel]);
    smoothing.train(&data).unwrap();
    let err = smoothing
        .predict_with_params(&smoothing.model_params().unwrap(), &earlier, &mut out)
        .unwrap_err();
    assert!(err.is_invalid_input());
}

#[test]
fn test_roster_from_json() {
    let config = EnsembleConfig::from_json(
        r#"{"roster": [{"kind": "MeanModel"}, {"kind": "SeasonalMedianModel", "enabled": false}]}"#,
    )
    .unwrap();
    let data = DataSequence::from_values(START, HOUR, &daily_cycle(96));
    let mut auto = AutoForecastModel::new(config);
    auto.train(&data).unwrap();
    assert_eq!(auto.name(), "MeanModel");
    assert_eq!(auto.config().roster.len(), 2);
}
