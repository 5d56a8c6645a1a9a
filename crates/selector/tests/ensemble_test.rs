//! End-to-end: train the default ensemble on timestamped data, forecast past
//! the training window, and replay from a persisted parameter bag.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use common::{DataSequence, Entry, ForecastModel, ParameterBag};
use selector::AutoForecastModel;

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn make_data(n: usize) -> DataSequence {
    (0..n)
        .map(|i| {
            let ts = base() + TimeDelta::hours(i as i64);
            let hour = (i % 24) as f64;
            let value = 500.0 + 2.0 * i as f64 + 80.0 * (hour / 24.0 * std::f64::consts::TAU).sin();
            Entry::from_datetime(ts, value as f32)
        })
        .collect()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("warn").try_init();
}

#[test]
fn test_ensemble_forecast_and_replay() {
    init_tracing();

    let data = make_data(24 * 7);
    let mut auto = AutoForecastModel::default();
    auto.train(&data).unwrap();

    let name = auto.name().to_string();
    assert_ne!(name, "AutoForecastModel");
    assert!(auto.forecast_errors().is_some());

    // forecast the next day
    let start = data.last().unwrap().time() + 3600;
    let mut horizon = DataSequence::with_times(start, start + 23 * 3600, 3600).unwrap();
    auto.predict(&mut horizon).unwrap();
    assert_eq!(horizon.len(), 24);
    assert!(horizon.iter().all(|e| e.value().is_finite() && e.value() > 0.0));

    // persisted parameters replay the in-sample fit
    let json = auto.model_params().unwrap().to_json().unwrap();
    let params = ParameterBag::from_json(&json).unwrap();
    let mut replayed = DataSequence::new();
    auto.predict_with_params(&params, &data, &mut replayed)
        .unwrap();

    let mut live = data.clone();
    auto.predict(&mut live).unwrap();
    assert_eq!(replayed.len(), live.len());
    for (r, l) in replayed.iter().zip(live.iter()) {
        assert_eq!(r.time(), l.time());
        approx::assert_relative_eq!(r.value(), l.value(), max_relative = 1e-4);
    }
}

#[test]
fn test_ensemble_on_too_short_data() {
    init_tracing();

    let mut auto = AutoForecastModel::default();
    auto.train(&make_data(2)).unwrap();
    // only the mean model accepts two points
    assert_eq!(auto.name(), "MeanModel");
}
