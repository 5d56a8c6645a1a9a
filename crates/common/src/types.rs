use std::ops::Index;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{ForecastErrors, ParameterBag, Result, TsmmError};

/// A single observation: epoch seconds and value.
///
/// Forecast entries reuse the timestamp of the point they were produced
/// for and carry the predicted value instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    time: i64,
    value: f32,
}

impl Entry {
    pub fn new(time: i64, value: f32) -> Self {
        Self { time, value }
    }

    /// Builds an entry from a naive timestamp interpreted as UTC.
    pub fn from_datetime(timestamp: NaiveDateTime, value: f32) -> Self {
        Self::new(timestamp.and_utc().timestamp(), value)
    }

    pub fn time(&self) -> i64 {
        self.time
    }

    pub fn value(&self) -> f32 {
        self.value
    }
}

/// Chronologically ordered observations, assumed evenly spaced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataSequence {
    entries: Vec<Entry>,
}

impl DataSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// Evenly spaced sequence starting at `start`.
    pub fn from_values(start: i64, granularity: i64, values: &[f32]) -> Self {
        let entries = values
            .iter()
            .enumerate()
            .map(|(i, &v)| Entry::new(start + granularity * i as i64, v))
            .collect();
        Self { entries }
    }

    /// Zero-valued placeholders for every step in `[start, end]`, the shape
    /// handed to `ForecastModel::predict` to be filled in.
    pub fn with_times(start: i64, end: i64, granularity: i64) -> Result<Self> {
        if granularity <= 0 {
            return Err(TsmmError::InvalidInput(format!(
                "granularity must be positive, got {}",
                granularity
            )));
        }
        if end < start {
            return Err(TsmmError::InvalidInput(format!(
                "end time {} precedes start time {}",
                end, start
            )));
        }
        let entries = (start..=end)
            .step_by(granularity as usize)
            .map(|t| Entry::new(t, 0.0))
            .collect();
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn first(&self) -> Option<&Entry> {
        self.entries.first()
    }

    pub fn last(&self) -> Option<&Entry> {
        self.entries.last()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Replaces the entry at `index`.
    pub fn set(&mut self, index: usize, entry: Entry) -> Result<()> {
        let len = self.entries.len();
        let slot = self.entries.get_mut(index).ok_or_else(|| {
            TsmmError::InvalidInput(format!("index {} out of bounds for length {}", index, len))
        })?;
        *slot = entry;
        Ok(())
    }

    pub fn times(&self) -> Vec<i64> {
        self.entries.iter().map(|e| e.time).collect()
    }

    /// Values widened to f64 for numeric work.
    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.value as f64).collect()
    }

    /// Spacing between the first two samples, `None` with fewer than two.
    pub fn granularity(&self) -> Option<i64> {
        match (self.entries.first(), self.entries.get(1)) {
            (Some(a), Some(b)) => Some(b.time - a.time),
            _ => None,
        }
    }

    /// `max - min` over all values, 0 for an empty sequence.
    pub fn value_range(&self) -> f64 {
        let mut iter = self.entries.iter().map(|e| e.value as f64);
        let Some(first) = iter.next() else {
            return 0.0;
        };
        let (min, max) = iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        max - min
    }
}

impl Index<usize> for DataSequence {
    type Output = Entry;

    fn index(&self, index: usize) -> &Entry {
        &self.entries[index]
    }
}

impl FromIterator<Entry> for DataSequence {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a DataSequence {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Operations every forecasting model implements.
pub trait ForecastModel: Send + Sync {
    /// Returns the model's name.
    fn name(&self) -> &str;

    /// Fit the model on a historical sequence, overwriting any previous fit.
    fn train(&mut self, data: &DataSequence) -> Result<()>;

    /// Online retraining is not supported; implementations leave the
    /// fitted state untouched.
    fn update(&mut self, _data: &DataSequence) -> Result<()> {
        Ok(())
    }

    /// Fill in the values for the timestamps already present in `sequence`.
    fn predict(&self, sequence: &mut DataSequence) -> Result<()>;

    /// Portable snapshot of the fitted state.
    fn model_params(&self) -> Result<ParameterBag>;

    /// Replay a forecast from `params` over the `observed` window, without
    /// using any state held by `self`. `expected` is overwritten with one
    /// entry per observed point.
    fn predict_with_params(
        &self,
        params: &ParameterBag,
        observed: &DataSequence,
        expected: &mut DataSequence,
    ) -> Result<()>;

    /// In-sample error summary from the last successful `train`.
    fn forecast_errors(&self) -> Option<&ForecastErrors>;
}
