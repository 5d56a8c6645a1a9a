//! Portable snapshot of a fitted model's state.
//!
//! A [`ParameterBag`] is the only thing a replaying caller needs besides the
//! observed window. Values are a small tagged union so that bags persisted
//! as JSON (where integers and floats are indistinguishable in intent) decode
//! back to something every reader can consume through [`ParamValue::as_f64`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Result, TsmmError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i32),
    Long(i64),
    Float(f64),
    Text(String),
    Array(Vec<ParamValue>),
}

impl ParamValue {
    /// Numeric view of a scalar. Integers of either width and floats are
    /// accepted interchangeably; anything else is a type error.
    pub fn as_f64(&self) -> Result<f64> {
        match self {
            ParamValue::Int(v) => Ok(*v as f64),
            ParamValue::Long(v) => Ok(*v as f64),
            ParamValue::Float(v) => Ok(*v),
            other => Err(TsmmError::TypeError(format!(
                "{} is not usable as a number",
                other.type_name()
            ))),
        }
    }

    /// Integral view of a scalar. Floats are accepted only when they carry
    /// no fractional part.
    pub fn as_i64(&self) -> Result<i64> {
        match self {
            ParamValue::Int(v) => Ok(*v as i64),
            ParamValue::Long(v) => Ok(*v),
            ParamValue::Float(v) if v.fract() == 0.0 && v.is_finite() => Ok(*v as i64),
            other => Err(TsmmError::TypeError(format!(
                "{} is not usable as an integer",
                other.type_name()
            ))),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Int(_) => "int",
            ParamValue::Long(_) => "long",
            ParamValue::Float(v) if v.is_nan() => "float(NaN)",
            ParamValue::Float(_) => "float",
            ParamValue::Text(_) => "text",
            ParamValue::Array(_) => "array",
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(v as f64)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Long(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<Vec<f64>> for ParamValue {
    fn from(v: Vec<f64>) -> Self {
        ParamValue::Array(v.into_iter().map(ParamValue::Float).collect())
    }
}

impl From<Vec<ParamValue>> for ParamValue {
    fn from(v: Vec<ParamValue>) -> Self {
        ParamValue::Array(v)
    }
}

/// String-keyed map of [`ParamValue`]s, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterBag {
    values: BTreeMap<String, ParamValue>,
}

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    fn require(&self, key: &str) -> Result<&ParamValue> {
        self.values
            .get(key)
            .ok_or_else(|| TsmmError::InvalidInput(format!("missing parameter '{}'", key)))
    }

    pub fn get_f64(&self, key: &str) -> Result<f64> {
        self.require(key)?.as_f64()
    }

    pub fn get_i64(&self, key: &str) -> Result<i64> {
        self.require(key)?.as_i64()
    }

    /// A strictly positive count, such as a seasonal period.
    pub fn get_positive_usize(&self, key: &str) -> Result<usize> {
        let v = self.get_i64(key)?;
        if v <= 0 {
            return Err(TsmmError::InvalidInput(format!(
                "parameter '{}' must be positive, got {}",
                key, v
            )));
        }
        usize::try_from(v)
            .map_err(|_| TsmmError::InvalidInput(format!("parameter '{}' out of range", key)))
    }

    /// Numeric array with every element decoded through [`ParamValue::as_f64`].
    pub fn get_f64_array(&self, key: &str) -> Result<Vec<f64>> {
        match self.require(key)? {
            ParamValue::Array(items) => items.iter().map(ParamValue::as_f64).collect(),
            other => Err(TsmmError::TypeError(format!(
                "parameter '{}' is {}, expected array",
                key,
                other.type_name()
            ))),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mixed_numeric_array_decodes() {
        let bag = ParameterBag::new().with(
            "seasonal",
            vec![
                ParamValue::Int(1),
                ParamValue::Float(2.5),
                ParamValue::Long(3_000_000_000),
            ],
        );
        let arr = bag.get_f64_array("seasonal").unwrap();
        assert_eq!(arr, vec![1.0, 2.5, 3_000_000_000.0]);
    }

    #[test]
    fn test_non_numeric_element_is_type_error() {
        let bag = ParameterBag::new().with(
            "seasonal",
            vec![ParamValue::Float(1.0), ParamValue::Text("x".into())],
        );
        let err = bag.get_f64_array("seasonal").unwrap_err();
        assert!(matches!(err, TsmmError::TypeError(_)), "got {err:?}");
    }

    #[test]
    fn test_scalar_where_array_expected() {
        let bag = ParameterBag::new().with("seasonal", 4.0);
        assert!(matches!(
            bag.get_f64_array("seasonal"),
            Err(TsmmError::TypeError(_))
        ));
    }

    #[test]
    fn test_missing_key_is_invalid_input() {
        let bag = ParameterBag::new();
        let err = bag.get_f64("alpha").unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_integer_views() {
        let bag = ParameterBag::new()
            .with("period", 24)
            .with("startTime", 1_700_000_000i64)
            .with("whole", 7.0)
            .with("half", 7.5);
        assert_eq!(bag.get_positive_usize("period").unwrap(), 24);
        assert_eq!(bag.get_i64("startTime").unwrap(), 1_700_000_000);
        assert_eq!(bag.get_i64("whole").unwrap(), 7);
        assert!(matches!(bag.get_i64("half"), Err(TsmmError::TypeError(_))));
    }

    #[test]
    fn test_non_positive_period_rejected() {
        let bag = ParameterBag::new().with("period", 0);
        assert!(bag.get_positive_usize("period").unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_json_persistence() {
        let bag = ParameterBag::new()
            .with("alpha", 0.25)
            .with("period", 7)
            .with("startTime", 1_600_000_000i64)
            .with("startseasonal", vec![0.5, 1.0, 1.5]);
        let json = bag.to_json().unwrap();
        let restored = ParameterBag::from_json(&json).unwrap();

        assert_relative_eq!(restored.get_f64("alpha").unwrap(), 0.25);
        assert_eq!(restored.get_positive_usize("period").unwrap(), 7);
        assert_eq!(restored.get_i64("startTime").unwrap(), 1_600_000_000);
        assert_eq!(
            restored.get_f64_array("startseasonal").unwrap(),
            vec![0.5, 1.0, 1.5]
        );
    }

    #[test]
    fn test_json_whole_numbers_decode_as_integers() {
        let restored = ParameterBag::from_json(r#"{"seasonal":[1,2.5,3]}"#).unwrap();
        assert_eq!(
            restored.get("seasonal"),
            Some(&ParamValue::Array(vec![
                ParamValue::Int(1),
                ParamValue::Float(2.5),
                ParamValue::Int(3),
            ]))
        );
        assert_eq!(restored.get_f64_array("seasonal").unwrap(), vec![1.0, 2.5, 3.0]);
    }
}
