use serde::{Deserialize, Serialize};

use crate::{Result, TsmmError};

/// Configuration shared by every model instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

/// Budget for the smoothing-coefficient search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iter: default_max_iter(),
            tolerance: default_tolerance(),
        }
    }
}

/// Concrete model types the ensemble knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    MeanModel,
    SeasonalMedianModel,
    TripleExponentialSmoothingModel,
    LongTripleExponentialSmoothingModel,
    DoubleExponentialSmoothingModel,
}

impl ModelKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::MeanModel => "MeanModel",
            ModelKind::SeasonalMedianModel => "SeasonalMedianModel",
            ModelKind::TripleExponentialSmoothingModel => "TripleExponentialSmoothingModel",
            ModelKind::LongTripleExponentialSmoothingModel => {
                "LongTripleExponentialSmoothingModel"
            }
            ModelKind::DoubleExponentialSmoothingModel => "DoubleExponentialSmoothingModel",
        }
    }
}

/// One roster slot; disabled slots stay declared but are never trained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub kind: ModelKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl RosterEntry {
    pub fn enabled(kind: ModelKind) -> Self {
        Self {
            kind,
            enabled: true,
        }
    }

    pub fn disabled(kind: ModelKind) -> Self {
        Self {
            kind,
            enabled: false,
        }
    }
}

/// Ensemble selector configuration. Roster order is the comparison order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default = "default_roster")]
    pub roster: Vec<RosterEntry>,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            roster: default_roster(),
        }
    }
}

impl EnsembleConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        if config.roster.is_empty() {
            return Err(TsmmError::ConfigError("roster must not be empty".into()));
        }
        Ok(config)
    }

    /// Kinds that will actually be trained, in declared order.
    pub fn enabled_kinds(&self) -> impl Iterator<Item = ModelKind> + '_ {
        self.roster.iter().filter(|e| e.enabled).map(|e| e.kind)
    }
}

fn default_max_iter() -> usize {
    200
}
fn default_tolerance() -> f64 {
    1e-6
}
fn default_enabled() -> bool {
    true
}
fn default_roster() -> Vec<RosterEntry> {
    vec![
        RosterEntry::enabled(ModelKind::MeanModel),
        RosterEntry::enabled(ModelKind::SeasonalMedianModel),
        RosterEntry::enabled(ModelKind::TripleExponentialSmoothingModel),
        RosterEntry::disabled(ModelKind::LongTripleExponentialSmoothingModel),
        RosterEntry::disabled(ModelKind::DoubleExponentialSmoothingModel),
    ]
}
