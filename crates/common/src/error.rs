use thiserror::Error;

#[derive(Error, Debug)]
pub enum TsmmError {
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported granularity: {0} seconds")]
    UnsupportedGranularity(i64),

    #[error("type error: {0}")]
    TypeError(String),

    #[error("model error: {0}")]
    ModelError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl TsmmError {
    /// True for the errors raised on malformed or insufficient input data.
    ///
    /// The ensemble drops candidates failing with one of these and
    /// propagates everything else.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            TsmmError::InsufficientData(_)
                | TsmmError::InvalidInput(_)
                | TsmmError::UnsupportedGranularity(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TsmmError>;
