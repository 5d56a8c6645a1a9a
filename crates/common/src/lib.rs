pub mod config;
pub mod error;
pub mod metrics;
pub mod params;
pub mod types;

pub use config::*;
pub use error::*;
pub use metrics::ForecastErrors;
pub use params::{ParamValue, ParameterBag};
pub use types::*;
