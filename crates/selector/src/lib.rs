mod selector;

pub use selector::AutoForecastModel;
