use crate::error::ForecastError;

/// A model fitted to one training set, ready to project forward.
pub trait FittedModel: Send + Sync {
    /// Point forecasts for the next `horizon` steps after the training data.
    fn forecast(&self, horizon: usize) -> Vec<f64>;
}

/// Fits a price-level model on a series indexed `0..N`.
pub trait TrendModel: Send + Sync {
    fn name(&self) -> &'static str;

    fn fit(&self, prices: &[f64]) -> Result<Box<dyn FittedModel>, ForecastError>;
}

/// Fits a conditional-volatility model on a return series.
///
/// Fitted models forecast volatility (standard deviation) in the same units as
/// the returns they were fitted on.
pub trait VolatilityModel: Send + Sync {
    fn name(&self) -> &'static str;

    fn fit(&self, returns: &[f64]) -> Result<Box<dyn FittedModel>, ForecastError>;
}
