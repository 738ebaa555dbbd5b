use core_types::KurtosisClass;
use serde::{Deserialize, Serialize};

/// Descriptive risk statistics for one return series.
///
/// Built once per request by the `AnalyticsEngine`; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    /// Sample mean of the daily returns.
    pub mean_return: f64,
    /// Sample standard deviation (n - 1) of the daily returns.
    pub std_return: f64,
    /// Annualized; 0 when the returns have no dispersion.
    pub sharpe_ratio: f64,
    /// Annualized against downside deviation; 0 when there is no downside dispersion.
    pub sortino_ratio: f64,
    /// Excess (Fisher) kurtosis of the returns.
    pub kurtosis: f64,
    pub skew: f64,
    pub kurtosis_class: KurtosisClass,
}
