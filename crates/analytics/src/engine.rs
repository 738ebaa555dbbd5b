use crate::report::RiskReport;
use configuration::AnalyticsConfig;
use core_types::{KurtosisClass, ObservationSeries};

/// Standard deviations at or below this are treated as zero. Rounding noise on
/// a constant-return series sits many orders of magnitude under it.
const DEGENERATE_STD: f64 = 1e-12;

/// A stateless calculator for deriving risk metrics from a return series.
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    periods_per_year: f64,
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self {
            periods_per_year: 365.0,
        }
    }
}

impl AnalyticsEngine {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            periods_per_year: f64::from(config.periods_per_year),
        }
    }

    /// The main entry point for calculating risk metrics.
    ///
    /// Ratios whose denominator is zero (or undefined) are reported as `0.0`,
    /// so the report never carries NaN or infinity from a division.
    pub fn compute(&self, series: &ObservationSeries) -> RiskReport {
        let returns = series.returns();

        let mean_return = mean(&returns);
        let std_return = sample_std(&returns);
        let sharpe_ratio = self.annualized_ratio(mean_return, std_return);

        let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
        let sortino_ratio = if downside.len() < 2 {
            0.0
        } else {
            self.annualized_ratio(mean_return, sample_std(&downside))
        };

        let (skew, kurtosis) = shape_moments(&returns);
        let kurtosis_class = KurtosisClass::classify(kurtosis);

        RiskReport {
            mean_return,
            std_return,
            sharpe_ratio,
            sortino_ratio,
            kurtosis,
            skew,
            kurtosis_class,
        }
    }

    /// `(mean * P) / (std * sqrt(P))`, guarded to zero.
    fn annualized_ratio(&self, mean: f64, std: f64) -> f64 {
        // Negated so a NaN deviation is guarded too.
        if !(std > DEGENERATE_STD) {
            return 0.0;
        }
        let ratio = (mean * self.periods_per_year) / (std * self.periods_per_year.sqrt());
        if ratio.is_finite() { ratio } else { 0.0 }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation with `n - 1` in the denominator; 0 below two values.
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Biased (population-moment) skewness and excess kurtosis.
/// A series without dispersion has no defined shape; both are reported as 0.
fn shape_moments(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let m = mean(values);
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in values {
        let d = v - m;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    m2 /= n;
    m3 /= n;
    m4 /= n;

    // Negated so a NaN second moment is guarded too.
    if !(m2.sqrt() > DEGENERATE_STD) {
        return (0.0, 0.0);
    }
    let skew = m3 / m2.powf(1.5);
    let kurtosis = m4 / (m2 * m2) - 3.0;
    (skew, kurtosis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{assert_approx, series_from_returns};

    #[test]
    fn matches_hand_computed_statistics() {
        let returns = [0.01, -0.02, 0.03, -0.01, 0.02];
        let report = AnalyticsEngine::default().compute(&series_from_returns(&returns));

        // mean = 0.006, sample variance = 0.00043
        assert_approx!(report.mean_return, 0.006);
        assert_approx!(report.std_return, 0.00043f64.sqrt());
        let expected_sharpe = (0.006 * 365.0) / (0.00043f64.sqrt() * 365f64.sqrt());
        assert_approx!(report.sharpe_ratio, expected_sharpe);

        // Downside returns: -0.02, -0.01 -> sample std = sqrt(0.00005)
        let expected_sortino = (0.006 * 365.0) / (0.00005f64.sqrt() * 365f64.sqrt());
        assert_approx!(report.sortino_ratio, expected_sortino);

        // Central moments: m2 = 0.000344, m3 = -0.000001008, m4 = 0.000000178592
        assert_approx!(report.skew, -0.000001008 / 0.000344f64.powf(1.5), 1e-9);
        assert_approx!(report.kurtosis, 0.000000178592 / (0.000344 * 0.000344) - 3.0, 1e-9);
        assert_eq!(report.kurtosis_class, KurtosisClass::Platykurtic);
    }

    #[test]
    fn zero_dispersion_guards_ratios_to_zero() {
        let report = AnalyticsEngine::default().compute(&series_from_returns(&[0.0; 10]));

        assert_eq!(report.std_return, 0.0);
        assert_eq!(report.sharpe_ratio, 0.0);
        assert_eq!(report.sortino_ratio, 0.0);
        assert_eq!(report.skew, 0.0);
        assert_eq!(report.kurtosis, 0.0);
    }

    #[test]
    fn no_negative_returns_means_zero_sortino() {
        let report =
            AnalyticsEngine::default().compute(&series_from_returns(&[0.01, 0.02, 0.0, 0.05]));
        assert_eq!(report.sortino_ratio, 0.0);
        assert!(report.sharpe_ratio > 0.0);
    }

    #[test]
    fn single_negative_return_has_no_downside_deviation() {
        let report =
            AnalyticsEngine::default().compute(&series_from_returns(&[0.01, -0.02, 0.03]));
        assert_eq!(report.sortino_ratio, 0.0);
    }

    #[test]
    fn identical_negative_returns_guard_sortino() {
        let report =
            AnalyticsEngine::default().compute(&series_from_returns(&[-0.01, 0.02, -0.01, 0.04]));
        assert_eq!(report.sortino_ratio, 0.0);
    }

    #[test]
    fn fat_tailed_returns_are_leptokurtic() {
        let mut returns = vec![0.001; 40];
        for (i, r) in returns.iter_mut().enumerate() {
            if i % 2 == 0 {
                *r = -0.001;
            }
        }
        returns[20] = 0.25;
        let report = AnalyticsEngine::default().compute(&series_from_returns(&returns));

        assert!(report.kurtosis > 3.5, "kurtosis = {}", report.kurtosis);
        assert!(report.skew > 0.0);
        assert_eq!(report.kurtosis_class, KurtosisClass::Leptokurtic);
    }

    #[test]
    fn annualization_follows_configured_periods() {
        let series = series_from_returns(&[0.01, -0.02, 0.03, -0.01, 0.02]);
        let daily = AnalyticsEngine::default().compute(&series);
        let weekly = AnalyticsEngine::new(&AnalyticsConfig {
            periods_per_year: 52,
            recent_window: 30,
        })
        .compute(&series);

        assert_approx!(
            daily.sharpe_ratio / weekly.sharpe_ratio,
            365f64.sqrt() / 52f64.sqrt()
        );
    }
}
