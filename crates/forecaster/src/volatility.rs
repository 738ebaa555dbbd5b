use crate::error::ForecastError;
use crate::model::{FittedModel, VolatilityModel};
use configuration::ForecastConfig;
use std::f64::consts::PI;

const MODEL_NAME: &str = "GARCH(1,1)";

/// Fewer returns than this cannot identify four parameters.
pub const MIN_OBSERVATIONS: usize = 10;

/// Lower bound on `omega` (in scaled units); keeps the variance recursion away
/// from zero so the likelihood stays finite.
const OMEGA_FLOOR: f64 = 1e-8;

/// Scaled returns with a variance below this are treated as constant.
const DEGENERATE_VARIANCE: f64 = 1e-10;

/// Relative spread of the simplex values at which the optimizer stops.
const F_TOLERANCE: f64 = 1e-10;

/// Decay and window of the exponentially weighted backcast of the initial variance.
const BACKCAST_DECAY: f64 = 0.94;
const BACKCAST_WINDOW: usize = 75;

/// GARCH(1,1) with a constant mean and normal innovations, fitted by maximum
/// likelihood:
///
/// ```text
/// r_t = mu + e_t,   e_t ~ N(0, s2_t)
/// s2_t = omega + alpha * e2_{t-1} + beta * s2_{t-1}
/// ```
///
/// Returns are multiplied by `scale` before fitting. Forecast variances are
/// divided by `scale^2` before the square root, so forecasts come back in the
/// units of the input returns.
#[derive(Debug, Clone)]
pub struct Garch11 {
    scale: f64,
    max_iterations: usize,
}

impl Garch11 {
    pub fn new(config: &ForecastConfig) -> Self {
        Self {
            scale: config.volatility_scale,
            max_iterations: config.garch_max_iterations,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Fits the model and returns the estimated parameters with the filtered
    /// state at the end of the sample.
    pub fn fit_params(&self, returns: &[f64]) -> Result<GarchFit, ForecastError> {
        if !(self.scale > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "volatility scale must be positive, got {}",
                self.scale
            )));
        }
        if returns.len() < MIN_OBSERVATIONS {
            return Err(ForecastError::InsufficientData {
                model: MODEL_NAME,
                needed: MIN_OBSERVATIONS,
                got: returns.len(),
            });
        }
        if returns.iter().any(|r| !r.is_finite()) {
            return Err(ForecastError::InvalidParameter(
                "returns must be finite".to_string(),
            ));
        }

        let scaled: Vec<f64> = returns.iter().map(|r| r * self.scale).collect();
        let n = scaled.len() as f64;
        let mean = scaled.iter().sum::<f64>() / n;
        let variance = scaled.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;

        if variance <= DEGENERATE_VARIANCE {
            tracing::debug!(variance, "Returns are constant; volatility forecast is zero.");
            return Ok(GarchFit {
                mu: mean,
                omega: 0.0,
                alpha: 0.0,
                beta: 0.0,
                next_variance: 0.0,
                scale: self.scale,
                log_likelihood: f64::NAN,
                iterations: 0,
            });
        }

        let backcast = backcast(&scaled, mean);
        let objective = |p: &[f64; 4]| negative_log_likelihood(p, &scaled, backcast);

        let omega0 = (variance * 0.1).max(2.0 * OMEGA_FLOOR);
        let start = [mean, omega0, 0.1, 0.8];
        let steps = [0.1 * variance.sqrt(), 0.5 * omega0, 0.05, 0.05];

        let outcome = nelder_mead(objective, start, steps, self.max_iterations);
        let Some((best, value, iterations)) = outcome else {
            tracing::warn!(
                max_iterations = self.max_iterations,
                "GARCH optimizer did not converge."
            );
            return Err(ForecastError::ModelFit {
                model: MODEL_NAME,
                reason: format!(
                    "optimizer did not converge within {} iterations",
                    self.max_iterations
                ),
            });
        };

        let [mu, omega, alpha, beta] = best;
        let next_variance = filter(&best, &scaled, backcast)
            .map(|(last_variance, last_residual)| {
                omega + alpha * last_residual * last_residual + beta * last_variance
            })
            .ok_or_else(|| ForecastError::ModelFit {
                model: MODEL_NAME,
                reason: "fitted variance path is not finite".to_string(),
            })?;

        tracing::debug!(
            mu,
            omega,
            alpha,
            beta,
            iterations,
            "Fitted GARCH(1,1)."
        );

        Ok(GarchFit {
            mu,
            omega,
            alpha,
            beta,
            next_variance,
            scale: self.scale,
            log_likelihood: -value,
            iterations,
        })
    }
}

impl Default for Garch11 {
    fn default() -> Self {
        Self::new(&ForecastConfig::default())
    }
}

impl VolatilityModel for Garch11 {
    fn name(&self) -> &'static str {
        MODEL_NAME
    }

    fn fit(&self, returns: &[f64]) -> Result<Box<dyn FittedModel>, ForecastError> {
        Ok(Box::new(self.fit_params(returns)?))
    }
}

/// Estimated parameters (in scaled units) and the one-step-ahead variance.
#[derive(Debug, Clone, PartialEq)]
pub struct GarchFit {
    pub mu: f64,
    pub omega: f64,
    pub alpha: f64,
    pub beta: f64,
    /// Conditional variance for the first step after the sample.
    pub next_variance: f64,
    pub scale: f64,
    pub log_likelihood: f64,
    pub iterations: usize,
}

impl GarchFit {
    pub fn persistence(&self) -> f64 {
        self.alpha + self.beta
    }

    /// Conditional variance forecasts in scaled units.
    pub fn variance_forecast(&self, horizon: usize) -> Vec<f64> {
        let mut out = Vec::with_capacity(horizon);
        let mut h = self.next_variance;
        for _ in 0..horizon {
            out.push(h);
            h = self.omega + self.persistence() * h;
        }
        out
    }
}

impl FittedModel for GarchFit {
    fn forecast(&self, horizon: usize) -> Vec<f64> {
        let denom = self.scale * self.scale;
        self.variance_forecast(horizon)
            .into_iter()
            .map(|h| (h / denom).max(0.0).sqrt())
            .collect()
    }
}

/// Exponentially weighted mean of the first squared residuals.
fn backcast(scaled: &[f64], mean: f64) -> f64 {
    let tau = scaled.len().min(BACKCAST_WINDOW);
    let mut weight = 1.0;
    let (mut acc, mut total) = (0.0, 0.0);
    for r in &scaled[..tau] {
        acc += weight * (r - mean).powi(2);
        total += weight;
        weight *= BACKCAST_DECAY;
    }
    acc / total
}

fn feasible(p: &[f64; 4]) -> bool {
    let [mu, omega, alpha, beta] = *p;
    mu.is_finite() && omega >= OMEGA_FLOOR && alpha >= 0.0 && beta >= 0.0 && alpha + beta < 1.0
}

/// Runs the variance recursion and returns the final `(s2_T, e_T)`.
fn filter(p: &[f64; 4], scaled: &[f64], backcast: f64) -> Option<(f64, f64)> {
    let [mu, omega, alpha, beta] = *p;
    let mut variance = omega + (alpha + beta) * backcast;
    let mut residual = scaled[0] - mu;
    for r in &scaled[1..] {
        variance = omega + alpha * residual * residual + beta * variance;
        residual = r - mu;
    }
    (variance.is_finite() && residual.is_finite()).then_some((variance, residual))
}

fn negative_log_likelihood(p: &[f64; 4], scaled: &[f64], backcast: f64) -> f64 {
    if !feasible(p) {
        return f64::INFINITY;
    }
    let [mu, omega, alpha, beta] = *p;
    let ln_2pi = (2.0 * PI).ln();

    let mut variance = omega + (alpha + beta) * backcast;
    let mut previous_sq = 0.0;
    let mut total = 0.0;
    for (t, r) in scaled.iter().enumerate() {
        if t > 0 {
            variance = omega + alpha * previous_sq + beta * variance;
        }
        let e = r - mu;
        total += ln_2pi + variance.ln() + e * e / variance;
        previous_sq = e * e;
    }
    let value = 0.5 * total;
    if value.is_finite() { value } else { f64::INFINITY }
}

/// Nelder-Mead simplex minimization. Infeasible points are expected to return
/// `+inf` and are never accepted. Returns the best point, its value and the
/// iteration count, or `None` if the simplex values have not collapsed within
/// `max_iterations`.
fn nelder_mead<F>(
    f: F,
    start: [f64; 4],
    steps: [f64; 4],
    max_iterations: usize,
) -> Option<([f64; 4], f64, usize)>
where
    F: Fn(&[f64; 4]) -> f64,
{
    const N: usize = 4;
    let (reflect, expand, contract, shrink) = (1.0, 2.0, 0.5, 0.5);

    let mut simplex: Vec<([f64; N], f64)> = Vec::with_capacity(N + 1);
    simplex.push((start, f(&start)));
    for i in 0..N {
        let mut vertex = start;
        vertex[i] += steps[i];
        simplex.push((vertex, f(&vertex)));
    }

    for iteration in 0..max_iterations {
        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        let best = simplex[0].1;
        let worst = simplex[N].1;
        if best.is_finite() && worst - best <= F_TOLERANCE * (1.0 + best.abs()) {
            return Some((simplex[0].0, best, iteration));
        }

        let mut centroid = [0.0; N];
        for (vertex, _) in &simplex[..N] {
            for (c, v) in centroid.iter_mut().zip(vertex) {
                *c += v / N as f64;
            }
        }
        let towards = |coef: f64| -> [f64; N] {
            let worst = &simplex[N].0;
            std::array::from_fn(|i| centroid[i] + coef * (worst[i] - centroid[i]))
        };

        let reflected = towards(-reflect);
        let f_reflected = f(&reflected);

        if f_reflected < simplex[0].1 {
            let expanded = towards(-reflect * expand);
            let f_expanded = f(&expanded);
            simplex[N] = if f_expanded < f_reflected {
                (expanded, f_expanded)
            } else {
                (reflected, f_reflected)
            };
            continue;
        }
        if f_reflected < simplex[N - 1].1 {
            simplex[N] = (reflected, f_reflected);
            continue;
        }

        let (contracted, f_contracted) = if f_reflected < simplex[N].1 {
            let point = towards(-contract);
            (point, f(&point))
        } else {
            let point = towards(contract);
            (point, f(&point))
        };
        if f_contracted < simplex[N].1.min(f_reflected) {
            simplex[N] = (contracted, f_contracted);
            continue;
        }

        let anchor = simplex[0].0;
        for (vertex, value) in simplex.iter_mut().skip(1) {
            *vertex = std::array::from_fn(|i| anchor[i] + shrink * (vertex[i] - anchor[i]));
            *value = f(vertex);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Simulates a GARCH(1,1) path with standard normal shocks (Box-Muller).
    fn simulate(n: usize, omega: f64, alpha: f64, beta: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut variance = omega / (1.0 - alpha - beta);
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
            let u2: f64 = rng.gen_range(0.0..1.0);
            let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
            let e = variance.sqrt() * z;
            out.push(e);
            variance = omega + alpha * e * e + beta * variance;
        }
        out
    }

    #[test]
    fn recovers_persistence_of_a_simulated_path() {
        let returns = simulate(2000, 0.05, 0.1, 0.85, 7);
        let fit = Garch11::default().with_scale(1.0).fit_params(&returns).unwrap();

        assert!(fit.alpha > 0.0 && fit.alpha < 0.3, "alpha = {}", fit.alpha);
        assert!(
            fit.persistence() > 0.8 && fit.persistence() < 1.0,
            "persistence = {}",
            fit.persistence()
        );
        assert!(fit.omega >= OMEGA_FLOOR);
    }

    #[test]
    fn forecast_has_horizon_length_and_is_non_negative() {
        let returns: Vec<f64> = simulate(300, 0.05, 0.1, 0.85, 11)
            .into_iter()
            .map(|r| r / 100.0)
            .collect();
        let forecast = Garch11::default().fit(&returns).unwrap().forecast(10);

        assert_eq!(forecast.len(), 10);
        assert!(forecast.iter().all(|v| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn variance_forecast_decays_towards_unconditional_level() {
        let returns = simulate(1000, 0.05, 0.1, 0.85, 3);
        let fit = Garch11::default().with_scale(1.0).fit_params(&returns).unwrap();
        let path = fit.variance_forecast(50);

        let unconditional = fit.omega / (1.0 - fit.persistence());
        for (k, h) in path.iter().enumerate() {
            let expected =
                unconditional + (fit.next_variance - unconditional) * fit.persistence().powi(k as i32);
            assert!((h - expected).abs() <= 1e-9 * expected.abs().max(1.0), "step {k}: {h} vs {expected}");
        }
        assert_eq!(path[0], fit.next_variance);
    }

    #[test]
    fn forecast_is_reported_in_unscaled_units() {
        let raw = simulate(400, 0.05, 0.1, 0.85, 5);
        let returns: Vec<f64> = raw.iter().map(|r| r / 100.0).collect();

        // Both fits see identical scaled data.
        let scaled_fit = Garch11::default().with_scale(100.0).fit(&returns).unwrap();
        let unit_fit = Garch11::default()
            .with_scale(1.0)
            .fit(&returns.iter().map(|r| r * 100.0).collect::<Vec<_>>())
            .unwrap();

        for (a, b) in scaled_fit.forecast(5).iter().zip(unit_fit.forecast(5)) {
            assert!((a * 100.0 - b).abs() <= 1e-9 * b, "{a} vs {b}");
        }
    }

    #[test]
    fn non_convergence_is_a_model_fit_error() {
        let returns = simulate(200, 0.05, 0.1, 0.85, 1);
        let err = Garch11::default()
            .with_scale(1.0)
            .with_max_iterations(1)
            .fit(&returns)
            .err()
            .unwrap();
        assert!(matches!(err, ForecastError::ModelFit { .. }));
    }

    #[test]
    fn short_series_is_insufficient_data() {
        let err = Garch11::default().fit(&[0.01, -0.01, 0.02]).err().unwrap();
        assert!(matches!(
            err,
            ForecastError::InsufficientData { needed: MIN_OBSERVATIONS, got: 3, .. }
        ));
    }

    #[test]
    fn constant_returns_forecast_zero_volatility() {
        let forecast = Garch11::default().fit(&[0.01; 29]).unwrap().forecast(10);
        assert_eq!(forecast, vec![0.0; 10]);
    }

    #[test]
    fn infeasible_parameters_have_infinite_cost() {
        let data = [0.5, -0.2, 0.1];
        assert!(negative_log_likelihood(&[0.0, 0.1, 0.6, 0.5], &data, 0.1).is_infinite());
        assert!(negative_log_likelihood(&[0.0, 0.0, 0.1, 0.8], &data, 0.1).is_infinite());
        assert!(negative_log_likelihood(&[0.0, 0.1, -0.1, 0.8], &data, 0.1).is_infinite());
        assert!(negative_log_likelihood(&[0.0, 0.1, 0.1, 0.8], &data, 0.1).is_finite());
    }
}
