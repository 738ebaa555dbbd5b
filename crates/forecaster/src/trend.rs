use crate::error::ForecastError;
use crate::model::{FittedModel, TrendModel};
use configuration::ForecastConfig;
use rand::SeedableRng;
use rand::rngs::StdRng;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};

const MODEL_NAME: &str = "gradient-boosted trend";

type Tree = DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Gradient boosting with squared loss over regression trees, mapping the
/// observation index to price.
///
/// Boosting starts from the mean price and each round fits a tree to the
/// current residuals, adding `learning_rate * tree(x)`. With `subsample < 1.0`
/// every round trains on a random subset of rows drawn from an RNG seeded with
/// `seed`, so the output is still reproducible.
///
/// Trees cannot split beyond the training range: every index past the last
/// observation lands in the same leaves, so forecasts are flat at the level
/// the ensemble assigns to the final observation.
#[derive(Debug, Clone)]
pub struct GradientBoostedTrend {
    n_trees: usize,
    learning_rate: f64,
    max_depth: u16,
    subsample: f64,
    seed: u64,
}

impl GradientBoostedTrend {
    pub fn new(config: &ForecastConfig) -> Self {
        Self {
            n_trees: config.n_trees,
            learning_rate: config.learning_rate,
            max_depth: config.max_depth,
            subsample: config.subsample,
            seed: config.seed,
        }
    }

    fn validate(&self) -> Result<(), ForecastError> {
        if self.n_trees == 0 {
            return Err(ForecastError::InvalidParameter(
                "n_trees must be at least 1".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "subsample must be in (0, 1], got {}",
                self.subsample
            )));
        }
        Ok(())
    }
}

impl Default for GradientBoostedTrend {
    fn default() -> Self {
        Self::new(&ForecastConfig::default())
    }
}

/// The fitted ensemble.
pub struct BoostedEnsemble {
    base_score: f64,
    learning_rate: f64,
    trees: Vec<Tree>,
    n_train: usize,
}

impl BoostedEnsemble {
    /// Predicts the price at each observation index in `indices`.
    pub fn predict_indices(&self, indices: &[f64]) -> Result<Vec<f64>, ForecastError> {
        let mut out = vec![self.base_score; indices.len()];
        if indices.is_empty() {
            return Ok(out);
        }
        let x = index_matrix(indices)?;
        for tree in &self.trees {
            let step = tree.predict(&x).map_err(fit_error)?;
            for (o, s) in out.iter_mut().zip(step) {
                *o += self.learning_rate * s;
            }
        }
        Ok(out)
    }
}

impl FittedModel for BoostedEnsemble {
    fn forecast(&self, horizon: usize) -> Vec<f64> {
        let indices: Vec<f64> = (self.n_train..self.n_train + horizon)
            .map(|i| i as f64)
            .collect();
        // Matrices built from finite indices always predict; fall back to the
        // base score if smartcore ever refuses.
        self.predict_indices(&indices)
            .unwrap_or_else(|_| vec![self.base_score; horizon])
    }
}

impl TrendModel for GradientBoostedTrend {
    fn name(&self) -> &'static str {
        MODEL_NAME
    }

    fn fit(&self, prices: &[f64]) -> Result<Box<dyn FittedModel>, ForecastError> {
        Ok(Box::new(self.fit_ensemble(prices)?))
    }
}

impl GradientBoostedTrend {
    pub fn fit_ensemble(&self, prices: &[f64]) -> Result<BoostedEnsemble, ForecastError> {
        self.validate()?;
        let n = prices.len();
        if n < 2 {
            return Err(ForecastError::InsufficientData {
                model: MODEL_NAME,
                needed: 2,
                got: n,
            });
        }

        let indices: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let x = index_matrix(&indices)?;
        let base_score = prices.iter().sum::<f64>() / n as f64;
        let mut predictions = vec![base_score; n];

        let params = DecisionTreeRegressorParameters::default().with_max_depth(self.max_depth);
        let sample_size = ((n as f64 * self.subsample).round() as usize).clamp(1, n);
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut trees = Vec::with_capacity(self.n_trees);
        for _ in 0..self.n_trees {
            let residuals: Vec<f64> = prices
                .iter()
                .zip(&predictions)
                .map(|(y, p)| y - p)
                .collect();

            let tree = if sample_size < n {
                let mut rows = rand::seq::index::sample(&mut rng, n, sample_size).into_vec();
                rows.sort_unstable();
                let x_rows: Vec<f64> = rows.iter().map(|&i| indices[i]).collect();
                let y_rows: Vec<f64> = rows.iter().map(|&i| residuals[i]).collect();
                Tree::fit(&index_matrix(&x_rows)?, &y_rows, params.clone()).map_err(fit_error)?
            } else {
                Tree::fit(&x, &residuals, params.clone()).map_err(fit_error)?
            };

            let step = tree.predict(&x).map_err(fit_error)?;
            for (p, s) in predictions.iter_mut().zip(step) {
                *p += self.learning_rate * s;
            }
            trees.push(tree);
        }

        tracing::debug!(
            rows = n,
            trees = trees.len(),
            base_score,
            "Fitted boosted trend ensemble."
        );

        Ok(BoostedEnsemble {
            base_score,
            learning_rate: self.learning_rate,
            trees,
            n_train: n,
        })
    }
}

/// A single-column design matrix of observation indices.
fn index_matrix(indices: &[f64]) -> Result<DenseMatrix<f64>, ForecastError> {
    DenseMatrix::new(indices.len(), 1, indices.to_vec(), false).map_err(fit_error)
}

fn fit_error(e: smartcore::error::Failed) -> ForecastError {
    ForecastError::ModelFit {
        model: MODEL_NAME,
        reason: e.to_string(),
    }
}
