//! Random Forest regressor.
//!
//! Bagged regression trees: each tree is grown on a bootstrap sample drawn with
//! its own RNG (`seed + tree_index`), so trees can be built in parallel while the
//! fitted forest stays identical to a sequential build. Predictions average the
//! trees in index order, which keeps floating-point results reproducible too.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::tree::{RegressionTree, TreeParams};
use crate::domain::ForestParams;
use crate::error::AppError;

/// A (possibly unfitted) Random Forest regressor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    trees: Vec<RegressionTree>,
    n_features: usize,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
            n_features: 0,
            feature_importances: Vec::new(),
        }
    }

    /// Fit the forest on `x` (rows = samples) against `y`.
    pub fn fit(&mut self, x: &DMatrix<f64>, y: &[f64]) -> Result<&mut Self, AppError> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(AppError::model(format!(
                "Design matrix has {n_samples} rows but target has {} values.",
                y.len()
            )));
        }
        if n_samples == 0 || n_features == 0 {
            return Err(AppError::model("Cannot fit a forest on an empty design matrix."));
        }
        if self.params.n_estimators == 0 {
            return Err(AppError::model("Forest needs at least one tree."));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(AppError::model("Training data contains non-finite values."));
        }

        let tree_params = TreeParams {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split.max(2),
            min_samples_leaf: self.params.min_samples_leaf.max(1),
            max_features: self.params.max_features,
        };
        let base_seed = self.params.seed;
        let bootstrap = self.params.bootstrap;

        let trees: Vec<RegressionTree> = (0..self.params.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(tree_idx as u64));

                let sample: Vec<usize> = if bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                RegressionTree::fit(x, y, &sample, tree_params, &mut rng)
            })
            .collect::<Result<_, _>>()?;

        self.trees = trees;
        self.n_features = n_features;
        self.compute_feature_importances();

        Ok(self)
    }

    fn compute_feature_importances(&mut self) {
        let mut total = vec![0.0; self.n_features];

        for tree in &self.trees {
            for (acc, &v) in total.iter_mut().zip(tree.importances()) {
                *acc += v;
            }
        }

        let n_trees = self.trees.len() as f64;
        for imp in &mut total {
            *imp /= n_trees;
        }

        let sum: f64 = total.iter().sum();
        if sum > 0.0 {
            for imp in &mut total {
                *imp /= sum;
            }
        }

        self.feature_importances = total;
    }

    /// Mean prediction across trees.
    pub fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, AppError> {
        if self.trees.is_empty() {
            return Err(AppError::model("Model is not fitted."));
        }
        if x.ncols() != self.n_features {
            return Err(AppError::model(format!(
                "Model expects {} features, got {}.",
                self.n_features,
                x.ncols()
            )));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(AppError::model("Prediction input contains non-finite values."));
        }

        let per_tree: Vec<Vec<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<_, _>>()?;

        let n_trees = per_tree.len() as f64;
        Ok((0..x.nrows())
            .map(|i| per_tree.iter().map(|p| p[i]).sum::<f64>() / n_trees)
            .collect())
    }

    /// Impurity-based importances, one per feature, summing to 1 (or all zero).
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Check the internal shape of a forest that did not come from `fit`.
    ///
    /// Every tree must expect `n_features` columns and split only on those, and
    /// there must be one importance per feature. Prediction indexes rows by split
    /// feature, so a forest failing this check must not be used.
    pub fn check_structure(&self) -> Result<(), AppError> {
        if self.feature_importances.len() != self.n_features {
            return Err(AppError::model(format!(
                "Forest has {} importances for {} features.",
                self.feature_importances.len(),
                self.n_features
            )));
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            if tree.n_features() != self.n_features {
                return Err(AppError::model(format!(
                    "Tree {idx} expects {} features, forest expects {}.",
                    tree.n_features(),
                    self.n_features
                )));
            }
            if !tree.splits_in_range() {
                return Err(AppError::model(format!(
                    "Tree {idx} splits on a feature index outside 0..{}.",
                    self.n_features
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(n_estimators: usize) -> ForestParams {
        ForestParams {
            n_estimators,
            ..ForestParams::default()
        }
    }

    fn linear_data() -> (DMatrix<f64>, Vec<f64>) {
        // y depends on column 0 only; column 1 is noise-free filler.
        let n = 40;
        let x = DMatrix::from_fn(n, 2, |i, j| if j == 0 { i as f64 } else { ((i * 7) % 5) as f64 });
        let y = (0..n).map(|i| 2.0 * i as f64 + 1.0).collect();
        (x, y)
    }

    #[test]
    fn regressor_fits_monotone_signal() {
        let (x, y) = linear_data();
        let mut rf = RandomForest::new(params(25));
        rf.fit(&x, &y).unwrap();

        let pred = rf.predict(&x).unwrap();
        let mse: f64 = pred.iter().zip(&y).map(|(p, a)| (p - a).powi(2)).sum::<f64>() / y.len() as f64;
        assert!(mse < 10.0, "MSE too high: {mse}");
        assert_eq!(rf.n_trees(), 25);
    }

    #[test]
    fn importances_favor_driving_feature_and_sum_to_one() {
        let (x, y) = linear_data();
        let mut rf = RandomForest::new(params(20));
        rf.fit(&x, &y).unwrap();

        let imp = rf.feature_importances();
        assert_eq!(imp.len(), 2);
        assert!(imp.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(imp[0] > imp[1]);
    }

    #[test]
    fn same_seed_same_forest() {
        let (x, y) = linear_data();
        let mut a = RandomForest::new(params(15));
        let mut b = RandomForest::new(params(15));
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
        assert_eq!(a.feature_importances(), b.feature_importances());
    }

    #[test]
    fn fitted_forest_passes_structure_check() {
        let (x, y) = linear_data();
        let mut rf = RandomForest::new(params(5));
        rf.fit(&x, &y).unwrap();
        assert!(rf.check_structure().is_ok());
    }

    #[test]
    fn unfitted_predict_is_model_error() {
        let rf = RandomForest::new(params(3));
        let x = DMatrix::from_row_slice(1, 1, &[1.0]);
        assert_eq!(rf.predict(&x).unwrap_err().exit_code(), crate::error::EXIT_MODEL);
    }

    #[test]
    fn non_finite_training_data_rejected() {
        let x = DMatrix::from_row_slice(3, 1, &[1.0, f64::NAN, 3.0]);
        let mut rf = RandomForest::new(params(3));
        assert_eq!(rf.fit(&x, &[1.0, 2.0, 3.0]).unwrap_err().exit_code(), crate::error::EXIT_MODEL);
    }

    #[test]
    fn json_round_trip_predicts_identically() {
        let (x, y) = linear_data();
        let mut rf = RandomForest::new(params(5));
        rf.fit(&x, &y).unwrap();

        let json = serde_json::to_string(&rf).unwrap();
        let back: RandomForest = serde_json::from_str(&json).unwrap();
        assert_eq!(rf.predict(&x).unwrap(), back.predict(&x).unwrap());
    }
}
