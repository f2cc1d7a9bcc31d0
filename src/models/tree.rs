//! CART regression tree with mean-squared-error impurity.
//!
//! Trees are grown on a list of row indices into a shared design matrix, so a
//! bootstrap sample is just an index vector with repeats. Every split is recorded
//! in a per-feature importance accumulator (total decrease in squared error),
//! normalized to sum to 1 once the tree is complete.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Tree node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn (without replacement) at each node; `None` uses all.
    pub max_features: Option<usize>,
}

/// A fitted regression tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    root: TreeNode,
    n_features: usize,
    importances: Vec<f64>,
}

/// Best split found at a node.
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// `sum_l^2 / n_l + sum_r^2 / n_r`; larger means lower child SSE.
    proxy: f64,
}

impl RegressionTree {
    /// Grow a tree on `indices` (rows of `x`, repeats allowed).
    pub fn fit(
        x: &DMatrix<f64>,
        y: &[f64],
        indices: &[usize],
        params: TreeParams,
        rng: &mut StdRng,
    ) -> Result<Self, AppError> {
        if x.nrows() != y.len() {
            return Err(AppError::model(format!(
                "Design matrix has {} rows but target has {} values.",
                x.nrows(),
                y.len()
            )));
        }
        if indices.is_empty() {
            return Err(AppError::model("Cannot grow a tree on zero samples."));
        }

        let mut builder = Builder {
            x,
            y,
            params,
            rng,
            importances: vec![0.0; x.ncols()],
        };
        let root = builder.build(indices.to_vec(), 0);

        let mut importances = builder.importances;
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }

        Ok(Self {
            root,
            n_features: x.ncols(),
            importances,
        })
    }

    /// Predict a single feature row.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    /// Predict every row of `x`.
    pub fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, AppError> {
        if x.ncols() != self.n_features {
            return Err(AppError::model(format!(
                "Tree expects {} features, got {}.",
                self.n_features,
                x.ncols()
            )));
        }
        let mut row = vec![0.0; self.n_features];
        Ok((0..x.nrows())
            .map(|i| {
                for (j, slot) in row.iter_mut().enumerate() {
                    *slot = x[(i, j)];
                }
                self.predict_row(&row)
            })
            .collect())
    }

    /// Normalized impurity-decrease importances (all zero for a single-leaf tree).
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn depth(&self) -> usize {
        fn walk(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        walk(&self.root)
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Whether every split reads a column below `n_features`.
    ///
    /// Always true for a fitted tree; a deserialized one may not be.
    pub fn splits_in_range(&self) -> bool {
        fn walk(node: &TreeNode, n_features: usize) -> bool {
            match node {
                TreeNode::Leaf { .. } => true,
                TreeNode::Split {
                    feature, left, right, ..
                } => *feature < n_features && walk(left, n_features) && walk(right, n_features),
            }
        }
        walk(&self.root, self.n_features)
    }
}

struct Builder<'a> {
    x: &'a DMatrix<f64>,
    y: &'a [f64],
    params: TreeParams,
    rng: &'a mut StdRng,
    importances: Vec<f64>,
}

impl Builder<'_> {
    fn build(&mut self, indices: Vec<usize>, depth: usize) -> TreeNode {
        let n_samples = indices.len();
        let (sum, sse) = sum_and_sse(self.y, &indices);
        let value = sum / n_samples as f64;

        let should_stop = n_samples < self.params.min_samples_split
            || n_samples < 2 * self.params.min_samples_leaf
            || self.params.max_depth.is_some_and(|d| depth >= d)
            || self.is_pure(&indices);

        if should_stop {
            return TreeNode::Leaf { value, n_samples };
        }

        let Some(best) = self.find_best_split(&indices, sum) else {
            return TreeNode::Leaf { value, n_samples };
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.x[(i, best.feature)] <= best.threshold);

        if left_idx.is_empty() || right_idx.is_empty() {
            return TreeNode::Leaf { value, n_samples };
        }

        // Impurity decrease, weighted by node size: SSE(parent) - SSE(left) - SSE(right).
        let (_, sse_left) = sum_and_sse(self.y, &left_idx);
        let (_, sse_right) = sum_and_sse(self.y, &right_idx);
        let decrease = sse - sse_left - sse_right;
        if decrease > 0.0 {
            self.importances[best.feature] += decrease;
        }

        let left = Box::new(self.build(left_idx, depth + 1));
        let right = Box::new(self.build(right_idx, depth + 1));

        TreeNode::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
            n_samples,
        }
    }

    fn is_pure(&self, indices: &[usize]) -> bool {
        let first = self.y[indices[0]];
        indices.iter().all(|&i| (self.y[i] - first).abs() < 1e-12)
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        let n_features = self.x.ncols();
        match self.params.max_features {
            Some(k) if k < n_features => {
                let mut picked = rand::seq::index::sample(&mut *self.rng, n_features, k.max(1)).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..n_features).collect(),
        }
    }

    fn find_best_split(&mut self, indices: &[usize], total_sum: f64) -> Option<SplitCandidate> {
        let n = indices.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let parent_proxy = total_sum * total_sum / n as f64;

        let mut best: Option<SplitCandidate> = None;
        let mut sorted = indices.to_vec();

        for feature in self.candidate_features() {
            sorted.sort_by(|&a, &b| self.x[(a, feature)].total_cmp(&self.x[(b, feature)]));

            let mut left_sum = 0.0;
            for pos in 0..n - 1 {
                left_sum += self.y[sorted[pos]];

                let left_n = pos + 1;
                let right_n = n - left_n;
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }

                let here = self.x[(sorted[pos], feature)];
                let next = self.x[(sorted[pos + 1], feature)];
                if here >= next {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let proxy = left_sum * left_sum / left_n as f64 + right_sum * right_sum / right_n as f64;

                if proxy > parent_proxy + 1e-12 && best.as_ref().is_none_or(|b| proxy > b.proxy) {
                    let mut threshold = here + (next - here) / 2.0;
                    // Midpoint can round up to `next` for adjacent floats.
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        proxy,
                    });
                }
            }
        }

        best
    }
}

fn sum_and_sse(y: &[f64], indices: &[usize]) -> (f64, f64) {
    let n = indices.len() as f64;
    let sum: f64 = indices.iter().map(|&i| y[i]).sum();
    let mean = sum / n;
    let sse = indices.iter().map(|&i| (y[i] - mean).powi(2)).sum();
    (sum, sse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn params() -> TreeParams {
        TreeParams {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }

    #[test]
    fn step_function_is_learned_exactly() {
        let x = DMatrix::from_row_slice(6, 1, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let y = [0.0, 0.0, 0.0, 10.0, 10.0, 10.0];
        let idx: Vec<usize> = (0..6).collect();
        let mut rng = StdRng::seed_from_u64(0);

        let tree = RegressionTree::fit(&x, &y, &idx, params(), &mut rng).unwrap();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict(&x).unwrap(), y.to_vec());
        match tree.root() {
            TreeNode::Split { threshold, .. } => assert!((threshold - 3.5).abs() < 1e-12),
            TreeNode::Leaf { .. } => panic!("expected a split"),
        }
    }

    #[test]
    fn irrelevant_feature_gets_no_importance() {
        // Column 0 drives y, column 1 is constant.
        let x = DMatrix::from_row_slice(5, 2, &[1.0, 7.0, 2.0, 7.0, 3.0, 7.0, 4.0, 7.0, 5.0, 7.0]);
        let y = [1.0, 2.0, 3.0, 4.0, 5.0];
        let idx: Vec<usize> = (0..5).collect();
        let mut rng = StdRng::seed_from_u64(1);

        let tree = RegressionTree::fit(&x, &y, &idx, params(), &mut rng).unwrap();
        assert_eq!(tree.importances(), &[1.0, 0.0]);
    }

    #[test]
    fn max_depth_limits_growth() {
        let x = DMatrix::from_row_slice(8, 1, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let y = [1.0, 4.0, 9.0, 16.0, 25.0, 36.0, 49.0, 64.0];
        let idx: Vec<usize> = (0..8).collect();
        let mut rng = StdRng::seed_from_u64(2);

        let p = TreeParams {
            max_depth: Some(2),
            ..params()
        };
        let tree = RegressionTree::fit(&x, &y, &idx, p, &mut rng).unwrap();
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn constant_target_is_single_leaf() {
        let x = DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]);
        let y = [5.0, 5.0, 5.0];
        let mut rng = StdRng::seed_from_u64(3);

        let tree = RegressionTree::fit(&x, &y, &[0, 1, 2], params(), &mut rng).unwrap();
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.importances(), &[0.0]);
        assert_eq!(tree.predict_row(&[100.0]), 5.0);
    }

    #[test]
    fn out_of_range_split_detected() {
        let json = r#"{
            "root": {"Split": {
                "feature": 3, "threshold": 0.5, "n_samples": 2,
                "left": {"Leaf": {"value": 1.0, "n_samples": 1}},
                "right": {"Leaf": {"value": 2.0, "n_samples": 1}}
            }},
            "n_features": 1,
            "importances": [1.0]
        }"#;
        let tree: RegressionTree = serde_json::from_str(json).unwrap();
        assert!(!tree.splits_in_range());

        let x = DMatrix::from_row_slice(2, 1, &[1.0, 2.0]);
        let mut rng = StdRng::seed_from_u64(5);
        let fitted = RegressionTree::fit(&x, &[1.0, 2.0], &[0, 1], params(), &mut rng).unwrap();
        assert!(fitted.splits_in_range());
    }

    #[test]
    fn feature_count_mismatch_is_model_error() {
        let x = DMatrix::from_row_slice(2, 1, &[1.0, 2.0]);
        let mut rng = StdRng::seed_from_u64(4);
        let tree = RegressionTree::fit(&x, &[1.0, 2.0], &[0, 1], params(), &mut rng).unwrap();

        let wide = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
        assert_eq!(tree.predict(&wide).unwrap_err().exit_code(), crate::error::EXIT_MODEL);
    }
}
