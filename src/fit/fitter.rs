//! Model stage: split, fit, predict, importances.
//!
//! The forest itself lives in `models`; this module only shapes the lagged
//! dataset into design matrices and the model outputs into records.

use nalgebra::DMatrix;
use tracing::{debug, info};

use super::split::train_test_split;
use crate::domain::{
    ForestParams, ImportanceRecord, LaggedDataset, Metrics, PredictionRecord, TrainTestSplit,
};
use crate::error::AppError;
use crate::models::RandomForest;

/// Everything the model stage produces for one run.
#[derive(Debug, Clone)]
pub struct ModelRun {
    pub forest: RandomForest,
    pub split: TrainTestSplit,
    /// Test-set predictions in date order.
    pub predictions: Vec<PredictionRecord>,
    /// One record per feature, in feature order (see `report::rank_importances`).
    pub importances: Vec<ImportanceRecord>,
    pub test_metrics: Metrics,
    pub train_metrics: Metrics,
}

/// Build a design matrix (rows = samples) from the selected dataset rows.
pub fn design_matrix(dataset: &LaggedDataset, rows: &[usize]) -> DMatrix<f64> {
    DMatrix::from_fn(rows.len(), dataset.n_features(), |i, j| dataset.rows[rows[i]].features[j])
}

fn targets(dataset: &LaggedDataset, rows: &[usize]) -> Vec<f64> {
    rows.iter().map(|&i| dataset.rows[i].target).collect()
}

/// Split the dataset, fit a forest on the train rows and evaluate on the test rows.
pub fn fit_and_evaluate(dataset: &LaggedDataset, test_size: f64, params: &ForestParams) -> Result<ModelRun, AppError> {
    let split = train_test_split(dataset.len(), test_size, params.seed)?;
    info!(
        rows = dataset.len(),
        train = split.train.len(),
        test = split.test.len(),
        "split dataset"
    );

    let x_train = design_matrix(dataset, &split.train);
    let y_train = targets(dataset, &split.train);

    let mut forest = RandomForest::new(*params);
    forest.fit(&x_train, &y_train)?;
    info!(
        trees = forest.n_trees(),
        features = forest.n_features(),
        max_depth = ?params.max_depth,
        seed = params.seed,
        "fitted random forest"
    );

    let train_pred = forest.predict(&x_train)?;
    let train_metrics = crate::report::compute_metrics(&y_train, &train_pred);

    let predictions = predict_rows(&forest, dataset, &split.test)?;
    let test_metrics = crate::report::metrics_from_predictions(&predictions);
    debug!(?test_metrics, ?train_metrics, "evaluated model");

    let importances = importance_records(&dataset.feature_names, forest.feature_importances());

    Ok(ModelRun {
        forest,
        split,
        predictions,
        importances,
        test_metrics,
        train_metrics,
    })
}

/// Predict the selected dataset rows with a fitted forest.
pub fn predict_rows(
    forest: &RandomForest,
    dataset: &LaggedDataset,
    rows: &[usize],
) -> Result<Vec<PredictionRecord>, AppError> {
    let x = design_matrix(dataset, rows);
    let predicted = forest.predict(&x)?;

    Ok(rows
        .iter()
        .zip(predicted)
        .map(|(&i, p)| {
            let row = &dataset.rows[i];
            PredictionRecord::new(row.date, row.target, p)
        })
        .collect())
}

/// Pair feature names with scores, keeping feature order.
pub fn importance_records(names: &[String], scores: &[f64]) -> Vec<ImportanceRecord> {
    names
        .iter()
        .zip(scores)
        .map(|(feature, &importance)| ImportanceRecord {
            feature: feature.clone(),
            importance,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LaggedRecord;
    use chrono::{Months, NaiveDate};

    fn dataset(n: usize) -> LaggedDataset {
        let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let rows = (0..n)
            .map(|i| {
                let t = i as f64;
                LaggedRecord {
                    date: start.checked_add_months(Months::new(i as u32)).unwrap(),
                    target: (t / 3.0).sin(),
                    features: vec![(t / 3.0).sin() * 0.9, (t / 4.0).cos(), 0.5],
                }
            })
            .collect();
        LaggedDataset {
            feature_names: vec!["a".into(), "b".into(), "c".into()],
            target_name: "y".into(),
            rows,
        }
    }

    fn params() -> ForestParams {
        ForestParams {
            n_estimators: 30,
            ..ForestParams::default()
        }
    }

    #[test]
    fn shapes_and_residuals() {
        let data = dataset(50);
        let run = fit_and_evaluate(&data, 0.2, &params()).unwrap();

        assert_eq!(run.predictions.len(), 10);
        assert_eq!(run.importances.len(), 3);
        assert_eq!(run.test_metrics.n, 10);
        assert!(run.predictions.windows(2).all(|w| w[0].date < w[1].date));
        for p in &run.predictions {
            assert_eq!(p.residual, p.actual - p.predicted);
        }
        let sum: f64 = run.importances.iter().map(|r| r.importance).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let data = dataset(40);
        let a = fit_and_evaluate(&data, 0.25, &params()).unwrap();
        let b = fit_and_evaluate(&data, 0.25, &params()).unwrap();
        assert_eq!(a.predictions, b.predictions);
        assert_eq!(a.importances, b.importances);
    }

    #[test]
    fn design_matrix_selects_rows() {
        let data = dataset(5);
        let x = design_matrix(&data, &[3, 1]);
        assert_eq!(x.shape(), (2, 3));
        assert_eq!(x[(0, 0)], data.rows[3].features[0]);
        assert_eq!(x[(1, 1)], data.rows[1].features[1]);
    }
}
