//! Reporting utilities: accuracy metrics, importance ranking, climate summary,
//! and formatted terminal output.

pub mod format;
pub mod summary;

pub use format::*;
pub use summary::*;

use crate::domain::{ImportanceRecord, Metrics, PredictionRecord};

/// R², RMSE and MAE of `predicted` against `actual`.
pub fn compute_metrics(actual: &[f64], predicted: &[f64]) -> Metrics {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return Metrics {
            n: 0,
            r2: None,
            rmse: f64::NAN,
            mae: f64::NAN,
        };
    }

    let mean = actual[..n].iter().sum::<f64>() / n as f64;
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    let mut abs_sum = 0.0;
    for (&a, &p) in actual.iter().zip(predicted) {
        ss_res += (a - p).powi(2);
        ss_tot += (a - mean).powi(2);
        abs_sum += (a - p).abs();
    }

    Metrics {
        n,
        r2: (ss_tot > 0.0).then(|| 1.0 - ss_res / ss_tot),
        rmse: (ss_res / n as f64).sqrt(),
        mae: abs_sum / n as f64,
    }
}

pub fn metrics_from_predictions(predictions: &[PredictionRecord]) -> Metrics {
    let actual: Vec<f64> = predictions.iter().map(|p| p.actual).collect();
    let predicted: Vec<f64> = predictions.iter().map(|p| p.predicted).collect();
    compute_metrics(&actual, &predicted)
}

/// Sort importances by descending score. Ties keep feature order.
pub fn rank_importances(records: &[ImportanceRecord]) -> Vec<ImportanceRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.importance.partial_cmp(&a.importance).unwrap_or(std::cmp::Ordering::Equal));
    sorted
}
