//! Export result tables to CSV.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::create_dir_all;
use std::path::Path;

use serde::Serialize;

use crate::domain::{ClimateSummary, ImportanceRecord, PredictionRecord};
use crate::error::AppError;

pub const PREDICTIONS_FILE: &str = "ml_predictions.csv";
pub const IMPORTANCE_FILE: &str = "ml_feature_importance.csv";
pub const FIGURE_FILE: &str = "ml_predictions.png";
pub const MODEL_FILE: &str = "model.json";
pub const SUMMARY_FILE: &str = "summary.csv";
pub const TRENDS_FILE: &str = "trends.png";

/// Create the output directory (and parents) if it does not exist.
pub fn ensure_out_dir(dir: &Path) -> Result<(), AppError> {
    create_dir_all(dir)
        .map_err(|e| AppError::output(format!("Failed to create output directory '{}': {e}", dir.display())))
}

/// Write test-set predictions (`date,actual,predicted,residual`).
pub fn write_predictions_csv(path: &Path, predictions: &[PredictionRecord]) -> Result<(), AppError> {
    write_records(path, predictions)
}

/// Write feature importances (`feature,importance`) in the given order.
pub fn write_importances_csv(path: &Path, importances: &[ImportanceRecord]) -> Result<(), AppError> {
    write_records(path, importances)
}

/// Write the one-row climate summary. Undefined values become empty cells.
pub fn write_summary_csv(path: &Path, summary: &ClimateSummary) -> Result<(), AppError> {
    write_records(path, std::slice::from_ref(summary))
}

fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::output(format!("Failed to create CSV '{}': {e}", path.display())))?;

    for record in records {
        writer
            .serialize(record)
            .map_err(|e| AppError::output(format!("Failed to write CSV row to '{}': {e}", path.display())))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::output(format!("Failed to flush CSV '{}': {e}", path.display())))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn predictions_csv_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREDICTIONS_FILE);
        let date = NaiveDate::from_ymd_opt(2001, 2, 1).unwrap();

        write_predictions_csv(&path, &[PredictionRecord::new(date, 1.5, 1.0)]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("date,actual,predicted,residual"));
        assert_eq!(lines.next(), Some("2001-02-01,1.5,1.0,0.5"));
    }

    #[test]
    fn summary_csv_leaves_missing_values_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SUMMARY_FILE);
        let summary = ClimateSummary {
            sst_trend_c_per_decade: Some(0.123),
            delta_sst_last_yr_c: None,
            delta_enso_last_yr: None,
            corr_sst_enso_roll: Some(-0.5),
            n_months: 20,
        };

        write_summary_csv(&path, &summary).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "sst_trend_c_per_decade,delta_sst_last_yr_c,delta_enso_last_yr,corr_sst_enso_roll,n_months"
        );
        assert_eq!(lines[1], "0.123,,,-0.5,20");
    }

    #[test]
    fn unwritable_path_is_output_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("x.csv");
        let err = write_importances_csv(&path, &[]).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_OUTPUT);
    }
}
