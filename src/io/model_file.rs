//! Read/write model JSON files.
//!
//! The model file is the reusable form of a fitted forest:
//! - forest trees + importances
//! - hyper-parameters
//! - training metadata (target, feature names, lag count, start month)
//!
//! The schema is defined by `domain::ModelFile`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{NaiveDate, Utc};

use crate::domain::ModelFile;
use crate::error::AppError;
use crate::models::RandomForest;

pub const TOOL_NAME: &str = "sst-ml";

/// Wrap a fitted forest with its training metadata.
pub fn model_file_from_forest(
    forest: RandomForest,
    target: &str,
    feature_names: &[String],
    n_lags: usize,
    start: Option<NaiveDate>,
) -> ModelFile {
    ModelFile {
        tool: TOOL_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        created: Utc::now(),
        target: target.to_string(),
        feature_names: feature_names.to_vec(),
        n_lags,
        start,
        params: *forest.params(),
        forest,
    }
}

/// Write a model JSON file.
pub fn write_model_json(path: &Path, model: &ModelFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::output(format!("Failed to create model file '{}': {e}", path.display())))?;

    let output = |e: &dyn std::fmt::Display| {
        AppError::output(format!("Failed to write model file '{}': {e}", path.display()))
    };

    // Dropping a BufWriter discards flush errors, so flush explicitly.
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, model).map_err(|e| output(&e))?;
    writer.flush().map_err(|e| output(&e))?;

    Ok(())
}

/// Read a model JSON file and check it is usable for prediction.
pub fn read_model_json(path: &Path) -> Result<ModelFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open model file '{}': {e}", path.display())))?;
    let model: ModelFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::model(format!("Invalid model file '{}': {e}", path.display())))?;

    if !model.forest.is_fitted() {
        return Err(AppError::model(format!("Model file '{}' holds an unfitted forest.", path.display())));
    }
    if model.feature_names.len() != model.forest.n_features() || model.n_lags != model.feature_names.len() {
        return Err(AppError::model(format!(
            "Model file '{}' is inconsistent: {} feature names, {} lags, forest expects {} features.",
            path.display(),
            model.feature_names.len(),
            model.n_lags,
            model.forest.n_features()
        )));
    }

    model
        .forest
        .check_structure()
        .map_err(|e| AppError::model(format!("Model file '{}' is corrupt: {e}", path.display())))?;

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ForestParams;
    use nalgebra::DMatrix;

    fn fitted() -> RandomForest {
        let x = DMatrix::from_fn(12, 2, |i, j| (i * (j + 1)) as f64);
        let y: Vec<f64> = (0..12).map(|i| i as f64 * 0.5).collect();
        let mut rf = RandomForest::new(ForestParams {
            n_estimators: 4,
            ..ForestParams::default()
        });
        rf.fit(&x, &y).unwrap();
        rf
    }

    #[test]
    fn write_then_read_keeps_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let names = vec!["lag1".to_string(), "lag2".to_string()];
        let start = NaiveDate::from_ymd_opt(2000, 1, 1);

        let model = model_file_from_forest(fitted(), "nino34_roll12", &names, 2, start);
        write_model_json(&path, &model).unwrap();
        let back = read_model_json(&path).unwrap();

        assert_eq!(back.tool, TOOL_NAME);
        assert_eq!(back.feature_names, names);
        assert_eq!(back.n_lags, 2);
        assert_eq!(back.start, start);
        assert_eq!(back.params.n_estimators, 4);
        assert_eq!(back.forest.feature_importances(), model.forest.feature_importances());
    }

    #[test]
    fn inconsistent_lag_count_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let names = vec!["lag1".to_string(), "lag2".to_string()];

        let model = model_file_from_forest(fitted(), "y", &names, 3, None);
        write_model_json(&path, &model).unwrap();
        assert_eq!(read_model_json(&path).unwrap_err().exit_code(), crate::error::EXIT_MODEL);
    }

    #[cfg(unix)]
    #[test]
    fn full_device_is_output_error() {
        let names = vec!["lag1".to_string(), "lag2".to_string()];
        let model = model_file_from_forest(fitted(), "y", &names, 2, None);

        let err = write_model_json(Path::new("/dev/full"), &model).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_OUTPUT);
    }

    /// Point every split in `value` at feature `to`; returns how many were changed.
    fn retarget_splits(value: &mut serde_json::Value, to: usize) -> usize {
        match value {
            serde_json::Value::Object(map) => {
                let mut changed = 0;
                if let Some(serde_json::Value::Object(split)) = map.get_mut("Split") {
                    split.insert("feature".to_string(), to.into());
                    changed += 1;
                }
                changed + map.values_mut().map(|v| retarget_splits(v, to)).sum::<usize>()
            }
            serde_json::Value::Array(items) => items.iter_mut().map(|v| retarget_splits(v, to)).sum(),
            _ => 0,
        }
    }

    #[test]
    fn out_of_range_split_feature_is_model_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let names = vec!["lag1".to_string(), "lag2".to_string()];
        write_model_json(&path, &model_file_from_forest(fitted(), "y", &names, 2, None)).unwrap();

        let mut json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(retarget_splits(&mut json, 7) > 0);
        std::fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();

        let err = read_model_json(&path).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_MODEL);
        assert!(err.message().contains("outside 0..2"), "{}", err.message());
    }

    #[test]
    fn garbage_file_is_model_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(read_model_json(&path).unwrap_err().exit_code(), crate::error::EXIT_MODEL);
    }
}
