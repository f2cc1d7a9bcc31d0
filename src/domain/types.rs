//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory while transforming and fitting
//! - exported to CSV/JSON
//! - reloaded later for inspection

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::RandomForest;

/// Trailing window (months) of the rolling mean applied to both series.
pub const ROLLING_WINDOW: usize = 12;

/// Which of the two input series a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    /// Sea-surface temperature (°C), the predictor.
    Sst,
    /// Niño 3.4 index, the target.
    Enso,
}

impl SeriesKind {
    /// Canonical value column in the input CSV.
    pub fn value_column(self) -> &'static str {
        match self {
            SeriesKind::Sst => "sst_c",
            SeriesKind::Enso => "nino34",
        }
    }

    /// Name of the smoothed column (e.g. `sst_c_roll12`).
    pub fn rolling_column(self) -> String {
        format!("{}_roll{ROLLING_WINDOW}", self.value_column())
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SeriesKind::Sst => "SST",
            SeriesKind::Enso => "ENSO",
        }
    }
}

/// One raw observation. `date` is always the first day of its month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesRow {
    pub date: NaiveDate,
    pub value: f64,
}

/// A raw observation with its trailing rolling mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub rolling: f64,
}

/// A month present in both smoothed series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinedRecord {
    pub date: NaiveDate,
    pub sst: f64,
    pub sst_roll: f64,
    pub enso: f64,
    pub enso_roll: f64,
}

/// One model row: lagged predictor values paired with the current target.
#[derive(Debug, Clone, PartialEq)]
pub struct LaggedRecord {
    pub date: NaiveDate,
    pub target: f64,
    /// `features[k - 1]` is the smoothed SST `k` rows earlier.
    pub features: Vec<f64>,
}

/// The feature-built table handed to the model stage.
#[derive(Debug, Clone, PartialEq)]
pub struct LaggedDataset {
    pub feature_names: Vec<String>,
    pub target_name: String,
    pub rows: Vec<LaggedRecord>,
}

impl LaggedDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }
}

/// Disjoint row-index partitions of a `LaggedDataset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// A test-set prediction. `residual = actual - predicted`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub date: NaiveDate,
    pub actual: f64,
    pub predicted: f64,
    pub residual: f64,
}

impl PredictionRecord {
    pub fn new(date: NaiveDate, actual: f64, predicted: f64) -> Self {
        Self {
            date,
            actual,
            predicted,
            residual: actual - predicted,
        }
    }
}

/// Per-feature importance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceRecord {
    pub feature: String,
    pub importance: f64,
}

/// Row counts through the transform stages of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetStats {
    pub sst_rows: usize,
    pub enso_rows: usize,
    pub joined_rows: usize,
    pub lagged_rows: usize,
    pub first_month: Option<NaiveDate>,
    pub last_month: Option<NaiveDate>,
}

/// Accuracy diagnostics over a set of predictions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub n: usize,
    /// `None` when the actual values have zero variance.
    pub r2: Option<f64>,
    pub rmse: f64,
    pub mae: f64,
}

/// One-row climate summary written by `sst-ml summary`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateSummary {
    pub sst_trend_c_per_decade: Option<f64>,
    pub delta_sst_last_yr_c: Option<f64>,
    pub delta_enso_last_yr: Option<f64>,
    pub corr_sst_enso_roll: Option<f64>,
    pub n_months: usize,
}

/// Random Forest hyper-parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// `None` grows trees until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn per split; `None` considers all of them.
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// A full `run` configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub sst_path: PathBuf,
    pub enso_path: PathBuf,
    pub out_dir: PathBuf,
    /// Earliest month kept after smoothing and joining.
    pub start: Option<NaiveDate>,
    pub n_lags: usize,
    /// Fraction of rows held out for evaluation, in `(0, 1)`.
    pub test_size: f64,
    pub forest: ForestParams,
}

impl RunConfig {
    /// Reject flag values the pipeline cannot use, before any file is read.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.n_lags == 0 {
            return Err(AppError::input("--n-lags must be at least 1."));
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(AppError::input(format!(
                "--test-size must be in (0, 1), got {}.",
                self.test_size
            )));
        }
        if self.forest.n_estimators == 0 {
            return Err(AppError::input("--n-estimators must be at least 1."));
        }
        if self.forest.max_depth == Some(0) {
            return Err(AppError::input("--max-depth must be at least 1."));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub sst_path: PathBuf,
    pub enso_path: PathBuf,
    pub out_dir: PathBuf,
    pub start: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct InspectConfig {
    pub model_path: PathBuf,
    pub sst_path: PathBuf,
    pub enso_path: PathBuf,
    /// Overrides the start month stored in the model file.
    pub start: Option<NaiveDate>,
    pub examples: usize,
}

/// The saved model file (JSON).
///
/// Besides the forest itself this records what the model was trained on, so
/// `sst-ml inspect` can rebuild matching features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub tool: String,
    pub version: String,
    pub created: DateTime<Utc>,
    pub target: String,
    pub feature_names: Vec<String>,
    pub n_lags: usize,
    pub start: Option<NaiveDate>,
    pub params: ForestParams,
    pub forest: RandomForest,
}
