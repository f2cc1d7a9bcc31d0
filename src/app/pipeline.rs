//! Shared pipeline logic behind the `run`, `summary` and `inspect` commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load -> smooth + join -> lag features -> split/fit/predict -> write artifacts
//!
//! `app` then only deals with presentation (printing reports).

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::domain::{
    ClimateSummary, DatasetStats, ImportanceRecord, InspectConfig, JoinedRecord, LaggedDataset, Metrics,
    ModelFile, PredictionRecord, RunConfig, SeriesKind, SummaryConfig,
};
use crate::error::AppError;
use crate::fit::ModelRun;
use crate::io::{self, load_series};
use crate::transform::{build_lagged, tidy_and_join};

/// Paths of everything `run` wrote.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub predictions_csv: PathBuf,
    pub importance_csv: PathBuf,
    pub figure_png: PathBuf,
    pub model_json: PathBuf,
}

/// All computed outputs of a single `sst-ml run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub stats: DatasetStats,
    pub dataset: LaggedDataset,
    pub model: ModelRun,
    /// Importances sorted by descending score (the order written to CSV).
    pub ranked: Vec<ImportanceRecord>,
    pub artifacts: Artifacts,
}

#[derive(Debug, Clone)]
pub struct SummaryOutput {
    pub stats: DatasetStats,
    pub summary: ClimateSummary,
    pub summary_csv: PathBuf,
    pub trends_png: PathBuf,
}

#[derive(Debug, Clone)]
pub struct InspectOutput {
    pub model: ModelFile,
    pub stats: DatasetStats,
    /// Metrics over every lagged row (train and test alike).
    pub metrics: Metrics,
    pub ranked: Vec<ImportanceRecord>,
    pub predictions: Vec<PredictionRecord>,
}

/// Both input series smoothed and joined on month.
struct JoinedInputs {
    sst_rows: usize,
    enso_rows: usize,
    joined: Vec<JoinedRecord>,
}

impl JoinedInputs {
    fn stats(&self, lagged_rows: usize) -> DatasetStats {
        DatasetStats {
            sst_rows: self.sst_rows,
            enso_rows: self.enso_rows,
            joined_rows: self.joined.len(),
            lagged_rows,
            first_month: self.joined.first().map(|r| r.date),
            last_month: self.joined.last().map(|r| r.date),
        }
    }
}

fn load_joined(sst_path: &Path, enso_path: &Path, start: Option<NaiveDate>) -> Result<JoinedInputs, AppError> {
    let sst = load_series(sst_path, SeriesKind::Sst)?;
    let enso = load_series(enso_path, SeriesKind::Enso)?;
    info!(sst = sst.len(), enso = enso.len(), "loaded input series");

    let joined = tidy_and_join(&sst, &enso, start);
    if joined.is_empty() {
        return Err(AppError::data(format!(
            "No overlapping months between '{}' and '{}' after the 12-month rolling mean{}.",
            sst_path.display(),
            enso_path.display(),
            start
                .map(|d| format!(" and the start filter ({})", d.format("%Y-%m")))
                .unwrap_or_default()
        )));
    }
    info!(rows = joined.len(), "joined smoothed series on month");

    Ok(JoinedInputs {
        sst_rows: sst.len(),
        enso_rows: enso.len(),
        joined,
    })
}

/// Execute the full `run` pipeline and write its artifacts.
pub fn run_pipeline(config: &RunConfig) -> Result<RunOutput, AppError> {
    config.validate()?;

    // 1) Load, smooth and join.
    let inputs = load_joined(&config.sst_path, &config.enso_path, config.start)?;

    // 2) Lagged SST features -> smoothed ENSO target.
    let dataset = build_lagged(&inputs.joined, config.n_lags)?;
    info!(rows = dataset.len(), features = dataset.n_features(), "built lagged dataset");

    // 3) Split, fit, predict.
    let model = crate::fit::fit_and_evaluate(&dataset, config.test_size, &config.forest)?;
    let ranked = crate::report::rank_importances(&model.importances);

    // 4) Write artifacts.
    let artifacts = write_artifacts(config, &dataset, &model, &ranked)?;

    Ok(RunOutput {
        stats: inputs.stats(dataset.len()),
        dataset,
        model,
        ranked,
        artifacts,
    })
}

fn write_artifacts(
    config: &RunConfig,
    dataset: &LaggedDataset,
    model: &ModelRun,
    ranked: &[ImportanceRecord],
) -> Result<Artifacts, AppError> {
    io::ensure_out_dir(&config.out_dir)?;

    let artifacts = Artifacts {
        predictions_csv: config.out_dir.join(io::PREDICTIONS_FILE),
        importance_csv: config.out_dir.join(io::IMPORTANCE_FILE),
        figure_png: config.out_dir.join(io::FIGURE_FILE),
        model_json: config.out_dir.join(io::MODEL_FILE),
    };

    io::write_predictions_csv(&artifacts.predictions_csv, &model.predictions)?;
    io::write_importances_csv(&artifacts.importance_csv, ranked)?;
    crate::plot::render_prediction_figure(&artifacts.figure_png, &model.predictions, ranked)?;

    let model_file = io::model_file_from_forest(
        model.forest.clone(),
        &dataset.target_name,
        &dataset.feature_names,
        config.n_lags,
        config.start,
    );
    io::write_model_json(&artifacts.model_json, &model_file)?;

    info!(out_dir = %config.out_dir.display(), "wrote artifacts");
    Ok(artifacts)
}

/// Execute `summary`: climate indicators + trend figure.
pub fn run_summary(config: &SummaryConfig) -> Result<SummaryOutput, AppError> {
    let inputs = load_joined(&config.sst_path, &config.enso_path, config.start)?;
    let summary = crate::report::climate_summary(&inputs.joined);

    io::ensure_out_dir(&config.out_dir)?;
    let summary_csv = config.out_dir.join(io::SUMMARY_FILE);
    let trends_png = config.out_dir.join(io::TRENDS_FILE);

    io::write_summary_csv(&summary_csv, &summary)?;
    crate::plot::render_trends_figure(&trends_png, &inputs.joined)?;
    info!(out_dir = %config.out_dir.display(), "wrote summary");

    Ok(SummaryOutput {
        stats: inputs.stats(0),
        summary,
        summary_csv,
        trends_png,
    })
}

/// Execute `inspect`: reload a model and predict every lagged row of the inputs.
pub fn run_inspect(config: &InspectConfig) -> Result<InspectOutput, AppError> {
    let model = io::read_model_json(&config.model_path)?;
    info!(
        path = %config.model_path.display(),
        trees = model.forest.n_trees(),
        features = model.forest.n_features(),
        "loaded model"
    );

    let start = config.start.or(model.start);
    let inputs = load_joined(&config.sst_path, &config.enso_path, start)?;
    let dataset = build_lagged(&inputs.joined, model.n_lags)?;

    if dataset.feature_names != model.feature_names {
        return Err(AppError::model(format!(
            "Model features [{}] do not match the rebuilt features [{}].",
            model.feature_names.join(", "),
            dataset.feature_names.join(", ")
        )));
    }

    let all_rows: Vec<usize> = (0..dataset.len()).collect();
    let predictions = crate::fit::predict_rows(&model.forest, &dataset, &all_rows)?;
    let metrics = crate::report::metrics_from_predictions(&predictions);
    let ranked = crate::report::rank_importances(&crate::fit::importance_records(
        &model.feature_names,
        model.forest.feature_importances(),
    ));

    Ok(InspectOutput {
        stats: inputs.stats(dataset.len()),
        model,
        metrics,
        ranked,
        predictions,
    })
}
