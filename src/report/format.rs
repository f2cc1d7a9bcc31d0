//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the transform/fitting code stays clean and testable
//! - output changes are localized

use std::path::Path;

use crate::domain::{
    ClimateSummary, DatasetStats, ImportanceRecord, Metrics, ModelFile, PredictionRecord, RunConfig,
};
use crate::fit::ModelRun;

/// Format the `run` summary (dataset counts + split + metrics + importances).
pub fn format_run_summary(stats: &DatasetStats, config: &RunConfig, run: &ModelRun) -> String {
    let mut out = String::new();

    out.push_str("=== sst-ml - ENSO from lagged SST (Random Forest) ===\n");
    out.push_str(&format_dataset(stats));
    out.push_str(&format!(
        "Start: {} | lags={} | test_size={}\n",
        config
            .start
            .map(|d| d.format("%Y-%m").to_string())
            .unwrap_or_else(|| "-".to_string()),
        config.n_lags,
        config.test_size
    ));
    out.push_str(&format!(
        "Split: train={} test={} | trees={} max_depth={} seed={}\n",
        run.split.train.len(),
        run.split.test.len(),
        config.forest.n_estimators,
        config
            .forest
            .max_depth
            .map(|d| d.to_string())
            .unwrap_or_else(|| "none".to_string()),
        config.forest.seed
    ));

    out.push_str("\nMetrics:\n");
    out.push_str(&format_metrics("train", &run.train_metrics));
    out.push_str(&format_metrics("test", &run.test_metrics));

    out.push_str("\nFeature importance:\n");
    out.push_str(&format_importances(&crate::report::rank_importances(&run.importances)));

    out
}

/// Format the `summary` command output.
pub fn format_climate_summary(stats: &DatasetStats, summary: &ClimateSummary) -> String {
    let mut out = String::new();

    out.push_str("=== sst-ml - SST / ENSO summary (12-month rolling means) ===\n");
    out.push_str(&format_dataset(stats));
    out.push_str(&format!(
        "SST trend:            {} °C/decade\n",
        fmt_opt(summary.sst_trend_c_per_decade)
    ));
    out.push_str(&format!(
        "SST delta (last yr):  {} °C\n",
        fmt_opt(summary.delta_sst_last_yr_c)
    ));
    out.push_str(&format!("ENSO delta (last yr): {}\n", fmt_opt(summary.delta_enso_last_yr)));
    out.push_str(&format!("corr(SST, ENSO):      {}\n", fmt_opt(summary.corr_sst_enso_roll)));
    out.push_str(&format!("Months:               {}\n", summary.n_months));

    out
}

/// Format the `inspect` report for a reloaded model.
pub fn format_inspect_report(
    model_path: &Path,
    model: &ModelFile,
    stats: &DatasetStats,
    metrics: &Metrics,
    ranked: &[ImportanceRecord],
    predictions: &[PredictionRecord],
    examples: usize,
) -> String {
    let mut out = String::new();

    out.push_str("=== sst-ml - saved model ===\n");
    out.push_str(&format!("Model: {}\n", model_path.display()));
    out.push_str(&format!(
        "Created: {} by {} {}\n",
        model.created.format("%Y-%m-%d %H:%M:%S UTC"),
        model.tool,
        model.version
    ));
    out.push_str(&format!(
        "Trees: {} | max_depth={} | seed={} | features={}\n",
        model.forest.n_trees(),
        model
            .params
            .max_depth
            .map(|d| d.to_string())
            .unwrap_or_else(|| "none".to_string()),
        model.params.seed,
        model.forest.n_features()
    ));
    out.push_str(&format!("Target: {}\n", model.target));
    out.push_str(&format!("Feature names: {}\n", model.feature_names.join(", ")));

    out.push('\n');
    out.push_str(&format_dataset(stats));

    out.push_str("\nMetrics (all rows):\n");
    out.push_str(&format_metrics("all", metrics));

    out.push_str("\nFeature importance:\n");
    out.push_str(&format_importances(ranked));

    out.push_str("\nExample predictions:\n");
    let shown = examples.min(predictions.len());
    out.push_str(&format_predictions(&predictions[..shown]));

    if let Some(top) = ranked.first() {
        out.push_str(&format!("\nTop feature: {} ({:.4})\n", top.feature, top.importance));
    }

    out
}

fn format_dataset(stats: &DatasetStats) -> String {
    let range = match (stats.first_month, stats.last_month) {
        (Some(a), Some(b)) => format!("{}..{}", a.format("%Y-%m"), b.format("%Y-%m")),
        _ => "-".to_string(),
    };
    format!(
        "Rows: sst={} enso={} | joined={} ({range}) | lagged={}\n",
        stats.sst_rows, stats.enso_rows, stats.joined_rows, stats.lagged_rows
    )
}

fn format_metrics(label: &str, m: &Metrics) -> String {
    format!(
        "  {label:<6} n={:<5} R²={} RMSE={:.4} MAE={:.4}\n",
        m.n,
        fmt_opt(m.r2),
        m.rmse,
        m.mae
    )
}

/// Format an importance table (already ranked).
pub fn format_importances(rows: &[ImportanceRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<24} {:>10}\n", "feature", "importance"));
    out.push_str(&format!("{:-<24} {:-<10}\n", "", ""));
    for r in rows {
        out.push_str(&format!("{:<24} {:>10.4}\n", truncate(&r.feature, 24), r.importance));
    }
    out
}

/// Format a prediction table.
pub fn format_predictions(rows: &[PredictionRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<10} {:>10} {:>10} {:>10}\n",
        "date", "actual", "predicted", "residual"
    ));
    out.push_str(&format!("{:-<10} {:-<10} {:-<10} {:-<10}\n", "", "", "", ""));
    for p in rows {
        out.push_str(&format!(
            "{:<10} {:>10.4} {:>10.4} {:>10.4}\n",
            p.date.format("%Y-%m"),
            p.actual,
            p.predicted,
            p.residual
        ));
    }
    out
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{v:.4}"),
        _ => "n/a".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn importance_table_lists_every_row() {
        let rows = vec![
            ImportanceRecord {
                feature: "sst_c_roll12_lag1".to_string(),
                importance: 0.7,
            },
            ImportanceRecord {
                feature: "sst_c_roll12_lag2".to_string(),
                importance: 0.3,
            },
        ];
        let table = format_importances(&rows);
        assert_eq!(table.lines().count(), 4);
        assert!(table.contains("sst_c_roll12_lag1"));
        assert!(table.contains("0.7000"));
    }

    #[test]
    fn prediction_table_uses_month_dates() {
        let date = NaiveDate::from_ymd_opt(2003, 7, 1).unwrap();
        let table = format_predictions(&[PredictionRecord::new(date, 1.0, 0.25)]);
        assert!(table.contains("2003-07"));
        assert!(table.contains("0.7500"));
    }

    #[test]
    fn truncate_long_names() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
