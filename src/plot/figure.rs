//! Three-panel prediction figure.
//!
//! Layout (1200×900):
//! - top: actual vs predicted over time (test rows, date order)
//! - bottom-left: actual vs predicted scatter with the identity line
//! - bottom-right: feature importance bars

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::debug;

use crate::domain::{ImportanceRecord, PredictionRecord};
use crate::error::AppError;
use crate::plot::{DRAW_TEXT, decimal_year, describe_axes, padded_range, render_error};

pub const FIGURE_SIZE: (u32, u32) = (1200, 900);

const ACTUAL_COLOR: RGBColor = RGBColor(31, 119, 180);
const PREDICTED_COLOR: RGBColor = RGBColor(214, 39, 40);
const BAR_COLOR: RGBColor = RGBColor(44, 160, 44);

/// Render `ml_predictions.png`.
///
/// `importances` are drawn in the given order (callers pass them ranked).
pub fn render_prediction_figure(
    path: &Path,
    predictions: &[PredictionRecord],
    importances: &[ImportanceRecord],
) -> Result<(), AppError> {
    let root = BitMapBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| render_error(path, e))?;

    let (top, bottom) = root.split_vertically(FIGURE_SIZE.1 / 2);
    let (left, right) = bottom.split_horizontally(FIGURE_SIZE.0 / 2);

    draw_time_panel(&top, predictions).map_err(|e| render_error(path, e))?;
    draw_scatter_panel(&left, predictions).map_err(|e| render_error(path, e))?;
    draw_importance_panel(&right, importances).map_err(|e| render_error(path, e))?;

    root.present().map_err(|e| render_error(path, e))?;
    debug!(path = %path.display(), "prediction figure written");
    Ok(())
}

fn draw_time_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    predictions: &[PredictionRecord],
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let actual: Vec<(f64, f64)> = predictions.iter().map(|p| (decimal_year(p.date), p.actual)).collect();
    let predicted: Vec<(f64, f64)> = predictions.iter().map(|p| (decimal_year(p.date), p.predicted)).collect();

    let (x0, x1) = padded_range(actual.iter().map(|&(x, _)| x));
    let (y0, y1) = padded_range(actual.iter().chain(predicted.iter()).map(|&(_, y)| y));

    let fmt_x = |v: &f64| format!("{v:.1}");
    let fmt_y = |v: &f64| format!("{v:.2}");

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40);
    if DRAW_TEXT {
        builder.caption("ENSO (12-mo rolling): actual vs predicted (test set)", ("sans-serif", 22));
    }
    let mut chart = builder.build_cartesian_2d(x0..x1, y0..y1)?;

    {
        let mut mesh = chart.configure_mesh();
        mesh.x_label_formatter(&fmt_x).y_label_formatter(&fmt_y);
        describe_axes(&mut mesh, Some("year"), "Niño3.4 roll12");
        mesh.draw()?;
    }

    chart
        .draw_series(LineSeries::new(actual.iter().copied(), ACTUAL_COLOR.stroke_width(2)))?
        .label("actual")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ACTUAL_COLOR));
    chart.draw_series(actual.iter().map(|&p| Circle::new(p, 3, ACTUAL_COLOR.filled())))?;

    chart
        .draw_series(LineSeries::new(predicted.iter().copied(), PREDICTED_COLOR.stroke_width(2)))?
        .label("predicted")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], PREDICTED_COLOR));
    chart.draw_series(predicted.iter().map(|&p| Circle::new(p, 3, PREDICTED_COLOR.filled())))?;

    if DRAW_TEXT {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    Ok(())
}

fn draw_scatter_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    predictions: &[PredictionRecord],
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    // Same range on both axes so the identity line is the diagonal.
    let (lo, hi) = padded_range(predictions.iter().flat_map(|p| [p.actual, p.predicted]));

    let fmt = |v: &f64| format!("{v:.2}");

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40);
    if DRAW_TEXT {
        builder.caption("Predicted vs actual", ("sans-serif", 20));
    }
    let mut chart = builder.build_cartesian_2d(lo..hi, lo..hi)?;

    {
        let mut mesh = chart.configure_mesh();
        mesh.x_label_formatter(&fmt).y_label_formatter(&fmt);
        describe_axes(&mut mesh, Some("actual"), "predicted");
        mesh.draw()?;
    }

    chart.draw_series(LineSeries::new([(lo, lo), (hi, hi)], BLACK.mix(0.5)))?;
    chart.draw_series(
        predictions
            .iter()
            .map(|p| Circle::new((p.actual, p.predicted), 4, ACTUAL_COLOR.filled())),
    )?;

    Ok(())
}

fn draw_importance_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    importances: &[ImportanceRecord],
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let n = importances.len().max(1);
    let top = importances
        .iter()
        .map(|r| r.importance)
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    let y1 = if top > 0.0 { top * 1.1 } else { 1.0 };

    let fmt_bar = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(i) => importances
            .get(*i)
            .map(|r| r.feature.clone())
            .unwrap_or_default(),
        _ => String::new(),
    };
    let fmt_y = |v: &f64| format!("{v:.2}");

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40);
    if DRAW_TEXT {
        builder.caption("Feature importance", ("sans-serif", 20));
    }
    let mut chart = builder.build_cartesian_2d((0..n).into_segmented(), 0.0..y1)?;

    {
        let mut mesh = chart.configure_mesh();
        mesh.disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&fmt_bar)
            .y_label_formatter(&fmt_y);
        describe_axes(&mut mesh, None, "importance");
        mesh.draw()?;
    }

    chart.draw_series(importances.iter().enumerate().map(|(i, r)| {
        let height = if r.importance.is_finite() { r.importance.max(0.0) } else { 0.0 };
        Rectangle::new(
            [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), height)],
            BAR_COLOR.filled(),
        )
    }))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn predictions() -> Vec<PredictionRecord> {
        (1..=6)
            .map(|m| {
                let date = NaiveDate::from_ymd_opt(2005, m, 1).unwrap();
                PredictionRecord::new(date, m as f64 * 0.1, m as f64 * 0.12)
            })
            .collect()
    }

    fn importances() -> Vec<ImportanceRecord> {
        vec![
            ImportanceRecord {
                feature: "sst_c_roll12_lag1".to_string(),
                importance: 0.6,
            },
            ImportanceRecord {
                feature: "sst_c_roll12_lag2".to_string(),
                importance: 0.4,
            },
        ]
    }

    #[test]
    fn writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fig.png");

        render_prediction_figure(&path, &predictions(), &importances()).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn single_point_and_zero_importances_still_render() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fig.png");
        let all = predictions();
        let one = &all[..1];
        let zero = vec![ImportanceRecord {
            feature: "sst_c_roll12_lag1".to_string(),
            importance: 0.0,
        }];

        render_prediction_figure(&path, one, &zero).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn missing_directory_is_output_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("fig.png");
        let err = render_prediction_figure(&path, &predictions(), &importances()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_OUTPUT);
    }
}
