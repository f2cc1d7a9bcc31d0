//! PNG figures (plotters bitmap backend).
//!
//! - `figure`: the three-panel prediction figure written by `run`
//! - `trends`: rolling SST / ENSO over time written by `summary`
//!
//! Plot code only draws; every series and bound is computed by the callers or
//! by the small helpers below.
//!
//! Text needs the `fonts` feature (on by default). Plotters panics on the first
//! caption or tick label when no font backend is compiled in, so without it the
//! renderers skip every text element and draw geometry only.

use chrono::{Datelike, NaiveDate};
use plotters::chart::MeshStyle;
use plotters::coord::ranged1d::Ranged;
use plotters::prelude::DrawingBackend;

use crate::error::AppError;

pub mod figure;
pub mod trends;

pub use figure::*;
pub use trends::*;

/// Whether captions, tick labels, axis descriptions and legends are drawn.
pub const DRAW_TEXT: bool = cfg!(feature = "fonts");

/// Month as a fractional year (`2001-07` -> `2001.5`), used as the time axis.
pub fn decimal_year(date: NaiveDate) -> f64 {
    date.year() as f64 + (date.month0() as f64) / 12.0
}

/// Axis bounds covering every finite value with 5% padding.
///
/// Degenerate inputs still give a drawable range: no finite values -> `0..1`,
/// a single distinct value -> `v - 0.5 .. v + 0.5`.
pub fn padded_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if hi - lo <= f64::EPSILON * lo.abs().max(1.0) {
        return (lo - 0.5, hi + 0.5);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

/// Set axis descriptions, or drop every tick label when text is off.
pub(crate) fn describe_axes<X: Ranged, Y: Ranged, DB: DrawingBackend>(
    mesh: &mut MeshStyle<'_, '_, X, Y, DB>,
    x_desc: Option<&str>,
    y_desc: &str,
) {
    if !DRAW_TEXT {
        mesh.disable_axes();
        return;
    }
    if let Some(x_desc) = x_desc {
        mesh.x_desc(x_desc);
    }
    mesh.y_desc(y_desc);
}

pub(crate) fn render_error(path: &std::path::Path, e: impl std::fmt::Display) -> AppError {
    AppError::output(format!("Failed to render figure '{}': {e}", path.display()))
}
