//! Rolling SST / ENSO trend chart (dual y-axis).

use std::path::Path;

use plotters::prelude::*;

use crate::domain::JoinedRecord;
use crate::error::AppError;
use crate::plot::{DRAW_TEXT, decimal_year, describe_axes, padded_range, render_error};

pub const TRENDS_SIZE: (u32, u32) = (1200, 500);

const SST_COLOR: RGBColor = RGBColor(214, 39, 40);
const ENSO_COLOR: RGBColor = RGBColor(31, 119, 180);

/// Render `trends.png`: rolling SST on the left axis, rolling Niño 3.4 on the right.
pub fn render_trends_figure(path: &Path, joined: &[JoinedRecord]) -> Result<(), AppError> {
    let sst: Vec<(f64, f64)> = joined.iter().map(|r| (decimal_year(r.date), r.sst_roll)).collect();
    let enso: Vec<(f64, f64)> = joined.iter().map(|r| (decimal_year(r.date), r.enso_roll)).collect();

    let (x0, x1) = padded_range(sst.iter().map(|&(x, _)| x));
    let (s0, s1) = padded_range(sst.iter().map(|&(_, y)| y));
    let (e0, e1) = padded_range(enso.iter().map(|&(_, y)| y));

    let fmt_x = |v: &f64| format!("{v:.0}");
    let fmt_y = |v: &f64| format!("{v:.2}");

    let root = BitMapBackend::new(path, TRENDS_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| render_error(path, e))?;

    let mut builder = ChartBuilder::on(&root);
    builder
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Right, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40);
    if DRAW_TEXT {
        builder.caption("12-month rolling SST and Niño 3.4", ("sans-serif", 22));
    }
    let mut chart = builder
        .build_cartesian_2d(x0..x1, s0..s1)
        .map_err(|e| render_error(path, e))?
        .set_secondary_coord(x0..x1, e0..e1);

    {
        let mut mesh = chart.configure_mesh();
        mesh.x_label_formatter(&fmt_x).y_label_formatter(&fmt_y);
        describe_axes(&mut mesh, Some("year"), "SST roll12 (°C)");
        mesh.draw().map_err(|e| render_error(path, e))?;
    }
    if DRAW_TEXT {
        chart
            .configure_secondary_axes()
            .y_desc("Niño3.4 roll12")
            .y_label_formatter(&fmt_y)
            .draw()
            .map_err(|e| render_error(path, e))?;
    }

    chart
        .draw_series(LineSeries::new(sst, SST_COLOR.stroke_width(2)))
        .map_err(|e| render_error(path, e))?
        .label("SST roll12")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], SST_COLOR));
    chart
        .draw_secondary_series(LineSeries::new(enso, ENSO_COLOR.stroke_width(2)))
        .map_err(|e| render_error(path, e))?
        .label("Niño3.4 roll12")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ENSO_COLOR));

    if DRAW_TEXT {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| render_error(path, e))?;
    }

    root.present().map_err(|e| render_error(path, e))?;
    Ok(())
}
