//! Climate summary of the joined, smoothed series.
//!
//! Indicators (all on the 12-month rolling columns):
//! - SST linear trend in °C per decade (time measured in days / 365.25)
//! - mean of the newest 12 months minus the mean of the 12 before, per series
//! - Pearson correlation between rolling SST and rolling ENSO
//! - number of joined months
//!
//! Values are rounded to three decimals; undefined values are `None`.

use crate::domain::{ClimateSummary, JoinedRecord};
use crate::math::{linear_fit, mean, pearson, round_to};

const DAYS_PER_YEAR: f64 = 365.25;

pub fn climate_summary(joined: &[JoinedRecord]) -> ClimateSummary {
    let sst: Vec<f64> = joined.iter().map(|r| r.sst_roll).collect();
    let enso: Vec<f64> = joined.iter().map(|r| r.enso_roll).collect();

    let sst_trend = joined.first().and_then(|first| {
        let t: Vec<f64> = joined
            .iter()
            .map(|r| (r.date - first.date).num_days() as f64 / DAYS_PER_YEAR)
            .collect();
        linear_fit(&t, &sst).map(|(_, per_year)| per_year * 10.0)
    });

    ClimateSummary {
        sst_trend_c_per_decade: sst_trend.map(|v| round_to(v, 3)),
        delta_sst_last_yr_c: delta_last_year(&sst).map(|v| round_to(v, 3)),
        delta_enso_last_yr: delta_last_year(&enso).map(|v| round_to(v, 3)),
        corr_sst_enso_roll: pearson(&sst, &enso).map(|v| round_to(v, 3)),
        n_months: joined.len(),
    }
}

/// Mean of the last 12 values minus the mean of the 12 before them.
pub fn delta_last_year(values: &[f64]) -> Option<f64> {
    if values.len() < 24 {
        return None;
    }
    let n = values.len();
    let last = mean(&values[n - 12..])?;
    let prior = mean(&values[n - 24..n - 12])?;
    Some(last - prior)
}
