//! Smoothing and joining of the two monthly series.
//!
//! Both series are smoothed independently with a trailing rolling mean and then
//! inner-joined on the month. Months without a full window are dropped before the
//! join, so for two series with identical dates the join has `len - (window - 1)`
//! rows.

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{JoinedRecord, ROLLING_WINDOW, SmoothedPoint, TimeSeriesRow};

/// Trailing mean over `window` samples.
///
/// Position `i` is `None` until `window` samples are available.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);

    // Summing each window directly avoids drift from a running sum; series are short.
    (0..values.len())
        .map(|i| {
            (i + 1 >= window).then(|| values[i + 1 - window..=i].iter().sum::<f64>() / window as f64)
        })
        .collect()
}

/// Smooth one (date-sorted) series, keeping only rows with a full window.
pub fn smooth(rows: &[TimeSeriesRow], window: usize) -> Vec<SmoothedPoint> {
    let values: Vec<f64> = rows.iter().map(|r| r.value).collect();
    rolling_mean(&values, window)
        .into_iter()
        .zip(rows)
        .filter_map(|(rolling, row)| {
            rolling.map(|rolling| SmoothedPoint {
                date: row.date,
                value: row.value,
                rolling,
            })
        })
        .collect()
}

/// Inner-join two smoothed series on the month, optionally dropping months before `start`.
///
/// Both inputs must be sorted by date (as produced by `smooth`). The output is
/// sorted by date. No shared months yields an empty vector.
pub fn join_on_month(sst: &[SmoothedPoint], enso: &[SmoothedPoint], start: Option<NaiveDate>) -> Vec<JoinedRecord> {
    let mut out = Vec::with_capacity(sst.len().min(enso.len()));
    let (mut i, mut j) = (0usize, 0usize);

    // Sorted merge: both sides are strictly increasing in date.
    while i < sst.len() && j < enso.len() {
        let (a, b) = (&sst[i], &enso[j]);
        match a.date.cmp(&b.date) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                if start.is_none_or(|s| a.date >= s) {
                    out.push(JoinedRecord {
                        date: a.date,
                        sst: a.value,
                        sst_roll: a.rolling,
                        enso: b.value,
                        enso_roll: b.rolling,
                    });
                }
                i += 1;
                j += 1;
            }
        }
    }

    out
}

/// Smooth both raw series with the standard window and join them.
pub fn tidy_and_join(sst: &[TimeSeriesRow], enso: &[TimeSeriesRow], start: Option<NaiveDate>) -> Vec<JoinedRecord> {
    let sst_smooth = smooth(sst, ROLLING_WINDOW);
    let enso_smooth = smooth(enso, ROLLING_WINDOW);
    let joined = join_on_month(&sst_smooth, &enso_smooth, start);

    debug!(
        sst_smoothed = sst_smooth.len(),
        enso_smoothed = enso_smooth.len(),
        joined = joined.len(),
        "smoothed and joined series"
    );

    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Months;

    fn monthly(start: NaiveDate, values: &[f64]) -> Vec<TimeSeriesRow> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| TimeSeriesRow {
                date: start.checked_add_months(Months::new(i as u32)).unwrap(),
                value,
            })
            .collect()
    }

    fn jan(year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, 1, 1).unwrap()
    }

    #[test]
    fn rolling_mean_window_three() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn smooth_drops_first_eleven() {
        let values: Vec<f64> = (0..20).map(f64::from).collect();
        let rows = monthly(jan(2000), &values);
        let smoothed = smooth(&rows, ROLLING_WINDOW);
        assert_eq!(smoothed.len(), 20 - 11);
        assert_eq!(smoothed[0].date, rows[11].date);
        // mean of 0..=11
        assert!((smoothed[0].rolling - 5.5).abs() < 1e-12);
    }

    #[test]
    fn identical_dates_join_to_overlap_minus_eleven() {
        let sst = monthly(jan(2000), &vec![20.0; 30]);
        let enso = monthly(jan(2000), &vec![0.5; 30]);
        let joined = tidy_and_join(&sst, &enso, None);
        assert_eq!(joined.len(), 30 - 11);
        assert!(joined.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn partial_overlap_joins_on_shared_months_only() {
        let sst = monthly(jan(2000), &vec![20.0; 24]);
        let enso = monthly(jan(2001), &vec![0.5; 24]);
        let joined = tidy_and_join(&sst, &enso, None);
        // ENSO smoothing starts at 2001-12, SST series ends at 2001-12.
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].date, NaiveDate::from_ymd_opt(2001, 12, 1).unwrap());
    }

    #[test]
    fn disjoint_series_join_is_empty() {
        let sst = monthly(jan(1990), &vec![20.0; 24]);
        let enso = monthly(jan(2010), &vec![0.5; 24]);
        assert!(tidy_and_join(&sst, &enso, None).is_empty());
    }

    #[test]
    fn start_filter_is_inclusive() {
        let sst = monthly(jan(2000), &vec![20.0; 36]);
        let enso = monthly(jan(2000), &vec![0.5; 36]);
        let joined = tidy_and_join(&sst, &enso, Some(jan(2002)));
        assert_eq!(joined.len(), 12);
        assert_eq!(joined[0].date, jan(2002));
    }
}
