//! Lag-feature construction.
//!
//! The model predicts the smoothed ENSO index from the smoothed SST of the
//! preceding months: row `i` gets `sst_roll[i-1] .. sst_roll[i-n]` as features
//! and `enso_roll[i]` as the target.

use crate::domain::{JoinedRecord, LaggedDataset, LaggedRecord, SeriesKind};
use crate::error::AppError;

/// Feature name for lag `k` (1-based), e.g. `sst_c_roll12_lag1`.
pub fn lag_feature_name(k: usize) -> String {
    format!("{}_lag{k}", SeriesKind::Sst.rolling_column())
}

/// Build the lagged dataset. Rows without `n_lags` predecessors are dropped.
pub fn build_lagged(joined: &[JoinedRecord], n_lags: usize) -> Result<LaggedDataset, AppError> {
    if n_lags == 0 {
        return Err(AppError::input("Lag count must be >= 1."));
    }
    if joined.len() <= n_lags {
        return Err(AppError::data(format!(
            "Insufficient rows for {n_lags} lags: {} joined months (need at least {}).",
            joined.len(),
            n_lags + 1
        )));
    }

    let rows = (n_lags..joined.len())
        .map(|i| LaggedRecord {
            date: joined[i].date,
            target: joined[i].enso_roll,
            features: (1..=n_lags).map(|k| joined[i - k].sst_roll).collect(),
        })
        .collect();

    Ok(LaggedDataset {
        feature_names: (1..=n_lags).map(lag_feature_name).collect(),
        target_name: SeriesKind::Enso.rolling_column(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Months, NaiveDate};

    fn joined(n: usize) -> Vec<JoinedRecord> {
        let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        (0..n)
            .map(|i| JoinedRecord {
                date: start.checked_add_months(Months::new(i as u32)).unwrap(),
                sst: 0.0,
                sst_roll: i as f64,
                enso: 0.0,
                enso_roll: 100.0 + i as f64,
            })
            .collect()
    }

    #[test]
    fn row_count_and_feature_order() {
        let data = build_lagged(&joined(13), 3).unwrap();
        assert_eq!(data.len(), 10);
        assert_eq!(data.feature_names, vec!["sst_c_roll12_lag1", "sst_c_roll12_lag2", "sst_c_roll12_lag3"]);
        assert_eq!(data.target_name, "nino34_roll12");

        let first = &data.rows[0];
        assert_eq!(first.target, 103.0);
        assert_eq!(first.features, vec![2.0, 1.0, 0.0]);

        for (offset, row) in data.rows.iter().enumerate() {
            let i = offset + 3;
            assert_eq!(row.features, vec![(i - 1) as f64, (i - 2) as f64, (i - 3) as f64]);
        }
    }

    #[test]
    fn dates_follow_input_order() {
        let input = joined(8);
        let data = build_lagged(&input, 2).unwrap();
        let dates: Vec<_> = data.rows.iter().map(|r| r.date).collect();
        let expected: Vec<_> = input[2..].iter().map(|r| r.date).collect();
        assert_eq!(dates, expected);
    }

    #[test]
    fn too_few_rows_is_data_error() {
        let err = build_lagged(&joined(3), 3).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_DATA);
    }

    #[test]
    fn zero_lags_rejected() {
        assert_eq!(build_lagged(&joined(5), 0).unwrap_err().exit_code(), crate::error::EXIT_INPUT);
    }
}
