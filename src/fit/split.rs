//! Seeded random train/test partition.
//!
//! This is an ordinary shuffled split, not a time-aware one: test rows are
//! scattered through the series.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::domain::TrainTestSplit;
use crate::error::AppError;

/// Number of rows held out for `n` rows at `test_size`, clamped so neither side is empty.
pub fn test_count(n: usize, test_size: f64) -> usize {
    let raw = (n as f64 * test_size).round() as usize;
    raw.clamp(1, n.saturating_sub(1).max(1))
}

/// Partition `0..n` into disjoint train/test index sets.
///
/// Both sets are returned in ascending order so downstream tables stay in date order.
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> Result<TrainTestSplit, AppError> {
    if !(test_size.is_finite() && test_size > 0.0 && test_size < 1.0) {
        return Err(AppError::input(format!(
            "Test size must be strictly between 0 and 1, got {test_size}."
        )));
    }
    if n < 2 {
        return Err(AppError::data(format!(
            "Need at least 2 rows to split into train and test sets, got {n}."
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let n_test = test_count(n, test_size);
    let mut test = order[..n_test].to_vec();
    let mut train = order[n_test..].to_vec();
    test.sort_unstable();
    train.sort_unstable();

    Ok(TrainTestSplit { train, test })
}
