//! Model stage.
//!
//! - `split`: seeded random train/test partition
//! - `fitter`: fit the forest, predict the test rows, collect importances

pub mod fitter;
pub mod split;

pub use fitter::*;
pub use split::*;
