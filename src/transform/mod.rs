//! Series transforms: rolling smoothing, month join, lag features.

pub mod lags;
pub mod tidy;

pub use lags::*;
pub use tidy::*;
