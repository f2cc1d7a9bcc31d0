//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw and smoothed series rows (`TimeSeriesRow`, `SmoothedPoint`)
//! - the joined and feature-built tables (`JoinedRecord`, `LaggedDataset`)
//! - model configuration and outputs (`ForestParams`, `PredictionRecord`, etc.)

pub mod types;

pub use types::*;
