//! `sst-ml` library crate.
//!
//! The binary (`sst-ml`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes
//! - each stage (load, smooth/join, lag, fit, write) can be used on its own

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod transform;
