//! Tree-ensemble regression models.
//!
//! - `tree`: a single CART regression tree (MSE impurity)
//! - `forest`: bagged trees with averaged predictions and importances

pub mod forest;
pub mod tree;

pub use forest::*;
pub use tree::*;
