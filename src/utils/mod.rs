//! Numerical helpers shared by the distributions and reference models.

pub mod bootstrap;
pub mod ols;
pub mod stats;

pub use bootstrap::{resample_blocks, resample_residuals, Innovations};
pub use ols::{ols_fit, OLSResult};
