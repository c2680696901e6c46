//! # anofox-distcast
//!
//! Probabilistic forecasting for fitted time series models.
//!
//! Given a fitted model and a forecast horizon (or explicit future data),
//! produces a table of forecast distributions on the original response
//! scale, with point forecast summaries alongside. Transformations applied
//! to the response before fitting are inverted automatically, including
//! transformations that depend on covariates of each future row. Tables of
//! models can be forecast sequentially or in parallel.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::needless_range_loop)]
#![allow(clippy::type_complexity)]

pub mod batch;
pub mod core;
pub mod distribution;
pub mod error;
pub mod forecast;
pub mod models;
pub mod specials;
pub mod transform;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::batch::{forecast_table, BatchForecast, Execution, FutureInput, ModelTable};
    pub use crate::core::{ForecastTable, Interrupt, Interval, TimeSeries};
    pub use crate::distribution::{Dist, Distribution};
    pub use crate::error::{ForecastError, Result};
    pub use crate::forecast::{forecast, ForecastOptions, Horizon, PointForecastSpec};
    pub use crate::models::{Estimator, FittedModel, LinearModel, ModelFit, Naive};
    pub use crate::specials::{SpecialTerm, Stage};
    pub use crate::transform::Transformation;
}
