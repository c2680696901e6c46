//! The forecast pipeline for a single fitted model.
//!
//! 1. [`resolve_future`] turns a horizon or explicit future data into the
//!    table of future time points.
//! 2. [`compute_raw`] produces the model-scale forecast distribution.
//! 3. [`back_transform`] maps it onto the response scale.
//! 4. [`extract_point_forecasts`] adds point summaries.
//!
//! # Example
//!
//! ```
//! use anofox_distcast::core::TimeSeries;
//! use anofox_distcast::forecast::{forecast, ForecastOptions};
//! use anofox_distcast::models::{FittedModel, Naive};
//! use anofox_distcast::transform::Transformation;
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let idx = (0..10).map(|i| base + Duration::days(i)).collect();
//! let values = (0..10).map(|i| 100.0 + i as f64).collect();
//! let data = TimeSeries::univariate(idx, values).unwrap();
//!
//! let model = FittedModel::estimate(data, "value", Transformation::log(), &Naive::new()).unwrap();
//! let table = forecast(&model, &ForecastOptions::with_horizon(5)).unwrap();
//!
//! assert_eq!(table.len(), 5);
//! assert_eq!(table.distribution_name(), "value");
//! assert!(table.point("mean").is_some());
//! ```

pub mod back_transform;
pub mod compute;
pub mod horizon;
mod options;
pub mod point;

pub use back_transform::{back_transform, check_transformations};
pub use compute::compute_raw;
pub use horizon::{resolve_future, CalendarSpan, Horizon};
pub use options::ForecastOptions;
pub use point::{extract_point_forecasts, Aggregator, PointForecastSpec};

use crate::core::ForecastTable;
use crate::error::{ForecastError, Result};
use crate::models::FittedModel;
use crate::transform::bind_transformations;
use tracing::debug;

/// Forecast `model` into a [`ForecastTable`] on the response scale.
pub fn forecast(model: &FittedModel, options: &ForecastOptions) -> Result<ForecastTable> {
    options.interrupt.check()?;
    check_transformations(model.transformation())?;

    let future = resolve_future(
        options.horizon.as_ref(),
        options.future_data.as_ref(),
        model.data(),
    )?;
    debug!(model = model.name(), rows = future.len(), "resolved future data");

    let bindings =
        bind_transformations(model.transformation(), &future).map_err(ForecastError::specials)?;
    let raw = compute_raw(model, &future, options)?;
    let distribution = back_transform(raw, &bindings, model.response())?;
    let point = extract_point_forecasts(&distribution, &options.point_forecast)?;

    ForecastTable::new(
        &future,
        distribution,
        point,
        model.response().to_vec(),
        model.data().resolve_interval().ok(),
    )
}
