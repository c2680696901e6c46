//! Core data structures for probabilistic forecasting.

mod forecast;
mod interrupt;
mod time_series;

pub use forecast::{distribution_name, ForecastTable, MULTIVARIATE_DISTRIBUTION_NAME};
pub use interrupt::Interrupt;
pub use time_series::{Interval, TimeSeries, TimeSeriesBuilder};
