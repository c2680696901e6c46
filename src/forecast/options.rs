//! Configuration of a forecast call.

use super::horizon::Horizon;
use super::point::PointForecastSpec;
use crate::core::{Interrupt, TimeSeries};
use crate::models::GenerateOptions;

/// Options controlling how forecasts are produced.
///
/// # Example
///
/// ```
/// use anofox_distcast::forecast::ForecastOptions;
///
/// let options = ForecastOptions::with_horizon(12).simulate(true).with_times(1000).with_seed(42);
/// assert!(options.simulate);
/// assert_eq!(options.times, 1000);
/// ```
#[derive(Debug, Clone)]
pub struct ForecastOptions {
    /// Forecast horizon; ignored when `future_data` is supplied.
    pub horizon: Option<Horizon>,
    /// Explicit future time points and covariates.
    pub future_data: Option<TimeSeries>,
    /// Build forecast distributions from simulated sample paths.
    pub simulate: bool,
    /// Simulate with bootstrapped residuals (implies `simulate`).
    pub bootstrap: bool,
    /// Number of sample paths for simulation.
    pub times: usize,
    /// Block length for the moving block bootstrap.
    pub block_size: Option<usize>,
    /// Point forecast summaries to add as columns.
    pub point_forecast: PointForecastSpec,
    /// Random seed for reproducible simulation.
    pub seed: Option<u64>,
    /// Cancellation flag polled while forecasting.
    pub interrupt: Interrupt,
}

impl Default for ForecastOptions {
    fn default() -> Self {
        Self {
            horizon: None,
            future_data: None,
            simulate: false,
            bootstrap: false,
            times: 5000,
            block_size: None,
            point_forecast: PointForecastSpec::mean_only(),
            seed: None,
            interrupt: Interrupt::new(),
        }
    }
}

impl ForecastOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_horizon(horizon: impl Into<Horizon>) -> Self {
        Self {
            horizon: Some(horizon.into()),
            ..Default::default()
        }
    }

    pub fn with_future_data(future: TimeSeries) -> Self {
        Self {
            future_data: Some(future),
            ..Default::default()
        }
    }

    pub fn horizon(mut self, horizon: impl Into<Horizon>) -> Self {
        self.horizon = Some(horizon.into());
        self
    }

    pub fn future_data(mut self, future: TimeSeries) -> Self {
        self.future_data = Some(future);
        self
    }

    pub fn simulate(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }

    pub fn bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn with_times(mut self, times: usize) -> Self {
        self.times = times;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = Some(block_size);
        self
    }

    pub fn with_point_forecast(mut self, spec: PointForecastSpec) -> Self {
        self.point_forecast = spec;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Whether forecasts are built from sample paths.
    pub fn uses_simulation(&self) -> bool {
        self.simulate || self.bootstrap
    }

    /// Path simulation settings derived from these options.
    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            times: self.times,
            bootstrap: self.bootstrap,
            block_size: self.block_size,
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let options = ForecastOptions::default();
        assert_eq!(options.times, 5000);
        assert!(!options.uses_simulation());
        assert_eq!(options.point_forecast.names(), vec!["mean"]);
    }

    #[test]
    fn bootstrap_implies_simulation() {
        let options = ForecastOptions::with_horizon(3).bootstrap(true).with_seed(1);
        assert!(options.uses_simulation());
        let generate = options.generate_options();
        assert!(generate.bootstrap);
        assert_eq!(generate.seed, Some(1));
    }
}
