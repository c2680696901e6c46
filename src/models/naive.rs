//! Naive (random walk) model, optionally with drift.
//!
//! The naive method forecasts the last observed value for all future
//! periods, with forecast variance growing linearly in the horizon.

use super::traits::{Estimator, GenerateOptions, ModelFit, SimulatedPaths};
use crate::core::TimeSeries;
use crate::distribution::{Dist, Distribution};
use crate::error::{ForecastError, Result};
use crate::specials::Specials;
use crate::utils::Innovations;
use std::sync::Arc;

/// Random walk estimator.
#[derive(Debug, Clone, Default)]
pub struct Naive {
    drift: bool,
}

impl Naive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Random walk with a drift estimated from the first and last observations.
    pub fn with_drift() -> Self {
        Self { drift: true }
    }
}

impl Estimator for Naive {
    fn name(&self) -> &str {
        if self.drift {
            "RW w/ drift"
        } else {
            "Naive"
        }
    }

    fn estimate(&self, y: &[f64], _specials: &Specials) -> Result<Arc<dyn ModelFit>> {
        Ok(Arc::new(NaiveFit::fit(y, self.drift, self.name())?))
    }
}

/// Fitted random walk.
#[derive(Debug, Clone)]
pub struct NaiveFit {
    name: String,
    last_value: f64,
    drift: Option<f64>,
    sigma: f64,
    n: usize,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
}

impl NaiveFit {
    fn fit(values: &[f64], with_drift: bool, name: &str) -> Result<Self> {
        let n = values.len();
        let last_value = *values.last().ok_or(ForecastError::EmptyData)?;
        if with_drift && n < 2 {
            return Err(ForecastError::InsufficientData { needed: 2, got: n });
        }

        let drift = with_drift.then(|| (last_value - values[0]) / (n - 1) as f64);
        let step = drift.unwrap_or(0.0);

        // Fitted values are shifted history (y_hat[t] = y[t-1] + drift)
        let fitted: Vec<f64> = std::iter::once(f64::NAN)
            .chain(values.windows(2).map(|w| w[0] + step))
            .collect();
        let residuals: Vec<f64> = values
            .iter()
            .zip(&fitted)
            .map(|(y, f)| y - f)
            .collect();

        let valid: Vec<f64> = residuals.iter().copied().filter(|r| !r.is_nan()).collect();
        let df = valid.len().saturating_sub(usize::from(with_drift)).max(1);
        let sigma = if valid.is_empty() {
            0.0
        } else {
            (valid.iter().map(|r| r * r).sum::<f64>() / df as f64).sqrt()
        };

        Ok(Self {
            name: name.to_string(),
            last_value,
            drift,
            sigma,
            n,
            fitted,
            residuals,
        })
    }

    pub fn last_value(&self) -> f64 {
        self.last_value
    }

    pub fn drift(&self) -> Option<f64> {
        self.drift
    }

    /// Residual standard deviation.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    fn standard_error(&self, h: usize) -> f64 {
        let h = h as f64;
        let base = self.sigma * h.sqrt();
        match self.drift {
            // Drift estimation error adds h/(n-1) to the variance factor
            Some(_) => base * (1.0 + h / (self.n - 1) as f64).sqrt(),
            None => base,
        }
    }
}

impl ModelFit for NaiveFit {
    fn name(&self) -> &str {
        &self.name
    }

    fn forecast(&self, future: &TimeSeries, _specials: &Specials, _times: usize) -> Result<Distribution> {
        let step = self.drift.unwrap_or(0.0);
        let elements = (1..=future.len())
            .map(|h| Dist::normal(self.last_value + step * h as f64, self.standard_error(h)))
            .collect();
        Ok(Distribution::new(elements))
    }

    fn generate(
        &self,
        future: &TimeSeries,
        _specials: &Specials,
        options: &GenerateOptions,
    ) -> Result<SimulatedPaths> {
        let horizon = future.len();
        let mut paths = SimulatedPaths::with_capacity(horizon * options.times);
        if horizon == 0 {
            return Ok(paths);
        }

        let innovations =
            Innovations::from_residuals(&self.residuals, options.bootstrap, options.block_size)?;
        let step = self.drift.unwrap_or(0.0);
        let mut rng = options.rng();

        for replicate in 0..options.times {
            let mut level = self.last_value;
            for (t, e) in future
                .timestamps()
                .iter()
                .zip(innovations.draw(horizon, &mut rng))
            {
                level += step + e;
                paths.push(*t, replicate, level);
            }
        }
        Ok(paths)
    }

    fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    fn residuals(&self) -> &[f64] {
        &self.residuals
    }
}
