//! Interfaces between the forecast pipeline and model estimators.

use crate::core::TimeSeries;
use crate::distribution::Distribution;
use crate::error::{ForecastError, Result};
use crate::specials::{SpecialTerm, Specials};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::sync::Arc;

/// Configuration for simulating future sample paths.
///
/// # Example
///
/// ```
/// use anofox_distcast::models::GenerateOptions;
///
/// let options = GenerateOptions::new(500).with_bootstrap(true).with_seed(7);
/// assert_eq!(options.times, 500);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    /// Number of sample paths.
    pub times: usize,
    /// Resample fitted residuals instead of drawing Gaussian innovations.
    pub bootstrap: bool,
    /// Block length for the moving block bootstrap.
    pub block_size: Option<usize>,
    /// Random seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            times: 5000,
            bootstrap: false,
            block_size: None,
            seed: None,
        }
    }
}

impl GenerateOptions {
    pub fn new(times: usize) -> Self {
        Self {
            times,
            ..Default::default()
        }
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = Some(block_size);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Random number generator honouring the configured seed.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Simulated future paths in long form: one row per (time point, replicate).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulatedPaths {
    index: Vec<DateTime<Utc>>,
    replicate: Vec<usize>,
    value: Vec<f64>,
}

impl SimulatedPaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: Vec::with_capacity(capacity),
            replicate: Vec::with_capacity(capacity),
            value: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, index: DateTime<Utc>, replicate: usize, value: f64) {
        self.index.push(index);
        self.replicate.push(replicate);
        self.value.push(value);
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn replicate(&self) -> &[usize] {
        &self.replicate
    }

    pub fn values(&self) -> &[f64] {
        &self.value
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.value
    }

    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, usize, f64)> + '_ {
        self.index
            .iter()
            .zip(&self.replicate)
            .zip(&self.value)
            .map(|((t, r), v)| (*t, *r, *v))
    }
}

/// An estimated model, on the transformed (model) scale.
///
/// This trait is object-safe and shared across threads as
/// `Arc<dyn ModelFit>`.
pub trait ModelFit: Send + Sync + fmt::Debug {
    /// Get the model name.
    fn name(&self) -> &str;

    /// Forecast distributions for each row of `future`, on the model scale.
    ///
    /// `times` is the number of draws to use where the model can only
    /// express its forecasts through sampling.
    fn forecast(&self, future: &TimeSeries, specials: &Specials, times: usize)
        -> Result<Distribution>;

    /// Simulate future sample paths on the model scale.
    fn generate(
        &self,
        future: &TimeSeries,
        specials: &Specials,
        options: &GenerateOptions,
    ) -> Result<SimulatedPaths> {
        let _ = (future, specials, options);
        Err(ForecastError::InvalidParameter(format!(
            "model `{}` does not support simulation",
            self.name()
        )))
    }

    /// Get the fitted values (in-sample predictions).
    fn fitted_values(&self) -> &[f64];

    /// Get the residuals (actual - fitted).
    fn residuals(&self) -> &[f64];
}

/// Estimates a [`ModelFit`] from a transformed response and its specials.
pub trait Estimator: Send + Sync {
    fn name(&self) -> &str;

    /// Special terms the model needs evaluated.
    fn terms(&self) -> Vec<SpecialTerm> {
        Vec::new()
    }

    fn estimate(&self, y: &[f64], specials: &Specials) -> Result<Arc<dyn ModelFit>>;
}
