//! Linear regression on evaluated special terms.

use super::traits::{Estimator, GenerateOptions, ModelFit, SimulatedPaths};
use crate::core::TimeSeries;
use crate::distribution::{Dist, Distribution};
use crate::error::{ForecastError, Result};
use crate::specials::{SpecialTerm, Specials};
use crate::utils::{ols_fit, Innovations, OLSResult};
use std::sync::Arc;

/// Regression of the response on trend, season and exogenous terms.
///
/// # Example
///
/// ```
/// use anofox_distcast::models::{Estimator, LinearModel};
/// use anofox_distcast::specials::SpecialTerm;
///
/// let model = LinearModel::new(vec![SpecialTerm::Trend, SpecialTerm::Season(4)]);
/// assert_eq!(model.terms().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LinearModel {
    terms: Vec<SpecialTerm>,
}

impl LinearModel {
    pub fn new(terms: Vec<SpecialTerm>) -> Self {
        Self { terms }
    }
}

impl Estimator for LinearModel {
    fn name(&self) -> &str {
        "LM"
    }

    fn terms(&self) -> Vec<SpecialTerm> {
        self.terms.clone()
    }

    fn estimate(&self, y: &[f64], specials: &Specials) -> Result<Arc<dyn ModelFit>> {
        Ok(Arc::new(LinearFit::fit(y, specials)?))
    }
}

/// Fitted linear regression.
#[derive(Debug, Clone)]
pub struct LinearFit {
    ols: OLSResult,
    sigma: f64,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
}

impl LinearFit {
    fn fit(y: &[f64], specials: &Specials) -> Result<Self> {
        if y.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if specials.rows() != y.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: y.len(),
                got: specials.rows(),
            });
        }

        let ols = ols_fit(y, specials.columns())?;
        let fitted = ols.predict(specials.columns(), y.len())?;
        let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(a, f)| a - f).collect();

        let df = y.len().saturating_sub(ols.num_regressors() + 1);
        let sse: f64 = residuals.iter().map(|r| r * r).sum();
        let sigma = if df > 0 { (sse / df as f64).sqrt() } else { 0.0 };

        Ok(Self {
            ols,
            sigma,
            fitted,
            residuals,
        })
    }

    pub fn coefficients(&self) -> &OLSResult {
        &self.ols
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    fn mean(&self, future: &TimeSeries, specials: &Specials) -> Result<Vec<f64>> {
        if specials.rows() != future.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: future.len(),
                got: specials.rows(),
            });
        }
        self.ols.predict(specials.columns(), future.len())
    }
}

impl ModelFit for LinearFit {
    fn name(&self) -> &str {
        "LM"
    }

    fn forecast(&self, future: &TimeSeries, specials: &Specials, _times: usize) -> Result<Distribution> {
        let mean = self.mean(future, specials)?;
        let leverage = self.ols.leverage(specials.columns(), future.len())?;
        let elements = mean
            .iter()
            .zip(&leverage)
            .map(|(m, lev)| Dist::normal(*m, self.sigma * (1.0 + lev).sqrt()))
            .collect();
        Ok(Distribution::new(elements))
    }

    fn generate(
        &self,
        future: &TimeSeries,
        specials: &Specials,
        options: &GenerateOptions,
    ) -> Result<SimulatedPaths> {
        let mean = self.mean(future, specials)?;
        let mut paths = SimulatedPaths::with_capacity(mean.len() * options.times);
        if mean.is_empty() {
            return Ok(paths);
        }

        let innovations =
            Innovations::from_residuals(&self.residuals, options.bootstrap, options.block_size)?;
        let mut rng = options.rng();
        for replicate in 0..options.times {
            let draws = innovations.draw(mean.len(), &mut rng);
            for ((t, m), e) in future.timestamps().iter().zip(&mean).zip(draws) {
                paths.push(*t, replicate, m + e);
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
