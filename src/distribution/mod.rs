//! Forecast distributions.
//!
//! A [`Distribution`] is a column of per-row [`Dist`] values, one for each
//! future time point, labelled with the response dimension name(s) it
//! describes.
//!
//! # Example
//!
//! ```
//! use anofox_distcast::distribution::{Dist, Distribution};
//!
//! let fc = Distribution::new(vec![Dist::normal(10.0, 2.0), Dist::normal(11.0, 2.5)])
//!     .with_dimnames(vec!["sales".to_string()]);
//! assert_eq!(fc.len(), 2);
//! assert_eq!(fc.mean(), vec![10.0, 11.0]);
//! ```

mod element;

pub use element::{Dist, DistKind};

use crate::error::{ForecastError, Result};
use rand::Rng;

/// Per-row forecast distributions with response dimension labels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Distribution {
    elements: Vec<Dist>,
    dimnames: Vec<String>,
}

impl Distribution {
    pub fn new(elements: Vec<Dist>) -> Self {
        Self {
            elements,
            dimnames: Vec::new(),
        }
    }

    /// Gaussian rows from parallel mean and standard deviation vectors.
    pub fn normal(means: &[f64], sds: &[f64]) -> Result<Self> {
        if means.len() != sds.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: means.len(),
                got: sds.len(),
            });
        }
        Ok(Self::new(
            means
                .iter()
                .zip(sds)
                .map(|(&m, &s)| Dist::normal(m, s))
                .collect(),
        ))
    }

    /// Sample-based rows, one set of draws per row.
    pub fn from_samples(samples: Vec<Vec<f64>>) -> Self {
        Self::new(samples.into_iter().map(Dist::Sample).collect())
    }

    /// Attach response dimension names.
    pub fn with_dimnames(mut self, dimnames: Vec<String>) -> Self {
        self.dimnames = dimnames;
        self
    }

    pub fn dimnames(&self) -> &[String] {
        &self.dimnames
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[Dist] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<Dist> {
        self.elements
    }

    pub fn get(&self, row: usize) -> Option<&Dist> {
        self.elements.get(row)
    }

    /// Representation of the column.
    ///
    /// A column is sample-based only if every row is.
    pub fn kind(&self) -> DistKind {
        if !self.elements.is_empty() && self.elements.iter().all(Dist::is_sample) {
            DistKind::Sample
        } else {
            DistKind::Analytical
        }
    }

    /// Number of response dimensions, from the labels or the first row.
    pub fn dimensions(&self) -> usize {
        if !self.dimnames.is_empty() {
            return self.dimnames.len();
        }
        self.elements.first().map(Dist::dimensions).unwrap_or(1)
    }

    /// Map every row, passing its position, into a new distribution.
    ///
    /// Dimension labels carry over.
    pub fn map<F>(&self, mut f: F) -> Result<Distribution>
    where
        F: FnMut(usize, &Dist) -> Result<Dist>,
    {
        let elements = self
            .elements
            .iter()
            .enumerate()
            .map(|(row, d)| f(row, d))
            .collect::<Result<Vec<_>>>()?;
        Ok(Distribution {
            elements,
            dimnames: self.dimnames.clone(),
        })
    }

    /// Concatenate rows positionally; labels come from the first part.
    pub fn concat(parts: &[Distribution]) -> Distribution {
        let dimnames = parts
            .first()
            .map(|p| p.dimnames.clone())
            .unwrap_or_default();
        let elements = parts
            .iter()
            .flat_map(|p| p.elements.iter().cloned())
            .collect();
        Distribution { elements, dimnames }
    }

    /// One dimension of a multi-response distribution.
    pub fn marginal(&self, dimension: usize) -> Result<Distribution> {
        let elements = self
            .elements
            .iter()
            .map(|d| d.marginal(dimension).cloned())
            .collect::<Result<Vec<_>>>()?;
        let dimnames = self
            .dimnames
            .get(dimension)
            .map(|n| vec![n.clone()])
            .unwrap_or_default();
        Ok(Distribution { elements, dimnames })
    }

    pub fn mean(&self) -> Vec<f64> {
        self.elements.iter().map(Dist::mean).collect()
    }

    pub fn median(&self) -> Vec<f64> {
        self.elements.iter().map(Dist::median).collect()
    }

    pub fn variance(&self) -> Vec<f64> {
        self.elements.iter().map(Dist::variance).collect()
    }

    pub fn quantile(&self, p: f64) -> Vec<f64> {
        self.elements.iter().map(|d| d.quantile(p)).collect()
    }

    pub fn cdf(&self, x: f64) -> Vec<f64> {
        self.elements.iter().map(|d| d.cdf(x)).collect()
    }

    pub fn density(&self, x: f64) -> Vec<f64> {
        self.elements.iter().map(|d| d.density(x)).collect()
    }

    /// Central prediction intervals covering `level`.
    pub fn hilo(&self, level: f64) -> Vec<(f64, f64)> {
        self.elements.iter().map(|d| d.hilo(level)).collect()
    }

    /// Draw `n` values from every row.
    pub fn sample<R: Rng>(&self, n: usize, rng: &mut R) -> Result<Vec<Vec<f64>>> {
        self.elements.iter().map(|d| d.sample(n, rng)).collect()
    }
}
