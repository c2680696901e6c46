//! Forecast result table for a single fitted model.

use super::time_series::{Interval, TimeSeries};
use crate::distribution::Distribution;
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};

/// Name of the distribution column when a model has several responses.
pub const MULTIVARIATE_DISTRIBUTION_NAME: &str = "distribution";

/// Forecasts for one model, one row per future time point.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastTable {
    index: Vec<DateTime<Utc>>,
    distribution: Distribution,
    distribution_name: String,
    point: Vec<(String, Vec<f64>)>,
    covariates: Vec<(String, Vec<f64>)>,
    response: Vec<String>,
    interval: Option<Interval>,
}

impl ForecastTable {
    /// Assemble a table aligned with the rows of `future`.
    ///
    /// The future table's columns are carried along as covariates.
    pub fn new(
        future: &TimeSeries,
        distribution: Distribution,
        point: Vec<(String, Vec<f64>)>,
        response: Vec<String>,
        interval: Option<Interval>,
    ) -> Result<Self> {
        let n = future.len();
        if distribution.len() != n {
            return Err(ForecastError::DimensionMismatch {
                expected: n,
                got: distribution.len(),
            });
        }
        if let Some((_, col)) = point.iter().find(|(_, col)| col.len() != n) {
            return Err(ForecastError::DimensionMismatch {
                expected: n,
                got: col.len(),
            });
        }

        Ok(Self {
            index: future.timestamps().to_vec(),
            distribution,
            distribution_name: distribution_name(&response),
            point,
            covariates: future
                .columns()
                .map(|(name, values)| (name.to_string(), values.to_vec()))
                .collect(),
            response,
            interval,
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Future time index.
    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    /// Column name the distribution is published under.
    pub fn distribution_name(&self) -> &str {
        &self.distribution_name
    }

    /// Point forecast column by name.
    pub fn point(&self, name: &str) -> Option<&[f64]> {
        self.point
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// All point forecast columns in declaration order.
    pub fn point_columns(&self) -> &[(String, Vec<f64>)] {
        &self.point
    }

    pub fn covariate(&self, name: &str) -> Option<&[f64]> {
        self.covariates
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn covariates(&self) -> &[(String, Vec<f64>)] {
        &self.covariates
    }

    /// Response variable names the distribution describes.
    pub fn response(&self) -> &[String] {
        &self.response
    }

    pub fn interval(&self) -> Option<Interval> {
        self.interval
    }

    /// Central prediction intervals of each row.
    pub fn hilo(&self, level: f64) -> Vec<(f64, f64)> {
        self.distribution.hilo(level)
    }
}

/// Distribution column name for a response set.
pub fn distribution_name(response: &[String]) -> String {
    match response {
        [single] => single.clone(),
        _ => MULTIVARIATE_DISTRIBUTION_NAME.to_string(),
    }
}
