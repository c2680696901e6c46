//! Special terms: model-side functions of the data that produce regressors.
//!
//! A model's specials are re-evaluated at forecast time against the future
//! covariates, with the fitting data still in scope so that terms such as
//! the trend can continue from where the sample ended.

use crate::core::{Interrupt, TimeSeries};
use crate::error::{ForecastError, Result};
use std::fmt;

/// Stage of the model life cycle a specials evaluation runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Estimate,
    Forecast,
    Generate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Estimate => write!(f, "estimate"),
            Stage::Forecast => write!(f, "forecast"),
            Stage::Generate => write!(f, "generate"),
        }
    }
}

/// A special term declared in a model formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialTerm {
    /// Exogenous regressors taken verbatim from the covariates.
    Xreg(Vec<String>),
    /// Linear time trend counting observations from the start of the sample.
    Trend,
    /// Seasonal dummies for a period of the given length.
    Season(usize),
}

/// Evaluated specials: named regressor columns of equal length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Specials {
    rows: usize,
    columns: Vec<(String, Vec<f64>)>,
}

impl Specials {
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            columns: Vec::new(),
        }
    }

    /// Append a column, rejecting length mismatches and duplicates.
    pub fn push(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if values.len() != self.rows {
            return Err(ForecastError::DimensionMismatch {
                expected: self.rows,
                got: values.len(),
            });
        }
        if self.columns.iter().any(|(n, _)| *n == name) {
            return Err(ForecastError::InvalidParameter(format!(
                "duplicate special column `{name}`"
            )));
        }
        self.columns.push((name, values));
        Ok(())
    }

    /// Number of rows each column holds.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> &[(String, Vec<f64>)] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Everything a specials evaluation can see.
#[derive(Debug, Clone, Copy)]
pub struct SpecialsScope<'a> {
    stage: Stage,
    covariates: &'a TimeSeries,
    data: &'a TimeSeries,
    interrupt: &'a Interrupt,
}

impl<'a> SpecialsScope<'a> {
    pub fn new(
        stage: Stage,
        covariates: &'a TimeSeries,
        data: &'a TimeSeries,
        interrupt: &'a Interrupt,
    ) -> Self {
        Self {
            stage,
            covariates,
            data,
            interrupt,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Rows the specials are evaluated for.
    pub fn covariates(&self) -> &'a TimeSeries {
        self.covariates
    }

    /// The model's fitting data.
    pub fn data(&self) -> &'a TimeSeries {
        self.data
    }

    pub fn interrupt(&self) -> &'a Interrupt {
        self.interrupt
    }

    /// Position of the first evaluated row relative to the start of the sample.
    pub fn offset(&self) -> usize {
        match self.stage {
            Stage::Estimate => 0,
            Stage::Forecast | Stage::Generate => self.data.len(),
        }
    }
}

/// Evaluates a model's specials for a scope.
pub trait SpecialsEvaluator: Send + Sync + fmt::Debug {
    fn evaluate(&self, scope: &SpecialsScope<'_>) -> Result<Specials>;
}

/// Evaluator for a list of declared [`SpecialTerm`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermEvaluator {
    terms: Vec<SpecialTerm>,
}

impl TermEvaluator {
    pub fn new(terms: Vec<SpecialTerm>) -> Self {
        Self { terms }
    }

    pub fn terms(&self) -> &[SpecialTerm] {
        &self.terms
    }
}

impl SpecialsEvaluator for TermEvaluator {
    fn evaluate(&self, scope: &SpecialsScope<'_>) -> Result<Specials> {
        let covariates = scope.covariates();
        let n = covariates.len();
        let offset = scope.offset();
        let mut specials = Specials::new(n);

        for term in &self.terms {
            scope.interrupt().check()?;
            match term {
                SpecialTerm::Xreg(names) => {
                    for name in names {
                        specials.push(name.clone(), covariates.column(name)?.to_vec())?;
                    }
                }
                SpecialTerm::Trend => {
                    let trend = (0..n).map(|i| (offset + i + 1) as f64).collect();
                    specials.push("trend", trend)?;
                }
                SpecialTerm::Season(period) => {
                    if *period < 2 {
                        return Err(ForecastError::InvalidParameter(format!(
                            "season period must be at least 2, got {period}"
                        )));
                    }
                    // First position is the baseline level.
                    for position in 1..*period {
                        let dummy = (0..n)
                            .map(|i| f64::from(u8::from((offset + i) % period == position)))
                            .collect();
                        specials.push(format!("season{}", position + 1), dummy)?;
                    }
                }
            }
        }
        Ok(specials)
    }
}
