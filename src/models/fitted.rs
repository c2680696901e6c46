//! A model estimated on a response, together with everything needed to
//! forecast it: fitting data, recorded transformations and specials.

use super::traits::{Estimator, GenerateOptions, ModelFit, SimulatedPaths};
use crate::core::{Interrupt, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::specials::{Specials, SpecialsEvaluator, SpecialsScope, Stage, TermEvaluator};
use crate::transform::{bind_transformation, Transformation};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Transient evaluation state of a model.
///
/// Populated only for the duration of a specials evaluation.
#[derive(Debug, Default)]
struct EvaluationState {
    stage: Option<Stage>,
    covariates: Option<TimeSeries>,
}

/// Restores [`EvaluationState`] when dropped, whether evaluation succeeded,
/// failed or unwound.
struct StageGuard<'a> {
    state: &'a mut EvaluationState,
}

impl<'a> StageGuard<'a> {
    fn enter(state: &'a mut EvaluationState, stage: Stage, covariates: &TimeSeries) -> Self {
        state.stage = Some(stage);
        state.covariates = Some(covariates.clone());
        Self { state }
    }

    fn covariates(&self) -> Option<&TimeSeries> {
        self.state.covariates.as_ref()
    }
}

impl Drop for StageGuard<'_> {
    fn drop(&mut self) {
        self.state.stage = None;
        self.state.covariates = None;
    }
}

/// A fitted model ready to forecast.
///
/// The model may be shared between threads (`Arc<FittedModel>`). Specials
/// evaluation temporarily switches the model into a stage and binds the
/// covariates it is evaluated against; that section is serialized per
/// model and always reverted afterwards.
#[derive(Debug)]
pub struct FittedModel {
    data: TimeSeries,
    response: Vec<String>,
    transformation: Vec<Transformation>,
    fit: Arc<dyn ModelFit>,
    evaluator: Arc<dyn SpecialsEvaluator>,
    state: Mutex<EvaluationState>,
}

impl FittedModel {
    /// Wrap an estimated fit.
    ///
    /// `transformation` holds one entry per response variable.
    pub fn new(
        data: TimeSeries,
        response: Vec<String>,
        transformation: Vec<Transformation>,
        fit: Arc<dyn ModelFit>,
    ) -> Result<Self> {
        if response.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "a model needs at least one response variable".to_string(),
            ));
        }
        if transformation.len() != response.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: response.len(),
                got: transformation.len(),
            });
        }

        Ok(Self {
            data,
            response,
            transformation,
            fit,
            evaluator: Arc::new(TermEvaluator::default()),
            state: Mutex::new(EvaluationState::default()),
        })
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn SpecialsEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Estimate a univariate model on `response`, fitted on the
    /// transformed scale.
    ///
    /// # Example
    ///
    /// ```
    /// use anofox_distcast::core::TimeSeries;
    /// use anofox_distcast::models::{FittedModel, Naive};
    /// use anofox_distcast::transform::Transformation;
    /// use chrono::{Duration, TimeZone, Utc};
    ///
    /// let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    /// let idx = (0..4).map(|i| base + Duration::days(i)).collect();
    /// let data = TimeSeries::univariate(idx, vec![1.0, 2.0, 4.0, 8.0]).unwrap();
    ///
    /// let model = FittedModel::estimate(data, "value", Transformation::log(), &Naive::new()).unwrap();
    /// assert_eq!(model.name(), "Naive");
    /// ```
    pub fn estimate(
        data: TimeSeries,
        response: &str,
        transformation: Transformation,
        estimator: &dyn Estimator,
    ) -> Result<Self> {
        let binding = bind_transformation(&transformation, &data)?;
        let y = data
            .column(response)?
            .iter()
            .enumerate()
            .map(|(row, y)| Ok(binding.for_row(row)?.forward(*y)))
            .collect::<Result<Vec<f64>>>()?;

        let evaluator = Arc::new(TermEvaluator::new(estimator.terms()));
        let interrupt = Interrupt::new();
        let specials =
            evaluator.evaluate(&SpecialsScope::new(Stage::Estimate, &data, &data, &interrupt))?;
        let fit = estimator.estimate(&y, &specials)?;
        debug!(model = estimator.name(), rows = y.len(), "estimated model");

        Ok(Self::new(data, vec![response.to_string()], vec![transformation], fit)?
            .with_evaluator(evaluator))
    }

    pub fn name(&self) -> &str {
        self.fit.name()
    }

    /// The data the model was fitted on.
    pub fn data(&self) -> &TimeSeries {
        &self.data
    }

    pub fn response(&self) -> &[String] {
        &self.response
    }

    /// Recorded transformations, one per response.
    pub fn transformation(&self) -> &[Transformation] {
        &self.transformation
    }

    pub fn fit(&self) -> &dyn ModelFit {
        self.fit.as_ref()
    }

    /// Stage the model is currently evaluating in, if any.
    pub fn stage(&self) -> Option<Stage> {
        self.state.lock().stage
    }

    /// Whether covariates are currently bound to the model.
    pub fn has_bound_covariates(&self) -> bool {
        self.state.lock().covariates.is_some()
    }

    /// Evaluate the model's specials against `covariates` in `stage`.
    ///
    /// Concurrent evaluations on the same model are serialized. Stage and
    /// bound covariates are reverted on every exit path.
    pub fn evaluate_specials(
        &self,
        stage: Stage,
        covariates: &TimeSeries,
        interrupt: &Interrupt,
    ) -> Result<Specials> {
        interrupt.check()?;
        let mut state = self.state.lock();
        let guard = StageGuard::enter(&mut state, stage, covariates);
        let bound = guard.covariates().unwrap_or(covariates);
        let specials = self
            .evaluator
            .evaluate(&SpecialsScope::new(stage, bound, &self.data, interrupt));
        drop(guard);
        drop(state);

        interrupt.check()?;
        specials
    }

    /// Simulate future sample paths on the response scale.
    ///
    /// Paths are simulated on the model scale and mapped back through the
    /// recorded transformation bound against `future`.
    pub fn generate(
        &self,
        future: &TimeSeries,
        options: &GenerateOptions,
        interrupt: &Interrupt,
    ) -> Result<SimulatedPaths> {
        let [_] = self.response.as_slice() else {
            return Err(ForecastError::InvalidParameter(format!(
                "simulation supports a single response variable, model has {}",
                self.response.len()
            )));
        };

        let specials = self
            .evaluate_specials(Stage::Generate, future, interrupt)
            .map_err(ForecastError::specials)?;
        let binding = bind_transformation(&self.transformation[0], future)
            .map_err(ForecastError::specials)?;
        let mut paths = self.fit.generate(future, &specials, options)?;
        interrupt.check()?;

        let rows = row_positions(future);
        let index = paths.index().to_vec();
        for (t, value) in index.iter().zip(paths.values_mut()) {
            let row = row_of(&rows, t)?;
            *value = binding.for_row(row)?.inverse(*value);
        }
        Ok(paths)
    }
}

/// Map each timestamp of `table` to its row.
pub(crate) fn row_positions(table: &TimeSeries) -> HashMap<DateTime<Utc>, usize> {
    table
        .timestamps()
        .iter()
        .enumerate()
        .map(|(row, t)| (*t, row))
        .collect()
}

pub(crate) fn row_of(rows: &HashMap<DateTime<Utc>, usize>, t: &DateTime<Utc>) -> Result<usize> {
    rows.get(t).copied().ok_or_else(|| {
        ForecastError::ComputationError(format!("simulated path at {t} is outside the future data"))
    })
}
