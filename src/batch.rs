//! Forecasting every cell of a model table.
//!
//! A [`ModelTable`] holds one row per key (e.g. one series of a panel) and
//! one column per model specification. Each cell is forecast independently
//! and the per-cell tables are stacked into a [`BatchForecast`] carrying
//! key and model columns.

use crate::core::{distribution_name, ForecastTable, Interval, TimeSeries};
use crate::distribution::Distribution;
use crate::error::{ForecastError, Result};
use crate::forecast::{forecast, ForecastOptions, Horizon};
use crate::models::FittedModel;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Fitted models by key and model name.
///
/// The same [`FittedModel`] may appear in several cells.
#[derive(Debug, Clone, Default)]
pub struct ModelTable {
    model_names: Vec<String>,
    keys: Vec<String>,
    rows: Vec<Vec<Arc<FittedModel>>>,
}

impl ModelTable {
    pub fn new<I, S>(model_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            model_names: model_names.into_iter().map(Into::into).collect(),
            keys: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Append a key with one model per model column.
    pub fn add_row(&mut self, key: impl Into<String>, models: Vec<Arc<FittedModel>>) -> Result<()> {
        let key = key.into();
        if models.len() != self.model_names.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.model_names.len(),
                got: models.len(),
            });
        }
        if self.keys.contains(&key) {
            return Err(ForecastError::InvalidParameter(format!("duplicate key `{key}`")));
        }
        self.keys.push(key);
        self.rows.push(models);
        Ok(())
    }

    pub fn with_row(mut self, key: impl Into<String>, models: Vec<Arc<FittedModel>>) -> Result<Self> {
        self.add_row(key, models)?;
        Ok(self)
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn model_names(&self) -> &[String] {
        &self.model_names
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, key: &str, model: &str) -> Option<&Arc<FittedModel>> {
        let row = self.keys.iter().position(|k| k == key)?;
        let col = self.model_names.iter().position(|m| m == model)?;
        self.rows.get(row)?.get(col)
    }

    /// Cells in row-major order: every model of the first key, then the next.
    pub fn cells(&self) -> impl Iterator<Item = Cell<'_>> {
        self.keys.iter().zip(&self.rows).flat_map(move |(key, models)| {
            self.model_names
                .iter()
                .zip(models)
                .map(move |(model_name, model)| Cell {
                    key,
                    model_name,
                    model,
                })
        })
    }
}

/// One (key, model) cell of a [`ModelTable`].
#[derive(Debug, Clone, Copy)]
pub struct Cell<'a> {
    pub key: &'a str,
    pub model_name: &'a str,
    pub model: &'a Arc<FittedModel>,
}

/// Where each key's future time points come from.
#[derive(Debug, Clone, Default)]
pub enum FutureInput {
    /// The horizon or future data of the [`ForecastOptions`].
    #[default]
    Shared,
    /// Future data per key; keys without an entry use the shared options.
    PerKeyData(HashMap<String, TimeSeries>),
    /// Horizon per key; keys without an entry use the shared options.
    PerKeyHorizon(HashMap<String, Horizon>),
}

impl FutureInput {
    fn options_for(&self, key: &str, shared: &ForecastOptions) -> ForecastOptions {
        let mut options = shared.clone();
        match self {
            FutureInput::Shared => {}
            FutureInput::PerKeyData(map) => {
                if let Some(future) = map.get(key) {
                    options.future_data = Some(future.clone());
                }
            }
            FutureInput::PerKeyHorizon(map) => {
                if let Some(horizon) = map.get(key) {
                    options.horizon = Some(horizon.clone());
                    options.future_data = None;
                }
            }
        }
        options
    }
}

/// How cells are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    #[default]
    Sequential,
    /// Cells run on a rayon pool, the global one unless a thread count is given.
    Parallel { threads: Option<usize> },
}

/// Stacked forecasts of every cell of a model table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchForecast {
    key: Vec<String>,
    model: Vec<String>,
    index: Vec<DateTime<Utc>>,
    distribution: Distribution,
    distribution_name: String,
    point: Vec<(String, Vec<f64>)>,
    covariates: Vec<(String, Vec<f64>)>,
    response: Vec<String>,
    interval: Option<Interval>,
}

impl BatchForecast {
    /// Stack per-cell tables in order.
    ///
    /// Table metadata (response, interval, point column names) comes from
    /// the first table. Covariates missing from a cell are filled with NaN.
    pub fn from_tables(tables: Vec<(String, String, ForecastTable)>) -> Self {
        let Some((_, _, first)) = tables.first() else {
            return Self::default();
        };
        let total: usize = tables.iter().map(|(_, _, t)| t.len()).sum();

        let response = first.response().to_vec();
        let interval = first.interval();
        let point_names: Vec<String> = first.point_columns().iter().map(|(n, _)| n.clone()).collect();
        let mut covariate_names: Vec<String> = Vec::new();
        for (_, _, table) in &tables {
            for (name, _) in table.covariates() {
                if !covariate_names.contains(name) {
                    covariate_names.push(name.clone());
                }
            }
        }

        let mut key = Vec::with_capacity(total);
        let mut model = Vec::with_capacity(total);
        let mut index = Vec::with_capacity(total);
        let mut point: Vec<(String, Vec<f64>)> = point_names
            .into_iter()
            .map(|n| (n, Vec::with_capacity(total)))
            .collect();
        let mut covariates: Vec<(String, Vec<f64>)> = covariate_names
            .into_iter()
            .map(|n| (n, Vec::with_capacity(total)))
            .collect();
        let mut parts = Vec::with_capacity(tables.len());

        for (cell_key, cell_model, table) in tables {
            let n = table.len();
            key.extend(std::iter::repeat(cell_key).take(n));
            model.extend(std::iter::repeat(cell_model).take(n));
            index.extend_from_slice(table.index());
            for (name, values) in point.iter_mut() {
                match table.point(name) {
                    Some(column) => values.extend_from_slice(column),
                    None => values.extend(std::iter::repeat(f64::NAN).take(n)),
                }
            }
            for (name, values) in covariates.iter_mut() {
                match table.covariate(name) {
                    Some(column) => values.extend_from_slice(column),
                    None => values.extend(std::iter::repeat(f64::NAN).take(n)),
                }
            }
            parts.push(table.distribution().clone());
        }

        Self {
            key,
            model,
            index,
            distribution: Distribution::concat(&parts),
            distribution_name: distribution_name(&response),
            point,
            covariates,
            response,
            interval,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Key column.
    pub fn key(&self) -> &[String] {
        &self.key
    }

    /// Model name column.
    pub fn model(&self) -> &[String] {
        &self.model
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    pub fn distribution_name(&self) -> &str {
        &self.distribution_name
    }

    pub fn point(&self, name: &str) -> Option<&[f64]> {
        self.point
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn point_columns(&self) -> &[(String, Vec<f64>)] {
        &self.point
    }

    pub fn covariate(&self, name: &str) -> Option<&[f64]> {
        self.covariates
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn response(&self) -> &[String] {
        &self.response
    }

    pub fn interval(&self) -> Option<Interval> {
        self.interval
    }

    /// Row positions belonging to one cell.
    pub fn rows_for(&self, key: &str, model: &str) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| self.key[i] == key && self.model[i] == model)
            .collect()
    }
}

/// Forecast every cell of `table`.
///
/// A failing cell fails the whole call; the error names the cell. In
/// parallel mode, cancellation wins over any other failure and otherwise
/// the first failing cell in table order is reported.
pub fn forecast_table(
    table: &ModelTable,
    options: &ForecastOptions,
    future: &FutureInput,
    execution: Execution,
) -> Result<BatchForecast> {
    options.interrupt.check()?;
    let cells: Vec<Cell<'_>> = table.cells().collect();
    debug!(cells = cells.len(), ?execution, "forecasting model table");

    let run = |cell: &Cell<'_>| -> Result<(String, String, ForecastTable)> {
        options.interrupt.check()?;
        let cell_options = future.options_for(cell.key, options);
        let forecast = forecast(cell.model, &cell_options)
            .map_err(|e| e.in_cell(cell.key, cell.model_name))?;
        Ok((cell.key.to_string(), cell.model_name.to_string(), forecast))
    };

    let tables = match execution {
        Execution::Sequential => cells.iter().map(run).collect::<Result<Vec<_>>>()?,
        Execution::Parallel { threads } => {
            let results: Vec<Result<_>> = match threads {
                Some(threads) => rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| ForecastError::ComputationError(e.to_string()))?
                    .install(|| cells.par_iter().map(run).collect()),
                None => cells.par_iter().map(run).collect(),
            };
            collect_parallel(results)?
        }
    };
    Ok(BatchForecast::from_tables(tables))
}

fn collect_parallel<T>(results: Vec<Result<T>>) -> Result<Vec<T>> {
    if results
        .iter()
        .any(|r| matches!(r, Err(e) if e.is_cancelled()))
    {
        return Err(ForecastError::Cancelled);
    }
    results.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LinearModel, Naive};
    use crate::specials::SpecialTerm;
    use crate::transform::Transformation;
    use chrono::{Duration, TimeZone};

    fn series(offset: f64) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let idx = (0..8).map(|i| base + Duration::days(i)).collect();
        let values = (0..8).map(|i| offset + (i % 3) as f64).collect();
        TimeSeries::univariate(idx, values).unwrap()
    }

    fn model(offset: f64) -> Arc<FittedModel> {
        Arc::new(
            FittedModel::estimate(series(offset), "value", Transformation::identity(), &Naive::new())
                .unwrap(),
        )
    }

    fn table() -> ModelTable {
        ModelTable::new(["naive"])
            .with_row("a", vec![model(10.0)])
            .unwrap()
            .with_row("b", vec![model(50.0)])
            .unwrap()
    }

    #[test]
    fn stacks_cells_in_table_order() {
        let batch = forecast_table(
            &table(),
            &ForecastOptions::with_horizon(2),
            &FutureInput::Shared,
            Execution::Sequential,
        )
        .unwrap();

        assert_eq!(batch.len(), 4);
        assert_eq!(batch.key(), &["a", "a", "b", "b"]);
        assert_eq!(batch.model(), &["naive"; 4]);
        assert_eq!(batch.rows_for("b", "naive"), vec![2, 3]);
        assert_eq!(batch.distribution_name(), "value");
    }

    #[test]
    fn parallel_matches_sequential() {
        let options = ForecastOptions::with_horizon(3);
        let sequential =
            forecast_table(&table(), &options, &FutureInput::Shared, Execution::Sequential).unwrap();
        let parallel = forecast_table(
            &table(),
            &options,
            &FutureInput::Shared,
            Execution::Parallel { threads: Some(2) },
        )
        .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn per_key_horizon_overrides_shared() {
        let mut horizons = HashMap::new();
        horizons.insert("b".to_string(), Horizon::Periods(5));
        let batch = forecast_table(
            &table(),
            &ForecastOptions::with_horizon(1),
            &FutureInput::PerKeyHorizon(horizons),
            Execution::Sequential,
        )
        .unwrap();
        assert_eq!(batch.rows_for("a", "naive").len(), 1);
        assert_eq!(batch.rows_for("b", "naive").len(), 5);
    }

    #[test]
    fn failing_cell_is_named() {
        let lm = Arc::new(
            FittedModel::estimate(
                series(1.0)
                    .with_column("price", (0..8).map(|i| 0.5 * i as f64).collect())
                    .unwrap(),
                "value",
                Transformation::identity(),
                &LinearModel::new(vec![SpecialTerm::Xreg(vec!["price".into()])]),
            )
            .unwrap(),
        );
        let table = ModelTable::new(["lm"]).with_row("x", vec![lm]).unwrap();

        let err = forecast_table(
            &table,
            &ForecastOptions::with_horizon(2),
            &FutureInput::Shared,
            Execution::Parallel { threads: None },
        )
        .unwrap_err();
        match err {
            ForecastError::Cell { key, model, source } => {
                assert_eq!((key.as_str(), model.as_str()), ("x", "lm"));
                assert!(matches!(*source, ForecastError::SpecialsEvaluation { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn cancellation_is_not_attributed_to_a_cell() {
        let options = ForecastOptions::with_horizon(2);
        options.interrupt.trigger();
        let err = forecast_table(
            &table(),
            &options,
            &FutureInput::Shared,
            Execution::Parallel { threads: None },
        )
        .unwrap_err();
        assert_eq!(err, ForecastError::Cancelled);
    }

    #[test]
    fn table_rejects_ragged_rows() {
        let mut table = ModelTable::new(["a", "b"]);
        assert!(table.add_row("k", vec![model(1.0)]).is_err());
        assert!(table.add_row("k", vec![model(1.0), model(2.0)]).is_ok());
        assert!(table.add_row("k", vec![model(1.0), model(2.0)]).is_err());
        assert!(table.get("k", "b").is_some());
    }
}
