//! TimeSeries data structure for representing temporal data.
//!
//! A `TimeSeries` is an ordered time index plus named numeric columns. The
//! same structure holds the data a model was fitted on and the future
//! covariate table a forecast is produced for; the latter may have no
//! columns at all, or no rows.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, Months, Utc};
use std::collections::HashMap;

/// Spacing between consecutive observations of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    /// A fixed elapsed duration (hourly, daily, weekly, ...).
    Fixed(Duration),
    /// A whole number of calendar months (monthly, quarterly, yearly).
    Months(u32),
    /// Calendar months, with every observation stamped on the last day of
    /// its month.
    MonthEnds(u32),
}

impl Interval {
    /// Timestamp `steps` intervals after `from`.
    pub fn advance(&self, from: DateTime<Utc>, steps: u32) -> Result<DateTime<Utc>> {
        let next = match *self {
            Interval::Fixed(step) => i32::try_from(steps)
                .ok()
                .and_then(|steps| step.checked_mul(steps))
                .and_then(|offset| from.checked_add_signed(offset)),
            Interval::Months(months) => months
                .checked_mul(steps)
                .and_then(|total| from.checked_add_months(Months::new(total))),
            Interval::MonthEnds(months) => months
                .checked_mul(steps)
                .and_then(|total| month_end_after(from, total)),
        };
        next.ok_or_else(|| {
            ForecastError::TimestampError(format!(
                "cannot advance {from} by {steps} steps of {self:?}"
            ))
        })
    }

    /// Approximate length of one interval in seconds.
    ///
    /// Calendar months count as 30.4375 days.
    pub fn approx_seconds(&self) -> f64 {
        match *self {
            Interval::Fixed(step) => step.num_seconds() as f64,
            Interval::Months(months) | Interval::MonthEnds(months) => {
                months as f64 * 30.4375 * 86_400.0
            }
        }
    }
}

fn is_month_end(ts: DateTime<Utc>) -> bool {
    use chrono::Datelike;

    ts.checked_add_signed(Duration::days(1))
        .is_some_and(|next| next.month() != ts.month())
}

/// Last day of the month `months` after the month of `from`, keeping the
/// time of day.
fn month_end_after(from: DateTime<Utc>, months: u32) -> Option<DateTime<Utc>> {
    use chrono::Datelike;

    from.with_day(1)?
        .checked_add_months(Months::new(months.checked_add(1)?))?
        .checked_sub_signed(Duration::days(1))
}

/// A time series with timestamps and named value columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    /// Values stored in column-major format: values[column][observation]
    values: Vec<Vec<f64>>,
    labels: Vec<String>,
    interval: Option<Interval>,
}

/// Builder for constructing TimeSeries.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesBuilder {
    timestamps: Vec<DateTime<Utc>>,
    columns: Vec<(String, Vec<f64>)>,
    interval: Option<Interval>,
}

impl TimeSeriesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timestamps(mut self, timestamps: Vec<DateTime<Utc>>) -> Self {
        self.timestamps = timestamps;
        self
    }

    pub fn column(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.columns.push((name.into(), values));
        self
    }

    pub fn interval(mut self, interval: Interval) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn build(self) -> Result<TimeSeries> {
        let mut ts = TimeSeries::new(self.timestamps, self.columns)?;
        ts.interval = self.interval;
        Ok(ts)
    }
}

impl TimeSeries {
    /// Create a new TimeSeries from timestamps and named columns.
    pub fn new(timestamps: Vec<DateTime<Utc>>, columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        // Validate timestamps are strictly increasing
        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(ForecastError::TimestampError(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }

        let mut labels = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());
        for (name, column) in columns {
            if column.len() != timestamps.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: timestamps.len(),
                    got: column.len(),
                });
            }
            if labels.contains(&name) {
                return Err(ForecastError::InvalidParameter(format!(
                    "duplicate column '{name}'"
                )));
            }
            labels.push(name);
            values.push(column);
        }

        Ok(Self {
            timestamps,
            values,
            labels,
            interval: None,
        })
    }

    /// Create a simple univariate time series with a single `value` column.
    pub fn univariate(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        Self::new(timestamps, vec![("value".to_string(), values)])
    }

    /// Create a series holding only a time index.
    pub fn index_only(timestamps: Vec<DateTime<Utc>>) -> Result<Self> {
        Self::new(timestamps, Vec::new())
    }

    /// Return a copy with an additional column.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if values.len() != self.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.len(),
                got: values.len(),
            });
        }
        if self.has_column(&name) {
            return Err(ForecastError::InvalidParameter(format!(
                "duplicate column '{name}'"
            )));
        }
        self.labels.push(name);
        self.values.push(values);
        Ok(self)
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Get timestamps.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Last observed timestamp.
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    /// Column names in order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l == name)
    }

    /// Get values for a named column.
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.labels
            .iter()
            .position(|l| l == name)
            .map(|i| self.values[i].as_slice())
            .ok_or_else(|| ForecastError::MissingVariable(name.to_string()))
    }

    /// Iterate over (name, values) pairs in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Vec::as_slice))
    }

    /// Values of every column at one observation, keyed by column name.
    pub fn row_context(&self, index: usize) -> Result<HashMap<String, f64>> {
        if index >= self.len() {
            return Err(ForecastError::IndexOutOfBounds {
                index,
                size: self.len(),
            });
        }
        Ok(self
            .columns()
            .map(|(name, values)| (name.to_string(), values[index]))
            .collect())
    }

    /// Explicitly recorded interval, if any.
    pub fn interval(&self) -> Option<Interval> {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Interval) {
        self.interval = Some(interval);
    }

    /// Recorded interval, or one inferred from the timestamps.
    pub fn resolve_interval(&self) -> Result<Interval> {
        match self.interval {
            Some(interval) => Ok(interval),
            None => self.infer_interval(0.5),
        }
    }

    /// Infer the interval from timestamps.
    ///
    /// Series whose consecutive timestamps are all a fixed number of
    /// calendar months apart get a `Months` interval; otherwise the modal
    /// spacing is used, provided at least `tolerance` of the gaps share it.
    pub fn infer_interval(&self, tolerance: f64) -> Result<Interval> {
        if self.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: self.len(),
            });
        }

        if let Some(interval) = self.calendar_months_step() {
            return Ok(interval);
        }

        // Calculate all differences
        let diffs: Vec<i64> = self
            .timestamps
            .windows(2)
            .map(|w| (w[1] - w[0]).num_seconds())
            .collect();

        // Find modal (most common) difference; ties prefer the smaller step
        let mut counts: HashMap<i64, usize> = HashMap::new();
        for &diff in &diffs {
            *counts.entry(diff).or_insert(0) += 1;
        }

        let (modal_diff, modal_count) = counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(&diff, &count)| (diff, count))
            .ok_or(ForecastError::FrequencyInference(
                "empty spacing data".to_string(),
            ))?;

        let modal_ratio = modal_count as f64 / diffs.len() as f64;
        if modal_ratio < tolerance {
            return Err(ForecastError::FrequencyInference(
                "no unique modal spacing found".to_string(),
            ));
        }

        Ok(Interval::Fixed(Duration::seconds(modal_diff)))
    }

    fn calendar_months_step(&self) -> Option<Interval> {
        use chrono::Datelike;

        let month_index = |ts: &DateTime<Utc>| ts.year() * 12 + ts.month() as i32;
        let months = month_index(&self.timestamps[1]) - month_index(&self.timestamps[0]);
        if months <= 0 {
            return None;
        }
        let same_step = self.timestamps.windows(2).all(|w| {
            month_index(&w[1]) - month_index(&w[0]) == months && w[0].time() == w[1].time()
        });
        if !same_step {
            return None;
        }

        let months = months as u32;
        if self.timestamps.iter().all(|ts| is_month_end(*ts)) {
            Some(Interval::MonthEnds(months))
        } else if self
            .timestamps
            .windows(2)
            .all(|w| w[0].day() == w[1].day())
        {
            Some(Interval::Months(months))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_timestamps(n: usize) -> Vec<DateTime<Utc>> {
        (0..n)
            .map(|i| Utc.with_ymd_and_hms(2024, 1, 1, i as u32, 0, 0).unwrap())
            .collect()
    }

    fn make_monthly_timestamps(n: usize) -> Vec<DateTime<Utc>> {
        (0..n)
            .map(|i| {
                Utc.with_ymd_and_hms(2020 + (i / 12) as i32, (i % 12) as u32 + 1, 1, 0, 0, 0)
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn time_series_constructs_named_columns() {
        let ts = TimeSeriesBuilder::new()
            .timestamps(make_timestamps(3))
            .column("y", vec![1.0, 2.0, 3.0])
            .column("x", vec![4.0, 5.0, 6.0])
            .build()
            .unwrap();

        assert_eq!(ts.len(), 3);
        assert_eq!(ts.labels(), &["y", "x"]);
        assert_eq!(ts.column("x").unwrap(), &[4.0, 5.0, 6.0]);
        assert_eq!(
            ts.column("z"),
            Err(ForecastError::MissingVariable("z".to_string()))
        );

        let ctx = ts.row_context(1).unwrap();
        assert_eq!(ctx["y"], 2.0);
        assert_eq!(ctx["x"], 5.0);
    }

    #[test]
    fn time_series_validates_constructor_input() {
        let result = TimeSeries::new(make_timestamps(3), vec![("y".to_string(), vec![1.0])]);
        assert!(matches!(
            result,
            Err(ForecastError::DimensionMismatch { expected: 3, got: 1 })
        ));

        let result = TimeSeries::new(
            make_timestamps(2),
            vec![
                ("y".to_string(), vec![1.0, 2.0]),
                ("y".to_string(), vec![1.0, 2.0]),
            ],
        );
        assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
    }

    #[test]
    fn time_series_rejects_non_increasing_timestamps() {
        let timestamps = vec![
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap(),
        ];
        let result = TimeSeries::univariate(timestamps, vec![1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(ForecastError::TimestampError(_))));
    }

    #[test]
    fn empty_series_is_valid() {
        let ts = TimeSeries::index_only(vec![]).unwrap();
        assert!(ts.is_empty());
        assert!(ts.last_timestamp().is_none());
        assert!(ts.row_context(0).is_err());
    }

    #[test]
    fn infers_fixed_interval() {
        let ts = TimeSeries::univariate(make_timestamps(5), vec![1.0; 5]).unwrap();
        assert_eq!(
            ts.infer_interval(0.5).unwrap(),
            Interval::Fixed(Duration::hours(1))
        );
    }

    #[test]
    fn infers_calendar_interval() {
        let ts = TimeSeries::univariate(make_monthly_timestamps(14), vec![1.0; 14]).unwrap();
        assert_eq!(ts.infer_interval(0.5).unwrap(), Interval::Months(1));

        let quarterly: Vec<_> = (0..6)
            .map(|i| {
                Utc.with_ymd_and_hms(2021 + (i / 4), (i % 4) as u32 * 3 + 1, 1, 0, 0, 0)
                    .unwrap()
            })
            .collect();
        let ts = TimeSeries::univariate(quarterly, vec![1.0; 6]).unwrap();
        assert_eq!(ts.infer_interval(0.5).unwrap(), Interval::Months(3));
    }

    #[test]
    fn infer_interval_needs_two_points() {
        let ts = TimeSeries::univariate(make_timestamps(1), vec![1.0]).unwrap();
        assert!(matches!(
            ts.infer_interval(0.5),
            Err(ForecastError::InsufficientData { needed: 2, got: 1 })
        ));
    }

    #[test]
    fn recorded_interval_takes_precedence() {
        let mut ts = TimeSeries::univariate(make_timestamps(3), vec![1.0; 3]).unwrap();
        ts.set_interval(Interval::Fixed(Duration::minutes(30)));
        assert_eq!(
            ts.resolve_interval().unwrap(),
            Interval::Fixed(Duration::minutes(30))
        );
    }

    #[test]
    fn interval_advances_on_the_calendar() {
        let jan = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let apr = Interval::Months(3).advance(jan, 1).unwrap();
        assert_eq!(apr, Utc.with_ymd_and_hms(2023, 4, 1, 0, 0, 0).unwrap());

        let day = Interval::Fixed(Duration::days(1)).advance(jan, 3).unwrap();
        assert_eq!(day, Utc.with_ymd_and_hms(2023, 1, 4, 0, 0, 0).unwrap());
    }

    fn month_ends(start_year: i32, start_month: u32, step: u32, n: usize) -> Vec<DateTime<Utc>> {
        let first = Utc.with_ymd_and_hms(start_year, start_month, 1, 0, 0, 0).unwrap();
        (0..n as u32)
            .map(|i| month_end_after(first, i * step).unwrap())
            .collect()
    }

    #[test]
    fn month_end_series_keep_month_end_steps() {
        let ts = TimeSeries::univariate(month_ends(2020, 1, 1, 24), vec![1.0; 24]).unwrap();
        let interval = ts.infer_interval(0.5).unwrap();
        assert_eq!(interval, Interval::MonthEnds(1));

        let last = ts.last_timestamp().unwrap();
        assert_eq!(last, Utc.with_ymd_and_hms(2021, 12, 31, 0, 0, 0).unwrap());
        let next: Vec<_> = (1..=3).map(|k| interval.advance(last, k).unwrap()).collect();
        assert_eq!(
            next,
            vec![
                Utc.with_ymd_and_hms(2022, 1, 31, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2022, 2, 28, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2022, 3, 31, 0, 0, 0).unwrap(),
            ]
        );
    }

    #[test]
    fn quarterly_month_end_series_keep_month_end_steps() {
        let ts = TimeSeries::univariate(month_ends(2021, 1, 3, 8), vec![1.0; 8]).unwrap();
        let interval = ts.infer_interval(0.5).unwrap();
        assert_eq!(interval, Interval::MonthEnds(3));

        let last = ts.last_timestamp().unwrap();
        assert_eq!(last, Utc.with_ymd_and_hms(2022, 10, 31, 0, 0, 0).unwrap());
        assert_eq!(
            interval.advance(last, 1).unwrap(),
            Utc.with_ymd_and_hms(2023, 1, 31, 0, 0, 0).unwrap()
        );
        assert_eq!(
            interval.advance(last, 2).unwrap(),
            Utc.with_ymd_and_hms(2023, 4, 30, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn mixed_days_of_month_are_not_calendar_regular() {
        let idx = vec![
            Utc.with_ymd_and_hms(2020, 1, 5, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 2, 9, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 3, 5, 0, 0, 0).unwrap(),
        ];
        let ts = TimeSeries::univariate(idx, vec![1.0; 3]).unwrap();
        assert!(!matches!(
            ts.infer_interval(0.0),
            Ok(Interval::Months(_) | Interval::MonthEnds(_))
        ));
    }

    #[test]
    fn oversized_fixed_advance_is_an_error() {
        let jan = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            Interval::Fixed(Duration::seconds(1)).advance(jan, u32::MAX),
            Err(ForecastError::TimestampError(_))
        ));
    }
}
