//! Resolving a forecast horizon into a table of future time points.

use crate::core::{Interval, TimeSeries};
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Months, Utc};
use std::str::FromStr;
use tracing::warn;

/// How far ahead to forecast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Horizon {
    /// A number of steps at the data's interval.
    Periods(usize),
    /// A calendar duration such as `"3 years"` or `"2 weeks"`.
    Duration(String),
}

impl From<usize> for Horizon {
    fn from(periods: usize) -> Self {
        Horizon::Periods(periods)
    }
}

impl From<&str> for Horizon {
    fn from(text: &str) -> Self {
        Horizon::Duration(text.to_string())
    }
}

/// A parsed calendar duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarSpan {
    Months(u32),
    Seconds(i64),
}

impl FromStr for CalendarSpan {
    type Err = ForecastError;

    /// Parse `<count> <unit>`, e.g. `"3 years"`, `"1 quarter"`, `"12h"`.
    fn from_str(text: &str) -> Result<Self> {
        let text = text.trim();
        let split = text
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(text.len());
        let (count, unit) = text.split_at(split);
        let count: u32 = count.parse().map_err(|_| {
            ForecastError::Config(format!("invalid horizon `{text}`: expected `<count> <unit>`"))
        })?;
        let unit = unit.trim().to_ascii_lowercase();

        let seconds = |per_unit: i64| CalendarSpan::Seconds(i64::from(count) * per_unit);
        Ok(match unit.as_str() {
            "year" | "years" | "yr" | "yrs" | "y" => CalendarSpan::Months(count.saturating_mul(12)),
            "quarter" | "quarters" | "q" => CalendarSpan::Months(count.saturating_mul(3)),
            "month" | "months" | "mon" | "mons" => CalendarSpan::Months(count),
            "week" | "weeks" | "wk" | "wks" | "w" => seconds(7 * 86_400),
            "day" | "days" | "d" => seconds(86_400),
            "hour" | "hours" | "hr" | "hrs" | "h" => seconds(3_600),
            "minute" | "minutes" | "min" | "mins" | "m" => seconds(60),
            "second" | "seconds" | "sec" | "secs" | "s" | "" => seconds(1),
            other => {
                return Err(ForecastError::Config(format!(
                    "invalid horizon `{text}`: unknown unit `{other}`"
                )))
            }
        })
    }
}

impl Horizon {
    /// Number of steps of `interval` covered by this horizon, counted from
    /// `last`.
    ///
    /// Partial steps round up, so the horizon is always fully covered.
    pub fn periods(&self, interval: Interval, last: DateTime<Utc>) -> Result<usize> {
        let span = match self {
            Horizon::Periods(n) => return Ok(*n),
            Horizon::Duration(text) => text.parse::<CalendarSpan>()?,
        };

        let steps = match (span, interval) {
            (CalendarSpan::Months(total), Interval::Months(step) | Interval::MonthEnds(step)) => {
                f64::from(total) / f64::from(step)
            }
            (CalendarSpan::Months(total), Interval::Fixed(_)) => {
                let end = last.checked_add_months(Months::new(total)).ok_or_else(|| {
                    ForecastError::TimestampError(format!("{last} + {total} months overflows"))
                })?;
                (end - last).num_seconds() as f64 / interval.approx_seconds()
            }
            (CalendarSpan::Seconds(total), _) => total as f64 / interval.approx_seconds(),
        };

        if !steps.is_finite() || steps < 0.0 {
            return Err(ForecastError::Config(format!(
                "horizon does not translate into a number of periods: {steps}"
            )));
        }
        Ok((steps - 1e-9).ceil().max(0.0) as usize)
    }
}

/// Produce the future table a forecast is computed for.
///
/// Explicit `future_data` takes precedence over `horizon`; supplying both
/// logs a warning. With only a horizon, the table continues the fitting
/// data's index at its (possibly inferred) interval and has no columns.
pub fn resolve_future(
    horizon: Option<&Horizon>,
    future_data: Option<&TimeSeries>,
    data: &TimeSeries,
) -> Result<TimeSeries> {
    match (future_data, horizon) {
        (Some(future), horizon) => {
            if horizon.is_some() {
                warn!("forecast `horizon` will be ignored as `future_data` has been provided");
            }
            Ok(future.clone())
        }
        (None, Some(horizon)) => {
            let last = data.last_timestamp().ok_or_else(|| {
                ForecastError::Config("cannot extend an empty fitting sample".to_string())
            })?;
            let interval = data
                .resolve_interval()
                .map_err(|e| ForecastError::Config(format!("cannot resolve horizon: {e}")))?;
            let periods = horizon.periods(interval, last)?;

            let index = (1..=periods)
                .map(|step| {
                    let step = u32::try_from(step).map_err(|_| {
                        ForecastError::Config(format!("horizon of {periods} periods is too long"))
                    })?;
                    interval.advance(last, step)
                })
                .collect::<Result<Vec<_>>>()?;
            TimeSeries::index_only(index)
        }
        (None, None) => Err(ForecastError::Config(
            "either a forecast horizon or future data must be provided".to_string(),
        )),
    }
}
