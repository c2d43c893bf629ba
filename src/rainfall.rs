//! Daily rainfall series and windowed accumulation.
//!
//! Triggers never read raw daily values: a storm's rain lands on two
//! calendar days more often than one, so consumers query the maximum of
//! a two-day rolling sum over a date range. The window for day *d*
//! covers [*d*, *d*+1], truncated at the series tail (a partial window
//! still counts).

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::DateSpan;

/// Which upstream family produced a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RainfallSource {
    /// Forecast-ensemble-derived daily means, one series per issuance.
    ForecastEnsemble,
    /// Satellite-observation-derived daily means, one value per date.
    SatelliteObserved,
}

/// Spatial-mean rainfall over the boundary for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RainfallSample {
    /// Calendar day the accumulation is stamped with.
    pub date: NaiveDate,

    /// Spatial mean over the boundary, in mm.
    pub mean_mm: f64,
}

/// Error constructing a [`RainfallSeries`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RainfallError {
    /// NaN or infinite daily mean.
    #[error("non-finite rainfall value {value} on {date}")]
    NonFiniteValue {
        /// Date carrying the rejected value.
        date: NaiveDate,
        /// The rejected value.
        value: f64,
    },
}

/// A daily rainfall series, sorted and unique by date.
///
/// Gaps are permitted; the rolling window is date-aware, so a missing
/// day simply contributes nothing rather than shifting the window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RainfallSeries {
    samples: Vec<RainfallSample>,
}

impl RainfallSeries {
    /// Builds a series from unordered samples. Later duplicates of the
    /// same date replace earlier ones.
    pub fn new(mut samples: Vec<RainfallSample>) -> Result<Self, RainfallError> {
        for s in &samples {
            if !s.mean_mm.is_finite() {
                return Err(RainfallError::NonFiniteValue {
                    date: s.date,
                    value: s.mean_mm,
                });
            }
        }
        samples.sort_by_key(|s| s.date);
        samples.reverse();
        samples.dedup_by_key(|s| s.date);
        samples.reverse();
        Ok(Self { samples })
    }

    /// The samples in date order.
    #[must_use]
    pub fn samples(&self) -> &[RainfallSample] {
        &self.samples
    }

    /// True when the series holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Date of the most recent sample.
    #[must_use]
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.samples.last().map(|s| s.date)
    }

    /// Samples dated at or before `cutoff`.
    #[must_use]
    pub fn up_to(&self, cutoff: NaiveDate) -> Self {
        Self {
            samples: self
                .samples
                .iter()
                .take_while(|s| s.date <= cutoff)
                .copied()
                .collect(),
        }
    }

    /// Two-day rolling sum: day *d* gets `mean(d) + mean(d+1)` when the
    /// next day exists, otherwise `mean(d)` alone (partial window).
    #[must_use]
    pub fn rolling_sum_2day(&self) -> RollingRainfall {
        let values = self
            .samples
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let next = self.samples.get(i + 1);
                let sum = match next {
                    Some(n) if n.date == s.date + Duration::days(1) => s.mean_mm + n.mean_mm,
                    _ => s.mean_mm,
                };
                (s.date, sum)
            })
            .collect();
        RollingRainfall { values }
    }
}

/// A rolled-up rainfall series produced by
/// [`RainfallSeries::rolling_sum_2day`].
#[derive(Debug, Clone, PartialEq)]
pub struct RollingRainfall {
    values: Vec<(NaiveDate, f64)>,
}

impl RollingRainfall {
    /// Maximum rolling value with a date inside `span` (inclusive).
    /// NaN when no value falls in the span; the caller treats that as
    /// "not yet relevant", and any threshold comparison against NaN is
    /// false.
    #[must_use]
    pub fn max_in_range(&self, span: DateSpan) -> f64 {
        self.values
            .iter()
            .filter(|(d, _)| span.contains(*d))
            .map(|(_, v)| *v)
            .fold(f64::NAN, f64::max)
    }

    /// The rolled values in date order.
    #[must_use]
    pub fn values(&self) -> &[(NaiveDate, f64)] {
        &self.values
    }
}
