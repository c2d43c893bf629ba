//! Temporal types for trigger evaluation.
//!
//! Two ranges matter here:
//! - **Lead-time window**: signed offset from a forecast issuance within
//!   which track points count toward a phase (e.g. action looks at
//!   −1 to +3 days around issuance).
//! - **Date span**: an inclusive range of calendar days used to query
//!   rolling rainfall, always extended one day past the track subset to
//!   absorb publication-time skew.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Serde adapter storing a `chrono::Duration` as whole seconds.
pub mod duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[allow(missing_docs)]
    pub fn serialize<S: Serializer>(v: &Duration, s: S) -> Result<S::Ok, S::Error> {
        v.num_seconds().serialize(s)
    }

    #[allow(missing_docs)]
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        i64::deserialize(d).map(Duration::seconds)
    }
}

/// Serde adapter storing an `Option<chrono::Duration>` as whole seconds.
pub mod opt_duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[allow(missing_docs)]
    pub fn serialize<S: Serializer>(v: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        v.map(|d| d.num_seconds()).serialize(s)
    }

    #[allow(missing_docs)]
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<i64>::deserialize(d)?.map(Duration::seconds))
    }
}

/// A signed lead-time window relative to an issuance time.
///
/// `min` may be negative (track points shortly before issuance still
/// count), `max` bounds how far ahead a phase looks. `None` on either
/// side leaves that side unbounded, which the observational phase uses
/// to accept everything up to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadTimeWindow {
    /// Earliest accepted lead time (inclusive). None = unbounded past.
    #[serde(with = "opt_duration_secs")]
    pub min: Option<Duration>,

    /// Latest accepted lead time (inclusive). None = unbounded future.
    #[serde(with = "opt_duration_secs")]
    pub max: Option<Duration>,
}

impl LeadTimeWindow {
    /// Window spanning `min_days` to `max_days` around issuance, both
    /// inclusive.
    #[must_use]
    pub fn days(min_days: i64, max_days: i64) -> Self {
        Self {
            min: Some(Duration::days(min_days)),
            max: Some(Duration::days(max_days)),
        }
    }

    /// Window accepting any lead time up to `max_days` ahead.
    #[must_use]
    pub fn up_to_days(max_days: i64) -> Self {
        Self {
            min: None,
            max: Some(Duration::days(max_days)),
        }
    }

    /// Window accepting everything at or before issuance ("up to now").
    #[must_use]
    pub fn up_to_now() -> Self {
        Self {
            min: None,
            max: Some(Duration::zero()),
        }
    }

    /// Check whether a lead time falls within the window.
    #[must_use]
    pub fn contains(&self, lead_time: Duration) -> bool {
        self.min.map_or(true, |min| lead_time >= min)
            && self.max.map_or(true, |max| lead_time <= max)
    }

    /// True when this window is a subset of `other`.
    #[must_use]
    pub fn within(&self, other: &Self) -> bool {
        let min_ok = match (self.min, other.min) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(a), Some(b)) => a >= b,
        };
        let max_ok = match (self.max, other.max) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(a), Some(b)) => a <= b,
        };
        min_ok && max_ok
    }
}

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSpan {
    /// First day of the span (inclusive).
    pub start: NaiveDate,

    /// Last day of the span (inclusive).
    pub end: NaiveDate,
}

impl DateSpan {
    /// Creates a span, swapping endpoints if given out of order.
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    /// Span covering the dates of the given instants, extended one day
    /// past the latest one. The extra day absorbs the offset between a
    /// bulletin's publication time and the rainfall series' date stamps.
    ///
    /// Returns None when the iterator is empty (a valid "not yet
    /// relevant" state, not an error).
    pub fn covering_padded<I>(times: I) -> Option<Self>
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        let mut iter = times.into_iter();
        let first = iter.next()?.date_naive();
        let (min, max) = iter.fold((first, first), |(lo, hi), t| {
            let d = t.date_naive();
            (lo.min(d), hi.max(d))
        });
        Some(Self {
            start: min,
            end: max + Duration::days(1),
        })
    }

    /// Check whether a date falls within the span.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl std::fmt::Display for DateSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} .. {}]", self.start, self.end)
    }
}
