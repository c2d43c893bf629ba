//! Storm identity and track types.
//!
//! A track is an ordered sequence of valid-time points for one storm.
//! Forecast tracks are keyed by the bulletin issuance that produced
//! them; observational tracks accumulate points up to the present.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reserved storm id for the synthetic test monitoring row.
pub const SYNTHETIC_STORM_ID: &str = "xx999999";

fn storm_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // ATCF convention: two-letter basin, two-digit storm number,
    // four-digit season, e.g. "al092024".
    PATTERN.get_or_init(|| Regex::new(r"^[a-z]{2}\d{6}$").expect("valid storm id pattern"))
}

/// Error constructing a [`StormId`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid ATCF storm id: {0:?}")]
pub struct StormIdError(pub String);

/// Identifier for a tropical cyclone in the ATCF tracking convention.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StormId(String);

impl StormId {
    /// Parses and validates an ATCF id. Input is lowercased first, since
    /// upstream feeds disagree on casing.
    pub fn new(raw: &str) -> Result<Self, StormIdError> {
        let id = raw.trim().to_ascii_lowercase();
        if storm_id_pattern().is_match(&id) {
            Ok(Self(id))
        } else {
            Err(StormIdError(raw.to_string()))
        }
    }

    /// The reserved id used by the injected test monitoring row.
    #[must_use]
    pub fn synthetic() -> Self {
        Self(SYNTHETIC_STORM_ID.to_string())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which family of monitoring a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseFamily {
    /// Derived from forecast bulletins, keyed by issuance.
    Forecast,
    /// Derived from observed positions, keyed by rainfall issuance.
    Observational,
}

impl PhaseFamily {
    /// Short tag used inside monitor ids ("fcast" / "obsv").
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Forecast => "fcast",
            Self::Observational => "obsv",
        }
    }
}

impl fmt::Display for PhaseFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Formats the unique key for one evaluated (storm, family, issuance)
/// record: `"{storm_id}_{family}_{issue_time_naive_iso}"`.
#[must_use]
pub fn monitor_id(storm_id: &StormId, family: PhaseFamily, issue_time: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}",
        storm_id,
        family.tag(),
        issue_time.naive_utc().format("%Y-%m-%dT%H:%M:%S")
    )
}

/// One observed or forecast position of a storm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    /// Valid time of the position.
    pub time: DateTime<Utc>,

    /// Latitude in degrees north (WGS84).
    pub latitude: f64,

    /// Longitude in degrees east (WGS84).
    pub longitude: f64,

    /// Maximum sustained wind in knots.
    pub max_wind_kt: f64,

    /// Central pressure in hPa, when the feed carries it.
    pub pressure_hpa: Option<f64>,
}

/// Error constructing a [`Track`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackError {
    /// No points at all.
    #[error("track for {0} has no points")]
    Empty(StormId),

    /// Points out of time order.
    #[error("track for {storm_id} is not ordered by time at index {index}")]
    Unordered {
        /// Storm the track belongs to.
        storm_id: StormId,
        /// First out-of-order index.
        index: usize,
    },
}

/// Ordered sequence of track points for one storm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// ATCF id of the storm.
    pub storm_id: StormId,

    /// Display name from the feed ("Beryl", "Nine", ...).
    pub name: String,

    /// Bulletin issuance for forecast tracks; None for observational
    /// tracks, which are keyed externally.
    pub issue_time: Option<DateTime<Utc>>,

    points: Vec<TrackPoint>,
}

impl Track {
    /// Builds a track, requiring at least one point and non-decreasing
    /// valid times.
    pub fn new(
        storm_id: StormId,
        name: impl Into<String>,
        issue_time: Option<DateTime<Utc>>,
        points: Vec<TrackPoint>,
    ) -> Result<Self, TrackError> {
        if points.is_empty() {
            return Err(TrackError::Empty(storm_id));
        }
        for (i, pair) in points.windows(2).enumerate() {
            if pair[1].time < pair[0].time {
                return Err(TrackError::Unordered {
                    storm_id,
                    index: i + 1,
                });
            }
        }
        Ok(Self {
            storm_id,
            name: name.into(),
            issue_time,
            points,
        })
    }

    /// The track's points, ordered by time.
    #[must_use]
    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    /// First valid time.
    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.points[0].time
    }

    /// Last valid time.
    #[must_use]
    pub fn end_time(&self) -> DateTime<Utc> {
        self.points[self.points.len() - 1].time
    }

    /// Sub-track of points at or before `cutoff`, used to freeze an
    /// observational track at a rainfall issuance. None when the storm
    /// has no points yet at that instant.
    #[must_use]
    pub fn up_to(&self, cutoff: DateTime<Utc>) -> Option<Self> {
        let points: Vec<TrackPoint> = self
            .points
            .iter()
            .take_while(|p| p.time <= cutoff)
            .cloned()
            .collect();
        if points.is_empty() {
            return None;
        }
        Some(Self {
            storm_id: self.storm_id.clone(),
            name: self.name.clone(),
            issue_time: self.issue_time,
            points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn point(time: DateTime<Utc>, wind: f64) -> TrackPoint {
        TrackPoint {
            time,
            latitude: 15.0,
            longitude: -60.0,
            max_wind_kt: wind,
            pressure_hpa: None,
        }
    }

    #[test]
    fn storm_id_accepts_atcf_convention() {
        assert_eq!(StormId::new("al092024").unwrap().as_str(), "al092024");
        assert_eq!(StormId::new("AL092024").unwrap().as_str(), "al092024");
        assert_eq!(StormId::new(" ep012025 ").unwrap().as_str(), "ep012025");
    }

    #[test]
    fn storm_id_rejects_malformed_input() {
        assert!(StormId::new("").is_err());
        assert!(StormId::new("al2024").is_err());
        assert!(StormId::new("al09x024").is_err());
        assert!(StormId::new("matthew").is_err());
    }

    #[test]
    fn synthetic_storm_id_is_valid() {
        assert_eq!(StormId::synthetic().as_str(), SYNTHETIC_STORM_ID);
        assert!(StormId::new(SYNTHETIC_STORM_ID).is_ok());
    }

    #[test]
    fn monitor_id_format_matches_convention() {
        let storm = StormId::new("al022024").unwrap();
        let issue = Utc.with_ymd_and_hms(2024, 7, 1, 15, 0, 0).unwrap();
        assert_eq!(
            monitor_id(&storm, PhaseFamily::Forecast, issue),
            "al022024_fcast_2024-07-01T15:00:00"
        );
        assert_eq!(
            monitor_id(&storm, PhaseFamily::Observational, issue),
            "al022024_obsv_2024-07-01T15:00:00"
        );
    }

    #[test]
    fn track_rejects_empty_and_unordered_points() {
        let storm = StormId::new("al092024").unwrap();
        assert!(matches!(
            Track::new(storm.clone(), "Nine", None, vec![]),
            Err(TrackError::Empty(_))
        ));

        let t0 = Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap();
        let pts = vec![point(t0, 30.0), point(t0 - Duration::hours(6), 25.0)];
        assert!(matches!(
            Track::new(storm, "Nine", None, pts),
            Err(TrackError::Unordered { index: 1, .. })
        ));
    }

    #[test]
    fn up_to_freezes_track_at_cutoff() {
        let storm = StormId::new("al092024").unwrap();
        let t0 = Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap();
        let pts = vec![
            point(t0, 30.0),
            point(t0 + Duration::hours(6), 35.0),
            point(t0 + Duration::hours(12), 45.0),
        ];
        let track = Track::new(storm, "Nine", None, pts).unwrap();

        let frozen = track.up_to(t0 + Duration::hours(6)).unwrap();
        assert_eq!(frozen.points().len(), 2);
        assert_eq!(frozen.end_time(), t0 + Duration::hours(6));

        // Before the storm existed: no sub-track.
        assert!(track.up_to(t0 - Duration::hours(1)).is_none());
    }
}
