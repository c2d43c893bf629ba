//! Fixed-cadence track resampling.
//!
//! Source bulletins carry positions at 6-to-24-hour steps. The point of
//! closest approach and short threshold crossings fall between those
//! steps, so evaluation runs on a regular sub-hourly grid interpolated
//! from the known points. The resampler never extrapolates beyond the
//! first or last known timestamp.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::EvaluationError;
use crate::time::duration_secs;
use crate::track::{Track, TrackPoint};

/// Configuration for [`TemporalResampler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResampleConfig {
    /// Output grid step.
    #[serde(with = "duration_secs")]
    pub cadence: Duration,

    /// Largest tolerated spacing between consecutive source points.
    /// A larger gap fails with [`EvaluationError::DataGap`] rather than
    /// inventing positions across it.
    #[serde(with = "duration_secs")]
    pub max_gap: Duration,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            cadence: Duration::minutes(30),
            // Long-lead forecast valid times sit 24 h apart; twice that
            // covers one missing bulletin step.
            max_gap: Duration::hours(48),
        }
    }
}

/// Produces a regular-cadence track by linear interpolation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemporalResampler {
    config: ResampleConfig,
}

impl TemporalResampler {
    /// Creates a resampler with the given grid configuration.
    #[must_use]
    pub const fn new(config: ResampleConfig) -> Self {
        Self { config }
    }

    /// Resamples `track` onto the configured grid.
    ///
    /// The grid starts at the first known timestamp and ends at or
    /// before the last one. A single-point track comes back unchanged.
    ///
    /// # Errors
    ///
    /// [`EvaluationError::DataGap`] when consecutive source points are
    /// further apart than the configured maximum.
    pub fn resample(&self, track: &Track) -> Result<Track, EvaluationError> {
        let source = track.points();

        for pair in source.windows(2) {
            let gap = pair[1].time - pair[0].time;
            if gap > self.config.max_gap {
                return Err(EvaluationError::DataGap {
                    before: pair[0].time,
                    after: pair[1].time,
                    gap,
                    max_gap: self.config.max_gap,
                });
            }
        }

        if source.len() == 1 {
            return Ok(track.clone());
        }

        let start = track.start_time();
        let end = track.end_time();
        let mut points = Vec::new();
        let mut t = start;
        // Index of the source point at or before t.
        let mut i = 0;

        while t <= end {
            while i + 1 < source.len() && source[i + 1].time <= t {
                i += 1;
            }
            points.push(interpolate(&source[i], source.get(i + 1), t));
            t += self.config.cadence;
        }

        Track::new(
            track.storm_id.clone(),
            track.name.clone(),
            track.issue_time,
            points,
        )
        .map_err(|_| unreachable_track_error())
    }
}

// Track::new only fails on empty or unordered points; the grid is
// non-empty and strictly increasing by construction.
fn unreachable_track_error() -> EvaluationError {
    unreachable!("resampled grid is non-empty and ordered")
}

fn interpolate(before: &TrackPoint, after: Option<&TrackPoint>, t: chrono::DateTime<chrono::Utc>) -> TrackPoint {
    let Some(after) = after else {
        return TrackPoint { time: t, ..*before };
    };
    if t <= before.time || after.time == before.time {
        return TrackPoint { time: t, ..*before };
    }
    if t >= after.time {
        return TrackPoint {
            time: t,
            ..*after
        };
    }

    let span = (after.time - before.time).num_seconds() as f64;
    let frac = (t - before.time).num_seconds() as f64 / span;
    let lerp = |a: f64, b: f64| a + (b - a) * frac;

    TrackPoint {
        time: t,
        latitude: lerp(before.latitude, after.latitude),
        longitude: lerp(before.longitude, after.longitude),
        max_wind_kt: lerp(before.max_wind_kt, after.max_wind_kt),
        pressure_hpa: match (before.pressure_hpa, after.pressure_hpa) {
            (Some(a), Some(b)) => Some(lerp(a, b)),
            _ => None,
        },
    }
}
