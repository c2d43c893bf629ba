//! Table-driven trigger evaluation.
//!
//! One evaluation covers one (storm, issuance, family). Each phase row
//! of the configuration filters the resampled track to points inside
//! the proximity radius and the phase's lead-time window, takes the
//! wind maximum over that subset, spans the subset's dates (padded one
//! day) to query the rolling-rain maximum, and requires BOTH thresholds
//! to be met. An empty subset is a valid "not yet relevant" state: the
//! extrema stay undefined and the trigger is false.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{MonitorConfig, Phase, PhaseConfig};
use crate::error::EvaluationError;
use crate::geometry::Boundary;
use crate::rainfall::RollingRainfall;
use crate::time::{opt_duration_secs, DateSpan};
use crate::track::{PhaseFamily, Track};

/// Result of evaluating one phase row against one track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseOutcome {
    /// Phase the outcome belongs to.
    pub phase: Phase,

    /// Maximum wind over the filtered subset, knots. None when the
    /// storm never enters the phase's window and radius.
    pub wind_extreme_kt: Option<f64>,

    /// Maximum two-day rolling rainfall over the subset's padded date
    /// span, mm. None when undefined.
    pub rain_extreme_mm: Option<f64>,

    /// True only when both extrema are defined and meet their
    /// thresholds.
    pub triggered: bool,
}

impl PhaseOutcome {
    fn not_relevant(phase: Phase) -> Self {
        Self {
            phase,
            wind_extreme_kt: None,
            rain_extreme_mm: None,
            triggered: false,
        }
    }
}

/// Closest-approach summary shared by both evaluation families.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosestPass {
    /// Smallest distance to the boundary over the whole track, km.
    pub min_distance_km: f64,

    /// Lead time of the closest point relative to issuance. Negative
    /// for observational tracks (the pass is in the past).
    #[serde(with = "opt_duration_secs")]
    pub time_to_closest: Option<Duration>,

    /// Wind at the closest point, knots.
    pub wind_kt: f64,

    /// Rolling-rain maximum over [closest date, closest date + 1], mm.
    pub rain_mm: Option<f64>,
}

/// Full evaluation of a forecast issuance.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastEvaluation {
    /// Closest-approach summary.
    pub closest: ClosestPass,

    /// True when time-to-closest-approach is below the configured
    /// cutoff: the actionable window has effectively closed and further
    /// forecast-trigger notifications should be suppressed. Does not
    /// alter the trigger booleans.
    pub past_cutoff: bool,

    /// One outcome per forecast-family phase row.
    pub outcomes: Vec<PhaseOutcome>,
}

/// Full evaluation of an observational issuance.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationalEvaluation {
    /// Closest-approach summary.
    pub closest: ClosestPass,

    /// False once the newest rainfall sample postdates the storm's exit
    /// from the proximity radius by more than the one-day pad: further
    /// accumulation is no longer attributable to this storm. Also false
    /// while the storm has never entered the radius.
    pub rainfall_relevant: bool,

    /// One outcome per observational-family phase row.
    pub outcomes: Vec<PhaseOutcome>,
}

/// Evaluates phase rows against resampled tracks.
#[derive(Debug, Clone, Copy)]
pub struct TriggerEvaluator<'a> {
    config: &'a MonitorConfig,
    boundary: &'a Boundary,
}

impl<'a> TriggerEvaluator<'a> {
    /// Creates an evaluator over a validated configuration and a fixed
    /// boundary.
    #[must_use]
    pub const fn new(config: &'a MonitorConfig, boundary: &'a Boundary) -> Self {
        Self { config, boundary }
    }

    /// Evaluates every forecast-family phase for one resampled forecast
    /// track.
    pub fn evaluate_forecast(
        &self,
        track: &Track,
        issue_time: DateTime<Utc>,
        rolling: &RollingRainfall,
    ) -> Result<ForecastEvaluation, EvaluationError> {
        let distances = self.boundary.track_distances_km(track.points())?;
        let closest = closest_pass(track, &distances, Some(issue_time), rolling, None);

        let outcomes = self
            .config
            .phases_for(PhaseFamily::Forecast)
            .map(|row| phase_outcome(row, track, &distances, issue_time, rolling, None).0)
            .collect();

        let past_cutoff = closest
            .time_to_closest
            .is_some_and(|lt| lt < self.config.lead_time_cutoff);

        Ok(ForecastEvaluation {
            closest,
            past_cutoff,
            outcomes,
        })
    }

    /// Evaluates every observational-family phase for one frozen,
    /// resampled observational track. `latest_rain_date` is the newest
    /// sample date available at this issuance; rainfall queries never
    /// reach past it.
    pub fn evaluate_observational(
        &self,
        track: &Track,
        issue_time: DateTime<Utc>,
        rolling: &RollingRainfall,
        latest_rain_date: NaiveDate,
    ) -> Result<ObservationalEvaluation, EvaluationError> {
        let distances = self.boundary.track_distances_km(track.points())?;
        let closest = closest_pass(track, &distances, None, rolling, Some(latest_rain_date));

        let mut outcomes = Vec::new();
        let mut rainfall_relevant = false;
        for row in self.config.phases_for(PhaseFamily::Observational) {
            let (outcome, span) = phase_outcome(
                row,
                track,
                &distances,
                issue_time,
                rolling,
                Some(latest_rain_date),
            );
            // Relevant while rainfall dates have not outrun the padded
            // span of the storm's time inside the radius.
            if let Some(span) = span {
                rainfall_relevant |= latest_rain_date <= span.end;
            }
            outcomes.push(outcome);
        }

        Ok(ObservationalEvaluation {
            closest,
            rainfall_relevant,
            outcomes,
        })
    }
}

/// Summary of the track's minimum-distance point.
fn closest_pass(
    track: &Track,
    distances: &[f64],
    issue_time: Option<DateTime<Utc>>,
    rolling: &RollingRainfall,
    rain_cutoff: Option<NaiveDate>,
) -> ClosestPass {
    let points = track.points();
    let (idx, min_distance_km) = distances
        .iter()
        .copied()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .unwrap_or((0, f64::NAN));

    let at_closest = &points[idx];
    let start = at_closest.time.date_naive();
    let span = clamp_span(
        DateSpan::new(start, start + Duration::days(1)),
        rain_cutoff,
    );
    let rain_mm = span.map(|s| rolling.max_in_range(s)).and_then(finite);

    ClosestPass {
        min_distance_km,
        time_to_closest: issue_time.map(|t| at_closest.time - t),
        wind_kt: at_closest.max_wind_kt,
        rain_mm,
    }
}

/// Evaluates one phase row. Returns the outcome plus the unclamped
/// padded date span of the in-radius subset (None when the subset is
/// empty), which the observational family needs for the
/// rainfall-relevance check.
fn phase_outcome(
    row: &PhaseConfig,
    track: &Track,
    distances: &[f64],
    issue_time: DateTime<Utc>,
    rolling: &RollingRainfall,
    rain_cutoff: Option<NaiveDate>,
) -> (PhaseOutcome, Option<DateSpan>) {
    let subset: Vec<_> = track
        .points()
        .iter()
        .zip(distances)
        .filter(|(p, d)| **d < row.distance_thresh_km && row.window.contains(p.time - issue_time))
        .map(|(p, _)| p)
        .collect();

    if subset.is_empty() {
        return (PhaseOutcome::not_relevant(row.phase), None);
    }

    let wind_extreme = subset
        .iter()
        .map(|p| p.max_wind_kt)
        .fold(f64::NAN, f64::max);

    // Min date to max date + 1 day, absorbing publication-time skew.
    let span = DateSpan::covering_padded(subset.iter().map(|p| p.time))
        .expect("subset is non-empty");
    let rain_extreme = clamp_span(span, rain_cutoff)
        .map(|s| rolling.max_in_range(s))
        .unwrap_or(f64::NAN);

    // Both conditions are required; a NaN extreme compares false.
    let triggered = wind_extreme >= row.wind_thresh_kt && rain_extreme >= row.rain_thresh_mm;

    (
        PhaseOutcome {
            phase: row.phase,
            wind_extreme_kt: finite(wind_extreme),
            rain_extreme_mm: finite(rain_extreme),
            triggered,
        },
        Some(span),
    )
}

/// Restricts a span to dates at or before `cutoff`. None when nothing
/// remains.
fn clamp_span(span: DateSpan, cutoff: Option<NaiveDate>) -> Option<DateSpan> {
    match cutoff {
        None => Some(span),
        Some(c) if c < span.start => None,
        Some(c) => Some(DateSpan::new(span.start, span.end.min(c))),
    }
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeoPoint;
    use crate::rainfall::{RainfallSample, RainfallSeries};
    use crate::track::{StormId, TrackPoint};
    use chrono::TimeZone;

    /// 1-degree square centered on the origin, roughly 111 km half-width.
    fn boundary() -> Boundary {
        Boundary::new(vec![
            GeoPoint {
                latitude: -1.0,
                longitude: -1.0,
            },
            GeoPoint {
                latitude: -1.0,
                longitude: 1.0,
            },
            GeoPoint {
                latitude: 1.0,
                longitude: 1.0,
            },
            GeoPoint {
                latitude: 1.0,
                longitude: -1.0,
            },
        ])
        .unwrap()
    }

    fn issue_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 1, 12, 0, 0).unwrap()
    }

    /// Track approaching along the equator: ~890 km out at issuance,
    /// closest pass ~100 km from the eastern edge at +2 days.
    fn approaching_track(peak_wind: f64) -> Track {
        let t0 = issue_time();
        let mk = |hours: i64, lon: f64, wind: f64| TrackPoint {
            time: t0 + Duration::hours(hours),
            latitude: 0.0,
            longitude: lon,
            max_wind_kt: wind,
            pressure_hpa: None,
        };
        Track::new(
            StormId::new("al092024").unwrap(),
            "Nine",
            Some(t0),
            vec![
                mk(0, 9.0, 40.0),
                mk(24, 5.0, peak_wind - 10.0),
                mk(48, 1.9, peak_wind),
                mk(72, 5.0, peak_wind - 15.0),
            ],
        )
        .unwrap()
    }

    fn rain(values: &[(u32, f64)]) -> RollingRainfall {
        RainfallSeries::new(
            values
                .iter()
                .map(|&(d, v)| RainfallSample {
                    date: NaiveDate::from_ymd_opt(2024, 8, d).unwrap(),
                    mean_mm: v,
                })
                .collect(),
        )
        .unwrap()
        .rolling_sum_2day()
    }

    fn resampled(track: &Track) -> Track {
        crate::resample::TemporalResampler::default()
            .resample(track)
            .unwrap()
    }

    #[test]
    fn and_semantics_require_both_thresholds() {
        let config = MonitorConfig::default();
        let boundary = boundary();
        let evaluator = TriggerEvaluator::new(&config, &boundary);
        let track = resampled(&approaching_track(70.0));

        // Rain well below the 42 mm action threshold.
        let dry = rain(&[(1, 5.0), (2, 10.0), (3, 15.0), (4, 5.0)]);
        let eval = evaluator
            .evaluate_forecast(&track, issue_time(), &dry)
            .unwrap();
        let action = eval
            .outcomes
            .iter()
            .find(|o| o.phase == Phase::Action)
            .unwrap();
        assert!(action.wind_extreme_kt.unwrap() >= 64.0);
        assert!(action.rain_extreme_mm.unwrap() < 42.0);
        assert!(!action.triggered);

        // Same track, enough rain: both conditions hold.
        let wet = rain(&[(1, 5.0), (2, 10.0), (3, 40.0), (4, 20.0)]);
        let eval = evaluator
            .evaluate_forecast(&track, issue_time(), &wet)
            .unwrap();
        let action = eval
            .outcomes
            .iter()
            .find(|o| o.phase == Phase::Action)
            .unwrap();
        assert!(action.triggered);
    }

    #[test]
    fn action_extrema_never_exceed_readiness_extrema() {
        let config = MonitorConfig::default();
        let boundary = boundary();
        let evaluator = TriggerEvaluator::new(&config, &boundary);
        let track = resampled(&approaching_track(80.0));
        let rolling = rain(&[(1, 10.0), (2, 20.0), (3, 30.0), (4, 25.0), (5, 5.0)]);

        let eval = evaluator
            .evaluate_forecast(&track, issue_time(), &rolling)
            .unwrap();
        let get = |phase| {
            eval.outcomes
                .iter()
                .find(|o| o.phase == phase)
                .copied()
                .unwrap()
        };
        let action = get(Phase::Action);
        let readiness = get(Phase::Readiness);

        assert!(action.wind_extreme_kt.unwrap() <= readiness.wind_extreme_kt.unwrap());
        assert!(action.rain_extreme_mm.unwrap() <= readiness.rain_extreme_mm.unwrap());
    }

    #[test]
    fn distant_storm_is_not_yet_relevant() {
        let config = MonitorConfig::default();
        let boundary = boundary();
        let evaluator = TriggerEvaluator::new(&config, &boundary);

        // Never comes within 1000 km.
        let t0 = issue_time();
        let far = Track::new(
            StormId::new("al102024").unwrap(),
            "Ten",
            Some(t0),
            vec![
                TrackPoint {
                    time: t0,
                    latitude: 0.0,
                    longitude: 20.0,
                    max_wind_kt: 100.0,
                    pressure_hpa: None,
                },
                TrackPoint {
                    time: t0 + Duration::hours(24),
                    latitude: 0.0,
                    longitude: 15.0,
                    max_wind_kt: 110.0,
                    pressure_hpa: None,
                },
            ],
        )
        .unwrap();
        let track = resampled(&far);
        let rolling = rain(&[(1, 100.0), (2, 100.0), (3, 100.0)]);

        let eval = evaluator
            .evaluate_forecast(&track, issue_time(), &rolling)
            .unwrap();
        for outcome in &eval.outcomes {
            assert_eq!(outcome.wind_extreme_kt, None);
            assert_eq!(outcome.rain_extreme_mm, None);
            assert!(!outcome.triggered);
        }
        assert!(eval.closest.min_distance_km > 1000.0);
    }

    #[test]
    fn past_cutoff_flags_imminent_closest_approach() {
        let config = MonitorConfig::default();
        let boundary = boundary();
        let evaluator = TriggerEvaluator::new(&config, &boundary);
        let rolling = rain(&[(1, 10.0), (2, 20.0)]);

        // Closest approach at +2 days: not past the 36 h cutoff.
        let track = resampled(&approaching_track(70.0));
        let eval = evaluator
            .evaluate_forecast(&track, issue_time(), &rolling)
            .unwrap();
        assert!(!eval.past_cutoff);
        assert_eq!(eval.closest.time_to_closest, Some(Duration::hours(48)));

        // Closest approach right at issuance: past cutoff.
        let t0 = issue_time();
        let imminent = Track::new(
            StormId::new("al112024").unwrap(),
            "Eleven",
            Some(t0),
            vec![
                TrackPoint {
                    time: t0,
                    latitude: 0.0,
                    longitude: 1.5,
                    max_wind_kt: 80.0,
                    pressure_hpa: None,
                },
                TrackPoint {
                    time: t0 + Duration::hours(24),
                    latitude: 0.0,
                    longitude: 6.0,
                    max_wind_kt: 60.0,
                    pressure_hpa: None,
                },
            ],
        )
        .unwrap();
        let eval = evaluator
            .evaluate_forecast(&resampled(&imminent), issue_time(), &rolling)
            .unwrap();
        assert!(eval.past_cutoff);
    }

    #[test]
    fn observational_rainfall_relevance_expires_after_exit() {
        let config = MonitorConfig::default();
        let boundary = boundary();
        let evaluator = TriggerEvaluator::new(&config, &boundary);

        // Storm inside the radius on Aug 1, gone by Aug 2.
        let t0 = Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap();
        let track = Track::new(
            StormId::new("al092024").unwrap(),
            "Nine",
            None,
            vec![
                TrackPoint {
                    time: t0,
                    latitude: 0.0,
                    longitude: 1.5,
                    max_wind_kt: 60.0,
                    pressure_hpa: None,
                },
                TrackPoint {
                    time: t0 + Duration::hours(12),
                    latitude: 0.0,
                    longitude: 4.0,
                    max_wind_kt: 55.0,
                    pressure_hpa: None,
                },
            ],
        )
        .unwrap();
        let track = resampled(&track);
        let rolling = rain(&[(1, 40.0), (2, 30.0), (3, 10.0), (4, 5.0)]);

        // Rain up to Aug 2 (within the one-day pad): still relevant.
        let eval = evaluator
            .evaluate_observational(
                &track,
                t0 + Duration::days(1),
                &rolling,
                NaiveDate::from_ymd_opt(2024, 8, 2).unwrap(),
            )
            .unwrap();
        assert!(eval.rainfall_relevant);

        // Rain through Aug 4: accumulation has outrun the storm.
        let eval = evaluator
            .evaluate_observational(
                &track,
                t0 + Duration::days(3),
                &rolling,
                NaiveDate::from_ymd_opt(2024, 8, 4).unwrap(),
            )
            .unwrap();
        assert!(!eval.rainfall_relevant);
    }

    #[test]
    fn observational_trigger_uses_inclusive_comparisons() {
        let mut config = MonitorConfig::default();
        // Exercise the deployment-parameter nature of the obsv row.
        if let Some(row) = config
            .phases
            .iter_mut()
            .find(|r| r.phase == Phase::Observational)
        {
            row.wind_thresh_kt = 50.0;
            row.rain_thresh_mm = 60.0;
        }
        let boundary = boundary();
        let evaluator = TriggerEvaluator::new(&config, &boundary);

        let t0 = Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap();
        let track = Track::new(
            StormId::new("al092024").unwrap(),
            "Nine",
            None,
            vec![
                TrackPoint {
                    time: t0,
                    latitude: 0.0,
                    longitude: 1.5,
                    // Exactly at threshold: inclusive comparison fires.
                    max_wind_kt: 50.0,
                    pressure_hpa: None,
                },
                TrackPoint {
                    time: t0 + Duration::hours(6),
                    latitude: 0.0,
                    longitude: 1.2,
                    max_wind_kt: 45.0,
                    pressure_hpa: None,
                },
            ],
        )
        .unwrap();
        let track = resampled(&track);
        let rolling = rain(&[(1, 30.0), (2, 30.0)]);

        let eval = evaluator
            .evaluate_observational(
                &track,
                t0 + Duration::days(1),
                &rolling,
                NaiveDate::from_ymd_opt(2024, 8, 2).unwrap(),
            )
            .unwrap();
        let outcome = &eval.outcomes[0];
        assert_eq!(outcome.wind_extreme_kt, Some(50.0));
        assert_eq!(outcome.rain_extreme_mm, Some(60.0));
        assert!(outcome.triggered);
    }
}
