//! Batch monitoring update loops.
//!
//! Each loop is synchronous and deterministic: storms ordered by id,
//! issuances within a storm in increasing time. A failure while
//! evaluating one storm is logged with enough context to diagnose and
//! skipped; it never aborts the batch and never writes a partial
//! record. Persistence failures are fatal since correctness depends on
//! durable state.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::error::{EvaluationError, MonitorResult};
use crate::monitoring::{MonitoringPoint, MonitoringStore};
use crate::providers::{BoundaryProvider, MonitoringRepository, RainfallProvider, TrackProvider};
use crate::rainfall::RainfallSource;
use crate::resample::TemporalResampler;
use crate::track::{monitor_id, PhaseFamily, Track};
use crate::trigger::TriggerEvaluator;

/// Hour of day (UTC) at which an observed-rainfall date becomes
/// available, one day after the date it stamps.
const OBSERVED_RAIN_PUBLICATION_HOUR: u32 = 15;

/// Issuance time attributed to an observed-rainfall date: the sample
/// for day *d* is published at 15:00 UTC on *d*+1.
#[must_use]
pub fn observational_issue_time(date: NaiveDate) -> DateTime<Utc> {
    let published = (date + Duration::days(1))
        .and_time(NaiveTime::from_hms_opt(OBSERVED_RAIN_PUBLICATION_HOUR, 0, 0).expect("valid"));
    published.and_utc()
}

/// Evaluates all new forecast issuances, merges the resulting points
/// into the persisted store, and returns the combined store.
///
/// Already-monitored issuances are skipped unless `config.clobber` is
/// set, in which case everything is recomputed and replaced.
pub fn update_forecast_monitoring(
    config: &MonitorConfig,
    tracks: &dyn TrackProvider,
    rainfall: &dyn RainfallProvider,
    boundaries: &dyn BoundaryProvider,
    repository: &dyn MonitoringRepository,
) -> MonitorResult<MonitoringStore> {
    config.validate()?;

    let boundary = boundaries.get_boundary()?;
    let existing = repository.load(PhaseFamily::Forecast)?;
    let resampler = TemporalResampler::new(config.resample);
    let evaluator = TriggerEvaluator::new(config, &boundary);

    let mut forecast_tracks = tracks.forecast_tracks()?;
    forecast_tracks.sort_by(|a, b| {
        (a.issue_time, &a.storm_id).cmp(&(b.issue_time, &b.storm_id))
    });

    let mut new_points = Vec::new();
    for track in &forecast_tracks {
        let Some(issue_time) = track.issue_time else {
            warn!(storm_id = %track.storm_id, "forecast track without issuance, skipping");
            continue;
        };
        let mid = monitor_id(&track.storm_id, PhaseFamily::Forecast, issue_time);
        if existing.contains(&mid) && !config.clobber {
            debug!(monitor_id = %mid, "already monitored, skipping");
            continue;
        }

        match evaluate_forecast_issuance(&resampler, &evaluator, rainfall, track, issue_time) {
            Ok(point) => {
                info!(monitor_id = %mid, "monitored forecast issuance");
                new_points.push(point);
            }
            Err(e) => {
                warn!(
                    storm_id = %track.storm_id,
                    issue_time = %issue_time,
                    error = %e,
                    "forecast evaluation failed, skipping storm issuance"
                );
            }
        }
    }

    let combined = existing.merge(new_points, config.clobber);
    repository.save(PhaseFamily::Forecast, &combined)?;
    Ok(combined)
}

fn evaluate_forecast_issuance(
    resampler: &TemporalResampler,
    evaluator: &TriggerEvaluator<'_>,
    rainfall: &dyn RainfallProvider,
    track: &Track,
    issue_time: DateTime<Utc>,
) -> Result<MonitoringPoint, crate::error::StormError> {
    let series = rainfall
        .forecast_series_for_issuance(issue_time)?
        .ok_or_else(|| EvaluationError::DataUnavailable {
            storm_id: track.storm_id.clone(),
            phase_family: PhaseFamily::Forecast,
            issue_time,
        })?;
    let rolling = series.rolling_sum_2day();

    let resampled = resampler.resample(track)?;
    let eval = evaluator.evaluate_forecast(&resampled, issue_time, &rolling)?;

    Ok(MonitoringPoint::from_forecast(
        track.storm_id.clone(),
        track.name.clone(),
        issue_time,
        eval,
    ))
}

/// Evaluates all new observational issuances (one per observed-rainfall
/// date) against the accumulated observed tracks, merges, and returns
/// the combined store.
pub fn update_observational_monitoring(
    config: &MonitorConfig,
    tracks: &dyn TrackProvider,
    rainfall: &dyn RainfallProvider,
    boundaries: &dyn BoundaryProvider,
    repository: &dyn MonitoringRepository,
) -> MonitorResult<MonitoringStore> {
    config.validate()?;

    let boundary = boundaries.get_boundary()?;
    let existing = repository.load(PhaseFamily::Observational)?;
    let resampler = TemporalResampler::new(config.resample);
    let evaluator = TriggerEvaluator::new(config, &boundary);

    let observed = rainfall.get_daily_series(RainfallSource::SatelliteObserved, None)?;
    // Rolling sums are computed once over the full series; per-issuance
    // queries are clamped to the dates available at that issuance.
    let rolling = observed.rolling_sum_2day();

    let mut observed_tracks = tracks.observational_tracks()?;
    observed_tracks.sort_by(|a, b| a.storm_id.cmp(&b.storm_id));

    let mut new_points = Vec::new();
    for track in &observed_tracks {
        for sample_date in observed.samples().iter().map(|s| s.date) {
            let issue_time = observational_issue_time(sample_date);
            let mid = monitor_id(&track.storm_id, PhaseFamily::Observational, issue_time);
            if existing.contains(&mid) && !config.clobber {
                debug!(monitor_id = %mid, "already monitored, skipping");
                continue;
            }

            // Storm not active yet at this issuance.
            let Some(frozen) = track.up_to(issue_time) else {
                continue;
            };
            // Storm no longer active: rainfall has moved on past it.
            if sample_date - frozen.end_time().date_naive() > Duration::days(1) {
                continue;
            }

            match evaluate_observational_issuance(
                &resampler, &evaluator, &frozen, issue_time, &rolling, sample_date,
            ) {
                Ok(point) => {
                    info!(monitor_id = %mid, "monitored observational issuance");
                    new_points.push(point);
                }
                Err(e) => {
                    warn!(
                        storm_id = %track.storm_id,
                        issue_time = %issue_time,
                        error = %e,
                        "observational evaluation failed, skipping storm issuance"
                    );
                }
            }
        }
    }

    let combined = existing.merge(new_points, config.clobber);
    repository.save(PhaseFamily::Observational, &combined)?;
    Ok(combined)
}

fn evaluate_observational_issuance(
    resampler: &TemporalResampler,
    evaluator: &TriggerEvaluator<'_>,
    frozen: &Track,
    issue_time: DateTime<Utc>,
    rolling: &crate::rainfall::RollingRainfall,
    latest_rain_date: NaiveDate,
) -> Result<MonitoringPoint, crate::error::StormError> {
    let resampled = resampler.resample(frozen)?;
    let eval = evaluator.evaluate_observational(&resampled, issue_time, rolling, latest_rain_date)?;
    Ok(MonitoringPoint::from_observational(
        frozen.storm_id.clone(),
        frozen.name.clone(),
        issue_time,
        eval,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn observational_issue_time_adds_publication_delay() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 3).unwrap();
        assert_eq!(
            observational_issue_time(date),
            Utc.with_ymd_and_hms(2024, 7, 4, 15, 0, 0).unwrap()
        );
    }
}
