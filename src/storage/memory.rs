//! Thread-safe in-memory providers and repositories.
//!
//! Intended for embedded usage, tests, and as reference implementations
//! of the provider contracts.

use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::geometry::Boundary;
use crate::monitoring::MonitoringStore;
use crate::notify::NotificationLedger;
use crate::providers::{
    BoundaryProvider, LedgerRepository, MonitoringRepository, RainfallProvider, StorageError,
    TrackProvider,
};
use crate::rainfall::{RainfallSeries, RainfallSource};
use crate::time::DateSpan;
use crate::track::{PhaseFamily, Track};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::Backend(format!("poisoned lock: {context}"))
}

fn restrict(series: &RainfallSeries, range: Option<DateSpan>) -> Result<RainfallSeries, StorageError> {
    let Some(span) = range else {
        return Ok(series.clone());
    };
    let samples = series
        .samples()
        .iter()
        .filter(|s| span.contains(s.date))
        .cloned()
        .collect();
    RainfallSeries::new(samples).map_err(|e| StorageError::Backend(e.to_string()))
}

/// In-memory track source.
#[derive(Debug, Default)]
pub struct InMemoryTrackProvider {
    forecast: RwLock<Vec<Track>>,
    observational: RwLock<Vec<Track>>,
}

impl InMemoryTrackProvider {
    /// An empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one forecast track (one issuance of one storm).
    pub fn add_forecast_track(&self, track: Track) -> Result<(), StorageError> {
        self.forecast
            .write()
            .map_err(|_| lock_err("forecast tracks"))?
            .push(track);
        Ok(())
    }

    /// Adds one observational track (the accumulated fix history of one
    /// storm). Replaces any previous track for the same storm.
    pub fn add_observational_track(&self, track: Track) -> Result<(), StorageError> {
        let mut tracks = self
            .observational
            .write()
            .map_err(|_| lock_err("observational tracks"))?;
        tracks.retain(|t| t.storm_id != track.storm_id);
        tracks.push(track);
        Ok(())
    }
}

impl TrackProvider for InMemoryTrackProvider {
    fn forecast_tracks(&self) -> Result<Vec<Track>, StorageError> {
        Ok(self
            .forecast
            .read()
            .map_err(|_| lock_err("forecast tracks"))?
            .clone())
    }

    fn observational_tracks(&self) -> Result<Vec<Track>, StorageError> {
        Ok(self
            .observational
            .read()
            .map_err(|_| lock_err("observational tracks"))?
            .clone())
    }
}

/// In-memory rainfall source holding one observed series plus a history
/// of forecast-ensemble runs keyed by their own issuance time.
#[derive(Debug, Default)]
pub struct InMemoryRainfallProvider {
    observed: RwLock<RainfallSeries>,
    forecast_runs: RwLock<Vec<(DateTime<Utc>, RainfallSeries)>>,
}

impl InMemoryRainfallProvider {
    /// An empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the observed series.
    pub fn set_observed(&self, series: RainfallSeries) -> Result<(), StorageError> {
        *self
            .observed
            .write()
            .map_err(|_| lock_err("observed rainfall"))? = series;
        Ok(())
    }

    /// Records one forecast-ensemble run issued at `run_time`.
    pub fn add_forecast_run(
        &self,
        run_time: DateTime<Utc>,
        series: RainfallSeries,
    ) -> Result<(), StorageError> {
        let mut runs = self
            .forecast_runs
            .write()
            .map_err(|_| lock_err("forecast rainfall runs"))?;
        runs.push((run_time, series));
        runs.sort_by_key(|(t, _)| *t);
        Ok(())
    }
}

impl RainfallProvider for InMemoryRainfallProvider {
    fn get_daily_series(
        &self,
        source: RainfallSource,
        range: Option<DateSpan>,
    ) -> Result<RainfallSeries, StorageError> {
        match source {
            RainfallSource::SatelliteObserved => {
                let observed = self
                    .observed
                    .read()
                    .map_err(|_| lock_err("observed rainfall"))?;
                restrict(&observed, range)
            }
            RainfallSource::ForecastEnsemble => {
                let runs = self
                    .forecast_runs
                    .read()
                    .map_err(|_| lock_err("forecast rainfall runs"))?;
                match runs.last() {
                    Some((_, series)) => restrict(series, range),
                    None => Ok(RainfallSeries::default()),
                }
            }
        }
    }

    fn forecast_series_for_issuance(
        &self,
        issue_time: DateTime<Utc>,
    ) -> Result<Option<RainfallSeries>, StorageError> {
        let runs = self
            .forecast_runs
            .read()
            .map_err(|_| lock_err("forecast rainfall runs"))?;
        Ok(runs
            .iter()
            .rev()
            .find(|(run_time, _)| *run_time < issue_time)
            .map(|(_, series)| series.clone()))
    }
}

/// Boundary provider serving one fixed polygon.
#[derive(Debug)]
pub struct StaticBoundaryProvider {
    boundary: Boundary,
}

impl StaticBoundaryProvider {
    /// Wraps the boundary this deployment monitors.
    #[must_use]
    pub fn new(boundary: Boundary) -> Self {
        Self { boundary }
    }
}

impl BoundaryProvider for StaticBoundaryProvider {
    fn get_boundary(&self) -> Result<Boundary, StorageError> {
        Ok(self.boundary.clone())
    }
}

/// In-memory monitoring persistence, one store per phase family.
#[derive(Debug, Default)]
pub struct InMemoryMonitoringRepository {
    forecast: RwLock<MonitoringStore>,
    observational: RwLock<MonitoringStore>,
}

impl InMemoryMonitoringRepository {
    /// Empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, family: PhaseFamily) -> &RwLock<MonitoringStore> {
        match family {
            PhaseFamily::Forecast => &self.forecast,
            PhaseFamily::Observational => &self.observational,
        }
    }
}

impl MonitoringRepository for InMemoryMonitoringRepository {
    fn load(&self, family: PhaseFamily) -> Result<MonitoringStore, StorageError> {
        Ok(self
            .slot(family)
            .read()
            .map_err(|_| lock_err("monitoring store"))?
            .clone())
    }

    fn save(&self, family: PhaseFamily, store: &MonitoringStore) -> Result<(), StorageError> {
        *self
            .slot(family)
            .write()
            .map_err(|_| lock_err("monitoring store"))? = store.clone();
        Ok(())
    }
}

/// In-memory ledger persistence.
#[derive(Debug, Default)]
pub struct InMemoryLedgerRepository {
    ledger: RwLock<NotificationLedger>,
}

impl InMemoryLedgerRepository {
    /// Empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerRepository for InMemoryLedgerRepository {
    fn load(&self) -> Result<NotificationLedger, StorageError> {
        Ok(self
            .ledger
            .read()
            .map_err(|_| lock_err("notification ledger"))?
            .clone())
    }

    fn save(&self, ledger: &NotificationLedger) -> Result<(), StorageError> {
        *self
            .ledger
            .write()
            .map_err(|_| lock_err("notification ledger"))? = ledger.clone();
        Ok(())
    }
}
