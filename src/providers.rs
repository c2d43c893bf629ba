//! Collaborator contracts for external data and persistence.
//!
//! Acquisition of raw track/rainfall/boundary data and the mechanics of
//! persisted storage live behind these traits. The engine only assumes
//! the contracts below; in-memory and file-backed implementations ship
//! in [`crate::storage`].

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::geometry::Boundary;
use crate::monitoring::MonitoringStore;
use crate::notify::NotificationLedger;
use crate::rainfall::{RainfallSeries, RainfallSource};
use crate::time::DateSpan;
use crate::track::{PhaseFamily, StormId, Track};

/// Errors from providers and repositories.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted record failed to round-trip.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Source of storm tracks.
pub trait TrackProvider {
    /// All recent forecast tracks, one per (storm, issuance), each with
    /// `issue_time` set.
    fn forecast_tracks(&self) -> Result<Vec<Track>, StorageError>;

    /// All recent observational tracks, one per storm, points up to
    /// "now".
    fn observational_tracks(&self) -> Result<Vec<Track>, StorageError>;

    /// One track: a forecast keyed by issuance, or the observational
    /// track when `issue_time` is None.
    fn get_track(
        &self,
        storm_id: &StormId,
        issue_time: Option<DateTime<Utc>>,
    ) -> Result<Option<Track>, StorageError> {
        let tracks = match issue_time {
            Some(_) => self.forecast_tracks()?,
            None => self.observational_tracks()?,
        };
        Ok(tracks
            .into_iter()
            .find(|t| &t.storm_id == storm_id && t.issue_time == issue_time))
    }
}

/// Source of daily spatial-mean rainfall series.
pub trait RainfallProvider {
    /// Daily series for one source, optionally restricted to a date
    /// range. Gaps are permitted.
    fn get_daily_series(
        &self,
        source: RainfallSource,
        range: Option<DateSpan>,
    ) -> Result<RainfallSeries, StorageError>;

    /// The most recent forecast-ensemble series issued strictly before
    /// the given track issuance. None when no series predates it yet.
    fn forecast_series_for_issuance(
        &self,
        issue_time: DateTime<Utc>,
    ) -> Result<Option<RainfallSeries>, StorageError>;
}

/// Source of the fixed per-deployment boundary polygon.
pub trait BoundaryProvider {
    /// The at-risk administrative area. Read-only for the run.
    fn get_boundary(&self) -> Result<Boundary, StorageError>;
}

/// Persistence for monitoring points, one store per family.
pub trait MonitoringRepository {
    /// Loads the store for a family; empty when nothing was persisted
    /// yet.
    fn load(&self, family: PhaseFamily) -> Result<MonitoringStore, StorageError>;

    /// Persists the store for a family. A failure here is fatal to the
    /// run.
    fn save(&self, family: PhaseFamily, store: &MonitoringStore) -> Result<(), StorageError>;
}

/// Persistence for the notification ledger.
pub trait LedgerRepository {
    /// Loads the ledger; empty when nothing was persisted yet.
    fn load(&self) -> Result<NotificationLedger, StorageError>;

    /// Persists the ledger. A failure here is fatal to the run.
    fn save(&self, ledger: &NotificationLedger) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check: the traits stay object-safe so engines can
    // hold them as trait objects.
    fn _assert_object_safe(
        _: &dyn TrackProvider,
        _: &dyn RainfallProvider,
        _: &dyn BoundaryProvider,
        _: &dyn MonitoringRepository,
        _: &dyn LedgerRepository,
    ) {
    }

    #[test]
    fn storage_error_display() {
        let err = StorageError::Backend("blob container unreachable".to_string());
        assert!(err.to_string().contains("blob container unreachable"));
    }
}
