//! The central monitoring record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Phase;
use crate::time::opt_duration_secs;
use crate::track::{monitor_id, PhaseFamily, StormId};
use crate::trigger::{ForecastEvaluation, ObservationalEvaluation, PhaseOutcome};

/// One immutable per-issuance monitoring record with trigger decisions.
///
/// Once merged into the store a point is never mutated; recomputation
/// requires an explicit clobber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringPoint {
    /// Unique key: `"{storm_id}_{family}_{issue_time_naive_iso}"`.
    pub monitor_id: String,

    /// Storm the record evaluates.
    pub storm_id: StormId,

    /// Display name at evaluation time.
    pub name: String,

    /// Family of the record.
    pub phase_family: PhaseFamily,

    /// Issuance the record is keyed by.
    pub issue_time: DateTime<Utc>,

    /// Smallest distance to the boundary over the evaluated track, km.
    pub min_distance_km: f64,

    /// Lead time of the closest approach; None for observational
    /// records.
    #[serde(with = "opt_duration_secs")]
    pub time_to_closest: Option<Duration>,

    /// Wind at the closest point, knots.
    pub closest_wind_kt: f64,

    /// Rolling-rain maximum around the closest approach, mm.
    pub closest_rain_mm: Option<f64>,

    /// Actionable lead time has closed (forecast records only; always
    /// false for observational ones).
    pub past_cutoff: bool,

    /// Rainfall accumulation is still attributable to this storm
    /// (observational records only; always true for forecast ones).
    pub rainfall_relevant: bool,

    /// Per-phase extrema and trigger decisions.
    pub phases: Vec<PhaseOutcome>,
}

impl MonitoringPoint {
    /// Builds a forecast record from an evaluation.
    #[must_use]
    pub fn from_forecast(
        storm_id: StormId,
        name: impl Into<String>,
        issue_time: DateTime<Utc>,
        eval: ForecastEvaluation,
    ) -> Self {
        Self {
            monitor_id: monitor_id(&storm_id, PhaseFamily::Forecast, issue_time),
            storm_id,
            name: name.into(),
            phase_family: PhaseFamily::Forecast,
            issue_time,
            min_distance_km: eval.closest.min_distance_km,
            time_to_closest: eval.closest.time_to_closest,
            closest_wind_kt: eval.closest.wind_kt,
            closest_rain_mm: eval.closest.rain_mm,
            past_cutoff: eval.past_cutoff,
            rainfall_relevant: true,
            phases: eval.outcomes,
        }
    }

    /// Builds an observational record from an evaluation.
    #[must_use]
    pub fn from_observational(
        storm_id: StormId,
        name: impl Into<String>,
        issue_time: DateTime<Utc>,
        eval: ObservationalEvaluation,
    ) -> Self {
        Self {
            monitor_id: monitor_id(&storm_id, PhaseFamily::Observational, issue_time),
            storm_id,
            name: name.into(),
            phase_family: PhaseFamily::Observational,
            issue_time,
            min_distance_km: eval.closest.min_distance_km,
            time_to_closest: None,
            closest_wind_kt: eval.closest.wind_kt,
            closest_rain_mm: eval.closest.rain_mm,
            past_cutoff: false,
            rainfall_relevant: eval.rainfall_relevant,
            phases: eval.outcomes,
        }
    }

    /// The trigger decision for one phase; false when the record does
    /// not carry that phase.
    #[must_use]
    pub fn triggered(&self, phase: Phase) -> bool {
        self.phases
            .iter()
            .any(|o| o.phase == phase && o.triggered)
    }

    /// Looks up one phase outcome.
    #[must_use]
    pub fn outcome(&self, phase: Phase) -> Option<&PhaseOutcome> {
        self.phases.iter().find(|o| o.phase == phase)
    }

    /// Synthetic record satisfying every trigger of the given family,
    /// injected ahead of dispatch in test mode. Carried by the reserved
    /// storm id so ledger entries it produces are flagged as test rows.
    #[must_use]
    pub fn synthetic(family: PhaseFamily, phases: Vec<PhaseOutcome>) -> Self {
        let storm_id = StormId::synthetic();
        let issue_time = Utc::now();
        Self {
            monitor_id: monitor_id(&storm_id, family, issue_time),
            storm_id,
            name: "Test".to_string(),
            phase_family: family,
            issue_time,
            min_distance_km: 0.0,
            time_to_closest: Some(Duration::hours(48)),
            closest_wind_kt: 100.0,
            closest_rain_mm: Some(100.0),
            past_cutoff: false,
            rainfall_relevant: true,
            phases,
        }
    }

    /// True for the injected test-mode record.
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.storm_id == StormId::synthetic()
    }
}
