//! Run configuration.
//!
//! All thresholds, windows, and mode switches live in one explicit
//! object handed to each entry point. Phase thresholds are data, not
//! per-phase code paths: evaluation iterates the phase table. The
//! defaults below are the documented operational values; a deployment
//! may override any of them (the observational thresholds in
//! particular are a deployment parameter, not a canonical constant).

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::notify::NotificationType;
use crate::resample::ResampleConfig;
use crate::time::{duration_secs, LeadTimeWindow};
use crate::track::PhaseFamily;

/// The three activation tiers of the anticipatory-action protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Early mobilization, evaluated on forecasts up to 5 days out.
    Readiness,
    /// Activation, evaluated on forecasts up to 3 days out.
    Action,
    /// Post-hoc confirmation on observed positions.
    Observational,
}

impl Phase {
    /// Which track family the phase evaluates.
    #[must_use]
    pub const fn family(self) -> PhaseFamily {
        match self {
            Self::Readiness | Self::Action => PhaseFamily::Forecast,
            Self::Observational => PhaseFamily::Observational,
        }
    }

    /// Short name used in logs and persisted records.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Readiness => "readiness",
            Self::Action => "action",
            Self::Observational => "obsv",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the phase table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    /// Phase the row configures.
    pub phase: Phase,

    /// Lead-time window relative to issuance.
    pub window: LeadTimeWindow,

    /// Minimum sustained wind, knots.
    pub wind_thresh_kt: f64,

    /// Minimum two-day rolling rainfall, mm.
    pub rain_thresh_mm: f64,

    /// Proximity radius defining the at-risk zone, km.
    pub distance_thresh_km: f64,
}

/// Cross-phase suppression: once `by` has been sent for a storm,
/// `suppressed` must not also fire for that storm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionRule {
    /// The lower-priority notification that gets suppressed.
    pub suppressed: NotificationType,

    /// The more authoritative notification that suppresses it.
    pub by: NotificationType,
}

/// Whether notifications go to the test or production distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionMode {
    /// Test distribution list.
    #[default]
    Test,
    /// Production distribution list.
    Production,
}

/// Complete configuration for one monitoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Phase table driving trigger evaluation.
    pub phases: Vec<PhaseConfig>,

    /// Track resampling grid.
    pub resample: ResampleConfig,

    /// Once time-to-closest-approach drops below this, the actionable
    /// window for forecast triggers has effectively closed.
    #[serde(with = "duration_secs")]
    pub lead_time_cutoff: Duration,

    /// Informational notifications only go out for points that came
    /// within this distance of the boundary, km.
    pub relevance_radius_km: f64,

    /// Cross-phase suppression rules.
    pub suppression: Vec<SuppressionRule>,

    /// Inject a synthetic monitoring row that satisfies every trigger.
    pub test_mode: bool,

    /// Recompute and replace all monitoring points instead of appending
    /// only new ones.
    pub clobber: bool,

    /// Distribution the downstream sink should target.
    pub distribution_mode: DistributionMode,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            phases: vec![
                PhaseConfig {
                    phase: Phase::Readiness,
                    window: LeadTimeWindow::days(0, 5),
                    wind_thresh_kt: 34.0,
                    rain_thresh_mm: 35.0,
                    distance_thresh_km: 230.0,
                },
                PhaseConfig {
                    phase: Phase::Action,
                    window: LeadTimeWindow::days(-1, 3),
                    wind_thresh_kt: 64.0,
                    rain_thresh_mm: 42.0,
                    distance_thresh_km: 230.0,
                },
                PhaseConfig {
                    phase: Phase::Observational,
                    window: LeadTimeWindow::up_to_now(),
                    wind_thresh_kt: 50.0,
                    rain_thresh_mm: 60.0,
                    distance_thresh_km: 230.0,
                },
            ],
            resample: ResampleConfig::default(),
            lead_time_cutoff: Duration::hours(36),
            relevance_radius_km: 1000.0,
            suppression: vec![SuppressionRule {
                suppressed: NotificationType::Observational,
                by: NotificationType::Action,
            }],
            test_mode: false,
            clobber: false,
            distribution_mode: DistributionMode::Test,
        }
    }
}

impl MonitorConfig {
    /// Validates the configuration. Called by every entry point before
    /// any I/O; a malformed table aborts the run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.phases.is_empty() {
            return Err(ConfigError::EmptyPhaseTable);
        }

        let mut seen: Vec<Phase> = Vec::new();
        for row in &self.phases {
            if seen.contains(&row.phase) {
                return Err(ConfigError::DuplicatePhase {
                    phase: row.phase.to_string(),
                });
            }
            seen.push(row.phase);

            if let (Some(min), Some(max)) = (row.window.min, row.window.max) {
                if min > max {
                    return Err(ConfigError::InvalidWindow {
                        phase: row.phase.to_string(),
                        min_days: min.num_seconds() as f64 / 86_400.0,
                        max_days: max.num_seconds() as f64 / 86_400.0,
                    });
                }
            }

            for (field, value) in [
                ("wind_thresh_kt", row.wind_thresh_kt),
                ("rain_thresh_mm", row.rain_thresh_mm),
                ("distance_thresh_km", row.distance_thresh_km),
            ] {
                if !(value > 0.0) {
                    return Err(ConfigError::NonPositiveThreshold {
                        phase: row.phase.to_string(),
                        field,
                        value,
                    });
                }
            }
        }

        if self.resample.cadence <= Duration::zero() {
            return Err(ConfigError::NonPositiveCadence(self.resample.cadence));
        }
        if self.resample.max_gap < self.resample.cadence {
            return Err(ConfigError::GapBelowCadence {
                gap: self.resample.max_gap,
                cadence: self.resample.cadence,
            });
        }

        for rule in &self.suppression {
            if !rule.suppressed.is_trigger() || !rule.by.is_trigger() {
                let offender = if rule.suppressed.is_trigger() {
                    rule.by
                } else {
                    rule.suppressed
                };
                return Err(ConfigError::UnknownSuppressionTarget(
                    offender.tag().to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Phase rows evaluated against the given track family.
    pub fn phases_for(&self, family: PhaseFamily) -> impl Iterator<Item = &PhaseConfig> {
        self.phases
            .iter()
            .filter(move |row| row.phase.family() == family)
    }

    /// Looks up one phase row.
    #[must_use]
    pub fn phase(&self, phase: Phase) -> Option<&PhaseConfig> {
        self.phases.iter().find(|row| row.phase == phase)
    }

    /// Notification types that suppress `ntype` for the same storm.
    pub fn suppressors_of(&self, ntype: NotificationType) -> impl Iterator<Item = NotificationType> + '_ {
        self.suppression
            .iter()
            .filter(move |rule| rule.suppressed == ntype)
            .map(|rule| rule.by)
    }
}
