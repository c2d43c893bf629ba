//! Error types for stormwatch.
//!
//! All errors are strongly typed using thiserror. This enables pattern
//! matching on specific error conditions and makes the per-storm
//! isolation policy (recoverable vs. fatal) explicit.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::track::{PhaseFamily, StormId};

/// Configuration errors detected before any I/O is performed.
///
/// A malformed phase table or window aborts the run at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No phase rows at all.
    #[error("phase table is empty")]
    EmptyPhaseTable,

    /// The same phase appears in more than one row.
    #[error("duplicate phase in table: {phase}")]
    DuplicatePhase {
        /// Offending phase name.
        phase: String,
    },

    /// A lead-time window with min above max.
    #[error("invalid lead-time window for phase {phase}: min ({min_days}d) exceeds max ({max_days}d)")]
    InvalidWindow {
        /// Offending phase name.
        phase: String,
        /// Window minimum in days.
        min_days: f64,
        /// Window maximum in days.
        max_days: f64,
    },

    /// A wind, rain, or distance threshold at or below zero.
    #[error("non-positive threshold for phase {phase}: {field} = {value}")]
    NonPositiveThreshold {
        /// Offending phase name.
        phase: String,
        /// Field name within the row.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Resample cadence at or below zero.
    #[error("resample cadence must be positive, got {0}")]
    NonPositiveCadence(Duration),

    /// Max interpolation gap below the cadence makes every multi-point
    /// track fail.
    #[error("max interpolation gap ({gap}) is smaller than the resample cadence ({cadence})")]
    GapBelowCadence {
        /// Configured maximum gap.
        gap: Duration,
        /// Configured cadence.
        cadence: Duration,
    },

    /// A suppression rule naming a non-trigger notification type.
    #[error("suppression rule references unknown notification type: {0}")]
    UnknownSuppressionTarget(String),
}

/// Errors raised while evaluating a single storm.
///
/// These are caught at the per-storm boundary: one storm's failure is
/// logged and skipped without aborting the batch.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// Requested track or rainfall window has no data yet. Recoverable;
    /// the pair is retried on the next run.
    #[error("no data available for storm {storm_id} ({phase_family}) at {issue_time}")]
    DataUnavailable {
        /// Storm being evaluated.
        storm_id: StormId,
        /// Family of the evaluation.
        phase_family: PhaseFamily,
        /// Issuance the data was requested for.
        issue_time: DateTime<Utc>,
    },

    /// Invalid or missing geometry. Fatal for this storm's evaluation only.
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// Interpolation gap exceeds the configured maximum. The affected
    /// phase evaluation is skipped rather than fabricated.
    #[error(
        "track gap of {gap} between {before} and {after} exceeds maximum interpolation gap of {max_gap}"
    )]
    DataGap {
        /// Source point before the gap.
        before: DateTime<Utc>,
        /// Source point after the gap.
        after: DateTime<Utc>,
        /// Observed spacing.
        gap: Duration,
        /// Configured maximum spacing.
        max_gap: Duration,
    },
}

/// Geometry failures from boundary or point handling.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// Fewer than three distinct boundary vertices.
    #[error("boundary polygon has {0} vertices, need at least 3")]
    DegenerateBoundary(usize),

    /// NaN or infinite coordinate.
    #[error("non-finite coordinate: lat={lat}, lon={lon}")]
    NonFiniteCoordinate {
        /// Rejected latitude.
        lat: f64,
        /// Rejected longitude.
        lon: f64,
    },

    /// Latitude too close to a pole for the planar projection.
    #[error("latitude {0} outside projectable range")]
    LatitudeOutOfRange(f64),
}

/// Errors from the downstream notification collaborator.
///
/// Delivery failures leave the ledger unmodified so the notification is
/// retried on the next run.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The sink could not deliver the notification.
    #[error("delivery failed for {monitor_id}: {message}")]
    DeliveryFailed {
        /// Monitoring point the notification was for.
        monitor_id: String,
        /// Sink-provided failure description.
        message: String,
    },
}

/// Top-level error type for stormwatch.
#[derive(Debug, Error)]
pub enum StormError {
    /// Malformed configuration, detected before any I/O.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A single storm's evaluation failed.
    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    /// A notification could not be delivered.
    #[error("notification error: {0}")]
    Notification(#[from] NotificationError),

    /// Provider or repository failure.
    #[error("storage error: {0}")]
    Storage(#[from] crate::providers::StorageError),
}

impl StormError {
    /// Returns true if the failure is expected to clear on a later run
    /// without operator intervention.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            // A bad phase table never fixes itself.
            Self::Config(_) => false,
            Self::Evaluation(e) => matches!(
                e,
                EvaluationError::DataUnavailable { .. } | EvaluationError::DataGap { .. }
            ),
            // The ledger is left untouched, so delivery retries next run.
            Self::Notification(_) => true,
            // Persistence failures are fatal: correctness depends on
            // durable state.
            Self::Storage(_) => false,
        }
    }
}

/// Result type alias for stormwatch operations.
pub type MonitorResult<T> = Result<T, StormError>;
