//! # Stormwatch - Tropical Cyclone Anticipatory-Action Monitoring
//!
//! Stormwatch evaluates tropical-cyclone forecast and observational data
//! against an anticipatory-action protocol for a fixed at-risk area. It
//! turns raw storm tracks and daily rainfall into per-issuance monitoring
//! records, decides which activation phases have triggered, and delivers
//! each resulting notification at most once.
//!
//! ## Core Concepts
//!
//! - **Track**: positions and intensities of one storm, forecast or observed
//! - **Boundary**: the administrative area the protocol protects
//! - **Phase**: one row of the trigger table (readiness, action, observational)
//! - **MonitoringPoint**: the frozen evaluation of one issuance, persisted forever
//! - **NotificationLedger**: the at-most-once delivery record
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stormwatch::{
//!     dispatch_trigger_notifications, update_forecast_monitoring, MonitorConfig, PhaseFamily,
//! };
//!
//! let config = MonitorConfig::default();
//! let store = update_forecast_monitoring(&config, &tracks, &rainfall, &boundaries, &repo)?;
//!
//! let mut ledger = ledger_repo.load()?;
//! dispatch_trigger_notifications(&config, &store, PhaseFamily::Forecast, &mut ledger, &sink)?;
//! ledger_repo.save(&ledger)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core domain types
pub mod config;
pub mod error;
pub mod geometry;
pub mod rainfall;
pub mod resample;
pub mod time;
pub mod track;

// Evaluation, persistence, and dispatch
pub mod monitoring;
pub mod notify;
pub mod providers;
pub mod storage;
pub mod trigger;

// Re-export primary types at crate root for convenience
pub use config::{DistributionMode, MonitorConfig, Phase, PhaseConfig, SuppressionRule};
pub use error::{
    ConfigError, EvaluationError, GeometryError, MonitorResult, NotificationError, StormError,
};
pub use geometry::{Boundary, GeoPoint};
pub use monitoring::{
    observational_issue_time, update_forecast_monitoring, update_observational_monitoring,
    MonitoringPoint, MonitoringStore,
};
pub use notify::{
    dispatch_info_notifications, dispatch_trigger_notifications, NotificationEvent,
    NotificationLedger, NotificationRecord, NotificationSink, NotificationType,
};
pub use providers::{
    BoundaryProvider, LedgerRepository, MonitoringRepository, RainfallProvider, StorageError,
    TrackProvider,
};
pub use rainfall::{RainfallSample, RainfallSeries, RainfallSource, RollingRainfall};
pub use resample::{ResampleConfig, TemporalResampler};
pub use time::{DateSpan, LeadTimeWindow};
pub use track::{monitor_id, PhaseFamily, StormId, Track, TrackPoint};
pub use trigger::{
    ClosestPass, ForecastEvaluation, ObservationalEvaluation, PhaseOutcome, TriggerEvaluator,
};
