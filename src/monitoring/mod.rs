//! Monitoring records, the persisted store, and the batch update loops.

mod point;
mod store;
mod update;

pub use point::MonitoringPoint;
pub use store::MonitoringStore;
pub use update::{
    observational_issue_time, update_forecast_monitoring, update_observational_monitoring,
};
