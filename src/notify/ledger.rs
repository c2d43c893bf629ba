//! Append-only notification ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::notify::NotificationType;
use crate::track::StormId;

/// One delivered notification. Existence of a record means "already
/// sent; do not resend".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Unique record id.
    pub id: Uuid,

    /// Monitoring point that produced the notification.
    pub monitor_id: String,

    /// Storm the notification concerns.
    pub storm_id: StormId,

    /// Class of notification.
    pub notification_type: NotificationType,

    /// Delivery time.
    pub sent_at: DateTime<Utc>,

    /// Synthetic test rows are recorded but ignored by membership
    /// checks, so a test run never suppresses a real notification and
    /// test notifications re-fire on every test run.
    pub is_test: bool,
}

impl NotificationRecord {
    /// Creates a record stamped now.
    #[must_use]
    pub fn new(
        monitor_id: impl Into<String>,
        storm_id: StormId,
        notification_type: NotificationType,
        is_test: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            monitor_id: monitor_id.into(),
            storm_id,
            notification_type,
            sent_at: Utc::now(),
            is_test,
        }
    }
}

/// Dedup ledger guaranteeing at-most-once notification per logical
/// event. Entries are only ever appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationLedger {
    records: Vec<NotificationRecord>,
}

impl NotificationLedger {
    /// An empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a ledger from persisted records.
    #[must_use]
    pub fn from_records(records: Vec<NotificationRecord>) -> Self {
        Self { records }
    }

    /// All records in append order.
    #[must_use]
    pub fn records(&self) -> &[NotificationRecord] {
        &self.records
    }

    /// Number of records, synthetic test rows included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a trigger-class notification was already delivered for
    /// this (storm, type) pair. Test rows are excluded.
    #[must_use]
    pub fn already_sent_trigger(&self, storm_id: &StormId, ntype: NotificationType) -> bool {
        self.records.iter().any(|r| {
            !r.is_test
                && r.notification_type == ntype
                && &r.storm_id == storm_id
        })
    }

    /// Whether an informational notification was already delivered for
    /// this monitoring point. Test rows are excluded.
    #[must_use]
    pub fn already_sent_info(&self, monitor_id: &str) -> bool {
        self.records.iter().any(|r| {
            !r.is_test
                && r.notification_type == NotificationType::Info
                && r.monitor_id == monitor_id
        })
    }

    /// Appends a record. There is deliberately no way to remove one.
    pub fn record(&mut self, record: NotificationRecord) {
        self.records.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storm() -> StormId {
        StormId::new("al092024").unwrap()
    }

    #[test]
    fn trigger_membership_is_keyed_by_storm_and_type() {
        let mut ledger = NotificationLedger::new();
        ledger.record(NotificationRecord::new(
            "al092024_fcast_2024-08-01T15:00:00",
            storm(),
            NotificationType::Action,
            false,
        ));

        assert!(ledger.already_sent_trigger(&storm(), NotificationType::Action));
        assert!(!ledger.already_sent_trigger(&storm(), NotificationType::Readiness));
        assert!(!ledger.already_sent_trigger(
            &StormId::new("al102024").unwrap(),
            NotificationType::Action
        ));
    }

    #[test]
    fn info_membership_is_keyed_by_monitor_id() {
        let mut ledger = NotificationLedger::new();
        ledger.record(NotificationRecord::new(
            "al092024_fcast_2024-08-01T15:00:00",
            storm(),
            NotificationType::Info,
            false,
        ));

        assert!(ledger.already_sent_info("al092024_fcast_2024-08-01T15:00:00"));
        assert!(!ledger.already_sent_info("al092024_fcast_2024-08-01T21:00:00"));
    }

    #[test]
    fn test_rows_are_excluded_from_membership() {
        let mut ledger = NotificationLedger::new();
        ledger.record(NotificationRecord::new(
            "xx999999_fcast_2024-08-01T15:00:00",
            StormId::synthetic(),
            NotificationType::Action,
            true,
        ));
        ledger.record(NotificationRecord::new(
            "xx999999_fcast_2024-08-01T15:00:00",
            StormId::synthetic(),
            NotificationType::Info,
            true,
        ));

        assert!(!ledger.already_sent_trigger(&StormId::synthetic(), NotificationType::Action));
        assert!(!ledger.already_sent_info("xx999999_fcast_2024-08-01T15:00:00"));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn ledger_round_trips_through_json() {
        let mut ledger = NotificationLedger::new();
        ledger.record(NotificationRecord::new(
            "al092024_obsv_2024-08-03T15:00:00",
            storm(),
            NotificationType::Observational,
            false,
        ));

        let json = serde_json::to_string(&ledger).unwrap();
        let back: NotificationLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(ledger, back);
    }
}
