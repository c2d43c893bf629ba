//! Notification ledger and dispatch.
//!
//! The ledger guarantees at-most-once delivery per logical event.
//! Trigger-class notifications dedup on (storm, type): only the first
//! monitoring point in issuance order that satisfies a phase's trigger
//! produces one. Informational notifications dedup on the monitor id.
//! Ledger entries are appended, never deleted; the one exception is the
//! flagged synthetic test row, which membership checks ignore.

mod dispatch;
mod ledger;

pub use dispatch::{dispatch_info_notifications, dispatch_trigger_notifications};
pub use ledger::{NotificationLedger, NotificationRecord};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::Phase;
use crate::track::StormId;

/// Classes of outbound notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// Readiness trigger met (forecast phase).
    Readiness,
    /// Action trigger met (forecast phase).
    Action,
    /// Observational trigger met.
    Observational,
    /// Informational update for one monitoring point.
    Info,
}

impl NotificationType {
    /// Short tag used in persisted records.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Readiness => "readiness",
            Self::Action => "action",
            Self::Observational => "obsv",
            Self::Info => "info",
        }
    }

    /// Trigger-class notifications dedup per storm; info dedups per
    /// monitoring point.
    #[must_use]
    pub const fn is_trigger(self) -> bool {
        !matches!(self, Self::Info)
    }

    /// The evaluation phase backing a trigger-class notification.
    #[must_use]
    pub const fn phase(self) -> Option<Phase> {
        match self {
            Self::Readiness => Some(Phase::Readiness),
            Self::Action => Some(Phase::Action),
            Self::Observational => Some(Phase::Observational),
            Self::Info => None,
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One notification handed to the downstream rendering/delivery
/// collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Monitoring point that caused the notification.
    pub monitor_id: String,

    /// Storm the notification concerns.
    pub storm_id: StormId,

    /// Class of notification.
    pub notification_type: NotificationType,
}

/// Downstream delivery collaborator (email/plot rendering lives there).
pub trait NotificationSink {
    /// Delivers one notification. A failure leaves the ledger untouched
    /// so the event is retried on the next run.
    fn deliver(&self, event: &NotificationEvent) -> Result<(), crate::error::NotificationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_match_persisted_convention() {
        assert_eq!(NotificationType::Readiness.tag(), "readiness");
        assert_eq!(NotificationType::Action.tag(), "action");
        assert_eq!(NotificationType::Observational.tag(), "obsv");
        assert_eq!(NotificationType::Info.tag(), "info");
    }

    #[test]
    fn info_is_not_trigger_class() {
        assert!(NotificationType::Action.is_trigger());
        assert!(!NotificationType::Info.is_trigger());
        assert!(NotificationType::Info.phase().is_none());
    }

    fn _assert_sink_object_safe(_: &dyn NotificationSink) {}
}
