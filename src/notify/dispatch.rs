//! Notification dispatch over a monitoring store.
//!
//! Dispatch walks storms in id order and each storm's points in
//! issuance order; the first point satisfying a trigger wins and later
//! still-triggered points for the same (storm, type) are suppressed.
//! A delivery failure is logged and the ledger left untouched, so the
//! event retries on the next run.

use tracing::{debug, error, info};

use crate::config::MonitorConfig;
use crate::error::MonitorResult;
use crate::monitoring::{MonitoringPoint, MonitoringStore};
use crate::notify::{
    NotificationEvent, NotificationLedger, NotificationRecord, NotificationSink, NotificationType,
};
use crate::track::PhaseFamily;
use crate::trigger::PhaseOutcome;

/// Trigger-class notification types evaluated against a family's
/// records.
fn trigger_types(family: PhaseFamily) -> &'static [NotificationType] {
    match family {
        PhaseFamily::Forecast => &[NotificationType::Readiness, NotificationType::Action],
        PhaseFamily::Observational => &[NotificationType::Observational],
    }
}

/// Injects the synthetic all-triggers point in test mode.
fn dispatch_view(
    config: &MonitorConfig,
    store: &MonitoringStore,
    family: PhaseFamily,
) -> Vec<MonitoringPoint> {
    let mut points: Vec<MonitoringPoint> = store.points().to_vec();
    if config.test_mode {
        let outcomes: Vec<PhaseOutcome> = config
            .phases_for(family)
            .map(|row| PhaseOutcome {
                phase: row.phase,
                wind_extreme_kt: Some(row.wind_thresh_kt + 10.0),
                rain_extreme_mm: Some(row.rain_thresh_mm + 10.0),
                triggered: true,
            })
            .collect();
        points.push(MonitoringPoint::synthetic(family, outcomes));
    }
    points
}

/// Evaluates trigger-class notifications for every storm in the store
/// and delivers the ones the ledger has not seen. Returns the events
/// delivered in this run; successfully delivered events are recorded in
/// the ledger.
pub fn dispatch_trigger_notifications(
    config: &MonitorConfig,
    store: &MonitoringStore,
    family: PhaseFamily,
    ledger: &mut NotificationLedger,
    sink: &dyn NotificationSink,
) -> MonitorResult<Vec<NotificationEvent>> {
    config.validate()?;

    let points = dispatch_view(config, store, family);
    let grouped = MonitoringStore::from_points(points);
    let mut delivered = Vec::new();

    for (storm_id, storm_points) in grouped.by_storm() {
        for &ntype in trigger_types(family) {
            if ledger.already_sent_trigger(storm_id, ntype) {
                debug!(storm_id = %storm_id, notification = %ntype, "already sent, skipping");
                continue;
            }
            if config
                .suppressors_of(ntype)
                .any(|by| ledger.already_sent_trigger(storm_id, by))
            {
                debug!(storm_id = %storm_id, notification = %ntype, "suppressed by higher-priority notification");
                continue;
            }

            let Some(phase) = ntype.phase() else {
                continue;
            };
            // First occurrence wins: scan in issuance order and stop at
            // the first point that satisfies this phase's trigger.
            let firing = storm_points.iter().find(|p| {
                p.triggered(phase) && !(p.phase_family == PhaseFamily::Forecast && p.past_cutoff)
            });
            let Some(point) = firing else {
                continue;
            };

            let event = NotificationEvent {
                monitor_id: point.monitor_id.clone(),
                storm_id: storm_id.clone(),
                notification_type: ntype,
            };
            match sink.deliver(&event) {
                Ok(()) => {
                    info!(monitor_id = %event.monitor_id, notification = %ntype, "sent trigger notification");
                    ledger.record(NotificationRecord::new(
                        event.monitor_id.clone(),
                        event.storm_id.clone(),
                        ntype,
                        point.is_synthetic(),
                    ));
                    delivered.push(event);
                }
                Err(e) => {
                    // Ledger untouched: retried next run.
                    error!(monitor_id = %event.monitor_id, error = %e, "trigger notification delivery failed");
                }
            }
        }
    }

    Ok(delivered)
}

/// Delivers informational (non-trigger) notifications: one per
/// monitoring point, gated by the relevance radius and, for
/// observational records, by rainfall relevance.
pub fn dispatch_info_notifications(
    config: &MonitorConfig,
    store: &MonitoringStore,
    family: PhaseFamily,
    ledger: &mut NotificationLedger,
    sink: &dyn NotificationSink,
) -> MonitorResult<Vec<NotificationEvent>> {
    config.validate()?;

    let points = dispatch_view(config, store, family);
    let mut delivered = Vec::new();

    for point in &points {
        if point.min_distance_km > config.relevance_radius_km {
            debug!(
                monitor_id = %point.monitor_id,
                min_distance_km = point.min_distance_km,
                "too far for informational notification, skipping"
            );
            continue;
        }
        if family == PhaseFamily::Observational && !point.rainfall_relevant {
            debug!(monitor_id = %point.monitor_id, "rainfall no longer attributable, skipping");
            continue;
        }
        if ledger.already_sent_info(&point.monitor_id) {
            debug!(monitor_id = %point.monitor_id, "info already sent, skipping");
            continue;
        }

        let event = NotificationEvent {
            monitor_id: point.monitor_id.clone(),
            storm_id: point.storm_id.clone(),
            notification_type: NotificationType::Info,
        };
        match sink.deliver(&event) {
            Ok(()) => {
                info!(monitor_id = %event.monitor_id, "sent info notification");
                ledger.record(NotificationRecord::new(
                    event.monitor_id.clone(),
                    event.storm_id.clone(),
                    NotificationType::Info,
                    point.is_synthetic(),
                ));
                delivered.push(event);
            }
            Err(e) => {
                error!(monitor_id = %event.monitor_id, error = %e, "info notification delivery failed");
            }
        }
    }

    Ok(delivered)
}
